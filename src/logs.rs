use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum LogLevel {
    #[serde(rename = "error")]
    Error,

    #[serde(rename = "warning")]
    Warning,

    #[serde(rename = "info")]
    #[default]
    Info,

    /// Includes per-decision denial traces from the access context.
    #[serde(rename = "debug")]
    Debug,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default)]
    pub level: LogLevel,

    /// Log file path, env-expanded. Logs go to stdout when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl LogsConfig {
    /// Initializes the global logger. Call once at process start.
    pub fn init(&self) -> Result<()> {
        let level = match self.level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
        };

        let is_terminal = self.file.is_none() && io::stdout().is_terminal();
        let colors = ColoredLevelConfig::new()
            .info(Color::Green)
            .debug(Color::Magenta);

        let dispatch = fern::Dispatch::new()
            .format(move |out, message, record| {
                if is_terminal {
                    out.finish(format_args!(
                        "{} [{}] {}",
                        humantime::format_rfc3339_millis(std::time::SystemTime::now()),
                        colors.color(record.level()),
                        message
                    ))
                } else {
                    out.finish(format_args!(
                        "{} [{}] {}",
                        humantime::format_rfc3339_millis(std::time::SystemTime::now()),
                        record.level(),
                        message
                    ))
                }
            })
            .level(level);

        let dispatch = match self.file {
            Some(ref file) => {
                let path = crate::config::expandenv("log file", file)?;
                dispatch.chain(
                    fern::log_file(&path).with_context(|| format!("open log file: {path}"))?,
                )
            }
            None => dispatch.chain(io::stdout()),
        };

        dispatch.apply().context("init logger")?;
        Ok(())
    }
}
