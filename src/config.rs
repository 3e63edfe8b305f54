use std::collections::{HashMap, HashSet};
use std::{fs, io};

use anyhow::{Context, Result};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::catalog::{AccessCatalog, Permission, Role};
use crate::logs::LogsConfig;
use crate::policy::{builtin_entries, AccessPolicy, RouteAccessEntry};

/// Implemented by config sections that need validation after parsing.
pub trait CommonConfig {
    /// Validates and fills in the parsed config. Called once by
    /// [`load_config`] before the config is handed out.
    fn complete(&mut self) -> Result<()>;
}

/// Loads a TOML config file.
///
/// A missing file is not an error: defaults are used and a warning logged,
/// so a bare deployment runs on the builtin tables. Parse and validation
/// failures are fatal.
pub fn load_config<T>(path: impl AsRef<str>) -> Result<T>
where
    T: CommonConfig + DeserializeOwned + Default,
{
    let path = expandenv("config path", path.as_ref())?;
    let mut cfg: T = match fs::read_to_string(&path) {
        Ok(s) => toml::from_str(&s).with_context(|| format!("parse config file: {path}"))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!("Config file {path} not found, using defaults");
            T::default()
        }
        Err(err) => {
            return Err(err).with_context(|| format!("read config file: {path}"));
        }
    };

    cfg.complete().context("validate config")?;
    Ok(cfg)
}

/// See: [`shellexpand::full`].
pub fn expandenv(name: &str, s: impl AsRef<str>) -> Result<String> {
    let s =
        shellexpand::full(s.as_ref()).with_context(|| format!("expand env value for '{name}'"))?;
    Ok(s.to_string())
}

/// Deployment overrides for the access-control tables.
///
/// Everything is optional: absent sections keep the builtin catalog and
/// route table. Overrides are merged per role (a listed role replaces its
/// builtin permission set or hierarchy level; unlisted roles keep theirs),
/// while a non-empty `routes` list replaces the builtin table wholesale.
/// The merged result must pass the same invariants as the builtin data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Per-role replacement permission sets.
    #[serde(default)]
    pub role_permissions: HashMap<Role, HashSet<Permission>>,

    /// Per-role replacement hierarchy levels.
    #[serde(default)]
    pub hierarchy: HashMap<Role, u32>,

    /// Replacement route table. Empty keeps the builtin one.
    #[serde(default)]
    pub routes: Vec<RouteAccessEntry>,

    #[serde(default)]
    pub logs: LogsConfig,
}

impl CommonConfig for AccessConfig {
    fn complete(&mut self) -> Result<()> {
        // Surface catalog and route defects at load time, not at decision
        // time
        self.build_catalog()?;
        self.build_policy()?;
        Ok(())
    }
}

impl AccessConfig {
    /// Merges the overrides onto the builtin catalog and validates the
    /// result.
    pub fn build_catalog(&self) -> Result<AccessCatalog> {
        let builtin = AccessCatalog::builtin();

        let mut role_permissions: HashMap<Role, HashSet<Permission>> = Role::ALL
            .into_iter()
            .filter_map(|role| builtin.role_permissions(role).map(|set| (role, set.clone())))
            .collect();
        for (role, set) in &self.role_permissions {
            role_permissions.insert(*role, set.clone());
        }

        let mut hierarchy: HashMap<Role, u32> = Role::ALL
            .into_iter()
            .map(|role| (role, builtin.hierarchy_level(role)))
            .collect();
        for (role, level) in &self.hierarchy {
            hierarchy.insert(*role, *level);
        }

        let catalog = AccessCatalog::new(role_permissions, hierarchy);
        catalog.validate().context("invalid role catalog")?;
        Ok(catalog)
    }

    /// Builds the route table from the overrides, or the builtin table when
    /// none are given.
    pub fn build_policy(&self) -> Result<AccessPolicy> {
        let entries = if self.routes.is_empty() {
            builtin_entries()
        } else {
            self.routes.clone()
        };
        let policy = AccessPolicy::new(entries).context("invalid route table")?;
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_builtins() {
        let mut cfg: AccessConfig = toml::from_str("").unwrap();
        cfg.complete().unwrap();

        let catalog = cfg.build_catalog().unwrap();
        catalog.validate().unwrap();
        assert_eq!(catalog.hierarchy_level(Role::PlatformAdmin), 100);

        let policy = cfg.build_policy().unwrap();
        assert!(policy.is_protected("/users"));
    }

    #[test]
    fn test_overrides_merge_per_role() {
        let mut cfg: AccessConfig = toml::from_str(
            r#"
[role_permissions]
customer_user = ["view_reports", "view_analytics"]

[hierarchy]
customer_user = 25

[logs]
level = "debug"
"#,
        )
        .unwrap();
        cfg.complete().unwrap();

        let catalog = cfg.build_catalog().unwrap();

        // The listed role is replaced
        let perms = catalog.role_permissions(Role::CustomerUser).unwrap();
        assert!(perms.contains(&Permission::ViewAnalytics));
        assert_eq!(catalog.hierarchy_level(Role::CustomerUser), 25);

        // Unlisted roles keep the builtin data
        assert_eq!(catalog.hierarchy_level(Role::CustomerAdmin), 60);
        assert!(catalog
            .role_permissions(Role::PlatformAdmin)
            .unwrap()
            .contains(&Permission::All));
    }

    #[test]
    fn test_route_overrides_replace_table() {
        let mut cfg: AccessConfig = toml::from_str(
            r#"
[[routes]]
path = "/billing"
permission = "manage_finances"

[[routes]]
path = "/admin"
minimum_role = "platform_admin"
"#,
        )
        .unwrap();
        cfg.complete().unwrap();

        let policy = cfg.build_policy().unwrap();
        assert!(policy.is_protected("/billing"));
        // The builtin table is gone, not merged
        assert!(!policy.is_protected("/users"));
    }

    #[test]
    fn test_defective_config_fails_loudly() {
        // Emptying a role's permission set violates the catalog invariant
        let mut cfg: AccessConfig = toml::from_str(
            r#"
[role_permissions]
customer_user = []
"#,
        )
        .unwrap();
        assert!(cfg.complete().is_err());

        // Duplicate route paths are rejected
        let mut cfg: AccessConfig = toml::from_str(
            r#"
[[routes]]
path = "/users"
permission = "manage_users"

[[routes]]
path = "/users"
minimum_role = "platform_admin"
"#,
        )
        .unwrap();
        assert!(cfg.complete().is_err());
    }
}
