//! Access control core for the strata management platform.
//!
//! This crate decides whether a subject (an optional role plus a list of
//! explicitly granted permissions) may perform an action. It is pure: no I/O,
//! no session fetching, no persistence. The application shell feeds it the
//! authenticated subject and asks questions; everything else (rendering,
//! routing, storage) lives outside.
//!
//! The pieces, bottom up:
//!
//! - [`catalog`]: the closed [`Role`](catalog::Role) and
//!   [`Permission`](catalog::Permission) enumerations and the injected
//!   [`AccessCatalog`](catalog::AccessCatalog) mapping roles to default
//!   permission sets and hierarchy levels.
//! - [`authz`]: pure decision functions over explicit inputs, plus the
//!   [`AccessRequirement`](authz::AccessRequirement) record describing what a
//!   gate needs.
//! - [`policy`]: the static route path → requirement table.
//! - [`context`]: a session-bound wrapper exposing memoized decisions to the
//!   application.

pub mod authz;
pub mod catalog;
pub mod config;
pub mod context;
pub mod logs;
pub mod policy;
