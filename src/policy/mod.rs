use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::authz::AccessRequirement;
use crate::catalog::{Permission, Role};

/// A route path paired with the requirement guarding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAccessEntry {
    /// Application route path, matched exactly.
    pub path: String,

    /// The requirement a subject must satisfy to enter the route.
    #[serde(flatten)]
    pub requirement: AccessRequirement,
}

impl RouteAccessEntry {
    pub fn new(path: impl Into<String>, requirement: AccessRequirement) -> Self {
        Self {
            path: path.into(),
            requirement,
        }
    }
}

/// Defects in a route table, rejected at construction.
#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("duplicate route path '{0}'")]
    DuplicatePath(String),

    #[error("route path '{0}' must start with '/'")]
    RelativePath(String),
}

/// The static route → requirement table.
///
/// Paths are unique; a duplicate is a configuration defect and
/// [`AccessPolicy::new`] rejects it outright rather than letting a later
/// entry shadow an earlier one. Routes absent from the table are
/// unprotected. All lookups are pure.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    entries: Vec<RouteAccessEntry>,
}

impl AccessPolicy {
    /// Builds a policy from explicit entries, rejecting duplicate or
    /// malformed paths.
    pub fn new(entries: Vec<RouteAccessEntry>) -> Result<Self, PolicyError> {
        for (i, entry) in entries.iter().enumerate() {
            if !entry.path.starts_with('/') {
                return Err(PolicyError::RelativePath(entry.path.clone()));
            }
            if entries[..i].iter().any(|prev| prev.path == entry.path) {
                return Err(PolicyError::DuplicatePath(entry.path.clone()));
            }
        }
        Ok(Self { entries })
    }

    /// The route table shipped with the platform.
    ///
    /// Uniqueness of these literals is enforced by a test over
    /// [`AccessPolicy::new`].
    pub fn builtin() -> Self {
        Self {
            entries: builtin_entries(),
        }
    }

    /// Returns the requirement guarding a path, or `None` for unprotected
    /// routes.
    pub fn requirement_for_path(&self, path: &str) -> Option<&AccessRequirement> {
        self.entries
            .iter()
            .find(|entry| entry.path == path)
            .map(|entry| &entry.requirement)
    }

    /// Whether a path appears in the table at all.
    pub fn is_protected(&self, path: &str) -> bool {
        self.entries.iter().any(|entry| entry.path == path)
    }

    /// Routes whose requirement mentions the given permission, either as the
    /// single permission or in the permission list.
    pub fn routes_requiring_permission(&self, permission: Permission) -> Vec<&RouteAccessEntry> {
        self.entries
            .iter()
            .filter(|entry| {
                entry.requirement.permission == Some(permission)
                    || entry
                        .requirement
                        .permissions
                        .as_ref()
                        .is_some_and(|list| list.contains(&permission))
            })
            .collect()
    }

    /// Routes gated on the given minimum role.
    pub fn routes_requiring_minimum_role(&self, role: Role) -> Vec<&RouteAccessEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.requirement.minimum_role == Some(role))
            .collect()
    }

    /// All entries, in table order.
    pub fn entries(&self) -> &[RouteAccessEntry] {
        &self.entries
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

/// The builtin route table for the platform's page surface.
pub fn builtin_entries() -> Vec<RouteAccessEntry> {
    vec![
        RouteAccessEntry::new(
            "/users",
            AccessRequirement::permission(Permission::ManageUsers),
        ),
        RouteAccessEntry::new(
            "/roles",
            AccessRequirement::permission(Permission::ManageRoles)
                .with_minimum_role(Role::CustomerAdmin),
        ),
        RouteAccessEntry::new(
            "/properties",
            AccessRequirement::permission(Permission::ManageProperties),
        ),
        RouteAccessEntry::new(
            "/finances",
            AccessRequirement::permission(Permission::ManageFinances),
        ),
        RouteAccessEntry::new(
            "/complaints",
            AccessRequirement::any_of(vec![
                Permission::ManageComplaints,
                Permission::ViewReports,
            ]),
        ),
        RouteAccessEntry::new(
            "/notices",
            AccessRequirement::permission(Permission::ManageNotices),
        ),
        RouteAccessEntry::new(
            "/reports",
            AccessRequirement::permission(Permission::ViewReports),
        ),
        RouteAccessEntry::new(
            "/analytics",
            AccessRequirement::permission(Permission::ViewAnalytics),
        ),
        RouteAccessEntry::new(
            "/settings",
            AccessRequirement::all_of(vec![Permission::ManageSettings])
                .with_minimum_role(Role::CustomerAdmin),
        ),
        RouteAccessEntry::new(
            "/admin",
            AccessRequirement::minimum_role(Role::PlatformAdmin),
        ),
    ]
}
