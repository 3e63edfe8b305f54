pub mod draft;

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A position in the organizational hierarchy.
///
/// The enumeration is closed. Role strings coming from stale session data that
/// no longer match any variant must be mapped to "no role" by the caller (see
/// [`Role::from_name`]); they never become a live `Role` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Operates the platform itself, across every customer society
    PlatformAdmin,

    /// Platform staff handling support and onboarding
    PlatformSupport,

    /// Administers a single customer society
    CustomerAdmin,

    /// Runs day-to-day operations for a society
    CustomerManager,

    /// Individual resident account
    CustomerUser,
}

impl Role {
    /// Every enumerated role, used for exhaustiveness checks over the catalog
    /// maps.
    pub const ALL: [Role; 5] = [
        Role::PlatformAdmin,
        Role::PlatformSupport,
        Role::CustomerAdmin,
        Role::CustomerManager,
        Role::CustomerUser,
    ];

    /// The wire name of this role, matching its serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::PlatformAdmin => "platform_admin",
            Role::PlatformSupport => "platform_support",
            Role::CustomerAdmin => "customer_admin",
            Role::CustomerManager => "customer_manager",
            Role::CustomerUser => "customer_user",
        }
    }

    /// Resolves a role from its wire name.
    ///
    /// Returns `None` for anything outside the enumeration, so stale or
    /// malformed session data degrades to an unassigned role rather than an
    /// error.
    pub fn from_name(name: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.as_str() == name)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A discrete capability a subject may hold.
///
/// [`Permission::All`] is the wildcard: holding it (directly or through a
/// role's default set) satisfies every permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Wildcard, grants every permission
    #[serde(rename = "*")]
    All,

    ManageUsers,
    ManageRoles,
    ManageProperties,
    ManageFinances,
    ManageComplaints,
    ManageNotices,
    ManageSettings,
    ViewAnalytics,
    ViewReports,
}

impl Permission {
    /// The wire name of this permission, matching its serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::All => "*",
            Permission::ManageUsers => "manage_users",
            Permission::ManageRoles => "manage_roles",
            Permission::ManageProperties => "manage_properties",
            Permission::ManageFinances => "manage_finances",
            Permission::ManageComplaints => "manage_complaints",
            Permission::ManageNotices => "manage_notices",
            Permission::ManageSettings => "manage_settings",
            Permission::ViewAnalytics => "view_analytics",
            Permission::ViewReports => "view_reports",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Defects in a catalog, caught at construction or by tests, never recovered
/// from at runtime.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("role '{0}' is missing from the permission map")]
    MissingPermissions(Role),

    #[error("role '{0}' maps to an empty permission set")]
    EmptyPermissions(Role),

    #[error("role '{0}' is missing from the hierarchy map")]
    MissingHierarchy(Role),
}

/// The role and permission catalog.
///
/// Holds the default permission set and the hierarchy level for every role.
/// A catalog is immutable configuration: it is constructed once (usually via
/// [`AccessCatalog::builtin`], optionally with deployment overrides applied by
/// the config layer) and passed explicitly into the evaluator and the access
/// context. Nothing in this crate reads a shared global catalog, so tests can
/// run against alternate catalogs in isolation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessCatalog {
    role_permissions: HashMap<Role, HashSet<Permission>>,
    hierarchy: HashMap<Role, u32>,
}

impl AccessCatalog {
    /// Creates a catalog from explicit maps. Call [`AccessCatalog::validate`]
    /// before trusting a catalog built from external data.
    pub fn new(
        role_permissions: HashMap<Role, HashSet<Permission>>,
        hierarchy: HashMap<Role, u32>,
    ) -> Self {
        Self {
            role_permissions,
            hierarchy,
        }
    }

    /// The builtin catalog shipped with the platform.
    ///
    /// Every role appears in both maps with a non-empty permission set; the
    /// platform administrator holds the wildcard.
    pub fn builtin() -> Self {
        let role_permissions: HashMap<Role, HashSet<Permission>> = [
            (Role::PlatformAdmin, vec![Permission::All]),
            (
                Role::PlatformSupport,
                vec![
                    Permission::ManageUsers,
                    Permission::ManageComplaints,
                    Permission::ViewAnalytics,
                    Permission::ViewReports,
                ],
            ),
            (
                Role::CustomerAdmin,
                vec![
                    Permission::ManageUsers,
                    Permission::ManageRoles,
                    Permission::ManageProperties,
                    Permission::ManageFinances,
                    Permission::ManageComplaints,
                    Permission::ManageNotices,
                    Permission::ManageSettings,
                    Permission::ViewAnalytics,
                    Permission::ViewReports,
                ],
            ),
            (
                Role::CustomerManager,
                vec![
                    Permission::ManageProperties,
                    Permission::ManageComplaints,
                    Permission::ManageNotices,
                    Permission::ViewReports,
                ],
            ),
            (Role::CustomerUser, vec![Permission::ViewReports]),
        ]
        .into_iter()
        .map(|(role, perms)| (role, perms.into_iter().collect()))
        .collect();

        let hierarchy: HashMap<Role, u32> = [
            (Role::PlatformAdmin, 100),
            (Role::PlatformSupport, 80),
            (Role::CustomerAdmin, 60),
            (Role::CustomerManager, 40),
            (Role::CustomerUser, 20),
        ]
        .into_iter()
        .collect();

        Self {
            role_permissions,
            hierarchy,
        }
    }

    /// Returns the default permission set for a role, or `None` if the role
    /// is absent from the catalog.
    pub fn role_permissions(&self, role: Role) -> Option<&HashSet<Permission>> {
        self.role_permissions.get(&role)
    }

    /// Returns the hierarchy level for a role. Higher means broader
    /// authority.
    ///
    /// A role absent from the hierarchy map ranks at level 0 and therefore
    /// fails every nonzero minimum-role check. Missing data denies, it never
    /// grants.
    pub fn hierarchy_level(&self, role: Role) -> u32 {
        self.hierarchy.get(&role).copied().unwrap_or(0)
    }

    /// Iterates the role → permission-set entries.
    pub fn iter_role_permissions(&self) -> impl Iterator<Item = (Role, &HashSet<Permission>)> {
        self.role_permissions.iter().map(|(role, set)| (*role, set))
    }

    /// Checks the catalog invariants: every enumerated role must appear in
    /// both maps, and no role may map to an empty permission set.
    ///
    /// A failure here is a configuration defect. It is surfaced to whoever is
    /// constructing the catalog (the config layer, or a test over the builtin
    /// tables) and is never handled at decision time.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for role in Role::ALL {
            match self.role_permissions.get(&role) {
                None => return Err(CatalogError::MissingPermissions(role)),
                Some(set) if set.is_empty() => {
                    return Err(CatalogError::EmptyPermissions(role));
                }
                Some(_) => {}
            }
            if !self.hierarchy.contains_key(&role) {
                return Err(CatalogError::MissingHierarchy(role));
            }
        }
        Ok(())
    }
}

impl Default for AccessCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
