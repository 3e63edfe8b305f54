use serde::{Deserialize, Serialize};

use crate::catalog::{AccessCatalog, Permission, Role};

/// What a gate needs before it lets a subject through.
///
/// Every present field must pass on its own, with one deliberate exception:
/// when both `permission` and a non-empty `permissions` list are set, the
/// list check replaces the single-permission result instead of combining
/// with it. Existing route tables rely on that precedence; do not tighten it
/// to a conjunction.
///
/// A requirement with no fields set means open access.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccessRequirement {
    /// A single permission the subject must hold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<Permission>,

    /// A list of permissions, interpreted through `require_all`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<Permission>>,

    /// When true, every entry of `permissions` must be held; otherwise one
    /// suffices.
    #[serde(default)]
    pub require_all: bool,

    /// The lowest role rank allowed through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_role: Option<Role>,
}

impl AccessRequirement {
    /// A requirement with no conditions: everyone passes.
    pub fn open() -> Self {
        Self::default()
    }

    /// Requires a single permission.
    pub fn permission(permission: Permission) -> Self {
        Self {
            permission: Some(permission),
            ..Self::default()
        }
    }

    /// Requires at least one of the listed permissions.
    pub fn any_of(permissions: Vec<Permission>) -> Self {
        Self {
            permissions: Some(permissions),
            require_all: false,
            ..Self::default()
        }
    }

    /// Requires every listed permission.
    pub fn all_of(permissions: Vec<Permission>) -> Self {
        Self {
            permissions: Some(permissions),
            require_all: true,
            ..Self::default()
        }
    }

    /// Requires a role ranking at or above the given role.
    pub fn minimum_role(role: Role) -> Self {
        Self {
            minimum_role: Some(role),
            ..Self::default()
        }
    }

    /// Adds a minimum-role condition to an existing requirement.
    pub fn with_minimum_role(mut self, role: Role) -> Self {
        self.minimum_role = Some(role);
        self
    }

    /// Whether any condition is set at all.
    pub fn is_open(&self) -> bool {
        self.permission.is_none()
            && self.permissions.as_ref().map_or(true, |p| p.is_empty())
            && self.minimum_role.is_none()
    }
}

/// Whether the subject holds a permission.
///
/// Explicit grants are checked first and authorize on their own, even when no
/// role is assigned. Otherwise the role's default set from the catalog
/// decides. The wildcard satisfies everything on either path. A subject with
/// no role and no matching grant is denied.
pub fn has_permission(
    catalog: &AccessCatalog,
    role: Option<Role>,
    grants: &[Permission],
    permission: Permission,
) -> bool {
    if grants.contains(&Permission::All) || grants.contains(&permission) {
        return true;
    }

    let Some(role) = role else {
        return false;
    };
    match catalog.role_permissions(role) {
        Some(defaults) => defaults.contains(&Permission::All) || defaults.contains(&permission),
        None => false,
    }
}

/// Whether the subject's role ranks at or above the minimum.
///
/// No role means no rank: always false. Equal levels pass. A role missing
/// from the catalog's hierarchy map ranks at level 0 (see
/// [`AccessCatalog::hierarchy_level`]), so it fails every nonzero minimum.
pub fn has_minimum_role(catalog: &AccessCatalog, role: Option<Role>, minimum: Role) -> bool {
    match role {
        Some(role) => catalog.hierarchy_level(role) >= catalog.hierarchy_level(minimum),
        None => false,
    }
}

/// Whether the subject holds at least one of the listed permissions.
///
/// An empty list passes: no listed condition means nothing to fail, matching
/// the open-access default of [`evaluate_access`].
pub fn has_any_permission(
    catalog: &AccessCatalog,
    role: Option<Role>,
    grants: &[Permission],
    permissions: &[Permission],
) -> bool {
    if permissions.is_empty() {
        return true;
    }
    permissions
        .iter()
        .any(|permission| has_permission(catalog, role, grants, *permission))
}

/// Whether the subject holds every listed permission. An empty list is
/// vacuously true.
pub fn has_all_permissions(
    catalog: &AccessCatalog,
    role: Option<Role>,
    grants: &[Permission],
    permissions: &[Permission],
) -> bool {
    permissions
        .iter()
        .all(|permission| has_permission(catalog, role, grants, *permission))
}

/// Evaluates a full requirement against the subject.
///
/// The checks run in order: single permission, then the permission list, then
/// minimum role. The list result replaces the single-permission result when
/// both are present (see [`AccessRequirement`]); the minimum-role check is
/// only consulted while the running result is still true, so it can restrict
/// but never rescue a failed permission check. No fields set returns true.
pub fn evaluate_access(
    catalog: &AccessCatalog,
    role: Option<Role>,
    grants: &[Permission],
    requirement: &AccessRequirement,
) -> bool {
    let mut ok = true;

    if let Some(permission) = requirement.permission {
        ok = has_permission(catalog, role, grants, permission);
    }

    if let Some(ref permissions) = requirement.permissions {
        if !permissions.is_empty() {
            ok = if requirement.require_all {
                has_all_permissions(catalog, role, grants, permissions)
            } else {
                has_any_permission(catalog, role, grants, permissions)
            };
        }
    }

    if let Some(minimum) = requirement.minimum_role {
        if ok {
            ok = has_minimum_role(catalog, role, minimum);
        }
    }

    ok
}

#[cfg(test)]
mod tests {
    use once_cell::sync::Lazy;

    use super::*;

    static CATALOG: Lazy<AccessCatalog> = Lazy::new(AccessCatalog::builtin);

    #[test]
    fn test_has_permission() {
        // Role default set satisfies the check
        assert!(has_permission(
            &CATALOG,
            Some(Role::CustomerManager),
            &[],
            Permission::ManageNotices
        ));

        // Permission outside the role's default set is denied
        assert!(!has_permission(
            &CATALOG,
            Some(Role::CustomerManager),
            &[],
            Permission::ManageFinances
        ));

        // Wildcard in the role's default set satisfies every permission
        assert!(has_permission(
            &CATALOG,
            Some(Role::PlatformAdmin),
            &[],
            Permission::ManageFinances
        ));

        // Explicit grant authorizes without any role
        assert!(has_permission(
            &CATALOG,
            None,
            &[Permission::ManageUsers],
            Permission::ManageUsers
        ));

        // Wildcard grant authorizes without any role
        assert!(has_permission(
            &CATALOG,
            None,
            &[Permission::All],
            Permission::ManageSettings
        ));

        // No role, no matching grant: denied
        assert!(!has_permission(
            &CATALOG,
            None,
            &[Permission::ViewReports],
            Permission::ManageUsers
        ));

        // Explicit grant also extends an assigned role's defaults
        assert!(has_permission(
            &CATALOG,
            Some(Role::CustomerUser),
            &[Permission::ManageNotices],
            Permission::ManageNotices
        ));
    }

    #[test]
    fn test_wildcard_role_satisfies_everything() {
        // A role holding the wildcard passes every enumerated permission
        let all = [
            Permission::ManageUsers,
            Permission::ManageRoles,
            Permission::ManageProperties,
            Permission::ManageFinances,
            Permission::ManageComplaints,
            Permission::ManageNotices,
            Permission::ManageSettings,
            Permission::ViewAnalytics,
            Permission::ViewReports,
        ];
        for permission in all {
            assert!(
                has_permission(&CATALOG, Some(Role::PlatformAdmin), &[], permission),
                "platform_admin should hold {permission}"
            );
        }
    }

    #[test]
    fn test_has_minimum_role() {
        // Higher rank passes, lower rank fails
        assert!(has_minimum_role(
            &CATALOG,
            Some(Role::CustomerAdmin),
            Role::CustomerUser
        ));
        assert!(!has_minimum_role(
            &CATALOG,
            Some(Role::CustomerUser),
            Role::CustomerAdmin
        ));

        // Equal rank passes in both directions
        assert!(has_minimum_role(
            &CATALOG,
            Some(Role::CustomerManager),
            Role::CustomerManager
        ));

        // No role never passes
        assert!(!has_minimum_role(&CATALOG, None, Role::CustomerUser));

        // A role missing from the hierarchy map ranks at 0 and fails
        let stripped = AccessCatalog::new(
            Role::ALL
                .into_iter()
                .map(|r| (r, CATALOG.role_permissions(r).unwrap().clone()))
                .collect(),
            [(Role::PlatformAdmin, 100)].into_iter().collect(),
        );
        assert!(!has_minimum_role(
            &stripped,
            Some(Role::CustomerAdmin),
            Role::PlatformAdmin
        ));
        // ...while two unranked roles tie at 0 >= 0
        assert!(has_minimum_role(
            &stripped,
            Some(Role::CustomerUser),
            Role::CustomerManager
        ));
    }

    #[test]
    fn test_any_and_all() {
        let grants = [];
        let role = Some(Role::CustomerManager);

        // Any: one held permission suffices
        assert!(has_any_permission(
            &CATALOG,
            role,
            &grants,
            &[Permission::ManageFinances, Permission::ManageNotices]
        ));
        assert!(!has_any_permission(
            &CATALOG,
            role,
            &grants,
            &[Permission::ManageFinances, Permission::ManageSettings]
        ));

        // All: every permission must be held
        assert!(has_all_permissions(
            &CATALOG,
            role,
            &grants,
            &[Permission::ManageProperties, Permission::ViewReports]
        ));
        assert!(!has_all_permissions(
            &CATALOG,
            role,
            &grants,
            &[Permission::ManageProperties, Permission::ManageFinances]
        ));

        // Empty lists are vacuously true for both
        assert!(has_any_permission(&CATALOG, None, &[], &[]));
        assert!(has_all_permissions(&CATALOG, None, &[], &[]));
    }

    #[test]
    fn test_evaluate_access_defaults() {
        // No conditions set: open access, even for an anonymous subject
        let open = AccessRequirement::open();
        assert!(evaluate_access(&CATALOG, None, &[], &open));
        assert!(open.is_open());

        // A present but empty permission list is still open
        let empty_list = AccessRequirement::any_of(vec![]);
        assert!(evaluate_access(&CATALOG, None, &[], &empty_list));
        assert!(empty_list.is_open());
    }

    #[test]
    fn test_evaluate_access_single_fields() {
        // Single permission
        let req = AccessRequirement::permission(Permission::ManageFinances);
        assert!(evaluate_access(&CATALOG, Some(Role::CustomerAdmin), &[], &req));
        assert!(!evaluate_access(&CATALOG, Some(Role::CustomerUser), &[], &req));

        // Wildcard role passes any single permission
        assert!(evaluate_access(&CATALOG, Some(Role::PlatformAdmin), &[], &req));

        // Explicit grant passes without a role
        let req = AccessRequirement::permission(Permission::ManageUsers);
        assert!(evaluate_access(
            &CATALOG,
            None,
            &[Permission::ManageUsers],
            &req
        ));

        // Minimum role alone
        let req = AccessRequirement::minimum_role(Role::CustomerAdmin);
        assert!(!evaluate_access(&CATALOG, Some(Role::CustomerUser), &[], &req));
        assert!(evaluate_access(&CATALOG, Some(Role::PlatformSupport), &[], &req));
        assert!(!evaluate_access(&CATALOG, None, &[], &req));
    }

    #[test]
    fn test_list_requirement_supersedes_single() {
        // The subject fails the single permission but passes the list; the
        // list result wins
        let req = AccessRequirement {
            permission: Some(Permission::ManageFinances),
            permissions: Some(vec![Permission::ViewReports]),
            require_all: false,
            minimum_role: None,
        };
        assert!(evaluate_access(&CATALOG, Some(Role::CustomerUser), &[], &req));

        // The subject passes the single permission but fails the list; the
        // list result still wins
        let req = AccessRequirement {
            permission: Some(Permission::ViewReports),
            permissions: Some(vec![Permission::ManageFinances]),
            require_all: false,
            minimum_role: None,
        };
        assert!(!evaluate_access(&CATALOG, Some(Role::CustomerUser), &[], &req));
    }

    #[test]
    fn test_minimum_role_only_restricts() {
        // Permission passes but the role ranks too low: denied
        let req = AccessRequirement::permission(Permission::ViewReports)
            .with_minimum_role(Role::CustomerManager);
        assert!(!evaluate_access(&CATALOG, Some(Role::CustomerUser), &[], &req));
        assert!(evaluate_access(
            &CATALOG,
            Some(Role::CustomerManager),
            &[],
            &req
        ));

        // Permission fails: a high rank does not rescue the decision
        let req = AccessRequirement::permission(Permission::ManageFinances)
            .with_minimum_role(Role::CustomerUser);
        assert!(!evaluate_access(
            &CATALOG,
            Some(Role::CustomerManager),
            &[],
            &req
        ));
    }

    #[test]
    fn test_require_all_flag() {
        let req = AccessRequirement::all_of(vec![
            Permission::ManageProperties,
            Permission::ManageComplaints,
        ]);
        assert!(evaluate_access(
            &CATALOG,
            Some(Role::CustomerManager),
            &[],
            &req
        ));
        assert!(!evaluate_access(
            &CATALOG,
            Some(Role::PlatformSupport),
            &[],
            &req
        ));

        // Explicit grants can fill the gap for a require-all list
        assert!(evaluate_access(
            &CATALOG,
            Some(Role::PlatformSupport),
            &[Permission::ManageProperties],
            &req
        ));
    }

    #[test]
    fn test_requirement_parses_from_json() {
        // The shape the route table and config files use
        let req: AccessRequirement = serde_json::from_str(
            r#"{"permissions": ["manage_users", "view_analytics"], "require_all": true, "minimum_role": "customer_admin"}"#,
        )
        .unwrap();
        assert_eq!(
            req,
            AccessRequirement::all_of(vec![Permission::ManageUsers, Permission::ViewAnalytics])
                .with_minimum_role(Role::CustomerAdmin)
        );

        // Absent fields default to an open requirement
        let req: AccessRequirement = serde_json::from_str("{}").unwrap();
        assert!(req.is_open());
    }
}
