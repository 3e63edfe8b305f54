use std::sync::Arc;

use log::debug;

use crate::authz::{self, AccessRequirement};
use crate::catalog::{AccessCatalog, Permission, Role};

/// Where the externally-owned session currently stands.
///
/// The session provider drives the transitions: sign-in moves through
/// `Loading` into `Authenticated`, sign-out returns to `Unauthenticated`.
/// Decision calls are well-defined in every state; outside `Authenticated`
/// the subject is treated as having no role and no grants, so answers lean
/// towards denial rather than throwing.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// No session. The subject has no role and no grants.
    #[default]
    Unauthenticated,

    /// The session provider is still resolving the profile. Consumers must
    /// treat denials in this state as "not yet known", not as final.
    Loading,

    /// A resolved session. The role may still be absent when the profile
    /// carries explicit grants only.
    Authenticated {
        role: Option<Role>,
        grants: Vec<Permission>,
    },
}

/// Binds the live session subject to the evaluator.
///
/// The context owns a catalog handle and the current [`SessionState`], and
/// answers the same questions as the [`authz`] functions without the caller
/// having to thread the subject around. The effective permission set is
/// computed when the subject changes and cached until it changes again, so
/// repeated queries between session updates are cheap lookups.
#[derive(Debug, Clone)]
pub struct AccessContext {
    catalog: Arc<AccessCatalog>,
    state: SessionState,
    effective: Vec<Permission>,
}

impl AccessContext {
    /// Creates a context with no session.
    pub fn new(catalog: Arc<AccessCatalog>) -> Self {
        Self {
            catalog,
            state: SessionState::Unauthenticated,
            effective: Vec::new(),
        }
    }

    /// Marks the session as resolving. Clears any previous subject.
    pub fn set_loading(&mut self) {
        self.state = SessionState::Loading;
        self.effective.clear();
    }

    /// Installs a resolved subject.
    ///
    /// Recomputes the cached effective permission set only when the
    /// (role, grants) pair actually changed; a refresh delivering the same
    /// profile is a no-op.
    pub fn authenticate(&mut self, role: Option<Role>, grants: Vec<Permission>) {
        if let SessionState::Authenticated {
            role: cur_role,
            grants: cur_grants,
        } = &self.state
        {
            if *cur_role == role && *cur_grants == grants {
                return;
            }
        }

        self.effective = effective_permissions(&self.catalog, role, &grants);
        self.state = SessionState::Authenticated { role, grants };
    }

    /// Drops the session, returning to the unauthenticated state.
    pub fn sign_out(&mut self) {
        self.state = SessionState::Unauthenticated;
        self.effective.clear();
    }

    /// Whether the session provider is still resolving. While this is true,
    /// a `false` answer from any decision call means "pending", not
    /// "denied".
    pub fn is_loading(&self) -> bool {
        self.state == SessionState::Loading
    }

    /// The current session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The current role, if a resolved session carries one.
    pub fn role(&self) -> Option<Role> {
        match &self.state {
            SessionState::Authenticated { role, .. } => *role,
            _ => None,
        }
    }

    /// Whether the subject holds a permission.
    pub fn can(&self, permission: Permission) -> bool {
        self.effective.contains(&Permission::All) || self.effective.contains(&permission)
    }

    /// Whether the subject holds at least one of the listed permissions.
    /// Empty list passes, matching [`authz::has_any_permission`].
    pub fn can_any(&self, permissions: &[Permission]) -> bool {
        let (role, grants) = self.subject();
        authz::has_any_permission(&self.catalog, role, grants, permissions)
    }

    /// Whether the subject holds every listed permission.
    pub fn can_all(&self, permissions: &[Permission]) -> bool {
        let (role, grants) = self.subject();
        authz::has_all_permissions(&self.catalog, role, grants, permissions)
    }

    /// Whether the subject's role ranks at or above the minimum.
    pub fn has_minimum_role(&self, minimum: Role) -> bool {
        let (role, _) = self.subject();
        authz::has_minimum_role(&self.catalog, role, minimum)
    }

    /// Evaluates a full requirement for the subject.
    pub fn can_access(&self, requirement: &AccessRequirement) -> bool {
        let (role, grants) = self.subject();
        let ok = authz::evaluate_access(&self.catalog, role, grants, requirement);
        if !ok {
            debug!(
                "Access denied: role={} requirement={requirement:?}",
                role.map(|r| r.as_str()).unwrap_or("<none>")
            );
        }
        ok
    }

    /// The cached effective permission set: exactly `[*]` when the subject
    /// holds the wildcard from either source, otherwise the de-duplicated
    /// union of the role's defaults and the explicit grants, in wire-name
    /// order.
    pub fn effective_permissions(&self) -> &[Permission] {
        &self.effective
    }

    fn subject(&self) -> (Option<Role>, &[Permission]) {
        match &self.state {
            SessionState::Authenticated { role, grants } => (*role, grants),
            _ => (None, &[]),
        }
    }
}

/// Computes the effective permission set for a subject.
///
/// The wildcard collapses the whole set: if either the role's default set or
/// the explicit grants contain it, the result is exactly `[All]`.
pub fn effective_permissions(
    catalog: &AccessCatalog,
    role: Option<Role>,
    grants: &[Permission],
) -> Vec<Permission> {
    let defaults = role.and_then(|role| catalog.role_permissions(role));

    let wildcard = grants.contains(&Permission::All)
        || defaults.is_some_and(|set| set.contains(&Permission::All));
    if wildcard {
        return vec![Permission::All];
    }

    let mut effective: Vec<Permission> = Vec::new();
    if let Some(defaults) = defaults {
        effective.extend(defaults.iter().copied());
    }
    for grant in grants {
        if !effective.contains(grant) {
            effective.push(*grant);
        }
    }
    effective.sort_by_key(|permission| permission.as_str());
    effective
}
