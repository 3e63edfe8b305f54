use std::collections::{HashMap, HashSet};

use super::{AccessCatalog, CatalogError, Permission, Role};

/// A staged copy of a catalog's role → permission map for the administrative
/// role editor.
///
/// Edits accumulate in the draft only; the source catalog is never touched.
/// The UI diffs the draft against the source to highlight pending changes and
/// calls [`CatalogDraft::build`] to produce a validated catalog for whatever
/// persistence step the application performs. Dropping the draft discards
/// everything.
#[derive(Debug, Clone)]
pub struct CatalogDraft {
    base: HashMap<Role, HashSet<Permission>>,
    edited: HashMap<Role, HashSet<Permission>>,
    hierarchy: HashMap<Role, u32>,
}

impl CatalogDraft {
    /// Starts a draft from a snapshot of the given catalog.
    pub fn new(catalog: &AccessCatalog) -> Self {
        let base: HashMap<Role, HashSet<Permission>> = catalog
            .iter_role_permissions()
            .map(|(role, set)| (role, set.clone()))
            .collect();
        let hierarchy = Role::ALL
            .into_iter()
            .map(|role| (role, catalog.hierarchy_level(role)))
            .collect();
        Self {
            edited: base.clone(),
            base,
            hierarchy,
        }
    }

    /// Adds a permission to a role's staged set. Returns true if the set
    /// changed.
    pub fn grant(&mut self, role: Role, permission: Permission) -> bool {
        self.edited.entry(role).or_default().insert(permission)
    }

    /// Removes a permission from a role's staged set. Returns true if the set
    /// changed.
    pub fn revoke(&mut self, role: Role, permission: Permission) -> bool {
        match self.edited.get_mut(&role) {
            Some(set) => set.remove(&permission),
            None => false,
        }
    }

    /// Replaces a role's staged set wholesale.
    pub fn set_permissions(&mut self, role: Role, permissions: HashSet<Permission>) {
        self.edited.insert(role, permissions);
    }

    /// The staged permission set for a role.
    pub fn permissions(&self, role: Role) -> Option<&HashSet<Permission>> {
        self.edited.get(&role)
    }

    /// Roles whose staged set differs from the source catalog.
    pub fn changed_roles(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.base.get(role) != self.edited.get(role))
            .collect()
    }

    /// Whether any staged edit is pending.
    pub fn is_dirty(&self) -> bool {
        !self.changed_roles().is_empty()
    }

    /// Throws away staged edits, resetting the draft to the source snapshot.
    pub fn reset(&mut self) {
        self.edited = self.base.clone();
    }

    /// Builds a validated catalog from the staged edits.
    ///
    /// The same invariants apply as to any catalog: an edit that empties a
    /// role's set is rejected here, before anything is persisted.
    pub fn build(&self) -> Result<AccessCatalog, CatalogError> {
        let catalog = AccessCatalog::new(self.edited.clone(), self.hierarchy.clone());
        catalog.validate()?;
        Ok(catalog)
    }
}
