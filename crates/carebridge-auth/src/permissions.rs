//! Role → capability projection
//!
//! `PermissionSet::resolve` is a pure function with no failure mode. Callers
//! holding an unvalidated role string go through `Role::parse_lossy` first,
//! so malformed input resolves to the viewer capability set instead of
//! erroring.

use crate::role::Role;
use serde::{Deserialize, Serialize};

/// Named capability keys, used where a caller checks a single permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewRecords,
    EditRecords,
    ViewExpenses,
    ManageTeam,
    EditSettings,
    ViewAuditLogs,
    ManageUsers,
}

/// Derived, read-only capability set for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    /// True for every authenticated principal
    pub can_view_records: bool,
    pub can_edit_records: bool,
    pub can_view_expenses: bool,
    pub can_manage_team: bool,
    pub can_edit_settings: bool,
    pub can_view_audit_logs: bool,
    pub can_manage_users: bool,
}

impl PermissionSet {
    /// Project a role onto its capability set.
    pub fn resolve(role: Role) -> Self {
        Self {
            can_view_records: true,
            can_edit_records: role.has_minimum(Role::Caregiver),
            can_view_expenses: role.has_minimum(Role::Caregiver),
            can_manage_team: role.has_minimum(Role::Admin),
            can_edit_settings: role.has_minimum(Role::Admin),
            can_view_audit_logs: role.has_minimum(Role::Admin),
            can_manage_users: role.has_minimum(Role::SuperAdmin),
        }
    }

    /// Check a single capability by key.
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::ViewRecords => self.can_view_records,
            Capability::EditRecords => self.can_edit_records,
            Capability::ViewExpenses => self.can_view_expenses,
            Capability::ManageTeam => self.can_manage_team,
            Capability::EditSettings => self.can_edit_settings,
            Capability::ViewAuditLogs => self.can_view_audit_logs,
            Capability::ManageUsers => self.can_manage_users,
        }
    }
}
