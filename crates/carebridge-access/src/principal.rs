//! Conversions between stored user rows and in-memory principals

use carebridge_auth::{Principal, Role};
use carebridge_db::entities::user::{self, GlobalRole};

/// Map a stored role onto the pure role table.
pub fn role_from_db(role: &GlobalRole) -> Role {
    match role {
        GlobalRole::Viewer => Role::Viewer,
        GlobalRole::Caregiver => Role::Caregiver,
        GlobalRole::Admin => Role::Admin,
        GlobalRole::SuperAdmin => Role::SuperAdmin,
    }
}

/// Map a role back to its storage representation.
pub fn role_to_db(role: Role) -> GlobalRole {
    match role {
        Role::Viewer => GlobalRole::Viewer,
        Role::Caregiver => GlobalRole::Caregiver,
        Role::Admin => GlobalRole::Admin,
        Role::SuperAdmin => GlobalRole::SuperAdmin,
    }
}

/// Build the explicit principal context for a stored user.
pub fn principal_for(user: &user::Model) -> Principal {
    Principal::new(user.id, user.email.clone(), role_from_db(&user.role))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_mapping_round_trips() {
        for role in [Role::Viewer, Role::Caregiver, Role::Admin, Role::SuperAdmin] {
            assert_eq!(role_from_db(&role_to_db(role)), role);
        }
    }
}
