//! Who may create, edit and delete what.
//!
//! Any authenticated identity may create a comment, so there is no
//! `can_create_comment`.

use crate::models::Role;

pub fn can_create_post(role: Role) -> bool {
    role == Role::Admin
}

pub fn can_edit_post(role: Role) -> bool {
    role == Role::Admin
}

pub fn can_delete_post(role: Role) -> bool {
    role == Role::Admin
}

/// Admins may delete any comment; everyone else only their own.
pub fn can_delete_comment(role: Role, requester_id: &str, author_id: &str) -> bool {
    role == Role::Admin || requester_id == author_id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_management_is_admin_only() {
        assert!(can_create_post(Role::Admin));
        assert!(can_edit_post(Role::Admin));
        assert!(can_delete_post(Role::Admin));
        assert!(!can_create_post(Role::Standard));
        assert!(!can_edit_post(Role::Standard));
        assert!(!can_delete_post(Role::Standard));
    }

    #[test]
    fn test_comment_deletion_decision_table() {
        assert!(!can_delete_comment(Role::Standard, "u1", "u2"));
        assert!(can_delete_comment(Role::Admin, "u1", "u2"));
        assert!(can_delete_comment(Role::Standard, "u1", "u1"));
        assert!(can_delete_comment(Role::Admin, "u1", "u1"));
    }
}
