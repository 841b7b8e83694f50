//! Fine-grained Permissions

use std::collections::HashSet;

use letters_core::UserRole;
use serde::{Deserialize, Serialize};

/// Permission enum for fine-grained access control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    // Letters
    LettersRead,
    LettersWrite,
    LettersDelete,
    BulkUpdate,
    /// See a letter's portal token; the applicant's own credential, so
    /// applicant-role keys never hold it
    PortalTokenRead,

    // Comments & attachments
    CommentsRead,
    CommentsWrite,
    AttachmentsRead,
    AttachmentsWrite,

    // Users
    UsersRead,
    UsersWrite,

    // Notifications
    NotificationsRead,
    NotificationsSnooze,

    // Admin
    Admin,
}

impl Permission {
    /// Get all permissions for a role
    pub fn for_role(role: UserRole) -> HashSet<Permission> {
        match role {
            UserRole::Admin => Self::all(),
            UserRole::Staff => Self::staff(),
            UserRole::Applicant => Self::applicant(),
        }
    }

    pub fn all() -> HashSet<Permission> {
        use Permission::*;
        [
            LettersRead, LettersWrite, LettersDelete, BulkUpdate, PortalTokenRead,
            CommentsRead, CommentsWrite,
            AttachmentsRead, AttachmentsWrite,
            UsersRead, UsersWrite,
            NotificationsRead, NotificationsSnooze,
            Admin,
        ]
        .into_iter()
        .collect()
    }

    fn staff() -> HashSet<Permission> {
        use Permission::*;
        [
            LettersRead, LettersWrite, BulkUpdate, PortalTokenRead,
            CommentsRead, CommentsWrite,
            AttachmentsRead, AttachmentsWrite,
            UsersRead,
            NotificationsRead, NotificationsSnooze,
        ]
        .into_iter()
        .collect()
    }

    fn applicant() -> HashSet<Permission> {
        use Permission::*;
        [LettersRead, CommentsRead, AttachmentsRead].into_iter().collect()
    }
}

/// Check if a set of permissions allows an action
pub fn has_permission(permissions: &HashSet<Permission>, required: Permission) -> bool {
    permissions.contains(&Permission::Admin) || permissions.contains(&required)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_implies_everything() {
        let admin = Permission::for_role(UserRole::Admin);
        assert!(has_permission(&admin, Permission::LettersDelete));
        assert!(has_permission(&admin, Permission::UsersWrite));
    }

    #[test]
    fn test_staff_cannot_delete_or_manage_users() {
        let staff = Permission::for_role(UserRole::Staff);
        assert!(has_permission(&staff, Permission::BulkUpdate));
        assert!(!has_permission(&staff, Permission::LettersDelete));
        assert!(!has_permission(&staff, Permission::UsersWrite));
    }

    #[test]
    fn test_applicant_is_read_only() {
        let applicant = Permission::for_role(UserRole::Applicant);
        assert!(has_permission(&applicant, Permission::LettersRead));
        assert!(!has_permission(&applicant, Permission::LettersWrite));
        assert!(!has_permission(&applicant, Permission::NotificationsSnooze));
    }

    #[test]
    fn test_applicant_cannot_see_portal_tokens() {
        let applicant = Permission::for_role(UserRole::Applicant);
        assert!(!has_permission(&applicant, Permission::PortalTokenRead));
        assert!(has_permission(&Permission::for_role(UserRole::Staff), Permission::PortalTokenRead));
    }
}
