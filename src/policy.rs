//! Access policy: pure decision functions over the resolved caller identity.
//!
//! User management is role-gated. Projects and tasks intentionally carry no
//! policy beyond authentication; any signed-in caller may mutate them.

use uuid::Uuid;

use crate::jwt::AuthUser;
use crate::models::user::Role;

pub fn is_admin(identity: &AuthUser) -> bool {
    identity.role == Role::Admin
}

pub fn is_manager(identity: &AuthUser) -> bool {
    identity.role == Role::Manager
}

pub fn can_list_all_users(identity: &AuthUser) -> bool {
    is_admin(identity) || is_manager(identity)
}

pub fn can_view_user(identity: &AuthUser, target_id: Uuid) -> bool {
    can_list_all_users(identity) || identity.user_id == target_id
}

pub fn can_create_user(identity: &AuthUser) -> bool {
    is_admin(identity)
}

pub fn can_delete_user(identity: &AuthUser) -> bool {
    is_admin(identity)
}

/// Which fields of a user-update request the caller may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserUpdateScope {
    /// Admins update any user, role included.
    AllFields,
    /// Self-service update; a supplied `role` is stripped, never rejected.
    OwnProfile,
}

pub fn user_update_scope(identity: &AuthUser, target_id: Uuid) -> Option<UserUpdateScope> {
    if is_admin(identity) {
        Some(UserUpdateScope::AllFields)
    } else if identity.user_id == target_id {
        Some(UserUpdateScope::OwnProfile)
    } else {
        None
    }
}
