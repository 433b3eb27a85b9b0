use curanet_application::AccessProfile;
use curanet_core::UserIdentity;
use curanet_domain::Permission;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Incoming payload for password login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Incoming payload for first-account bootstrap.
#[derive(Debug, Deserialize)]
pub struct BootstrapRequest {
    pub token: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

/// API representation of the authenticated user.
#[derive(Debug, Serialize)]
pub struct UserIdentityResponse {
    pub user_id: Uuid,
    pub display_name: String,
    pub email: Option<String>,
    pub is_super_admin: bool,
    /// Effective permission slugs resolved for this user.
    pub permissions: Vec<&'static str>,
}

impl UserIdentityResponse {
    pub fn from_identity_with_profile(identity: &UserIdentity, profile: AccessProfile) -> Self {
        Self {
            user_id: identity.user_id(),
            display_name: identity.display_name().to_owned(),
            email: identity.email().map(str::to_owned),
            is_super_admin: profile.is_super_admin,
            permissions: profile
                .permissions
                .iter()
                .map(Permission::as_str)
                .collect(),
        }
    }
}
