use curanet_application::{AccessAdminService, AuthService, AuthorizationService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub access_admin_service: AccessAdminService,
    pub auth_service: AuthService,
    pub frontend_url: String,
    pub bootstrap_token: String,
}
