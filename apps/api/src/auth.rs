use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use curanet_application::AuthOutcome;
use curanet_core::{AppError, UserIdentity};
use tower_sessions::Session;

use crate::dto::{BootstrapRequest, LoginRequest, UserIdentityResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub const SESSION_USER_KEY: &str = "user_identity";

/// POST /auth/bootstrap - Create the first super-admin account.
pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<(StatusCode, Json<UserIdentityResponse>)> {
    if payload.token != state.bootstrap_token {
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let user_id = state
        .auth_service
        .bootstrap_super_admin(&payload.name, &payload.email, &payload.password)
        .await?;

    let identity = UserIdentity::new(user_id, payload.name.trim(), Some(payload.email.clone()));
    establish_session(&session, &identity).await?;

    let profile = state.authorization_service.access_profile(user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserIdentityResponse::from_identity_with_profile(
            &identity, profile,
        )),
    ))
}

/// POST /auth/login - Authenticate with email+password.
pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let outcome = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    let user = match outcome {
        AuthOutcome::Authenticated(user) => user,
        AuthOutcome::Failed => {
            // Generic message; never reveals whether the account exists.
            return Err(AppError::Unauthorized("invalid email or password".to_owned()).into());
        }
    };

    let identity = UserIdentity::new(user.user_id, user.name, Some(user.email));
    establish_session(&session, &identity).await?;

    let profile = state
        .authorization_service
        .access_profile(user.user_id)
        .await?;

    Ok(Json(UserIdentityResponse::from_identity_with_profile(
        &identity, profile,
    )))
}

/// POST /auth/logout - End the current session.
pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me - The authenticated user with effective permissions.
pub async fn me_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let profile = state
        .authorization_service
        .access_profile(identity.user_id())
        .await?;

    Ok(Json(UserIdentityResponse::from_identity_with_profile(
        &identity, profile,
    )))
}

async fn establish_session(session: &Session, identity: &UserIdentity) -> ApiResult<()> {
    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    Ok(())
}
