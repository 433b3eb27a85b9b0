use super::*;

use uuid::Uuid;

use curanet_application::UserDirectoryQuery;

pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(params): Query<UserDirectoryParams>,
) -> ApiResult<Json<Paginated<UserAccessResponse>>> {
    let is_active = match params.status.as_deref() {
        None => None,
        Some("active") => Some(true),
        Some("inactive") => Some(false),
        Some(other) => {
            return Err(AppError::Validation(format!(
                "unknown status filter '{other}'"
            ))
            .into());
        }
    };

    let query = UserDirectoryQuery {
        page: params.page.unwrap_or(1),
        per_page: params.per_page.unwrap_or(50),
        search: params.search.filter(|search| !search.trim().is_empty()),
        role_slug: params.role.map(RoleSlug::new).transpose()?,
        is_active,
    };

    let page = state.access_admin_service.list_users(&user, query).await?;

    Ok(Json(Paginated::from(page.map(UserAccessResponse::from))))
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<UserAccessResponse>> {
    let target = state
        .access_admin_service
        .get_user_access(&user, user_id)
        .await?;

    Ok(Json(UserAccessResponse::from(target)))
}

pub async fn revoke_access_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<RevokeAccessRequest>,
) -> ApiResult<Json<GenericMessageResponse>> {
    let reason = AuditReason::new(payload.reason)?;

    state
        .access_admin_service
        .revoke_access(&user, user_id, reason)
        .await?;

    Ok(Json(GenericMessageResponse {
        message: "User access revoked successfully".to_owned(),
    }))
}
