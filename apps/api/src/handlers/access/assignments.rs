use super::*;

use uuid::Uuid;

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<AssignRoleRequest>,
) -> ApiResult<Json<UserAccessResponse>> {
    let reason = AuditReason::new(payload.reason)?;

    let target = state
        .access_admin_service
        .assign_role(&user, user_id, payload.role_id, reason)
        .await?;

    Ok(Json(UserAccessResponse::from(target)))
}

pub async fn remove_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((user_id, role_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<RemoveRoleRequest>,
) -> ApiResult<Json<UserAccessResponse>> {
    let reason = AuditReason::new(payload.reason)?;

    let target = state
        .access_admin_service
        .remove_role(&user, user_id, role_id, reason)
        .await?;

    Ok(Json(UserAccessResponse::from(target)))
}

pub async fn sync_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<SyncRolesRequest>,
) -> ApiResult<Json<UserAccessResponse>> {
    let reason = AuditReason::new(payload.reason)?;

    let target = state
        .access_admin_service
        .sync_roles(&user, user_id, payload.role_ids, reason)
        .await?;

    Ok(Json(UserAccessResponse::from(target)))
}

pub async fn update_user_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRoleRequest>,
) -> ApiResult<Json<UserAccessResponse>> {
    let reason = AuditReason::new(payload.reason)?;

    let target = state
        .access_admin_service
        .update_user_role(&user, user_id, payload.role_id, reason)
        .await?;

    Ok(Json(UserAccessResponse::from(target)))
}
