use super::*;

use uuid::Uuid;

use curanet_application::{CreateRoleInput, UpdateRoleInput};

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .access_admin_service
        .list_roles(&user)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn get_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state.access_admin_service.get_role(&user, role_id).await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let input = CreateRoleInput {
        name: NonEmptyString::new(payload.name)?,
        slug: RoleSlug::new(payload.slug)?,
        description: payload.description,
        hierarchy_level: payload.hierarchy_level.unwrap_or(DEFAULT_HIERARCHY_LEVEL),
        permissions: parse_permissions(&payload.permissions)?,
    };

    let role = state.access_admin_service.create_role(&user, input).await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleUpdateResponse>> {
    let reason = AuditReason::new(payload.reason)?;
    let input = UpdateRoleInput {
        name: NonEmptyString::new(payload.name)?,
        slug: RoleSlug::new(payload.slug)?,
        description: payload.description,
        hierarchy_level: payload.hierarchy_level.unwrap_or(DEFAULT_HIERARCHY_LEVEL),
        permissions: parse_permissions(&payload.permissions)?,
    };

    let outcome = state
        .access_admin_service
        .update_role(&user, role_id, input, reason)
        .await?;

    Ok(Json(RoleUpdateResponse::from(outcome)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .access_admin_service
        .delete_role(&user, role_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_role_status_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<ToggleRoleStatusRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let reason = payload.reason.map(AuditReason::new).transpose()?;

    let role = state
        .access_admin_service
        .toggle_role_status(&user, role_id, reason)
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn list_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<PermissionCatalogEntryResponse>>> {
    let catalog = state
        .access_admin_service
        .permission_catalog(&user)
        .await?
        .into_iter()
        .map(PermissionCatalogEntryResponse::from)
        .collect();

    Ok(Json(catalog))
}
