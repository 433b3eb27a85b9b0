use super::*;

use std::str::FromStr;

use curanet_application::AuditLogQuery;
use curanet_domain::{AuditEventType, RiskLevel};

pub async fn list_audit_log_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(params): Query<AuditLogParams>,
) -> ApiResult<Json<AuditLogResponse>> {
    let event_type = params
        .event_type
        .as_deref()
        .filter(|value| !value.is_empty())
        .map(AuditEventType::from_str)
        .transpose()?;
    let risk_level = params
        .risk_level
        .as_deref()
        .filter(|value| !value.is_empty())
        .map(RiskLevel::from_str)
        .transpose()?;

    let view = state
        .access_admin_service
        .list_audit_log(
            &user,
            AuditLogQuery {
                page: params.page.unwrap_or(1),
                per_page: params.per_page.unwrap_or(20),
                event_type,
                risk_level,
                performed_by: params.user_id,
                created_after: params.start_date,
                created_before: params.end_date,
            },
        )
        .await?;

    Ok(Json(AuditLogResponse {
        audit_logs: Paginated::from(view.entries.map(Into::into)),
        summary: AuditSummaryResponse::from(view.summary),
    }))
}

pub async fn review_audit_entry_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(entry_id): Path<i64>,
    Json(payload): Json<ReviewAuditEntryRequest>,
) -> ApiResult<Json<GenericMessageResponse>> {
    state
        .access_admin_service
        .mark_reviewed(&user, entry_id, payload.review_notes)
        .await?;

    Ok(Json(GenericMessageResponse {
        message: "Audit log marked as reviewed".to_owned(),
    }))
}

pub async fn system_stats_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<SystemStatsResponse>> {
    let stats = state.access_admin_service.system_stats(&user).await?;

    Ok(Json(SystemStatsResponse::from(stats)))
}
