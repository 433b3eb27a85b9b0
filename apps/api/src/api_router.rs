use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, patch, post};
use curanet_core::AppError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

pub fn build_router(
    app_state: AppState,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let allowed_origin = app_state
        .frontend_url
        .parse::<HeaderValue>()
        .map_err(|error| {
            AppError::Validation(format!(
                "invalid FRONTEND_URL '{}': {error}",
                app_state.frontend_url
            ))
        })?;

    let cors_layer = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true);

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/api/access/roles",
            get(handlers::access::list_roles_handler).post(handlers::access::create_role_handler),
        )
        .route(
            "/api/access/roles/{role_id}",
            get(handlers::access::get_role_handler)
                .put(handlers::access::update_role_handler)
                .delete(handlers::access::delete_role_handler),
        )
        .route(
            "/api/access/roles/{role_id}/status",
            patch(handlers::access::toggle_role_status_handler),
        )
        .route(
            "/api/access/permissions",
            get(handlers::access::list_permissions_handler),
        )
        .route("/api/access/users", get(handlers::access::list_users_handler))
        .route(
            "/api/access/users/{user_id}",
            get(handlers::access::get_user_handler),
        )
        .route(
            "/api/access/users/{user_id}/roles",
            post(handlers::access::assign_role_handler)
                .put(handlers::access::sync_roles_handler),
        )
        .route(
            "/api/access/users/{user_id}/roles/{role_id}",
            delete(handlers::access::remove_role_handler),
        )
        .route(
            "/api/access/users/{user_id}/role",
            post(handlers::access::update_user_role_handler),
        )
        .route(
            "/api/access/users/{user_id}/revoke",
            post(handlers::access::revoke_access_handler),
        )
        .route(
            "/api/access/audit-log",
            get(handlers::access::list_audit_log_handler),
        )
        .route(
            "/api/access/audit-log/{entry_id}/review",
            post(handlers::access::review_audit_entry_handler),
        )
        .route(
            "/api/access/stats",
            get(handlers::access::system_stats_handler),
        )
        .route_layer(from_fn(middleware::require_auth));

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state);

    Ok(app)
}
