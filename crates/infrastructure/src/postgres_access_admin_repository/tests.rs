use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use curanet_application::{
    AccessAdminRepository, ActorRef, AuditContext, AuditLogQuery, AuditLogRepository,
    AuthorizationRepository, CreateRoleInput, UpdateRoleInput,
};
use curanet_core::{AppError, NonEmptyString};
use curanet_domain::{AuditEventType, AuditReason, Permission, RoleSlug};

use super::PostgresAccessAdminRepository;
use crate::{PostgresAuditLogRepository, PostgresAuthorizationRepository};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for access admin tests: {error}");
    }

    Some(pool)
}

async fn create_user(pool: &PgPool, label: &str) -> Uuid {
    let email = format!("{label}-{}@test.example", Uuid::new_v4().simple());
    let inserted = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO users (name, email, password_hash)
        VALUES ($1, $2, 'not-a-real-hash')
        RETURNING id
        "#,
    )
    .bind(label)
    .bind(email)
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(user_id) => user_id,
        Err(error) => panic!("failed to create test user: {error}"),
    }
}

fn unique_slug(prefix: &str) -> RoleSlug {
    let candidate = format!("{prefix}-{}", Uuid::new_v4().simple());
    RoleSlug::new(candidate).unwrap_or_else(|_| panic!("invalid test slug"))
}

fn role_name(value: &str) -> NonEmptyString {
    NonEmptyString::new(value).unwrap_or_else(|_| panic!("invalid test role name"))
}

fn audit_context(actor_id: Uuid) -> AuditContext {
    AuditContext {
        actor: ActorRef {
            user_id: actor_id,
            name: "Test Admin".to_owned(),
            email: Some("test-admin@test.example".to_owned()),
        },
        reason: Some(
            AuditReason::new("integration test change")
                .unwrap_or_else(|_| panic!("invalid test reason")),
        ),
    }
}

fn create_input(slug: RoleSlug, permissions: Vec<Permission>) -> CreateRoleInput {
    CreateRoleInput {
        name: role_name("Integration Role"),
        slug,
        description: Some("created by integration tests".to_owned()),
        hierarchy_level: 80,
        permissions,
    }
}

#[tokio::test]
async fn create_role_stores_permissions_with_set_semantics() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessAdminRepository::new(pool.clone());
    let actor_id = create_user(&pool, "actor").await;
    let slug = unique_slug("auditor");

    let created = repository
        .create_role(
            create_input(
                slug,
                vec![
                    Permission::ViewReports,
                    Permission::ViewReports,
                    Permission::ViewOrders,
                ],
            ),
            audit_context(actor_id),
        )
        .await;

    assert!(created.is_ok_and(|role| {
        role.permissions == vec![Permission::ViewOrders, Permission::ViewReports]
            && role.user_count == 0
    }));
}

#[tokio::test]
async fn deactivated_role_permissions_are_excluded_from_the_profile() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessAdminRepository::new(pool.clone());
    let authorization_repository = PostgresAuthorizationRepository::new(pool.clone());
    let actor_id = create_user(&pool, "actor").await;
    let member_id = create_user(&pool, "member").await;

    let created = repository
        .create_role(
            create_input(unique_slug("reports"), vec![Permission::ViewReports]),
            audit_context(actor_id),
        )
        .await;
    let role = match created {
        Ok(role) => role,
        Err(error) => panic!("failed to create role: {error}"),
    };

    let assigned = repository
        .assign_role(member_id, role.role_id, audit_context(actor_id))
        .await;
    assert!(assigned.is_ok());

    let profile_before = authorization_repository.load_access_profile(member_id).await;
    assert!(profile_before.is_ok_and(|profile| {
        profile.is_some_and(|profile| profile.permissions.contains(&Permission::ViewReports))
    }));

    let disabled = repository
        .set_role_status(role.role_id, false, audit_context(actor_id))
        .await;
    assert!(disabled.is_ok_and(|role| !role.is_active));

    // The assignment row survives; only the effective permissions change.
    let member = repository.find_user_access(member_id).await;
    assert!(member.is_ok_and(|member| {
        member.is_some_and(|member| member.holds_role(role.role_id))
    }));

    let profile_after = authorization_repository.load_access_profile(member_id).await;
    assert!(profile_after.is_ok_and(|profile| {
        profile.is_some_and(|profile| !profile.permissions.contains(&Permission::ViewReports))
    }));
}

#[tokio::test]
async fn audit_write_failure_rolls_back_the_mutation() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessAdminRepository::new(pool.clone());
    let actor_id = create_user(&pool, "actor").await;

    let created = repository
        .create_role(
            create_input(unique_slug("rollback"), vec![Permission::ViewReports]),
            audit_context(actor_id),
        )
        .await;
    let role = match created {
        Ok(role) => role,
        Err(error) => panic!("failed to create role: {error}"),
    };

    let install = sqlx::query(
        r#"
        CREATE OR REPLACE FUNCTION curanet_test_block_audit() RETURNS trigger
        LANGUAGE plpgsql AS
        $$ BEGIN RAISE EXCEPTION 'audit insert blocked by test'; END; $$
        "#,
    )
    .execute(&pool)
    .await;
    assert!(install.is_ok());

    let trigger_name = format!("t_block_audit_{}", Uuid::new_v4().simple());
    let create_trigger = sqlx::query(&format!(
        r#"
        CREATE TRIGGER {trigger_name}
        BEFORE INSERT ON rbac_audit_log
        FOR EACH ROW
        WHEN (NEW.entity_id = '{}')
        EXECUTE FUNCTION curanet_test_block_audit()
        "#,
        role.role_id
    ))
    .execute(&pool)
    .await;
    assert!(create_trigger.is_ok());

    let update = repository
        .update_role(
            role.role_id,
            UpdateRoleInput {
                name: role_name("Integration Role"),
                slug: role.slug.clone(),
                description: None,
                hierarchy_level: 80,
                permissions: vec![Permission::ViewOrders],
            },
            audit_context(actor_id),
        )
        .await;
    assert!(matches!(update, Err(AppError::Internal(_))));

    let drop_trigger = sqlx::query(&format!(
        "DROP TRIGGER IF EXISTS {trigger_name} ON rbac_audit_log"
    ))
    .execute(&pool)
    .await;
    assert!(drop_trigger.is_ok());

    // The blocked audit write aborted the whole transaction.
    let reloaded = repository.get_role(role.role_id).await;
    assert!(reloaded.is_ok_and(|reloaded| {
        reloaded.is_some_and(|reloaded| reloaded.permissions == vec![Permission::ViewReports])
    }));
}

#[tokio::test]
async fn deleting_a_held_role_conflicts_and_changes_nothing() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessAdminRepository::new(pool.clone());
    let actor_id = create_user(&pool, "actor").await;
    let member_id = create_user(&pool, "member").await;

    let created = repository
        .create_role(
            create_input(unique_slug("held"), vec![Permission::ViewReports]),
            audit_context(actor_id),
        )
        .await;
    let role = match created {
        Ok(role) => role,
        Err(error) => panic!("failed to create role: {error}"),
    };

    let assigned = repository
        .assign_role(member_id, role.role_id, audit_context(actor_id))
        .await;
    assert!(assigned.is_ok());

    let deleted = repository
        .delete_role(role.role_id, audit_context(actor_id))
        .await;
    assert!(matches!(deleted, Err(AppError::Conflict(_))));

    let reloaded = repository.get_role(role.role_id).await;
    assert!(reloaded.is_ok_and(|reloaded| {
        reloaded.is_some_and(|reloaded| reloaded.user_count == 1)
    }));
}

#[tokio::test]
async fn role_update_is_audited_with_the_permission_diff() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessAdminRepository::new(pool.clone());
    let audit_log_repository = PostgresAuditLogRepository::new(pool.clone());
    let actor_id = create_user(&pool, "actor").await;

    let created = repository
        .create_role(
            create_input(
                unique_slug("diff"),
                vec![Permission::ViewReports, Permission::ViewOrders],
            ),
            audit_context(actor_id),
        )
        .await;
    let role = match created {
        Ok(role) => role,
        Err(error) => panic!("failed to create role: {error}"),
    };

    let updated = repository
        .update_role(
            role.role_id,
            UpdateRoleInput {
                name: role_name("Integration Role"),
                slug: role.slug.clone(),
                description: None,
                hierarchy_level: 80,
                permissions: vec![Permission::ViewOrders, Permission::ViewProducts],
            },
            audit_context(actor_id),
        )
        .await;
    assert!(updated.is_ok_and(|outcome| {
        outcome.permissions_added == vec![Permission::ViewProducts]
            && outcome.permissions_removed == vec![Permission::ViewReports]
    }));

    let listed = audit_log_repository
        .list_entries(AuditLogQuery {
            page: 1,
            per_page: 10,
            event_type: Some(AuditEventType::RolePermissionsUpdated),
            risk_level: None,
            performed_by: Some(actor_id),
            created_after: None,
            created_before: None,
        })
        .await;
    let page = match listed {
        Ok(page) => page,
        Err(error) => panic!("failed to list audit entries: {error}"),
    };

    assert_eq!(page.data.len(), 1);
    let entry = &page.data[0];
    assert_eq!(entry.performed_by.user_id, actor_id);
    assert_eq!(
        entry.changes.get("permissions_added").cloned(),
        Some(serde_json::json!(["view-products"]))
    );
    assert_eq!(
        entry.changes.get("permissions_removed").cloned(),
        Some(serde_json::json!(["view-reports"]))
    );

    let reviewed = audit_log_repository
        .mark_reviewed(
            entry.entry_id,
            ActorRef {
                user_id: actor_id,
                name: "Test Admin".to_owned(),
                email: None,
            },
            Some("verified during integration run".to_owned()),
        )
        .await;
    assert!(reviewed.is_ok());

    let relisted = audit_log_repository
        .list_entries(AuditLogQuery {
            page: 1,
            per_page: 10,
            event_type: Some(AuditEventType::RolePermissionsUpdated),
            risk_level: None,
            performed_by: Some(actor_id),
            created_after: None,
            created_before: None,
        })
        .await;
    assert!(relisted.is_ok_and(|page| {
        page.data
            .first()
            .is_some_and(|entry| entry.reviewed_at.is_some())
    }));
}

#[tokio::test]
async fn revoking_access_deactivates_the_user_and_requires_review() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessAdminRepository::new(pool.clone());
    let audit_log_repository = PostgresAuditLogRepository::new(pool.clone());
    let actor_id = create_user(&pool, "actor").await;
    let target_id = create_user(&pool, "target").await;

    let revoked = repository
        .revoke_access(target_id, audit_context(actor_id))
        .await;
    assert!(revoked.is_ok());

    let target = repository.find_user_access(target_id).await;
    assert!(target.is_ok_and(|target| target.is_some_and(|target| !target.is_active)));

    let listed = audit_log_repository
        .list_entries(AuditLogQuery {
            page: 1,
            per_page: 10,
            event_type: Some(AuditEventType::UserAccessRevoked),
            risk_level: None,
            performed_by: Some(actor_id),
            created_after: None,
            created_before: None,
        })
        .await;
    assert!(listed.is_ok_and(|page| {
        page.data.first().is_some_and(|entry| {
            entry.requires_review
                && entry
                    .target_user
                    .as_ref()
                    .is_some_and(|target| target.user_id == target_id)
        })
    }));
}
