use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use curanet_core::{AppError, AppResult, NonEmptyString, UserIdentity};
use curanet_domain::{AuditEventType, AuditReason, Permission, RoleSlug};

use crate::access_admin_ports::{
    AccessAdminRepository, ActorRef, AuditContext, AuditEntryRecord, AuditLogQuery,
    AuditLogRepository, AuditSummary, CreateRoleInput, DirectoryStats, Page, PermissionUsage,
    RoleRecord, RoleRef, RoleUpdateOutcome, UpdateRoleInput, UserAccessRecord, UserDirectoryQuery,
};
use crate::authorization_service::{AccessProfile, AuthorizationRepository, AuthorizationService};

use super::AccessAdminService;

struct FakeAuthorizationRepository {
    profiles: HashMap<Uuid, AccessProfile>,
}

#[async_trait]
impl AuthorizationRepository for FakeAuthorizationRepository {
    async fn load_access_profile(&self, user_id: Uuid) -> AppResult<Option<AccessProfile>> {
        Ok(self.profiles.get(&user_id).cloned())
    }
}

#[derive(Default)]
struct FakeAccessAdminRepository {
    roles: Mutex<Vec<RoleRecord>>,
    users: Mutex<Vec<UserAccessRecord>>,
    recorded_audits: Mutex<Vec<(String, AuditContext)>>,
}

impl FakeAccessAdminRepository {
    async fn record(&self, event: &str, audit: AuditContext) {
        self.recorded_audits
            .lock()
            .await
            .push((event.to_owned(), audit));
    }

    async fn user(&self, user_id: Uuid) -> AppResult<UserAccessRecord> {
        self.users
            .lock()
            .await
            .iter()
            .find(|user| user.user_id == user_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("user vanished mid-test".to_owned()))
    }
}

#[async_trait]
impl AccessAdminRepository for FakeAccessAdminRepository {
    async fn list_roles(&self) -> AppResult<Vec<RoleRecord>> {
        Ok(self.roles.lock().await.clone())
    }

    async fn get_role(&self, role_id: Uuid) -> AppResult<Option<RoleRecord>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.role_id == role_id)
            .cloned())
    }

    async fn permission_usage(&self) -> AppResult<Vec<PermissionUsage>> {
        Ok(Vec::new())
    }

    async fn create_role(
        &self,
        input: CreateRoleInput,
        audit: AuditContext,
    ) -> AppResult<RoleRecord> {
        let role = RoleRecord {
            role_id: Uuid::new_v4(),
            name: input.name.as_str().to_owned(),
            slug: input.slug,
            description: input.description,
            hierarchy_level: input.hierarchy_level,
            is_active: true,
            permissions: input.permissions,
            user_count: 0,
        };
        self.roles.lock().await.push(role.clone());
        self.record("role_created", audit).await;
        Ok(role)
    }

    async fn update_role(
        &self,
        role_id: Uuid,
        input: UpdateRoleInput,
        audit: AuditContext,
    ) -> AppResult<RoleUpdateOutcome> {
        let mut roles = self.roles.lock().await;
        let role = roles
            .iter_mut()
            .find(|role| role.role_id == role_id)
            .ok_or_else(|| AppError::NotFound("role vanished mid-test".to_owned()))?;

        let permissions_added: Vec<Permission> = input
            .permissions
            .iter()
            .filter(|permission| !role.permissions.contains(permission))
            .copied()
            .collect();
        let permissions_removed: Vec<Permission> = role
            .permissions
            .iter()
            .filter(|permission| !input.permissions.contains(permission))
            .copied()
            .collect();

        role.name = input.name.as_str().to_owned();
        role.slug = input.slug;
        role.description = input.description;
        role.hierarchy_level = input.hierarchy_level;
        role.permissions = input.permissions;
        let updated = role.clone();
        drop(roles);

        self.record("role_permissions_updated", audit).await;
        Ok(RoleUpdateOutcome {
            role: updated,
            permissions_added,
            permissions_removed,
        })
    }

    async fn delete_role(&self, role_id: Uuid, audit: AuditContext) -> AppResult<()> {
        self.roles.lock().await.retain(|role| role.role_id != role_id);
        self.record("role_deleted", audit).await;
        Ok(())
    }

    async fn set_role_status(
        &self,
        role_id: Uuid,
        is_active: bool,
        audit: AuditContext,
    ) -> AppResult<RoleRecord> {
        let mut roles = self.roles.lock().await;
        let role = roles
            .iter_mut()
            .find(|role| role.role_id == role_id)
            .ok_or_else(|| AppError::NotFound("role vanished mid-test".to_owned()))?;
        role.is_active = is_active;
        let updated = role.clone();
        drop(roles);

        let event = if is_active { "role_enabled" } else { "role_disabled" };
        self.record(event, audit).await;
        Ok(updated)
    }

    async fn find_user_access(&self, user_id: Uuid) -> AppResult<Option<UserAccessRecord>> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|user| user.user_id == user_id)
            .cloned())
    }

    async fn list_users(&self, _query: UserDirectoryQuery) -> AppResult<Page<UserAccessRecord>> {
        let users = self.users.lock().await.clone();
        let total = users.len() as i64;
        Ok(Page {
            data: users,
            current_page: 1,
            last_page: 1,
            per_page: 50,
            total,
        })
    }

    async fn assign_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        audit: AuditContext,
    ) -> AppResult<UserAccessRecord> {
        let role = self
            .get_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound("role vanished mid-test".to_owned()))?;

        {
            let mut users = self.users.lock().await;
            let user = users
                .iter_mut()
                .find(|user| user.user_id == user_id)
                .ok_or_else(|| AppError::NotFound("user vanished mid-test".to_owned()))?;
            user.roles.push(RoleRef {
                role_id,
                name: role.name,
                slug: role.slug,
                hierarchy_level: role.hierarchy_level,
            });
        }

        self.record("user_role_assigned", audit).await;
        self.user(user_id).await
    }

    async fn remove_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        audit: AuditContext,
    ) -> AppResult<UserAccessRecord> {
        {
            let mut users = self.users.lock().await;
            let user = users
                .iter_mut()
                .find(|user| user.user_id == user_id)
                .ok_or_else(|| AppError::NotFound("user vanished mid-test".to_owned()))?;
            user.roles.retain(|role| role.role_id != role_id);
        }

        self.record("user_role_removed", audit).await;
        self.user(user_id).await
    }

    async fn replace_roles(
        &self,
        user_id: Uuid,
        role_ids: &[Uuid],
        event_type: AuditEventType,
        audit: AuditContext,
    ) -> AppResult<UserAccessRecord> {
        let roles = self.roles.lock().await.clone();
        {
            let mut users = self.users.lock().await;
            let user = users
                .iter_mut()
                .find(|user| user.user_id == user_id)
                .ok_or_else(|| AppError::NotFound("user vanished mid-test".to_owned()))?;
            user.roles = roles
                .iter()
                .filter(|role| role_ids.contains(&role.role_id))
                .map(|role| RoleRef {
                    role_id: role.role_id,
                    name: role.name.clone(),
                    slug: role.slug.clone(),
                    hierarchy_level: role.hierarchy_level,
                })
                .collect();
        }

        self.record(event_type.as_str(), audit).await;
        self.user(user_id).await
    }

    async fn revoke_access(&self, user_id: Uuid, audit: AuditContext) -> AppResult<()> {
        {
            let mut users = self.users.lock().await;
            let user = users
                .iter_mut()
                .find(|user| user.user_id == user_id)
                .ok_or_else(|| AppError::NotFound("user vanished mid-test".to_owned()))?;
            user.is_active = false;
        }

        self.record("user_access_revoked", audit).await;
        Ok(())
    }

    async fn directory_stats(&self) -> AppResult<DirectoryStats> {
        Ok(DirectoryStats::default())
    }
}

#[derive(Default)]
struct FakeAuditLogRepository {
    reviewed: Mutex<Vec<(i64, ActorRef, Option<String>)>>,
}

#[async_trait]
impl AuditLogRepository for FakeAuditLogRepository {
    async fn list_entries(&self, query: AuditLogQuery) -> AppResult<Page<AuditEntryRecord>> {
        Ok(Page {
            data: Vec::new(),
            current_page: query.page.max(1),
            last_page: 1,
            per_page: query.per_page.max(1),
            total: 0,
        })
    }

    async fn summary(&self, _recent_days: i64) -> AppResult<AuditSummary> {
        Ok(AuditSummary::default())
    }

    async fn mark_reviewed(
        &self,
        entry_id: i64,
        reviewer: ActorRef,
        notes: Option<String>,
    ) -> AppResult<()> {
        self.reviewed.lock().await.push((entry_id, reviewer, notes));
        Ok(())
    }
}

struct Harness {
    service: AccessAdminService,
    admin_repository: Arc<FakeAccessAdminRepository>,
    audit_log_repository: Arc<FakeAuditLogRepository>,
}

fn slug(value: &str) -> RoleSlug {
    RoleSlug::new(value).unwrap_or_else(|_| panic!("invalid test slug '{value}'"))
}

fn name(value: &str) -> NonEmptyString {
    NonEmptyString::new(value).unwrap_or_else(|_| panic!("invalid test name '{value}'"))
}

fn reason() -> AuditReason {
    AuditReason::new("quarterly access review").unwrap_or_else(|_| panic!("invalid test reason"))
}

fn actor(user_id: Uuid) -> UserIdentity {
    UserIdentity::new(user_id, "Casey Admin", Some("casey@curanet.example".to_owned()))
}

fn role(slug_value: &str, user_count: i64) -> RoleRecord {
    RoleRecord {
        role_id: Uuid::new_v4(),
        name: slug_value.to_owned(),
        slug: slug(slug_value),
        description: None,
        hierarchy_level: 50,
        is_active: true,
        permissions: vec![Permission::ViewReports],
        user_count,
    }
}

fn user(roles: Vec<&RoleRecord>) -> UserAccessRecord {
    UserAccessRecord {
        user_id: Uuid::new_v4(),
        name: "Jordan Provider".to_owned(),
        email: "jordan@clinic.example".to_owned(),
        is_active: true,
        roles: roles
            .into_iter()
            .map(|role| RoleRef {
                role_id: role.role_id,
                name: role.name.clone(),
                slug: role.slug.clone(),
                hierarchy_level: role.hierarchy_level,
            })
            .collect(),
        last_login_at: None,
        created_at: chrono::Utc::now(),
    }
}

fn harness(
    profiles: Vec<(Uuid, AccessProfile)>,
    roles: Vec<RoleRecord>,
    users: Vec<UserAccessRecord>,
) -> Harness {
    let authorization_service = AuthorizationService::new(Arc::new(FakeAuthorizationRepository {
        profiles: profiles.into_iter().collect(),
    }));
    let admin_repository = Arc::new(FakeAccessAdminRepository {
        roles: Mutex::new(roles),
        users: Mutex::new(users),
        recorded_audits: Mutex::new(Vec::new()),
    });
    let audit_log_repository = Arc::new(FakeAuditLogRepository::default());
    let service = AccessAdminService::new(
        authorization_service,
        admin_repository.clone(),
        audit_log_repository.clone(),
    );

    Harness {
        service,
        admin_repository,
        audit_log_repository,
    }
}

fn rbac_manager_profile() -> AccessProfile {
    AccessProfile {
        is_active: true,
        is_super_admin: false,
        permissions: vec![
            Permission::ManageRbac,
            Permission::AssignRoles,
            Permission::EditUsers,
            Permission::DeleteUsers,
        ],
    }
}

fn super_admin_profile() -> AccessProfile {
    AccessProfile {
        is_active: true,
        is_super_admin: true,
        permissions: Vec::new(),
    }
}

fn create_input(slug_value: &str) -> CreateRoleInput {
    CreateRoleInput {
        name: name("Auditor"),
        slug: slug(slug_value),
        description: None,
        hierarchy_level: 60,
        permissions: vec![Permission::ViewReports],
    }
}

#[tokio::test]
async fn create_role_requires_a_management_permission() {
    let actor_id = Uuid::new_v4();
    let harness = harness(
        vec![(
            actor_id,
            AccessProfile {
                is_active: true,
                is_super_admin: false,
                permissions: vec![Permission::ViewUsers],
            },
        )],
        Vec::new(),
        Vec::new(),
    );

    let result = harness
        .service
        .create_role(&actor(actor_id), create_input("auditor"))
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn create_role_accepts_the_create_roles_alternative() {
    let actor_id = Uuid::new_v4();
    let harness = harness(
        vec![(
            actor_id,
            AccessProfile {
                is_active: true,
                is_super_admin: false,
                permissions: vec![Permission::CreateRoles],
            },
        )],
        Vec::new(),
        Vec::new(),
    );

    let result = harness
        .service
        .create_role(&actor(actor_id), create_input("auditor"))
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn create_role_rejects_reserved_slugs() {
    let actor_id = Uuid::new_v4();
    let harness = harness(
        vec![(actor_id, rbac_manager_profile())],
        Vec::new(),
        Vec::new(),
    );

    let result = harness
        .service
        .create_role(&actor(actor_id), create_input("super-admin"))
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(harness.admin_repository.roles.lock().await.is_empty());
}

#[tokio::test]
async fn super_admin_role_cannot_be_updated() {
    let actor_id = Uuid::new_v4();
    let protected = role("super-admin", 1);
    let role_id = protected.role_id;
    let harness = harness(
        vec![(actor_id, rbac_manager_profile())],
        vec![protected],
        Vec::new(),
    );

    let input = UpdateRoleInput {
        name: name("Renamed"),
        slug: slug("renamed"),
        description: None,
        hierarchy_level: 0,
        permissions: Vec::new(),
    };
    let result = harness
        .service
        .update_role(&actor(actor_id), role_id, input, reason())
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert!(harness.admin_repository.recorded_audits.lock().await.is_empty());
}

#[tokio::test]
async fn system_roles_cannot_be_toggled() {
    let actor_id = Uuid::new_v4();
    let admin_role = role("admin", 3);
    let role_id = admin_role.role_id;
    let harness = harness(
        vec![(actor_id, rbac_manager_profile())],
        vec![admin_role],
        Vec::new(),
    );

    let result = harness
        .service
        .toggle_role_status(&actor(actor_id), role_id, None)
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn super_admin_role_cannot_be_deleted() {
    let actor_id = Uuid::new_v4();
    let protected = role("super-admin", 0);
    let role_id = protected.role_id;
    let harness = harness(
        vec![(actor_id, rbac_manager_profile())],
        vec![protected],
        Vec::new(),
    );

    let result = harness.service.delete_role(&actor(actor_id), role_id).await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn delete_role_conflicts_while_users_hold_it() {
    let actor_id = Uuid::new_v4();
    let held = role("provider", 2);
    let role_id = held.role_id;
    let harness = harness(
        vec![(actor_id, rbac_manager_profile())],
        vec![held],
        Vec::new(),
    );

    let result = harness.service.delete_role(&actor(actor_id), role_id).await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert_eq!(harness.admin_repository.roles.lock().await.len(), 1);
}

#[tokio::test]
async fn assigning_super_admin_requires_super_admin() {
    let actor_id = Uuid::new_v4();
    let super_role = role("super-admin", 1);
    let target = user(Vec::new());
    let target_id = target.user_id;
    let role_id = super_role.role_id;
    let harness = harness(
        vec![(actor_id, rbac_manager_profile())],
        vec![super_role],
        vec![target],
    );

    let result = harness
        .service
        .assign_role(&actor(actor_id), target_id, role_id, reason())
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn super_admin_may_assign_super_admin() {
    let actor_id = Uuid::new_v4();
    let super_role = role("super-admin", 1);
    let target = user(Vec::new());
    let target_id = target.user_id;
    let role_id = super_role.role_id;
    let harness = harness(
        vec![(actor_id, super_admin_profile())],
        vec![super_role],
        vec![target],
    );

    let result = harness
        .service
        .assign_role(&actor(actor_id), target_id, role_id, reason())
        .await;

    assert!(result.is_ok_and(|user| user.is_super_admin()));
}

#[tokio::test]
async fn update_user_role_guards_super_admin_escalation() {
    let actor_id = Uuid::new_v4();
    let super_role = role("super-admin", 1);
    let target = user(Vec::new());
    let target_id = target.user_id;
    let role_id = super_role.role_id;
    let harness = harness(
        vec![(actor_id, rbac_manager_profile())],
        vec![super_role],
        vec![target],
    );

    let result = harness
        .service
        .update_user_role(&actor(actor_id), target_id, role_id, reason())
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    let target_after = harness.admin_repository.user(target_id).await;
    assert!(target_after.is_ok_and(|user| user.roles.is_empty()));
}

#[tokio::test]
async fn removing_super_admin_role_requires_super_admin() {
    let actor_id = Uuid::new_v4();
    let super_role = role("super-admin", 1);
    let target = user(vec![&super_role]);
    let target_id = target.user_id;
    let role_id = super_role.role_id;
    let harness = harness(
        vec![(actor_id, rbac_manager_profile())],
        vec![super_role],
        vec![target],
    );

    let result = harness
        .service
        .remove_role(&actor(actor_id), target_id, role_id, reason())
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn sync_roles_guards_stripping_super_admin() {
    let actor_id = Uuid::new_v4();
    let super_role = role("super-admin", 1);
    let provider_role = role("provider", 0);
    let target = user(vec![&super_role]);
    let target_id = target.user_id;
    let provider_role_id = provider_role.role_id;
    let harness = harness(
        vec![(actor_id, rbac_manager_profile())],
        vec![super_role, provider_role],
        vec![target],
    );

    let result = harness
        .service
        .sync_roles(&actor(actor_id), target_id, vec![provider_role_id], reason())
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn self_revocation_is_refused() {
    let actor_id = Uuid::new_v4();
    let mut same_user = user(Vec::new());
    same_user.user_id = actor_id;
    let harness = harness(
        vec![(actor_id, rbac_manager_profile())],
        Vec::new(),
        vec![same_user],
    );

    let result = harness
        .service
        .revoke_access(&actor(actor_id), actor_id, reason())
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert!(harness.admin_repository.recorded_audits.lock().await.is_empty());
    let target_after = harness.admin_repository.user(actor_id).await;
    assert!(target_after.is_ok_and(|user| user.is_active));
}

#[tokio::test]
async fn revoking_a_super_admin_requires_super_admin() {
    let actor_id = Uuid::new_v4();
    let super_role = role("super-admin", 1);
    let target = user(vec![&super_role]);
    let target_id = target.user_id;
    let harness = harness(
        vec![(actor_id, rbac_manager_profile())],
        vec![super_role],
        vec![target],
    );

    let result = harness
        .service
        .revoke_access(&actor(actor_id), target_id, reason())
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn successful_update_appends_exactly_one_audit_record() {
    let actor_id = Uuid::new_v4();
    let editable = role("provider", 0);
    let role_id = editable.role_id;
    let harness = harness(
        vec![(actor_id, rbac_manager_profile())],
        vec![editable],
        Vec::new(),
    );

    let input = UpdateRoleInput {
        name: name("Provider"),
        slug: slug("provider"),
        description: Some("Ordering providers".to_owned()),
        hierarchy_level: 50,
        permissions: vec![Permission::ViewReports, Permission::ViewOrders],
    };
    let result = harness
        .service
        .update_role(&actor(actor_id), role_id, input, reason())
        .await;

    assert!(result.is_ok_and(|outcome| {
        outcome.permissions_added == vec![Permission::ViewOrders]
            && outcome.permissions_removed.is_empty()
    }));

    let audits = harness.admin_repository.recorded_audits.lock().await;
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].0, "role_permissions_updated");
    assert_eq!(audits[0].1.actor.user_id, actor_id);
}

#[tokio::test]
async fn marking_reviewed_requires_rbac_manage() {
    let actor_id = Uuid::new_v4();
    let harness = harness(
        vec![(
            actor_id,
            AccessProfile {
                is_active: true,
                is_super_admin: false,
                permissions: vec![Permission::ViewUsers],
            },
        )],
        Vec::new(),
        Vec::new(),
    );

    let result = harness
        .service
        .mark_reviewed(&actor(actor_id), 7, Some("checked".to_owned()))
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert!(harness.audit_log_repository.reviewed.lock().await.is_empty());
}

#[tokio::test]
async fn marking_reviewed_records_the_reviewer() {
    let actor_id = Uuid::new_v4();
    let harness = harness(
        vec![(actor_id, rbac_manager_profile())],
        Vec::new(),
        Vec::new(),
    );

    let result = harness
        .service
        .mark_reviewed(&actor(actor_id), 7, Some("looks legitimate".to_owned()))
        .await;

    assert!(result.is_ok());
    let reviewed = harness.audit_log_repository.reviewed.lock().await;
    assert_eq!(reviewed.len(), 1);
    assert_eq!(reviewed[0].0, 7);
    assert_eq!(reviewed[0].1.user_id, actor_id);
}

#[tokio::test]
async fn revocation_records_the_acting_user() {
    let actor_id = Uuid::new_v4();
    let target = user(Vec::new());
    let target_id = target.user_id;
    let harness = harness(
        vec![(actor_id, rbac_manager_profile())],
        Vec::new(),
        vec![target],
    );

    let result = harness
        .service
        .revoke_access(&actor(actor_id), target_id, reason())
        .await;

    assert!(result.is_ok());
    let audits = harness.admin_repository.recorded_audits.lock().await;
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].0, "user_access_revoked");
    assert_eq!(
        audits[0].1.reason.as_ref().map(|reason| reason.as_str()),
        Some("quarterly access review")
    );
}
