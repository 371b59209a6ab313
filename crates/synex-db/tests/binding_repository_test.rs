//! Integration tests for roles, role bindings and user overrides using
//! in-memory SurrealDB.

use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use synex_core::error::SynexError;
use synex_core::models::binding::AssignRolePermissions;
use synex_core::models::permission::{CreatePermission, Permission};
use synex_core::models::role::CreateRole;
use synex_core::models::user::{CreateUser, UserStatus};
use synex_core::models::user_permission::{GrantType, GrantUserPermission};
use synex_core::repository::{
    Pagination, PermissionRepository, PermissionStore, RolePermissionRepository, RoleRepository,
    UserPermissionRepository, UserRepository,
};
use synex_db::SurrealStore;
use uuid::Uuid;

struct Fixture {
    db: Surreal<Db>,
    store: SurrealStore<Db>,
    user_id: Uuid,
    role_id: Uuid,
    view: Permission,
    create: Permission,
    delete: Permission,
}

async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    synex_db::run_migrations(&db).await.unwrap();
    let store = SurrealStore::new(db.clone());

    let user = store
        .users()
        .create(CreateUser {
            username: "alice".into(),
            email: "alice@example.com".into(),
        })
        .await
        .unwrap();
    let role = store
        .roles()
        .create(CreateRole {
            name: "EDITOR".into(),
            description: "Edits samples".into(),
        })
        .await
        .unwrap();
    store.roles().assign_to_user(user.id, role.id).await.unwrap();

    let perms = store.permissions();
    let view = perms.create(CreatePermission::new("SAMPLE", "VIEW")).await.unwrap();
    let create = perms.create(CreatePermission::new("SAMPLE", "CREATE")).await.unwrap();
    let delete = perms.create(CreatePermission::new("SAMPLE", "DELETE")).await.unwrap();

    Fixture {
        db,
        store,
        user_id: user.id,
        role_id: role.id,
        view,
        create,
        delete,
    }
}

fn ids(bindings: &[synex_core::models::binding::RolePermissionBinding]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = bindings.iter().map(|b| b.permission.id).collect();
    ids.sort();
    ids
}

async fn override_edge_ids(db: &Surreal<Db>) -> Vec<String> {
    db.query("SELECT VALUE meta::id(id) FROM overrides")
        .await
        .unwrap()
        .take(0)
        .unwrap()
}

fn sorted(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort();
    ids
}

// ---------------------------------------------------------------------------
// Roles and users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_role_name_is_rejected() {
    let f = setup().await;
    let err = f
        .store
        .roles()
        .create(CreateRole {
            name: "EDITOR".into(),
            description: String::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, SynexError::AlreadyExists { .. }), "{err:?}");
}

#[tokio::test]
async fn role_membership_is_idempotent() {
    let f = setup().await;
    let roles = f.store.roles();

    roles.assign_to_user(f.user_id, f.role_id).await.unwrap();
    assert_eq!(roles.get_user_roles(f.user_id).await.unwrap().len(), 1);

    roles.unassign_from_user(f.user_id, f.role_id).await.unwrap();
    roles.unassign_from_user(f.user_id, f.role_id).await.unwrap();
    assert!(roles.get_user_roles(f.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_roles_is_paginated() {
    let f = setup().await;
    f.store
        .roles()
        .create(CreateRole {
            name: "ADMIN".into(),
            description: String::new(),
        })
        .await
        .unwrap();

    let page = f
        .store
        .roles()
        .list(Pagination {
            offset: 0,
            limit: 1,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "ADMIN");
}

#[tokio::test]
async fn user_status_round_trips() {
    let f = setup().await;
    let locked = f
        .store
        .users()
        .update_status(f.user_id, UserStatus::Locked)
        .await
        .unwrap();
    assert_eq!(locked.status, UserStatus::Locked);

    let fetched = f.store.users().get_by_username("alice").await.unwrap();
    assert_eq!(fetched.status, UserStatus::Locked);
}

// ---------------------------------------------------------------------------
// Role bindings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn replace_swaps_the_whole_set() {
    let f = setup().await;
    let granter = Uuid::new_v4();
    let bindings = f.store.role_bindings();

    bindings
        .replace(vec![AssignRolePermissions::new(
            f.role_id,
            vec![f.view.id, f.create.id, f.view.id],
            granter,
        )])
        .await
        .unwrap();
    let first = bindings.list_for_role(f.role_id).await.unwrap();
    assert_eq!(ids(&first), sorted(vec![f.view.id, f.create.id]));
    assert!(first.iter().all(|b| b.granted_by == granter && b.is_active));

    bindings
        .replace(vec![AssignRolePermissions::new(
            f.role_id,
            vec![f.delete.id],
            granter,
        )])
        .await
        .unwrap();
    let second = bindings.list_for_role(f.role_id).await.unwrap();
    assert_eq!(ids(&second), vec![f.delete.id]);
}

#[tokio::test]
async fn replace_records_expiry() {
    let f = setup().await;
    let expires_at = Utc::now() + Duration::hours(1);

    f.store
        .role_bindings()
        .replace(vec![AssignRolePermissions {
            expires_at: Some(expires_at),
            ..AssignRolePermissions::new(f.role_id, vec![f.view.id], Uuid::new_v4())
        }])
        .await
        .unwrap();

    let bindings = f.store.role_bindings().list_for_role(f.role_id).await.unwrap();
    assert_eq!(bindings.len(), 1);
    let stored = bindings[0].expires_at.expect("expiry should be stored");
    assert!((stored - expires_at).num_milliseconds().abs() < 1000);
}

#[tokio::test]
async fn remove_deletes_only_listed_bindings() {
    let f = setup().await;
    let bindings = f.store.role_bindings();
    bindings
        .replace(vec![AssignRolePermissions::new(
            f.role_id,
            vec![f.view.id, f.create.id],
            Uuid::new_v4(),
        )])
        .await
        .unwrap();

    bindings.remove(&[f.role_id], &[]).await.unwrap();
    bindings
        .remove(&[f.role_id], &[f.create.id, f.delete.id])
        .await
        .unwrap();

    let remaining = bindings.list_for_role(f.role_id).await.unwrap();
    assert_eq!(ids(&remaining), vec![f.view.id]);
}

#[tokio::test]
async fn user_bindings_follow_role_membership() {
    let f = setup().await;
    f.store
        .role_bindings()
        .replace(vec![AssignRolePermissions::new(
            f.role_id,
            vec![f.view.id],
            Uuid::new_v4(),
        )])
        .await
        .unwrap();

    let via_role = f.store.role_bindings().list_for_user(f.user_id).await.unwrap();
    assert_eq!(ids(&via_role), vec![f.view.id]);

    f.store
        .roles()
        .unassign_from_user(f.user_id, f.role_id)
        .await
        .unwrap();
    assert!(
        f.store
            .role_bindings()
            .list_for_user(f.user_id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn deleting_a_role_cascades() {
    let f = setup().await;
    f.store
        .role_bindings()
        .replace(vec![AssignRolePermissions::new(
            f.role_id,
            vec![f.view.id],
            Uuid::new_v4(),
        )])
        .await
        .unwrap();
    assert_eq!(
        f.store
            .role_bindings()
            .count_active_for_permission(f.view.id)
            .await
            .unwrap(),
        1
    );

    f.store.roles().delete(f.role_id).await.unwrap();

    assert!(f.store.roles().get_by_id(f.role_id).await.is_err());
    assert!(f.store.roles().get_user_roles(f.user_id).await.unwrap().is_empty());
    assert_eq!(
        f.store
            .role_bindings()
            .count_active_for_permission(f.view.id)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn bindings_on_deleted_permissions_are_skipped() {
    let f = setup().await;
    f.store
        .role_bindings()
        .replace(vec![AssignRolePermissions::new(
            f.role_id,
            vec![f.view.id, f.delete.id],
            Uuid::new_v4(),
        )])
        .await
        .unwrap();

    f.store.permissions().soft_delete(f.delete.id).await.unwrap();

    let bindings = f.store.role_bindings().list_for_role(f.role_id).await.unwrap();
    assert_eq!(ids(&bindings), vec![f.view.id]);
}

// ---------------------------------------------------------------------------
// User overrides
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upsert_overwrites_in_place() {
    let f = setup().await;
    let overrides = f.store.overrides();

    let granted = overrides
        .upsert(
            GrantUserPermission {
                user_id: f.user_id,
                permission_id: f.view.id,
                grant_type: GrantType::Grant,
                granted_by: Uuid::new_v4(),
                expires_at: None,
                reason: Some("temporary cover".into()),
            },
            Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(granted.grant_type, GrantType::Grant);
    assert_eq!(granted.permission.id, f.view.id);
    assert_eq!(granted.reason, "temporary cover");
    let edges_before = override_edge_ids(&f.db).await;
    assert_eq!(edges_before.len(), 1);

    let denied = overrides
        .upsert(
            GrantUserPermission {
                user_id: f.user_id,
                permission_id: f.view.id,
                grant_type: GrantType::Deny,
                granted_by: Uuid::new_v4(),
                expires_at: None,
                reason: None,
            },
            Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(denied.grant_type, GrantType::Deny);
    assert_eq!(denied.reason, "");
    assert_eq!(override_edge_ids(&f.db).await, edges_before);

    let all = overrides.list_for_user(f.user_id).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].grant_type, GrantType::Deny);
    assert_eq!(
        overrides.count_active_for_permission(f.view.id).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn delete_override_is_idempotent() {
    let f = setup().await;
    let overrides = f.store.overrides();
    overrides
        .upsert(
            GrantUserPermission {
                user_id: f.user_id,
                permission_id: f.create.id,
                grant_type: GrantType::Grant,
                granted_by: Uuid::new_v4(),
                expires_at: Some(Utc::now() + Duration::days(1)),
                reason: None,
            },
            Utc::now(),
        )
        .await
        .unwrap();

    overrides.delete(f.user_id, f.create.id).await.unwrap();
    overrides.delete(f.user_id, f.create.id).await.unwrap();

    assert!(overrides.list_for_user(f.user_id).await.unwrap().is_empty());
}
