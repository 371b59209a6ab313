//! Integration tests for the permission catalog service.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use synex_auth::{AdministrationService, CatalogService, DirectoryService, PermissionConfig, SeedReport};
use synex_core::error::SynexError;
use synex_core::models::binding::AssignRolePermissions;
use synex_core::models::permission::{CreatePermission, UpdatePermission};
use synex_core::models::permission_group::CreatePermissionGroup;
use synex_core::models::role::CreateRole;
use synex_core::models::user::CreateUser;
use synex_core::models::user_permission::{GrantType, GrantUserPermission};
use synex_db::SurrealStore;
use uuid::Uuid;

type Store = SurrealStore<Db>;

async fn setup() -> (CatalogService<Store>, DirectoryService<Store>, AdministrationService<Store>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    synex_db::run_migrations(&db).await.unwrap();
    let store = SurrealStore::new(db);

    (
        CatalogService::new(store.clone()),
        DirectoryService::new(store.clone()),
        AdministrationService::new(store, PermissionConfig::default()),
    )
}

#[tokio::test]
async fn create_derives_uppercase_name() {
    let (catalog, _, _) = setup().await;

    let permission = catalog
        .create(CreatePermission {
            resource: Some("price".into()),
            description: Some("View sample pricing".into()),
            ..CreatePermission::new("sample", "view")
        })
        .await
        .unwrap();

    assert_eq!(permission.module, "SAMPLE");
    assert_eq!(permission.action, "VIEW");
    assert_eq!(permission.name, "SAMPLE_VIEW_PRICE");
    assert!(permission.is_active);

    let found = catalog.find_by_name("sample_view_price").await.unwrap();
    assert_eq!(found.id, permission.id);
}

#[tokio::test]
async fn create_rejects_duplicate_active_name() {
    let (catalog, _, _) = setup().await;
    catalog
        .create(CreatePermission::new("USER", "VIEW"))
        .await
        .unwrap();

    let err = catalog
        .create(CreatePermission::new("user", "view"))
        .await
        .unwrap_err();
    assert!(matches!(err, SynexError::AlreadyExists { .. }));
    assert_eq!(catalog.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_creates_leave_one_active_permission() {
    let (catalog, _, _) = setup().await;

    let (a, b) = tokio::join!(
        catalog.create(CreatePermission::new("ORDER", "SHIP")),
        catalog.create(CreatePermission::new("ORDER", "SHIP")),
    );
    assert_eq!(
        [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(),
        1,
        "exactly one create must win: {a:?} / {b:?}"
    );

    let active: Vec<_> = catalog
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .filter(|p| p.name == "ORDER_SHIP")
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(catalog.find_by_name("ORDER_SHIP").await.unwrap().id, active[0].id);
}

#[tokio::test]
async fn create_requires_module_and_action() {
    let (catalog, _, _) = setup().await;

    for input in [
        CreatePermission::new("", "VIEW"),
        CreatePermission::new("USER", "   "),
    ] {
        let err = catalog.create(input).await.unwrap_err();
        assert!(matches!(err, SynexError::Validation { .. }));
    }
    assert!(catalog.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn deactivated_name_can_be_reused_but_not_reactivated() {
    let (catalog, _, _) = setup().await;
    let old = catalog
        .create(CreatePermission::new("ORDER", "SHIP"))
        .await
        .unwrap();
    catalog
        .update(
            old.id,
            UpdatePermission {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(catalog.list_all().await.unwrap().is_empty());

    let new = catalog
        .create(CreatePermission::new("ORDER", "SHIP"))
        .await
        .unwrap();
    assert_ne!(new.id, old.id);

    let err = catalog
        .update(
            old.id,
            UpdatePermission {
                is_active: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SynexError::AlreadyExists { .. }));
}

#[tokio::test]
async fn update_changes_description_only() {
    let (catalog, _, _) = setup().await;
    let permission = catalog
        .create(CreatePermission::new("REPORT", "EXPORT"))
        .await
        .unwrap();

    let updated = catalog
        .update(
            permission.id,
            UpdatePermission {
                description: Some("Export reports as CSV".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.description, "Export reports as CSV");
    assert_eq!(updated.name, "REPORT_EXPORT");
    assert!(updated.is_active);

    assert!(matches!(
        catalog.update(Uuid::new_v4(), UpdatePermission::default()).await,
        Err(SynexError::NotFound { .. })
    ));
}

#[tokio::test]
async fn delete_is_refused_while_referenced() {
    let (catalog, directory, admin) = setup().await;
    let permission = catalog
        .create(CreatePermission::new("FINANCE", "APPROVE"))
        .await
        .unwrap();
    let role = directory
        .create_role(CreateRole {
            name: "ACCOUNTANT".into(),
            description: String::new(),
        })
        .await
        .unwrap();
    let user = directory
        .create_user(CreateUser {
            username: "olga".into(),
            email: "olga@example.com".into(),
        })
        .await
        .unwrap();

    admin
        .assign(AssignRolePermissions::new(role.id, vec![permission.id], Uuid::new_v4()))
        .await
        .unwrap();
    admin
        .grant(GrantUserPermission {
            user_id: user.id,
            permission_id: permission.id,
            grant_type: GrantType::Deny,
            granted_by: Uuid::new_v4(),
            expires_at: None,
            reason: None,
        })
        .await
        .unwrap();

    match catalog.delete(permission.id).await {
        Err(SynexError::InUse { references, .. }) => assert_eq!(references, 2),
        other => panic!("expected InUse, got {other:?}"),
    }

    admin.remove(role.id, &[permission.id]).await.unwrap();
    admin.revoke(user.id, permission.id).await.unwrap();
    catalog.delete(permission.id).await.unwrap();

    assert!(matches!(
        catalog.find_by_id(permission.id).await,
        Err(SynexError::NotFound { .. })
    ));
    assert!(catalog.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_by_module_is_ordered_by_action() {
    let (catalog, _, _) = setup().await;
    for action in ["UPDATE", "CREATE", "VIEW"] {
        catalog
            .create(CreatePermission::new("CUSTOMER", action))
            .await
            .unwrap();
    }
    catalog
        .create(CreatePermission::new("ORDER", "VIEW"))
        .await
        .unwrap();

    let actions: Vec<String> = catalog
        .list_by_module("customer")
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.action)
        .collect();
    assert_eq!(actions, vec!["CREATE", "UPDATE", "VIEW"]);
}

#[tokio::test]
async fn seeding_is_idempotent() {
    let (catalog, _, _) = setup().await;

    let first = catalog.seed_catalog().await.unwrap();
    assert_eq!(first.permissions_created, 56);
    assert_eq!(first.groups_created, 11);

    let second = catalog.seed_catalog().await.unwrap();
    assert_eq!(second, SeedReport::default());
    assert_eq!(catalog.list_all().await.unwrap().len(), 56);
}

#[tokio::test]
async fn seeding_keeps_deactivated_entries_deactivated() {
    let (catalog, _, _) = setup().await;
    catalog.seed_catalog().await.unwrap();
    let backup = catalog.find_by_name("SYSTEM_BACKUP").await.unwrap();
    catalog
        .update(
            backup.id,
            UpdatePermission {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let report = catalog.seed_catalog().await.unwrap();
    assert_eq!(report.permissions_created, 0);
    assert!(!catalog.find_by_id(backup.id).await.unwrap().is_active);
}

#[tokio::test]
async fn groups_list_their_module_permissions() {
    let (catalog, _, _) = setup().await;
    catalog.seed_catalog().await.unwrap();

    let groups = catalog.list_groups().await.unwrap();
    assert_eq!(groups.len(), 11);
    assert_eq!(groups[0].group.group_name, "USER_MANAGEMENT");
    assert_eq!(groups[0].permissions.len(), 6);

    let samples = groups
        .iter()
        .find(|g| g.group.module == "SAMPLE")
        .unwrap();
    assert!(samples.permissions.iter().any(|p| p.name == "SAMPLE_DISPATCH"));
}

#[tokio::test]
async fn group_names_are_unique() {
    let (catalog, _, _) = setup().await;
    let input = CreatePermissionGroup {
        group_name: "quality_control".into(),
        display_name: "Quality Control".into(),
        description: String::new(),
        module: "qc".into(),
        sort_order: 20,
    };
    let group = catalog.create_group(input.clone()).await.unwrap();
    assert_eq!(group.group_name, "QUALITY_CONTROL");

    assert!(matches!(
        catalog.create_group(input).await,
        Err(SynexError::AlreadyExists { .. })
    ));

    catalog.delete_group(group.id).await.unwrap();
    assert!(catalog.list_groups().await.unwrap().is_empty());
}
