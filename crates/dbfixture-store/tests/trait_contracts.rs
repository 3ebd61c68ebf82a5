//! Trait contract tests for MetadataProvider and DataAccess.
//!
//! These tests verify the behavioral contracts of the storage traits
//! using the in-memory database. Any conforming implementation must pass these.

use dbfixture_store::storage_traits::*;
use dbfixture_store::{AdminStatement, MemoryDatabase, Scn, StorageError, TableId};
use serde_json::json;

fn orders_schema() -> (MemoryDatabase, TableId, TableId) {
    let db = MemoryDatabase::new().with_default_schema("app");
    let orders = db.add_table("app", "orders");
    let items = db.add_table("app", "order_items");
    db.add_foreign_key("fk_order_items_orders", &items, &orders);
    db.add_trigger(&orders, "trg_orders_audit");
    (db, orders, items)
}

// ===========================================================================
// MetadataProvider contract tests
// ===========================================================================

#[tokio::test]
async fn describe_returns_canonical_identity() {
    let (db, _, _) = orders_schema();
    let desc = db.describe_table("Orders", Some("app")).await.unwrap();

    assert_eq!(desc.owner, "APP");
    assert_eq!(desc.name, "ORDERS");
    assert!(!desc.index_organized);
    assert_eq!(desc.table_id(), TableId::qualified("app", "orders"));
}

#[tokio::test]
async fn describe_missing_table_is_not_found() {
    let (db, _, _) = orders_schema();
    let err = db.describe_table("invoices", None).await.unwrap_err();

    assert!(matches!(err, StorageError::TableNotFound { .. }));
}

#[tokio::test]
async fn describe_reports_index_organization() {
    let db = MemoryDatabase::new();
    db.add_index_organized_table("app", "lookup");
    let desc = db.describe_table("lookup", Some("APP")).await.unwrap();

    assert!(desc.index_organized);
}

#[tokio::test]
async fn child_foreign_keys_lists_referencing_tables() {
    let (db, _, items) = orders_schema();
    let edges = db.child_foreign_keys("orders", None).await.unwrap();

    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].constraint_name, "FK_ORDER_ITEMS_ORDERS");
    assert_eq!(edges[0].child_id(), items);
}

#[tokio::test]
async fn child_foreign_keys_empty_for_leaf_table() {
    let (db, _, _) = orders_schema();
    let edges = db.child_foreign_keys("order_items", None).await.unwrap();

    assert!(edges.is_empty());
}

#[tokio::test]
async fn triggers_for_returns_table_triggers_only() {
    let (db, _, _) = orders_schema();

    let orders_triggers = db.triggers_for("orders", None).await.unwrap();
    assert_eq!(orders_triggers.len(), 1);
    assert_eq!(orders_triggers[0].qualified_name(), "APP.TRG_ORDERS_AUDIT");

    let items_triggers = db.triggers_for("order_items", None).await.unwrap();
    assert!(items_triggers.is_empty());
}

// ===========================================================================
// DataAccess contract tests
// ===========================================================================

#[tokio::test]
async fn insert_then_select_preserves_column_order_and_casing() {
    let (db, orders, _) = orders_schema();
    let row = vec![
        ("Id".to_string(), json!(1)),
        ("description".to_string(), json!("first")),
    ];
    db.insert_row(&orders, &row).await.unwrap();

    let rows = db.select_rows(&orders).await.unwrap();
    assert_eq!(rows, vec![row]);
}

#[tokio::test]
async fn select_accepts_owner_less_table_via_default_schema() {
    let (db, orders, _) = orders_schema();
    db.insert_row(&orders, &vec![("ID".to_string(), json!(7))])
        .await
        .unwrap();

    let rows = db.select_rows(&TableId::new("orders")).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn scn_advances_on_every_commit() {
    let (db, orders, _) = orders_schema();
    let before = db.current_scn().await.unwrap();
    db.insert_row(&orders, &vec![("ID".to_string(), json!(1))])
        .await
        .unwrap();
    let after = db.current_scn().await.unwrap();

    assert!(after > before);
}

#[tokio::test]
async fn delete_child_then_parent_succeeds() {
    let (db, orders, items) = orders_schema();
    db.insert_row(&orders, &vec![("ID".to_string(), json!(1))])
        .await
        .unwrap();
    db.insert_row(&items, &vec![("ORDER_ID".to_string(), json!(1))])
        .await
        .unwrap();

    db.execute(&AdminStatement::DeleteAll {
        table: items.clone(),
    })
    .await
    .unwrap();
    db.execute(&AdminStatement::DeleteAll {
        table: orders.clone(),
    })
    .await
    .unwrap();

    assert!(db.rows(&orders).is_empty());
    assert!(db.rows(&items).is_empty());
}

#[tokio::test]
async fn truncate_requires_child_constraints_disabled() {
    let (db, orders, items) = orders_schema();
    let truncate = AdminStatement::Truncate {
        table: orders.clone(),
    };
    assert!(matches!(
        db.execute(&truncate).await.unwrap_err(),
        StorageError::ConstraintViolation { .. }
    ));

    db.execute(&AdminStatement::DisableConstraint {
        table: items.clone(),
        constraint: "FK_ORDER_ITEMS_ORDERS".to_string(),
    })
    .await
    .unwrap();
    db.execute(&truncate).await.unwrap();
    assert_eq!(db.constraint_enabled("fk_order_items_orders"), Some(false));
}

#[tokio::test]
async fn trigger_toggle_updates_state() {
    let (db, _, _) = orders_schema();
    db.execute(&AdminStatement::DisableTrigger {
        trigger: "APP.TRG_ORDERS_AUDIT".to_string(),
    })
    .await
    .unwrap();
    assert_eq!(db.trigger_enabled("app.trg_orders_audit"), Some(false));

    db.execute(&AdminStatement::EnableTrigger {
        trigger: "APP.TRG_ORDERS_AUDIT".to_string(),
    })
    .await
    .unwrap();
    assert_eq!(db.trigger_enabled("app.trg_orders_audit"), Some(true));
}

#[tokio::test]
async fn flashback_to_future_scn_fails() {
    let db = MemoryDatabase::new();
    let lookup = db.add_index_organized_table("app", "lookup");

    let err = db
        .execute(&AdminStatement::Flashback {
            table: lookup,
            scn: Scn(999),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::StatementFailed { .. }));
}

#[tokio::test]
async fn unknown_table_statement_fails() {
    let db = MemoryDatabase::new();
    let err = db
        .execute(&AdminStatement::DeleteAll {
            table: TableId::new("ghost"),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::UnknownTable { .. }));
}
