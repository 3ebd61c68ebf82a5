//! End-to-end fixture sessions over the in-memory database.

use std::sync::Arc;

use dbfixture_core::{
    equal_to, expected_dataset, seed_dataset, DataAccess, FixtureConfig, FixtureError,
    FixtureSession, LiveDataset,
};
use dbfixture_store::{AdminStatement, MemoryDatabase, TableId};
use serde_json::json;

struct Shop {
    db: Arc<MemoryDatabase>,
    customers: TableId,
    orders: TableId,
    items: TableId,
}

/// customers <- orders <- order_items, with an audit trigger on orders.
/// No default schema: owner-less names rely on the session config.
fn shop() -> Shop {
    let db = Arc::new(MemoryDatabase::new());
    db.add_table("sales", "customers");
    db.add_table("archive", "customers");
    let customers = TableId::qualified("app", "customers");
    db.add_table("app", "customers");
    let orders = db.add_table("app", "orders");
    let items = db.add_table("app", "order_items");
    db.add_foreign_key("fk_orders_customers", &orders, &customers);
    db.add_foreign_key("fk_items_orders", &items, &orders);
    db.add_trigger(&orders, "trg_orders_audit");
    Shop {
        db,
        customers,
        orders,
        items,
    }
}

fn config() -> FixtureConfig {
    FixtureConfig::default()
        .with_default_schema("app")
        .with_period(1_000, 100)
}

fn seed() -> LiveDataset {
    seed_dataset()
        .row_for("customers")
        .col("ID", 1)
        .col("NAME", "Ada")
        .row_for("orders")
        .col("ID", 10)
        .col("CUSTOMER_ID", 1)
        .build()
        .unwrap()
}

async fn insert(db: &MemoryDatabase, table: &TableId, id: i64) {
    db.insert_row(table, &vec![("ID".to_string(), json!(id))])
        .await
        .unwrap();
}

#[tokio::test]
async fn prepare_replaces_contents_of_dataset_tables_and_children() {
    let shop = shop();
    insert(&shop.db, &shop.customers, 99).await;
    insert(&shop.db, &shop.orders, 98).await;
    insert(&shop.db, &shop.items, 97).await;
    let mut session = FixtureSession::with_database(shop.db.clone(), config());

    session.prepare(&seed()).await.unwrap();

    let customers = shop.db.rows(&shop.customers);
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0][1], ("NAME".to_string(), json!("Ada")));
    assert_eq!(shop.db.rows(&shop.orders).len(), 1);
    assert!(shop.db.rows(&shop.items).is_empty());

    let touched: Vec<&TableId> = session.touched_tables().collect();
    assert_eq!(touched, vec![&shop.customers, &shop.orders]);
}

#[tokio::test]
async fn prepare_disables_triggers_around_inserts() {
    let shop = shop();
    let mut session = FixtureSession::with_database(shop.db.clone(), config());

    session.prepare(&seed()).await.unwrap();

    let log = shop.db.statement_log();
    let disable = AdminStatement::DisableTrigger {
        trigger: "APP.TRG_ORDERS_AUDIT".to_string(),
    };
    let enable = AdminStatement::EnableTrigger {
        trigger: "APP.TRG_ORDERS_AUDIT".to_string(),
    };
    let disabled_at = log.iter().position(|s| *s == disable).unwrap();
    let enabled_at = log.iter().position(|s| *s == enable).unwrap();
    assert!(disabled_at < enabled_at);
    assert_eq!(shop.db.trigger_enabled("app.trg_orders_audit"), Some(true));
}

#[tokio::test]
async fn triggers_are_re_enabled_when_insert_fails() {
    let shop = shop();
    shop.db.fail_inserts_into(&shop.orders);
    let mut session = FixtureSession::with_database(shop.db.clone(), config());

    let err = session.prepare(&seed()).await.unwrap_err();

    assert!(matches!(err, FixtureError::DataAccess { ref table, .. } if table == "ORDERS"));
    assert_eq!(shop.db.trigger_enabled("app.trg_orders_audit"), Some(true));
}

#[tokio::test]
async fn unknown_table_aborts_before_any_statement() {
    let shop = shop();
    let mut session = FixtureSession::with_database(shop.db.clone(), config());
    let dataset = seed_dataset()
        .row_for("invoices")
        .col("ID", 1)
        .build()
        .unwrap();

    let err = session.prepare(&dataset).await.unwrap_err();

    assert!(matches!(err, FixtureError::SchemaLoad { ref table, .. } if table == "INVOICES"));
    assert!(shop.db.statement_log().is_empty());
}

#[tokio::test]
async fn finish_restores_the_state_recorded_by_begin() {
    let shop = shop();
    insert(&shop.db, &shop.customers, 99).await;
    let mut session =
        FixtureSession::with_database(shop.db.clone(), config().with_restore(true));

    let scn = session.begin().await.unwrap();
    assert!(scn.is_some());
    session.prepare(&seed()).await.unwrap();
    insert(&shop.db, &shop.items, 5).await;

    let script = session.restore_script().unwrap();
    assert!(script.contains("flashback table APP.CUSTOMERS"));
    assert!(script.contains("flashback table APP.ORDER_ITEMS"));

    session.finish().await.unwrap();

    let customers = shop.db.rows(&shop.customers);
    assert_eq!(customers, vec![vec![("ID".to_string(), json!(99))]]);
    assert!(shop.db.rows(&shop.orders).is_empty());
    assert!(shop.db.rows(&shop.items).is_empty());
    assert!(session.restore_point().is_none());
}

#[tokio::test]
async fn failed_finish_keeps_restore_point_for_retry() {
    let shop = shop();
    insert(&shop.db, &shop.customers, 99).await;
    let mut session =
        FixtureSession::with_database(shop.db.clone(), config().with_restore(true));
    let scn = session.begin().await.unwrap();
    session.prepare(&seed()).await.unwrap();
    shop.db.fail_statement(AdminStatement::EnableRowMovement {
        table: shop.customers.clone(),
    });

    let err = session.finish().await.unwrap_err();

    assert!(matches!(err, FixtureError::DataAccess { ref table, .. } if table == "CUSTOMERS"));
    assert_eq!(session.restore_point(), scn);
    assert_eq!(session.touched_tables().count(), 2);

    shop.db.clear_failures();
    session.finish().await.unwrap();

    assert_eq!(
        shop.db.rows(&shop.customers),
        vec![vec![("ID".to_string(), json!(99))]]
    );
    assert!(session.restore_point().is_none());
}

#[tokio::test]
async fn same_table_name_in_two_schemas_is_prepared_separately() {
    let shop = shop();
    let sales = TableId::qualified("sales", "customers");
    let mut session = FixtureSession::with_database(shop.db.clone(), config());
    let dataset = seed_dataset()
        .row_for("app.customers")
        .col("ID", 1)
        .row_for("sales.customers")
        .col("ID", 2)
        .build()
        .unwrap();

    session.prepare(&dataset).await.unwrap();

    assert_eq!(
        shop.db.rows(&shop.customers),
        vec![vec![("ID".to_string(), json!(1))]]
    );
    assert_eq!(shop.db.rows(&sales), vec![vec![("ID".to_string(), json!(2))]]);
    let touched: Vec<&TableId> = session.touched_tables().collect();
    assert_eq!(touched, vec![&shop.customers, &sales]);
}

#[tokio::test]
async fn finish_without_restore_leaves_data() {
    let shop = shop();
    let mut session = FixtureSession::with_database(shop.db.clone(), config());

    assert_eq!(session.begin().await.unwrap(), None);
    session.prepare(&seed()).await.unwrap();
    shop.db.clear_statement_log();
    session.finish().await.unwrap();

    assert!(shop.db.statement_log().is_empty());
    assert_eq!(shop.db.rows(&shop.orders).len(), 1);
}

#[tokio::test]
async fn assert_contains_sees_prepared_rows() {
    let shop = shop();
    let mut session = FixtureSession::with_database(shop.db.clone(), config());
    session.prepare(&seed()).await.unwrap();

    let expected = expected_dataset()
        .row_for("orders")
        .col("id", equal_to(10))
        .col("customer_id", equal_to(1))
        .build()
        .unwrap();
    let outcome = session.assert_contains(&expected).await.unwrap();

    assert!(outcome.is_match(), "{outcome}");
    assert_eq!(outcome.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn assert_contains_reports_mismatch() {
    let shop = shop();
    let mut session = FixtureSession::with_database(shop.db.clone(), config());
    session.prepare(&seed()).await.unwrap();

    let expected = expected_dataset()
        .row_for("customers")
        .col("name", equal_to("Grace"))
        .build()
        .unwrap();
    let outcome = session.assert_contains(&expected).await.unwrap();

    assert!(!outcome.is_match());
    assert!(outcome
        .report()
        .contains("Table=CUSTOMERS, column=name, expected value='\"Grace\"', actual value='\"Ada\"'"));
}

#[tokio::test]
async fn structure_is_resolved_once_per_session() {
    let shop = shop();
    let mut session = FixtureSession::with_database(shop.db.clone(), config());

    session.prepare(&seed()).await.unwrap();
    session.prepare(&seed()).await.unwrap();

    assert_eq!(shop.db.describe_calls("orders"), 1);
    assert_eq!(session.graph().len(), 3);
}
