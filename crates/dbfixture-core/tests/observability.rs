//! Structured tracing events emitted by fixture sessions.
//!
//! `#[traced_test]` captures every event so the assertions can check the
//! structured `event = ...` fields.

use std::sync::Arc;

use dbfixture_core::obs::{
    emit_constraint_enable_failed, emit_fixture_prepared, emit_match_finished,
    emit_restore_completed, emit_tables_resolved, session_span,
};
use dbfixture_core::{
    equal_to, expected_dataset, seed_dataset, BulkOperationExecutor, DataAccess, FixtureConfig,
    FixtureSession, GraphLoader, MetadataProvider,
};
use dbfixture_store::{AdminStatement, MemoryDatabase};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn emitters_write_event_names() {
    let _span = session_span().entered();
    emit_tables_resolved(1, 2);
    emit_fixture_prepared(1, 3);
    emit_restore_completed(2, 17);
    emit_match_finished(true, 1);

    assert!(logs_contain("tables.resolved"));
    assert!(logs_contain("fixture.prepared"));
    assert!(logs_contain("restore.completed"));
    assert!(logs_contain("match.finished"));
}

#[traced_test]
#[test]
fn enable_failure_is_logged_at_error_level() {
    emit_constraint_enable_failed("APP.ORDER_ITEMS", "FK_ITEMS_ORDERS", &"lock timeout");

    assert!(logs_contain("ERROR"));
    assert!(logs_contain("constraint.enable_failed"));
    assert!(logs_contain("lock timeout"));
}

#[traced_test]
#[tokio::test]
async fn session_phases_are_traced() {
    let db = Arc::new(MemoryDatabase::new().with_default_schema("app"));
    db.add_table("app", "orders");
    let mut session = FixtureSession::with_database(
        db.clone(),
        FixtureConfig::default().with_restore(true),
    );
    let seed = seed_dataset().row_for("orders").col("ID", 1).build().unwrap();
    let expected = expected_dataset()
        .row_for("orders")
        .col("id", equal_to(1))
        .build()
        .unwrap();

    session.begin().await.unwrap();
    session.prepare(&seed).await.unwrap();
    session.assert_contains(&expected).await.unwrap();
    session.finish().await.unwrap();

    assert!(logs_contain("dbfixture.session{session="));
    assert!(logs_contain("recorded restore point"));
    assert!(logs_contain("restore script"));
    assert!(logs_contain("fixture.prepared"));
    assert!(logs_contain("match.finished"));
    assert!(logs_contain("restore.completed"));
}

#[traced_test]
#[tokio::test]
async fn swallowed_enable_failure_is_traced() {
    let db = Arc::new(MemoryDatabase::new());
    let orders = db.add_table("app", "orders");
    let items = db.add_table("app", "order_items");
    db.add_foreign_key("fk_items_orders", &items, &orders);
    db.fail_statement(AdminStatement::EnableConstraint {
        table: items.clone(),
        constraint: "FK_ITEMS_ORDERS".to_string(),
    });

    let mut loader = GraphLoader::new(db.clone() as Arc<dyn MetadataProvider>);
    let key = loader.resolve(&orders).await.unwrap();
    let executor = BulkOperationExecutor::new(db.clone() as Arc<dyn DataAccess>);
    executor.truncate_table(loader.graph(), key).await.unwrap();

    assert!(logs_contain("constraint.enable_failed"));
    assert!(logs_contain("FK_ITEMS_ORDERS"));
}
