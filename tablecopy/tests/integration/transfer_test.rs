use tablecopy::destination::memory::MemoryDestination;
use tablecopy::error::ErrorKind;
use tablecopy::steps;
use tablecopy::test_utils::source::MemorySource;
use tablecopy::test_utils::table::{customer_batch, full_actor_batch};
use tablecopy::types::TableColumns;
use tablecopy_telemetry::tracing::init_test_tracing;

async fn source() -> MemorySource {
    MemorySource::new()
        .with_table("actor", full_actor_batch())
        .await
        .with_table("customer", customer_batch())
        .await
}

#[tokio::test]
async fn transfer_only_touches_selected_tables() {
    init_test_tracing();

    let source = source().await;
    let destination = MemoryDestination::new();
    let selection = vec![TableColumns::new("actor", ["actor_id", "first_name"])];

    let report = steps::transfer(source.clone(), destination.clone(), &selection)
        .await
        .unwrap();

    assert_eq!(report.table_names(), vec!["actor"]);
    assert_eq!(source.reads().await, vec!["actor"]);
    assert_eq!(destination.table_names().await, vec!["actor"]);

    let actor = destination.snapshot("actor").await.unwrap();
    assert_eq!(actor.column_names(), vec!["actor_id", "first_name"]);
    assert_eq!(actor.num_rows(), 5);
}

#[tokio::test]
async fn transfer_keeps_selection_column_order() {
    init_test_tracing();

    let destination = MemoryDestination::new();
    let selection = vec![TableColumns::new("customer", ["email", "customer_id"])];

    steps::transfer(source().await, destination.clone(), &selection)
        .await
        .unwrap();

    let customer = destination.snapshot("customer").await.unwrap();
    assert_eq!(customer.column_names(), vec!["email", "customer_id"]);
}

#[tokio::test]
async fn unknown_selected_column_fails() {
    init_test_tracing();

    let selection = vec![TableColumns::new("actor", ["actor_id", "nickname"])];

    let err = steps::transfer(source().await, MemoryDestination::new(), &selection)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SourceQueryFailed);
}

#[tokio::test]
async fn empty_selection_transfers_nothing() {
    init_test_tracing();

    let source = source().await;
    let destination = MemoryDestination::new();

    let report = steps::transfer(source.clone(), destination.clone(), &[])
        .await
        .unwrap();

    assert!(report.tables.is_empty());
    assert!(source.reads().await.is_empty());
}

#[tokio::test]
async fn copy_replaces_previous_contents() {
    init_test_tracing();

    let source = source().await;
    let destination = MemoryDestination::new();
    let selection = vec![TableColumns::new("actor", ["actor_id"])];

    steps::transfer(source.clone(), destination.clone(), &selection)
        .await
        .unwrap();
    steps::copy(source, destination.clone()).await.unwrap();

    let actor = destination.snapshot("actor").await.unwrap();
    assert_eq!(actor.num_columns(), 4);
    assert_eq!(destination.table_names().await, vec!["actor", "customer"]);
}
