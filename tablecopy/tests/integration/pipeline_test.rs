use tablecopy::destination::memory::MemoryDestination;
use tablecopy::destination::{Destination, FanoutDestination};
use tablecopy::error::ErrorKind;
use tablecopy::pipeline::Pipeline;
use tablecopy::test_utils::destination::FailingDestination;
use tablecopy::test_utils::source::MemorySource;
use tablecopy::test_utils::table::{actor_batch, customer_batch};
use tablecopy::types::TablePlan;
use tablecopy_telemetry::tracing::init_test_tracing;

async fn sakila_source() -> MemorySource {
    MemorySource::new()
        .with_table("customer", customer_batch())
        .await
        .with_table("actor", actor_batch())
        .await
}

#[tokio::test]
async fn all_plan_copies_every_table_in_catalog_order() {
    init_test_tracing();

    let source = sakila_source().await;
    let destination = MemoryDestination::new();
    let pipeline = Pipeline::new(source.clone(), destination.clone());

    let report = pipeline.run(TablePlan::All).await.unwrap();

    assert_eq!(report.table_names(), vec!["actor", "customer"]);
    assert_eq!(report.total_rows(), 7);
    assert_eq!(source.reads().await, vec!["actor", "customer"]);
    assert_eq!(destination.table_names().await, vec!["actor", "customer"]);

    let actor = destination.snapshot("actor").await.unwrap();
    assert_eq!(actor.batch(), &actor_batch());
}

#[tokio::test]
async fn tables_plan_reads_only_named_tables() {
    init_test_tracing();

    let source = sakila_source().await;
    let destination = MemoryDestination::new();
    let pipeline = Pipeline::new(source.clone(), destination.clone());

    let report = pipeline
        .run(TablePlan::Tables(vec!["customer".to_string()]))
        .await
        .unwrap();

    assert_eq!(report.table_names(), vec!["customer"]);
    assert_eq!(source.reads().await, vec!["customer"]);
}

#[tokio::test]
async fn missing_table_aborts_the_run() {
    init_test_tracing();

    let source = sakila_source().await;
    let destination = MemoryDestination::new();
    let pipeline = Pipeline::new(source, destination.clone());

    let err = pipeline
        .run(TablePlan::Tables(vec![
            "actor".to_string(),
            "film".to_string(),
            "customer".to_string(),
        ]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SourceQueryFailed);
    // Tables written before the failure stay written, later ones are never read.
    assert_eq!(destination.table_names().await, vec!["actor"]);
}

#[tokio::test]
async fn write_failure_aborts_the_run() {
    init_test_tracing();

    let source = sakila_source().await;
    let pipeline = Pipeline::new(source.clone(), FailingDestination::for_table("actor"));

    let err = pipeline.run(TablePlan::All).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DestinationError);
    assert_eq!(source.reads().await, vec!["actor"]);
}

#[tokio::test]
async fn fanout_writes_the_same_snapshot_to_each_destination() {
    init_test_tracing();

    let first = MemoryDestination::new();
    let second = MemoryDestination::new();
    let mut fanout = FanoutDestination::default();
    fanout.push(first.clone());
    fanout.push(second.clone());
    assert_eq!(fanout.name(), "fanout");

    let source = sakila_source().await;
    Pipeline::new(source.clone(), fanout)
        .run(TablePlan::All)
        .await
        .unwrap();

    // Each table is read once regardless of the number of destinations.
    assert_eq!(source.reads().await, vec!["actor", "customer"]);
    assert_eq!(first.snapshots().await.len(), 2);
    assert_eq!(
        first.snapshot("customer").await.unwrap().batch(),
        second.snapshot("customer").await.unwrap().batch()
    );
}

#[tokio::test]
async fn fanout_stops_at_the_first_failing_destination() {
    init_test_tracing();

    let after = MemoryDestination::new();
    let mut fanout = FanoutDestination::default();
    fanout.push(FailingDestination::new());
    fanout.push(after.clone());

    let source = sakila_source().await;
    let result = Pipeline::new(source, fanout).run(TablePlan::All).await;

    assert!(result.is_err());
    assert!(after.snapshots().await.is_empty());
}
