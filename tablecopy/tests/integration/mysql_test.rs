#![cfg(feature = "mysql-tests")]

use arrow::array::AsArray;
use arrow::datatypes::{DataType, Int64Type, TimeUnit};
use sqlx::{Executor, MySqlPool};
use tablecopy::destination::mysql::MySqlDestination;
use tablecopy::source::Source;
use tablecopy::source::mysql::MySqlSource;
use tablecopy::steps;
use tablecopy::types::TableColumns;
use tablecopy_mysql::test_utils::{
    create_mysql_database, drop_mysql_database, local_mysql_connection_config,
};
use tablecopy_telemetry::tracing::init_test_tracing;

async fn seed_actor(pool: &MySqlPool) {
    pool.execute(
        "CREATE TABLE actor (
            actor_id SMALLINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
            first_name VARCHAR(45) NOT NULL,
            last_name VARCHAR(45) NOT NULL,
            last_update TIMESTAMP NOT NULL DEFAULT '2006-02-15 04:34:33'
        )",
    )
    .await
    .unwrap();
    pool.execute(
        "INSERT INTO actor (first_name, last_name) VALUES
            ('PENELOPE', 'GUINESS'), ('NICK', 'WAHLBERG'), ('ED', 'CHASE'),
            ('JENNIFER', 'DAVIS'), ('JOHNNY', 'LOLLOBRIGIDA')",
    )
    .await
    .unwrap();
    pool.execute("CREATE TABLE category (category_id TINYINT UNSIGNED, name VARCHAR(25))")
        .await
        .unwrap();
}

async fn column_names(pool: &MySqlPool, table: &str) -> Vec<String> {
    sqlx::query_scalar(
        "SELECT CAST(COLUMN_NAME AS CHAR(64)) FROM information_schema.COLUMNS \
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION",
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .unwrap()
}

async fn row_count(pool: &MySqlPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM `{table}`"))
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn source_reads_catalog_and_typed_columns() {
    init_test_tracing();

    let config = local_mysql_connection_config();
    let pool = create_mysql_database(&config).await;
    seed_actor(&pool).await;
    let source = MySqlSource::new(pool);

    assert_eq!(source.list_tables().await.unwrap(), vec!["actor", "category"]);

    let actor = source.read_table("actor", None).await.unwrap();
    assert_eq!(actor.num_rows(), 5);
    let schema = actor.schema();
    assert_eq!(schema.field(0).data_type(), &DataType::Int64);
    assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
    assert_eq!(
        schema.field(3).data_type(),
        &DataType::Timestamp(TimeUnit::Microsecond, Some("+00:00".into()))
    );
    let ids = actor.batch().column(0).as_primitive::<Int64Type>();
    assert_eq!(ids.values().to_vec(), vec![1, 2, 3, 4, 5]);

    // Empty tables still carry their schema.
    let category = source.read_table("category", None).await.unwrap();
    assert_eq!(category.num_rows(), 0);
    assert_eq!(category.column_names(), vec!["category_id", "name"]);

    let columns = vec!["first_name".to_string(), "actor_id".to_string()];
    let projected = source
        .read_table("actor", Some(columns.as_slice()))
        .await
        .unwrap();
    assert_eq!(projected.column_names(), columns);

    drop_mysql_database(&config).await;
}

#[tokio::test]
async fn copy_then_transfer_replaces_target_tables() {
    init_test_tracing();

    let source_config = local_mysql_connection_config();
    let target_config = local_mysql_connection_config();
    let source_pool = create_mysql_database(&source_config).await;
    let target_pool = create_mysql_database(&target_config).await;
    seed_actor(&source_pool).await;

    let source = MySqlSource::new(source_pool);
    // A small batch size forces several INSERT statements per table.
    let destination = MySqlDestination::new(target_pool.clone(), 2);

    let report = steps::copy(source.clone(), destination.clone()).await.unwrap();
    assert_eq!(report.table_names(), vec!["actor", "category"]);
    assert_eq!(row_count(&target_pool, "actor").await, 5);
    assert_eq!(
        column_names(&target_pool, "actor").await,
        vec!["actor_id", "first_name", "last_name", "last_update"]
    );

    let selection = vec![TableColumns::new("actor", ["actor_id", "first_name"])];
    steps::transfer(source, destination, &selection).await.unwrap();

    assert_eq!(row_count(&target_pool, "actor").await, 5);
    assert_eq!(
        column_names(&target_pool, "actor").await,
        vec!["actor_id", "first_name"]
    );
    // Tables outside the selection keep their copied state.
    assert_eq!(
        column_names(&target_pool, "category").await,
        vec!["category_id", "name"]
    );

    let first_name: String =
        sqlx::query_scalar("SELECT first_name FROM actor WHERE actor_id = 4")
            .fetch_one(&target_pool)
            .await
            .unwrap();
    assert_eq!(first_name, "JENNIFER");

    drop_mysql_database(&source_config).await;
    drop_mysql_database(&target_config).await;
}
