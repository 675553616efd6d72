use sqlx::{MySqlPool, mysql::MySqlPoolOptions};
use tablecopy_config::shared::MySqlConnectionConfig;
use tracing::debug;

/// Lists table names in the connection's default schema, ordered by name.
const LIST_TABLES_QUERY: &str = "
    SELECT CAST(TABLE_NAME AS CHAR(64)) AS TABLE_NAME
    FROM information_schema.TABLES
    WHERE TABLE_SCHEMA = DATABASE()
    ORDER BY TABLE_NAME
";

/// Connects to the configured database with a single-connection pool.
///
/// Steps run sequentially, so one connection per database is held for the whole invocation.
pub async fn connect_to_database(config: &MySqlConnectionConfig) -> Result<MySqlPool, sqlx::Error> {
    let pool = MySqlPoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .connect_with(config.with_db())
        .await?;

    debug!(host = %config.host, port = config.port, database = %config.name, "connected to mysql");

    Ok(pool)
}

/// Returns every table name of the pool's default database.
pub async fn list_tables(pool: &MySqlPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(LIST_TABLES_QUERY)
        .fetch_all(pool)
        .await
}

/// Quotes an identifier with backticks, doubling embedded backticks.
pub fn quote_identifier(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}
