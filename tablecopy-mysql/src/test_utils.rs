use sqlx::{Connection, Executor, MySqlConnection, MySqlPool};
use tablecopy_config::shared::{MySqlConnectionConfig, TlsConfig};
use uuid::Uuid;

use crate::db::{connect_to_database, quote_identifier};

/// Connection settings for a uniquely named database on the test MySQL server.
///
/// Reads `TESTS_MYSQL_HOST`, `TESTS_MYSQL_PORT`, `TESTS_MYSQL_USERNAME` and the optional
/// `TESTS_MYSQL_PASSWORD`. The database itself is not created.
///
/// # Panics
/// Panics if a required variable is missing or the port is not a number.
pub fn local_mysql_connection_config() -> MySqlConnectionConfig {
    MySqlConnectionConfig {
        host: std::env::var("TESTS_MYSQL_HOST").expect("TESTS_MYSQL_HOST must be set"),
        port: std::env::var("TESTS_MYSQL_PORT")
            .expect("TESTS_MYSQL_PORT must be set")
            .parse()
            .expect("TESTS_MYSQL_PORT must be a valid port number"),
        name: Uuid::new_v4().simple().to_string(),
        username: std::env::var("TESTS_MYSQL_USERNAME").expect("TESTS_MYSQL_USERNAME must be set"),
        password: std::env::var("TESTS_MYSQL_PASSWORD").ok().map(Into::into),
        tls: TlsConfig::disabled(),
    }
}

/// Creates the database named in `config` and returns a pool connected to it.
///
/// # Panics
/// Panics if connection or database creation fails.
pub async fn create_mysql_database(config: &MySqlConnectionConfig) -> MySqlPool {
    let mut connection = MySqlConnection::connect_with(&config.without_db())
        .await
        .expect("Failed to connect to MySQL");

    connection
        .execute(&*format!(
            "CREATE DATABASE {}",
            quote_identifier(&config.name)
        ))
        .await
        .expect("Failed to create database");

    connect_to_database(config)
        .await
        .expect("Failed to connect to MySQL database")
}

/// Drops the database named in `config` if it exists.
///
/// # Panics
/// Panics if any database operation fails.
pub async fn drop_mysql_database(config: &MySqlConnectionConfig) {
    let mut connection = MySqlConnection::connect_with(&config.without_db())
        .await
        .expect("Failed to connect to MySQL");

    connection
        .execute(&*format!(
            "DROP DATABASE IF EXISTS {}",
            quote_identifier(&config.name)
        ))
        .await
        .expect("Failed to destroy database");
}
