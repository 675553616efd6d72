use async_trait::async_trait;
use sqlx::MySqlPool;
use tablecopy_config::shared::MySqlConnectionConfig;
use tablecopy_mysql::{db, read};

use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::source::Source;
use crate::types::TableSnapshot;

/// [`Source`] backed by the default database of a MySQL connection.
#[derive(Debug, Clone)]
pub struct MySqlSource {
    pool: MySqlPool,
}

impl MySqlSource {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Connects to the database named in `config`.
    pub async fn connect(config: &MySqlConnectionConfig) -> EtlResult<Self> {
        let pool = db::connect_to_database(config).await.map_err(|err| {
            etl_error!(
                ErrorKind::SourceConnectionFailed,
                "Connecting to the source database failed",
                format!("{}:{}/{}", config.host, config.port, config.name),
                source: err
            )
        })?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl Source for MySqlSource {
    async fn list_tables(&self) -> EtlResult<Vec<String>> {
        let tables = db::list_tables(&self.pool).await?;

        Ok(tables)
    }

    async fn read_table(
        &self,
        table: &str,
        columns: Option<&[String]>,
    ) -> EtlResult<TableSnapshot> {
        let batch = read::read_table(&self.pool, table, columns).await?;

        Ok(TableSnapshot::new(table, batch))
    }
}
