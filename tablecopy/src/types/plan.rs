use tablecopy_config::shared::TableColumns;

/// Which tables a pipeline run reads, and which of their columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TablePlan {
    /// Every table in the source catalog, in catalog order.
    All,
    /// The named tables with all of their columns.
    Tables(Vec<String>),
    /// The named tables restricted to the listed columns, in the listed order.
    Columns(Vec<TableColumns>),
}

impl TablePlan {
    /// Plan for an explicit table list, where an empty list means every table.
    pub fn tables_or_all(tables: &[String]) -> Self {
        if tables.is_empty() {
            TablePlan::All
        } else {
            TablePlan::Tables(tables.to_vec())
        }
    }

    /// Expands the plan into per-table requests, using `catalog` for [`TablePlan::All`].
    pub fn into_requests(self, catalog: Option<Vec<String>>) -> Vec<TableRequest> {
        match self {
            TablePlan::All => catalog
                .unwrap_or_default()
                .into_iter()
                .map(TableRequest::all_columns)
                .collect(),
            TablePlan::Tables(tables) => tables
                .into_iter()
                .map(TableRequest::all_columns)
                .collect(),
            TablePlan::Columns(selection) => selection
                .into_iter()
                .map(|entry| TableRequest {
                    table: entry.table,
                    columns: Some(entry.columns),
                })
                .collect(),
        }
    }

    /// Whether resolving the plan needs the source catalog.
    pub fn needs_catalog(&self) -> bool {
        matches!(self, TablePlan::All)
    }
}

/// One table to read, optionally restricted to some columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRequest {
    pub table: String,
    pub columns: Option<Vec<String>>,
}

impl TableRequest {
    pub fn all_columns(table: String) -> Self {
        Self {
            table,
            columns: None,
        }
    }
}
