use serde::{Deserialize, Serialize};

/// Columns to transfer for one table, in output order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumns {
    pub table: String,
    pub columns: Vec<String>,
}

impl TableColumns {
    pub fn new<T, C>(table: T, columns: impl IntoIterator<Item = C>) -> Self
    where
        T: Into<String>,
        C: Into<String>,
    {
        Self {
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}
