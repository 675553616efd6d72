mod plan;
mod snapshot;

pub use plan::{TablePlan, TableRequest};
pub use snapshot::TableSnapshot;
pub use tablecopy_config::shared::TableColumns;
