//! Record store access.
//!
//! A [`RecordSource`] yields the checked-out items a scan works from. The
//! outer `Result` is the fatal connection/query failure; each inner
//! `Result` is one row, which may fail to decode on its own.

pub mod sqlite;

pub use sqlite::SqliteSource;

use crate::error::{RowDecodeError, ScanError};
use crate::models::OverdueRow;
use async_trait::async_trait;

/// Rows fetched in one scan, in the order the store yielded them.
pub type FetchedRows = Vec<Result<OverdueRow, RowDecodeError>>;

/// Data source for checked-out items.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Run the overdue query once and return every row.
    async fn fetch_rows(&self) -> Result<FetchedRows, ScanError>;
}
