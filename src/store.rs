//! Access to chart records and the migration ledger.
use async_trait::async_trait;

use crate::types::AppLabel;
use crate::types::ChartId;
use crate::types::ChartRecord;
use crate::types::MigrationName;

mod postgres;

pub use postgres::PgStore;
pub use postgres::PgTransaction;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),
    #[error("chart {0} does not exist")]
    ChartNotFound(ChartId),
}

#[async_trait]
pub trait RecordStore: Send {
    type Tx<'a>: StoreTransaction + 'a
    where
        Self: 'a;

    /// Open a transaction. Everything done through it lands atomically on commit.
    async fn begin<'a>(&'a mut self) -> Result<Self::Tx<'a>, StoreError>;
}

/// A unit of work on the store.
///
/// Dropping a transaction without committing discards its writes.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Get all chart records, ordered by id.
    async fn fetch_charts(&mut self) -> Result<Vec<ChartRecord>, StoreError>;

    /// Overwrite the config of an existing chart.
    async fn save_chart(&mut self, chart: &ChartRecord) -> Result<(), StoreError>;

    /// Returns true if migration `name` of `app` is in the ledger.
    async fn is_applied(&mut self, app: AppLabel, name: MigrationName) -> Result<bool, StoreError>;

    async fn record_applied(&mut self, app: AppLabel, name: MigrationName) -> Result<(), StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}
