//! In-memory store and diagnostics capture for tests.
use std::collections::BTreeMap;
use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::Value;

use crate::diagnostics::DiagnosticSink;
use crate::selection::SelectionEntry;
use crate::store::RecordStore;
use crate::store::StoreError;
use crate::store::StoreTransaction;
use crate::types::AppLabel;
use crate::types::ChartId;
use crate::types::ChartRecord;
use crate::types::ConfigText;
use crate::types::MigrationName;

type Ledger = BTreeSet<(String, String)>;

/// Chart records and migration ledger held in memory.
///
/// Transactions work on a copy of the store's state that replaces it on commit.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    charts: BTreeMap<ChartId, ConfigText>,
    ledger: Ledger,
    commits: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chart(mut self, id: ChartId, config: &str) -> Self {
        self.charts.insert(id, config.to_owned());
        self
    }

    pub fn with_applied(mut self, app: &str, name: &str) -> Self {
        self.ledger.insert((app.to_owned(), name.to_owned()));
        self
    }

    pub fn chart(&self, id: ChartId) -> Option<&str> {
        self.charts.get(&id).map(String::as_str)
    }

    pub fn charts(&self) -> &BTreeMap<ChartId, ConfigText> {
        &self.charts
    }

    pub fn is_applied(&self, app: &str, name: &str) -> bool {
        self.ledger.contains(&(app.to_owned(), name.to_owned()))
    }

    /// Number of committed transactions
    pub fn commits(&self) -> usize {
        self.commits
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    type Tx<'a> = MemoryTransaction<'a>;

    async fn begin<'a>(&'a mut self) -> Result<MemoryTransaction<'a>, StoreError> {
        Ok(MemoryTransaction {
            charts: self.charts.clone(),
            ledger: self.ledger.clone(),
            store: self,
        })
    }
}

pub struct MemoryTransaction<'a> {
    store: &'a mut MemoryStore,
    charts: BTreeMap<ChartId, ConfigText>,
    ledger: Ledger,
}

#[async_trait]
impl<'a> StoreTransaction for MemoryTransaction<'a> {
    async fn fetch_charts(&mut self) -> Result<Vec<ChartRecord>, StoreError> {
        Ok(self
            .charts
            .iter()
            .map(|(id, config)| ChartRecord::new(*id, config))
            .collect())
    }

    async fn save_chart(&mut self, chart: &ChartRecord) -> Result<(), StoreError> {
        match self.charts.get_mut(&chart.id) {
            Some(config) => {
                config.clone_from(&chart.config);
                Ok(())
            }
            None => Err(StoreError::ChartNotFound(chart.id)),
        }
    }

    async fn is_applied(&mut self, app: AppLabel, name: MigrationName) -> Result<bool, StoreError> {
        Ok(self.ledger.contains(&(app.to_owned(), name.to_owned())))
    }

    async fn record_applied(&mut self, app: AppLabel, name: MigrationName) -> Result<(), StoreError> {
        self.ledger.insert((app.to_owned(), name.to_owned()));
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.store.charts = self.charts;
        self.store.ledger = self.ledger;
        self.store.commits += 1;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// A dump received by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct Dump {
    pub chart_id: ChartId,
    pub legacy: Value,
    pub selection: Vec<SelectionEntry>,
}

/// Keeps every dump it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub dumps: Vec<Dump>,
}

impl DiagnosticSink for RecordingSink {
    fn rewritten(&mut self, chart_id: ChartId, legacy: &Value, selection: &[SelectionEntry]) {
        self.dumps.push(Dump {
            chart_id,
            legacy: legacy.clone(),
            selection: selection.to_vec(),
        });
    }
}
