use postgres_from_row::FromRow;

pub type ChartId = i32;
/// Raw, JSON-encoded chart configuration
pub type ConfigText = String;
pub type AppLabel = &'static str;
pub type MigrationName = &'static str;

/// A row of the charts table, as far as migrations are concerned.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ChartRecord {
    pub id: ChartId,
    pub config: ConfigText,
}

impl ChartRecord {
    pub fn new(id: ChartId, config: &str) -> Self {
        Self {
            id,
            config: config.to_owned(),
        }
    }
}
