use async_trait::async_trait;
use postgres_from_row::FromRow;
use tokio_postgres::Client;
use tokio_postgres::NoTls;
use tokio_postgres::Transaction;

use super::RecordStore;
use super::StoreError;
use super::StoreTransaction;
use crate::config::PostgresConfig;
use crate::types::AppLabel;
use crate::types::ChartRecord;
use crate::types::MigrationName;

pub struct PgStore {
    client: Client,
}

impl PgStore {
    pub async fn connect(pgconf: &PostgresConfig) -> Result<Self, StoreError> {
        tracing::debug!("connecting to postgres");
        let (client, connection) = tokio_postgres::connect(&pgconf.connection_uri, NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("connection error: {e}");
            }
        });

        Ok(Self { client })
    }
}

#[async_trait]
impl RecordStore for PgStore {
    type Tx<'a> = PgTransaction<'a>;

    async fn begin<'a>(&'a mut self) -> Result<PgTransaction<'a>, StoreError> {
        tracing::trace!("starting transaction");
        let pgtx = self.client.transaction().await?;
        Ok(PgTransaction { pgtx })
    }
}

pub struct PgTransaction<'a> {
    pgtx: Transaction<'a>,
}

#[async_trait]
impl<'a> StoreTransaction for PgTransaction<'a> {
    async fn fetch_charts(&mut self) -> Result<Vec<ChartRecord>, StoreError> {
        tracing::trace!("fetching charts");
        let qry = "
            select id
                , config
            from charts
            order by id;";
        let rows = self.pgtx.query(qry, &[]).await?;
        let charts = rows
            .iter()
            .map(ChartRecord::try_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(charts)
    }

    async fn save_chart(&mut self, chart: &ChartRecord) -> Result<(), StoreError> {
        tracing::trace!("saving chart {}", chart.id);
        let sql = "update charts set config = $1 where id = $2;";
        let n_modified = self
            .pgtx
            .execute(sql, &[&chart.config, &chart.id])
            .await?;
        if n_modified == 0 {
            return Err(StoreError::ChartNotFound(chart.id));
        }
        Ok(())
    }

    async fn is_applied(&mut self, app: AppLabel, name: MigrationName) -> Result<bool, StoreError> {
        tracing::trace!("checking ledger for {app}.{name}");
        let qry = "
            select exists(
                select *
                from django_migrations
                where app = $1 and name = $2
            );";
        let row = self.pgtx.query_one(qry, &[&app, &name]).await?;
        Ok(row.get(0))
    }

    async fn record_applied(&mut self, app: AppLabel, name: MigrationName) -> Result<(), StoreError> {
        tracing::trace!("recording {app}.{name}");
        let sql = "
            insert into django_migrations (app, name, applied)
            values ($1, $2, now());";
        self.pgtx.execute(sql, &[&app, &name]).await?;
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        tracing::trace!("committing transaction");
        Ok(self.pgtx.commit().await?)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        tracing::trace!("rolling back transaction");
        Ok(self.pgtx.rollback().await?)
    }
}
