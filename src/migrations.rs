//! Data migrations of the grapher_admin app.
//!
//! Applied migrations are recorded in the `django_migrations` ledger.
//! Each migration runs in its own transaction, together with its ledger
//! entry, so it is applied entirely or not at all.
use crate::diagnostics::DiagnosticSink;
use crate::selection::SelectionError;
use crate::store::RecordStore;
use crate::store::StoreError;
use crate::store::StoreTransaction;
use crate::types::AppLabel;
use crate::types::ChartId;
use crate::types::MigrationName;

pub mod mig_0005;

pub const APP: AppLabel = "grapher_admin";

pub struct MigrationDef {
    pub name: MigrationName,
    /// Migrations of the same app that must have been applied first
    pub dependencies: &'static [MigrationName],
}

pub const MIGRATIONS: &[MigrationDef] = &[MigrationDef {
    name: mig_0005::NAME,
    dependencies: &["0004_axis_config_cleanup"],
}];

#[derive(thiserror::Error, Debug)]
pub enum MigrationError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to rewrite chart {id}")]
    Chart {
        id: ChartId,
        #[source]
        source: SelectionError,
    },
    #[error("migration {migration} depends on {dependency}, which has not been applied")]
    UnmetDependency {
        migration: MigrationName,
        dependency: MigrationName,
    },
    #[error("database is {0} migration(s) behind, run with the -m option to allow migrations to be applied")]
    NotAllowed(usize),
    #[error("attempted to apply unknown migration {0}")]
    Unknown(MigrationName),
}

/// Returns registered migrations missing from the ledger, in order.
pub async fn pending<S: RecordStore>(
    store: &mut S,
) -> Result<Vec<&'static MigrationDef>, MigrationError> {
    let mut tx = store.begin().await?;
    let mut pending = vec![];
    for def in MIGRATIONS {
        if !tx.is_applied(APP, def.name).await? {
            pending.push(def);
        }
    }
    tx.rollback().await?;
    Ok(pending)
}

/// Check ledger and apply pending migrations if allowed.
///
/// Returns the names of applied migrations.
pub async fn check<S: RecordStore>(
    store: &mut S,
    allow_migrations: bool,
    sink: &mut dyn DiagnosticSink,
) -> Result<Vec<MigrationName>, MigrationError> {
    let pending = pending(store).await?;
    if pending.is_empty() {
        tracing::info!("{APP} migrations are up to date");
        return Ok(vec![]);
    }
    tracing::info!("{APP} has {} pending migration(s)", pending.len());
    if !allow_migrations {
        return Err(MigrationError::NotAllowed(pending.len()));
    }

    let mut applied = vec![];
    for def in pending {
        apply_migration(store, def, sink).await?;
        applied.push(def.name);
    }
    Ok(applied)
}

/// Apply a single migration and record it in the ledger.
pub async fn apply_migration<S: RecordStore>(
    store: &mut S,
    def: &MigrationDef,
    sink: &mut dyn DiagnosticSink,
) -> Result<(), MigrationError> {
    tracing::info!("applying migration {APP}.{}", def.name);
    let mut tx = store.begin().await?;
    match run(&mut tx, def, sink).await {
        Ok(()) => {
            tx.record_applied(APP, def.name).await?;
            tx.commit().await?;
            tracing::info!("applied migration {APP}.{}", def.name);
            Ok(())
        }
        Err(e) => {
            tracing::error!("migration {APP}.{} failed: {e}", def.name);
            tx.rollback().await?;
            Err(e)
        }
    }
}

async fn run<T: StoreTransaction>(
    tx: &mut T,
    def: &MigrationDef,
    sink: &mut dyn DiagnosticSink,
) -> Result<(), MigrationError> {
    for &dependency in def.dependencies {
        if !tx.is_applied(APP, dependency).await? {
            return Err(MigrationError::UnmetDependency {
                migration: def.name,
                dependency,
            });
        }
    }
    match def.name {
        mig_0005::NAME => {
            mig_0005::apply(tx, sink).await?;
        }
        name => return Err(MigrationError::Unknown(name)),
    };
    Ok(())
}
