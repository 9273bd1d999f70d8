/// Migration 0005
///
/// Selected keys redesign. Replaces the per-entity `selected-countries`
/// list of chart configs with per-series `selection` entries.
use super::MigrationError;
use crate::diagnostics::DiagnosticSink;
use crate::selection;
use crate::store::StoreTransaction;
use crate::types::MigrationName;

pub const NAME: MigrationName = "0005_selected_keys_redesign";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RedesignSummary {
    /// Number of charts inspected
    pub charts: usize,
    pub rewritten: usize,
    /// Charts without a legacy selection
    pub skipped: usize,
    /// Number of selection entries written
    pub entries: usize,
}

/// Rewrite the selection of every chart still using the legacy format.
///
/// Stops at the first failing chart. Saved charts are only visible once
/// the caller commits `tx`.
pub async fn apply<T: StoreTransaction>(
    tx: &mut T,
    sink: &mut dyn DiagnosticSink,
) -> Result<RedesignSummary, MigrationError> {
    let charts = tx.fetch_charts().await?;
    let mut summary = RedesignSummary {
        charts: charts.len(),
        ..Default::default()
    };

    for mut chart in charts {
        let rewritten = selection::rewrite_config(&chart.config).map_err(|source| {
            MigrationError::Chart {
                id: chart.id,
                source,
            }
        })?;
        let Some((config, rewrite)) = rewritten else {
            tracing::trace!("chart {} has no legacy selection", chart.id);
            summary.skipped += 1;
            continue;
        };

        tracing::trace!(
            "chart {}: {} legacy entities -> {} selection entries",
            chart.id,
            rewrite.legacy.as_array().map_or(0, Vec::len),
            rewrite.selection.len()
        );
        sink.rewritten(chart.id, &rewrite.legacy, &rewrite.selection);

        chart.config = config;
        tx.save_chart(&chart).await?;
        summary.rewritten += 1;
        summary.entries += rewrite.selection.len();
    }

    tracing::info!(
        "rewrote {} of {} charts ({} selection entries, {} skipped)",
        summary.rewritten,
        summary.charts,
        summary.entries,
        summary.skipped
    );
    Ok(summary)
}
