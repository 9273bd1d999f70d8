//! Before/after dumps of rewritten chart selections.
use std::io::Write;

use serde_json::Value;

use crate::selection::SelectionEntry;
use crate::types::ChartId;

/// Receives a dump of every rewritten chart, before it is saved.
///
/// Sinks are observational only and cannot fail a migration.
pub trait DiagnosticSink: Send {
    fn rewritten(&mut self, chart_id: ChartId, legacy: &Value, selection: &[SelectionEntry]);
}

/// Emits dumps as debug events.
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn rewritten(&mut self, chart_id: ChartId, legacy: &Value, selection: &[SelectionEntry]) {
        tracing::debug!(chart_id, %legacy, "legacy selection");
        match serde_json::to_string(selection) {
            Ok(json) => tracing::debug!(chart_id, selection = %json, "new selection"),
            Err(e) => tracing::warn!(chart_id, "could not render new selection: {e}"),
        }
    }
}

/// Writes the legacy array, the new array and a blank line per chart.
pub struct WriterSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn dump(&mut self, legacy: &Value, selection: &[SelectionEntry]) -> std::io::Result<()> {
        writeln!(self.writer, "{legacy}")?;
        serde_json::to_writer(&mut self.writer, selection)?;
        writeln!(self.writer)?;
        writeln!(self.writer)?;
        self.writer.flush()
    }
}

impl<W: Write + Send> DiagnosticSink for WriterSink<W> {
    fn rewritten(&mut self, chart_id: ChartId, legacy: &Value, selection: &[SelectionEntry]) {
        if let Err(e) = self.dump(legacy, selection) {
            tracing::warn!(chart_id, "failed writing diagnostics: {e}");
        }
    }
}
