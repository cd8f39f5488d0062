//! Per-run record of filler applications.

use crate::pipeline::ImputationStep;
use crate::types::{ColumnImputationRecord, ColumnImputationSummary, FillerKind};
use serde::Serialize;

/// Ordered record of what one pipeline run filled.
///
/// Built by the pipeline during the run and handed back by value; it cannot
/// be modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImputationReport {
    records: Vec<ColumnImputationRecord>,
    missing_before: usize,
    missing_after: usize,
}

impl ImputationReport {
    pub(crate) fn new(missing_before: usize) -> Self {
        Self {
            records: Vec::new(),
            missing_before,
            missing_after: missing_before,
        }
    }

    pub(crate) fn push(&mut self, record: ColumnImputationRecord) {
        self.records.push(record);
    }

    pub(crate) fn finish(mut self, missing_after: usize) -> Self {
        self.missing_after = missing_after;
        self
    }

    /// All records in the order they were produced.
    pub fn records(&self) -> &[ColumnImputationRecord] {
        &self.records
    }

    /// Records touching one column, in step order.
    pub fn records_for(&self, column: &str) -> Vec<&ColumnImputationRecord> {
        self.records.iter().filter(|r| r.column == column).collect()
    }

    /// One entry per column that had cells filled, in order of first fill.
    pub fn column_summaries(&self) -> Vec<ColumnImputationSummary> {
        let mut summaries: Vec<ColumnImputationSummary> = Vec::new();
        for record in self.records.iter().filter(|r| r.filled > 0) {
            let index = match summaries.iter().position(|s| s.column == record.column) {
                Some(index) => index,
                None => {
                    summaries.push(ColumnImputationSummary {
                        column: record.column.clone(),
                        mechanism: record.mechanism,
                        fillers: Vec::new(),
                        filled: 0,
                    });
                    summaries.len() - 1
                }
            };

            let summary = &mut summaries[index];
            if !summary.fillers.contains(&record.filler) {
                summary.fillers.push(record.filler);
            }
            summary.filled += record.filled;
        }
        summaries
    }

    /// Records produced by one step.
    pub fn records_for_step(&self, step: ImputationStep) -> Vec<&ColumnImputationRecord> {
        self.records.iter().filter(|r| r.step == step).collect()
    }

    /// Missing cells in the table handed to the pipeline.
    pub fn missing_before(&self) -> usize {
        self.missing_before
    }

    /// Missing cells in the table handed back. Zero for a successful run.
    pub fn missing_after(&self) -> usize {
        self.missing_after
    }

    /// Sum of cells filled across all records.
    pub fn cells_filled(&self) -> usize {
        self.records.iter().map(|r| r.filled).sum()
    }

    /// Cells filled by a given filler.
    pub fn filled_by(&self, filler: FillerKind) -> usize {
        self.records
            .iter()
            .filter(|r| r.filler == filler)
            .map(|r| r.filled)
            .sum()
    }

    /// Percentage of originally missing cells that were resolved.
    pub fn resolution_rate(&self) -> f64 {
        if self.missing_before == 0 {
            return 100.0;
        }
        let resolved = self.missing_before.saturating_sub(self.missing_after);
        resolved as f64 / self.missing_before as f64 * 100.0
    }
}
