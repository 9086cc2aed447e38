use super::model::{EvaluationTable, Field};

/// Row counts around the cleaning step, shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanReport {
    pub before: usize,
    pub after: usize,
}

impl CleanReport {
    pub fn dropped(&self) -> usize {
        self.before - self.after
    }
}

/// Drop every record missing one of the three score fields.
///
/// This is the only stage that discards data, and it is idempotent.
pub fn clean(table: &EvaluationTable) -> (EvaluationTable, CleanReport) {
    let kept = table
        .records
        .iter()
        .filter(|r| Field::SCORES.iter().all(|f| r.has(*f)))
        .cloned()
        .collect();
    let cleaned = table.with_records(kept);

    let report = CleanReport {
        before: table.len(),
        after: cleaned.len(),
    };
    log::info!(
        "Cleaned table: {} rows before, {} after ({} dropped)",
        report.before,
        report.after,
        report.dropped()
    );
    (cleaned, report)
}
