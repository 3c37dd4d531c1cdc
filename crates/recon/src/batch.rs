//! One posting pass over the pending submissions.

use crate::error::{PostingError, StoreError};
use crate::model::{AttendanceRecord, BatchSummary, Diagnostic};
use crate::reconcile::{reconcile, Reconciliation};
use crate::reference::{ActivityMap, MemberMap};
use crate::submission::{parse_submission, SubmissionRow};

#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub summary: BatchSummary,
    /// Every record handed to the ledger append, in submission then name order.
    pub records: Vec<AttendanceRecord>,
    /// Sheet row numbers marked posted, in row order.
    pub posted_rows: Vec<usize>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Reconcile every pending submission, append all records in a single
/// `ledger_append` call, then hand the processed row numbers to
/// `mark_processed`.
///
/// Nothing is written when no record was produced. A failed append marks
/// nothing; a failed mark after a successful append is reported as
/// [`PostingError::MarkPosted`] so the operator knows the ledger moved.
pub fn run_batch<A, M>(
    submissions: &[SubmissionRow],
    activities: &ActivityMap,
    members: &MemberMap,
    ledger_append: A,
    mark_processed: M,
) -> Result<BatchOutcome, PostingError>
where
    A: FnOnce(&[AttendanceRecord]) -> Result<(), StoreError>,
    M: FnOnce(&[usize]) -> Result<(), StoreError>,
{
    let mut summary = BatchSummary::default();
    let mut records = Vec::new();
    let mut processed = Vec::new();
    let mut diagnostics = Vec::new();

    for row in submissions.iter().filter(|row| !row.is_posted()) {
        summary.pending_rows += 1;

        let Some(parsed) = parse_submission(row) else {
            summary.skipped_empty += 1;
            continue;
        };

        match reconcile(row, &parsed, activities, members) {
            Reconciliation::Resolved { records: found, warnings } => {
                log::debug!(
                    "row {}: '{}' -> {} record(s), {} unmatched name(s)",
                    row.row_number,
                    parsed.activity_key.trim(),
                    found.len(),
                    warnings.len()
                );
                for warning in &warnings {
                    warning.log();
                }
                records.extend(found);
                diagnostics.extend(warnings);
                processed.push(row.row_number);
            }
            Reconciliation::Rejected(diagnostic) => {
                diagnostic.log();
                diagnostics.push(diagnostic);
            }
        }
    }

    summary.tally(&diagnostics);

    if records.is_empty() {
        log::info!("nothing to post ({} pending row(s))", summary.pending_rows);
        return Ok(BatchOutcome { summary, records, posted_rows: Vec::new(), diagnostics });
    }

    ledger_append(&records).map_err(PostingError::LedgerAppend)?;
    mark_processed(&processed).map_err(|source| PostingError::MarkPosted {
        appended: records.len(),
        rows: processed.len(),
        source,
    })?;

    summary.posted_rows = processed.len();
    summary.records = records.len();
    log::info!("posted {} staging row(s), {} ledger record(s)", summary.posted_rows, summary.records);

    Ok(BatchOutcome { summary, records, posted_rows: processed, diagnostics })
}
