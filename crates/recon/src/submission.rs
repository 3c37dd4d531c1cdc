//! Intake rows and attendee-name parsing.

use crate::config::{cell, IntakeLayout};
use crate::model::POSTED;
use crate::store::Row;

/// One row of the intake table, read through the layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionRow {
    /// 1-based sheet row number (header = row 1).
    pub row_number: usize,
    pub activity_key: String,
    pub name_slots: Vec<String>,
    /// Free-text "missed names" field, appended after the slots.
    pub missed: String,
    pub status: String,
    pub overrides: RawOverrides,
}

/// Override cells as typed into the sheet. Empty means "use the activity default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOverrides {
    pub nights: String,
    pub miles: String,
    pub service: String,
}

impl SubmissionRow {
    pub fn from_cells(row_number: usize, cells: &[String], layout: &IntakeLayout) -> Self {
        Self {
            row_number,
            activity_key: cell(cells, layout.activity_key).to_string(),
            name_slots: layout.name_columns().map(|col| cell(cells, col).to_string()).collect(),
            missed: cell(cells, layout.missed).to_string(),
            status: cell(cells, layout.status).to_string(),
            overrides: RawOverrides {
                nights: cell(cells, layout.override_nights).to_string(),
                miles: cell(cells, layout.override_miles).to_string(),
                service: cell(cells, layout.override_service).to_string(),
            },
        }
    }

    /// Exact match on the marker; "posted" or " Posted" are still pending.
    pub fn is_posted(&self) -> bool {
        self.status == POSTED
    }

    /// 0-based index into the stored rows.
    pub fn store_index(&self) -> usize {
        self.row_number - 1
    }
}

/// Read every intake row after the header.
pub fn read_submissions(rows: &[Row], layout: &IntakeLayout) -> Vec<SubmissionRow> {
    rows.iter()
        .enumerate()
        .skip(1)
        .map(|(idx, cells)| SubmissionRow::from_cells(idx + 1, cells, layout))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSubmission {
    /// Raw key; the reconciler normalizes it.
    pub activity_key: String,
    /// In submission order, duplicates kept.
    pub names: Vec<String>,
}

/// Extract the activity key and attendee names. `None` when the row has
/// neither an activity key nor any name text.
pub fn parse_submission(row: &SubmissionRow) -> Option<ParsedSubmission> {
    let raw = raw_name_text(row);
    if row.activity_key.is_empty() && raw.is_empty() {
        return None;
    }
    Some(ParsedSubmission { activity_key: row.activity_key.clone(), names: split_names(&raw) })
}

/// Every non-empty slot followed by a comma, then the raw missed field:
/// `slot1,slot2,...,slotN,missed`.
pub fn raw_name_text(row: &SubmissionRow) -> String {
    let mut raw = String::new();
    for slot in row.name_slots.iter().filter(|s| !s.is_empty()) {
        raw.push_str(slot);
        raw.push(',');
    }
    raw.push_str(&row.missed);
    raw
}

/// Split on commas, trim, drop empties and the status marker.
pub fn split_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != POSTED)
        .map(String::from)
        .collect()
}
