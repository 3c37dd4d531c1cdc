use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::store::{Row, TableId};

/// Status marker for a reconciled submission. Also filtered out of name
/// lists, where it shows up when the status column leaks into a name slot.
pub const POSTED: &str = "Posted";

/// Header written when posting into an empty ledger.
pub const LEDGER_HEADER: [&str; 7] = ["EventId", "Date", "MemberName", "MemberId", "Nights", "Miles", "Service"];

// ---------------------------------------------------------------------------
// Quantity
// ---------------------------------------------------------------------------

/// Non-negative count of nights, miles or service hours.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct Quantity(f64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0.0);

    /// `None` for negative or non-finite values.
    pub fn new(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        // Fold -0.0 so it prints as "0".
        Some(Self(if value == 0.0 { 0.0 } else { value }))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a non-negative number")]
pub struct QuantityError(pub String);

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<f64>()
            .ok()
            .and_then(Quantity::new)
            .ok_or_else(|| QuantityError(s.to_string()))
    }
}

/// Shortest decimal form of the value: "2" not "2.0", "1.5" for "1.50",
/// "1000" for "1e3". Ledger cells never echo the submitted text.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Reference records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRecord {
    pub id: String,
    pub date: String,
    pub nights: Quantity,
    pub service: Quantity,
    pub miles: Quantity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRecord {
    pub id: String,
    pub display_name: String,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One finalized ledger line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRecord {
    pub event_id: String,
    pub event_date: String,
    pub member_name: String,
    pub member_id: String,
    pub nights: Quantity,
    pub miles: Quantity,
    pub service: Quantity,
}

impl AttendanceRecord {
    /// Ledger column order: EventId, Date, MemberName, MemberId, Nights, Miles, Service.
    pub fn to_row(&self) -> Row {
        vec![
            self.event_id.clone(),
            self.event_date.clone(),
            self.member_name.clone(),
            self.member_id.clone(),
            self.nights.to_string(),
            self.miles.to_string(),
            self.service.to_string(),
        ]
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideField {
    Nights,
    Miles,
    Service,
}

impl fmt::Display for OverrideField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nights => write!(f, "nights"),
            Self::Miles => write!(f, "miles"),
            Self::Service => write!(f, "service"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// A per-row problem found while loading or reconciling. Rows are 1-based
/// sheet row numbers (header = row 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Activity key not in the catalog; the submission stays pending.
    UnresolvedActivity { row: usize, key: String },
    /// Name not in the roster; sibling names still post.
    UnresolvedMember { row: usize, name: String },
    /// Override cell is not a non-negative number; the submission stays pending.
    InvalidOverride { row: usize, field: OverrideField, value: String },
    /// Reference row skipped or partly read while building a lookup map.
    MalformedReferenceRow { table: TableId, row: usize, reason: String },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Self::UnresolvedActivity { .. } | Self::InvalidOverride { .. } => Severity::Error,
            Self::UnresolvedMember { .. } | Self::MalformedReferenceRow { .. } => Severity::Warning,
        }
    }

    pub fn row(&self) -> usize {
        match self {
            Self::UnresolvedActivity { row, .. }
            | Self::UnresolvedMember { row, .. }
            | Self::InvalidOverride { row, .. }
            | Self::MalformedReferenceRow { row, .. } => *row,
        }
    }

    /// Emit through the `log` facade at the diagnostic's severity.
    pub fn log(&self) {
        match self.severity() {
            Severity::Error => log::error!("{self}"),
            Severity::Warning => log::warn!("{self}"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedActivity { row, key } => {
                write!(f, "row {row}: activity key '{key}' not found")
            }
            Self::UnresolvedMember { row, name } => {
                write!(f, "row {row}: member '{name}' not found in roster")
            }
            Self::InvalidOverride { row, field, value } => {
                write!(f, "row {row}: {field} override '{value}' is not a non-negative number")
            }
            Self::MalformedReferenceRow { table, row, reason } => {
                write!(f, "{table} row {row}: {reason}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Summary + Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Submissions not yet posted, blank rows included.
    pub pending_rows: usize,
    pub skipped_empty: usize,
    pub posted_rows: usize,
    pub records: usize,
    pub unresolved_activities: usize,
    pub unresolved_members: usize,
    pub invalid_overrides: usize,
    pub reference_warnings: usize,
}

impl BatchSummary {
    /// Count diagnostics by kind into the summary.
    pub fn tally(&mut self, diagnostics: &[Diagnostic]) {
        for d in diagnostics {
            match d {
                Diagnostic::UnresolvedActivity { .. } => self.unresolved_activities += 1,
                Diagnostic::UnresolvedMember { .. } => self.unresolved_members += 1,
                Diagnostic::InvalidOverride { .. } => self.invalid_overrides += 1,
                Diagnostic::MalformedReferenceRow { .. } => self.reference_warnings += 1,
            }
        }
    }

    /// Rows the operator has to look at: pending submissions or dropped names.
    pub fn has_unresolved(&self) -> bool {
        self.unresolved_activities > 0 || self.unresolved_members > 0 || self.invalid_overrides > 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub meta: ReportMeta,
    pub summary: BatchSummary,
    /// Sheet row numbers marked posted, in row order.
    pub posted_rows: Vec<usize>,
    pub records: Vec<AttendanceRecord>,
    pub diagnostics: Vec<Diagnostic>,
}
