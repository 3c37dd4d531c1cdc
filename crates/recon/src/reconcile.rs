//! Resolve one submission against the reference maps.

use crate::model::{ActivityRecord, AttendanceRecord, Diagnostic, OverrideField, Quantity};
use crate::reference::{normalize_key, ActivityMap, MemberMap};
use crate::submission::{ParsedSubmission, SubmissionRow};

#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// The activity resolved; the row counts as processed even when no
    /// name matched. `warnings` holds the unmatched names.
    Resolved {
        records: Vec<AttendanceRecord>,
        warnings: Vec<Diagnostic>,
    },
    /// The row cannot be posted as submitted and stays pending.
    Rejected(Diagnostic),
}

/// Per-submission numbers after applying overrides.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Amounts {
    nights: Quantity,
    miles: Quantity,
    service: Quantity,
}

pub fn reconcile(
    row: &SubmissionRow,
    parsed: &ParsedSubmission,
    activities: &ActivityMap,
    members: &MemberMap,
) -> Reconciliation {
    let key = normalize_key(&parsed.activity_key);
    let Some(activity) = activities.get(&key) else {
        return Reconciliation::Rejected(Diagnostic::UnresolvedActivity { row: row.row_number, key });
    };

    let amounts = match resolve_amounts(row, activity) {
        Ok(amounts) => amounts,
        Err(diagnostic) => return Reconciliation::Rejected(diagnostic),
    };

    let mut records = Vec::with_capacity(parsed.names.len());
    let mut warnings = Vec::new();

    for name in &parsed.names {
        match members.get(name) {
            Some(member) => records.push(AttendanceRecord {
                event_id: activity.id.clone(),
                event_date: activity.date.clone(),
                member_name: member.display_name.clone(),
                member_id: member.id.clone(),
                nights: amounts.nights,
                miles: amounts.miles,
                service: amounts.service,
            }),
            None => warnings.push(Diagnostic::UnresolvedMember { row: row.row_number, name: name.clone() }),
        }
    }

    Reconciliation::Resolved { records, warnings }
}

fn resolve_amounts(row: &SubmissionRow, activity: &ActivityRecord) -> Result<Amounts, Diagnostic> {
    let o = &row.overrides;
    Ok(Amounts {
        nights: pick(row.row_number, OverrideField::Nights, &o.nights, activity.nights)?,
        miles: pick(row.row_number, OverrideField::Miles, &o.miles, activity.miles)?,
        service: pick(row.row_number, OverrideField::Service, &o.service, activity.service)?,
    })
}

/// Any non-empty override wins over the default, "0" included.
fn pick(row: usize, field: OverrideField, raw: &str, default: Quantity) -> Result<Quantity, Diagnostic> {
    if raw.is_empty() {
        return Ok(default);
    }
    raw.parse().map_err(|_| Diagnostic::InvalidOverride { row, field, value: raw.to_string() })
}
