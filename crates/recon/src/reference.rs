//! Lookup maps built from the activity catalog and the member roster.
//!
//! Keys are normalized by trimming. Keys that normalize identically collide
//! and the later row wins; there is no duplicate detection.

use std::collections::HashMap;

use crate::config::{cell, ActivityLayout, RosterLayout};
use crate::model::{ActivityRecord, Diagnostic, MemberRecord, Quantity};
use crate::store::{Row, TableId};

pub type ActivityMap = HashMap<String, ActivityRecord>;
pub type MemberMap = HashMap<String, MemberRecord>;

/// A lookup map plus the reference rows skipped while building it.
#[derive(Debug, Clone, Default)]
pub struct Loaded<M> {
    pub map: M,
    pub warnings: Vec<Diagnostic>,
}

pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_string()
}

/// Build the activity map. Skips the header and rows with an empty key.
/// Blank numeric cells count as 0; unreadable ones count as 0 with a
/// warning naming the field, and the activity stays in the map.
pub fn load_activity_map(rows: &[Row], layout: &ActivityLayout) -> Loaded<ActivityMap> {
    let mut loaded = Loaded::<ActivityMap>::default();

    for (idx, row) in rows.iter().enumerate().skip(1) {
        let key = cell(row, layout.key);
        if key.is_empty() {
            continue;
        }

        let activity = parse_activity(row, layout, idx + 1, &mut loaded.warnings);
        loaded.map.insert(normalize_key(key), activity);
    }

    log::debug!("loaded {} activities", loaded.map.len());
    loaded
}

/// Build the roster map. Skips the header, rows too short to hold both the
/// key and id columns, and rows with an empty key.
pub fn load_member_map(rows: &[Row], layout: &RosterLayout) -> Loaded<MemberMap> {
    let mut loaded = Loaded::<MemberMap>::default();
    let required = layout.key.max(layout.id) + 1;

    for (idx, row) in rows.iter().enumerate().skip(1) {
        if row.len() < required {
            let diagnostic = Diagnostic::MalformedReferenceRow {
                table: TableId::Roster,
                row: idx + 1,
                reason: format!("skipped, row has {} column(s), {required} required", row.len()),
            };
            diagnostic.log();
            loaded.warnings.push(diagnostic);
            continue;
        }

        let key = cell(row, layout.key);
        if key.is_empty() {
            continue;
        }

        loaded.map.insert(
            normalize_key(key),
            MemberRecord {
                id: cell(row, layout.id).to_string(),
                display_name: cell(row, layout.name).to_string(),
            },
        );
    }

    log::debug!("loaded {} roster members", loaded.map.len());
    loaded
}

fn parse_activity(
    row: &[String],
    layout: &ActivityLayout,
    sheet_row: usize,
    warnings: &mut Vec<Diagnostic>,
) -> ActivityRecord {
    let mut quantity = |col: usize, label: &str| {
        reference_quantity(cell(row, col)).unwrap_or_else(|e| {
            let diagnostic = Diagnostic::MalformedReferenceRow {
                table: TableId::Activities,
                row: sheet_row,
                reason: format!("{label}: {e}, counted as 0"),
            };
            diagnostic.log();
            warnings.push(diagnostic);
            Quantity::ZERO
        })
    };

    ActivityRecord {
        id: cell(row, layout.id).to_string(),
        date: cell(row, layout.date).to_string(),
        nights: quantity(layout.nights, "nights"),
        service: quantity(layout.service, "service"),
        miles: quantity(layout.miles, "miles"),
    }
}

fn reference_quantity(raw: &str) -> Result<Quantity, crate::model::QuantityError> {
    if raw.trim().is_empty() {
        return Ok(Quantity::ZERO);
    }
    raw.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Row> {
        data.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect()
    }

    const ACTIVITY_HEADER: &[&str] =
        &["EventId", "Date", "Activity", "Type", "Status", "Nights", "ServiceHours", "Miles"];

    #[test]
    fn activity_map_reads_default_layout() {
        let table = rows(&[
            ACTIVITY_HEADER,
            &["CAMP1", "2024-05-01", "Spring Camp", "Camping", "Done", "2", "0", "50"],
        ]);
        let loaded = load_activity_map(&table, &ActivityLayout::default());
        let camp = &loaded.map["CAMP1"];
        assert_eq!(camp.id, "CAMP1");
        assert_eq!(camp.date, "2024-05-01");
        assert_eq!(camp.nights.value(), 2.0);
        assert_eq!(camp.service, Quantity::ZERO);
        assert_eq!(camp.miles.value(), 50.0);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn header_row_is_never_a_key() {
        let table = rows(&[ACTIVITY_HEADER]);
        let loaded = load_activity_map(&table, &ActivityLayout::default());
        assert!(loaded.map.is_empty());
    }

    #[test]
    fn blank_numerics_default_to_zero() {
        let table = rows(&[ACTIVITY_HEADER, &["HIKE", "2024-06-01", "Hike", "", "", "", ""]]);
        let loaded = load_activity_map(&table, &ActivityLayout::default());
        let hike = &loaded.map["HIKE"];
        assert_eq!(hike.nights, Quantity::ZERO);
        assert_eq!(hike.service, Quantity::ZERO);
        // Miles column is past the end of this row.
        assert_eq!(hike.miles, Quantity::ZERO);
    }

    #[test]
    fn keys_are_trimmed_and_last_write_wins() {
        let table = rows(&[
            ACTIVITY_HEADER,
            &["CAMP1", "2024-05-01", "", "", "", "1", "", ""],
            &["  CAMP1 ", "2024-05-02", "", "", "", "3", "", ""],
        ]);
        let loaded = load_activity_map(&table, &ActivityLayout::default());
        assert_eq!(loaded.map.len(), 1);
        let camp = &loaded.map["CAMP1"];
        assert_eq!(camp.date, "2024-05-02");
        assert_eq!(camp.nights.value(), 3.0);
        // Saved id is the raw cell, not the normalized key.
        assert_eq!(camp.id, "  CAMP1 ");
    }

    #[test]
    fn keys_differing_in_case_do_not_collide() {
        let table = rows(&[ACTIVITY_HEADER, &["camp1", "a"], &["CAMP1", "b"]]);
        let loaded = load_activity_map(&table, &ActivityLayout::default());
        assert_eq!(loaded.map.len(), 2);
    }

    #[test]
    fn empty_activity_key_is_skipped_silently() {
        let table = rows(&[ACTIVITY_HEADER, &["", "2024-05-01", "Orphan", "", "", "9"]]);
        let loaded = load_activity_map(&table, &ActivityLayout::default());
        assert!(loaded.map.is_empty());
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn non_numeric_activity_value_counts_as_zero_with_warning() {
        let table = rows(&[
            ACTIVITY_HEADER,
            &["CAMP1", "2024-05-01", "", "", "", "two", "1", "TBD"],
            &["HIKE", "2024-06-01", "", "", "", "0", "", "5"],
        ]);
        let loaded = load_activity_map(&table, &ActivityLayout::default());
        let camp = &loaded.map["CAMP1"];
        assert_eq!(camp.nights, Quantity::ZERO);
        assert_eq!(camp.service.value(), 1.0);
        assert_eq!(camp.miles, Quantity::ZERO);
        assert!(loaded.map.contains_key("HIKE"));

        let reasons: Vec<&str> = loaded
            .warnings
            .iter()
            .map(|w| match w {
                Diagnostic::MalformedReferenceRow { table, row, reason } => {
                    assert_eq!((*table, *row), (TableId::Activities, 2));
                    reason.as_str()
                }
                other => panic!("unexpected diagnostic {other:?}"),
            })
            .collect();
        assert_eq!(reasons.len(), 2);
        assert!(reasons[0].starts_with("nights"), "{}", reasons[0]);
        assert!(reasons[1].starts_with("miles"), "{}", reasons[1]);
    }

    #[test]
    fn member_map_reads_default_layout() {
        let table = rows(&[
            &["FullName", "MemberId", "PatrolId", "Notes"],
            &["Alice Smith", "S001", "FOX", "likes maps"],
            &[" Bob Jones ", "S002", "WOLF"],
        ]);
        let loaded = load_member_map(&table, &RosterLayout::default());
        assert_eq!(loaded.map["Alice Smith"], MemberRecord { id: "S001".into(), display_name: "Alice Smith".into() });
        // Lookup key is trimmed, saved display name is the raw cell.
        assert_eq!(loaded.map["Bob Jones"].display_name, " Bob Jones ");
    }

    #[test]
    fn short_roster_rows_are_skipped() {
        let table = rows(&[&["FullName", "MemberId"], &["Carol"], &["Dan", "S004"]]);
        let loaded = load_member_map(&table, &RosterLayout::default());
        assert!(!loaded.map.contains_key("Carol"));
        assert!(loaded.map.contains_key("Dan"));
        assert_eq!(loaded.warnings.len(), 1);
        assert_eq!(loaded.warnings[0].row(), 2);
    }

    #[test]
    fn roster_row_with_empty_name_is_skipped_silently() {
        let table = rows(&[&["FullName", "MemberId"], &["", "S009"]]);
        let loaded = load_member_map(&table, &RosterLayout::default());
        assert!(loaded.map.is_empty());
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn roster_layout_can_split_key_and_name() {
        let layout = RosterLayout { key: 2, name: 0, id: 1 };
        let table = rows(&[&["Name", "Id", "Nick"], &["Alice Smith", "S001", "Ali"]]);
        let loaded = load_member_map(&table, &layout);
        assert_eq!(loaded.map["Ali"].display_name, "Alice Smith");
    }
}
