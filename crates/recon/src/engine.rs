use crate::batch::run_batch;
use crate::config::PostingConfig;
use crate::error::PostingError;
use crate::model::{BatchReport, Diagnostic, ReportMeta, LEDGER_HEADER, POSTED};
use crate::reference::{load_activity_map, load_member_map, ActivityMap, MemberMap};
use crate::store::{CellUpdate, Row, TableId, TableStore};
use crate::submission::{read_submissions, SubmissionRow};

#[derive(Debug, Clone, Copy, Default)]
pub struct PostOptions {
    /// Compute the report without appending or marking anything.
    pub dry_run: bool,
}

/// Both lookup maps, loaded fresh for one run.
#[derive(Debug, Clone, Default)]
pub struct References {
    pub activities: ActivityMap,
    pub members: MemberMap,
    pub warnings: Vec<Diagnostic>,
}

pub fn load_references(store: &dyn TableStore, config: &PostingConfig) -> Result<References, PostingError> {
    let activity_rows = store.read_all_rows(TableId::Activities)?;
    let roster_rows = store.read_all_rows(TableId::Roster)?;

    let activities = load_activity_map(&activity_rows, &config.activities);
    let members = load_member_map(&roster_rows, &config.roster);

    let mut warnings = activities.warnings;
    warnings.extend(members.warnings);

    Ok(References { activities: activities.map, members: members.map, warnings })
}

pub fn load_submissions(store: &dyn TableStore, config: &PostingConfig) -> Result<Vec<SubmissionRow>, PostingError> {
    let rows = store.read_all_rows(TableId::Intake)?;
    Ok(read_submissions(&rows, &config.intake))
}

/// Run one posting pass against `store`: load the reference maps, reconcile
/// every pending intake row, append the records to the ledger and mark the
/// processed rows "Posted".
pub fn post_pending(
    store: &mut dyn TableStore,
    config: &PostingConfig,
    options: &PostOptions,
) -> Result<BatchReport, PostingError> {
    let references = load_references(store, config)?;
    let submissions = load_submissions(store, config)?;
    log::info!(
        "processing {} intake row(s) against {} activities and {} members",
        submissions.len(),
        references.activities.len(),
        references.members.len()
    );

    let status_col = config.intake.status;
    let outcome = if options.dry_run {
        run_batch(&submissions, &references.activities, &references.members, |_| Ok(()), |_| Ok(()))?
    } else {
        // Both closures need the store; the batch calls them one after the other.
        let store = std::cell::RefCell::new(store);
        run_batch(
            &submissions,
            &references.activities,
            &references.members,
            |records| {
                let mut store = store.borrow_mut();
                let mut rows: Vec<Row> = Vec::with_capacity(records.len() + 1);
                if store.last_row_index(TableId::Ledger)? == 0 {
                    rows.push(LEDGER_HEADER.iter().map(|h| h.to_string()).collect());
                }
                rows.extend(records.iter().map(|r| r.to_row()));
                store.append_rows(TableId::Ledger, &rows)
            },
            |row_numbers| {
                let updates: Vec<CellUpdate> = row_numbers
                    .iter()
                    .map(|&row| CellUpdate { row: row - 1, col: status_col, value: POSTED.to_string() })
                    .collect();
                store.borrow_mut().set_cells(TableId::Intake, &updates)
            },
        )?
    };

    let mut summary = outcome.summary;
    summary.reference_warnings = references.warnings.len();

    let mut diagnostics = references.warnings;
    diagnostics.extend(outcome.diagnostics);

    Ok(BatchReport {
        meta: ReportMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            dry_run: options.dry_run,
        },
        summary,
        posted_rows: outcome.posted_rows,
        records: outcome.records,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn config() -> PostingConfig {
        PostingConfig::from_toml(
            r#"
name = "unit"
[tables]
intake = "i.csv"
activities = "a.csv"
roster = "r.csv"
ledger = "l.csv"
"#,
        )
        .unwrap()
    }

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_table(
                TableId::Activities,
                [
                    vec!["EventId", "Date", "Activity", "Type", "Status", "Nights", "ServiceHours", "Miles"],
                    vec!["CAMP1", "2024-05-01", "Camp", "", "", "2", "0", "50"],
                ],
            )
            .with_table(TableId::Roster, [vec!["FullName", "MemberId"], vec!["Alice Smith", "S001"]])
            .with_table(
                TableId::Intake,
                [
                    vec!["Timestamp", "Email", "Key", "Patrol", "N1", "N2", "N3", "N4", "N5", "Missed", "Status"],
                    vec!["t", "e", "CAMP1", "", "Alice Smith", "", "", "", "", "", ""],
                ],
            )
    }

    #[test]
    fn empty_ledger_gets_header_first() {
        let mut store = store();
        post_pending(&mut store, &config(), &PostOptions::default()).unwrap();
        let ledger = store.table(TableId::Ledger);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0], LEDGER_HEADER.to_vec());
        assert_eq!(ledger[1], vec!["CAMP1", "2024-05-01", "Alice Smith", "S001", "2", "50", "0"]);
    }

    #[test]
    fn existing_ledger_is_appended_without_header() {
        let mut store = store().with_table(TableId::Ledger, [LEDGER_HEADER.to_vec(), vec!["OLD", "", "", "", "", "", ""]]);
        post_pending(&mut store, &config(), &PostOptions::default()).unwrap();
        let ledger = store.table(TableId::Ledger);
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger[1][0], "OLD");
        assert_eq!(ledger[2][0], "CAMP1");
    }

    #[test]
    fn status_written_past_short_row_end() {
        let mut store = store();
        post_pending(&mut store, &config(), &PostOptions::default()).unwrap();
        assert_eq!(store.table(TableId::Intake)[1][10], POSTED);
    }

    #[test]
    fn dry_run_leaves_store_untouched() {
        let mut store = store();
        let before = store.clone();
        let report = post_pending(&mut store, &config(), &PostOptions { dry_run: true }).unwrap();
        assert!(report.meta.dry_run);
        assert_eq!(report.summary.posted_rows, 1);
        assert_eq!(report.records.len(), 1);
        assert!(store.table(TableId::Ledger).is_empty());
        assert_eq!(store.table(TableId::Intake), before.table(TableId::Intake));
    }

    #[test]
    fn reference_warnings_lead_the_diagnostics() {
        let mut store = store().with_table(TableId::Roster, [vec!["FullName", "MemberId"], vec!["Short"], vec!["Alice Smith", "S001"]]);
        let report = post_pending(&mut store, &config(), &PostOptions::default()).unwrap();
        assert_eq!(report.summary.reference_warnings, 1);
        assert!(matches!(report.diagnostics[0], Diagnostic::MalformedReferenceRow { table: TableId::Roster, row: 2, .. }));
        assert_eq!(report.meta.config_name, "unit");
    }
}
