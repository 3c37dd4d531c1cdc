use std::ops::RangeInclusive;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::store::TableId;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostingConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub tables: TablePaths,
    #[serde(default)]
    pub intake: IntakeLayout,
    #[serde(default)]
    pub activities: ActivityLayout,
    #[serde(default)]
    pub roster: RosterLayout,
}

fn default_name() -> String {
    "attendance".into()
}

/// Table locations. Relative paths are resolved against the config file's
/// directory by the caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TablePaths {
    pub intake: String,
    pub activities: String,
    pub roster: String,
    pub ledger: String,
}

impl TablePaths {
    pub fn path_for(&self, table: TableId) -> &str {
        match table {
            TableId::Intake => &self.intake,
            TableId::Activities => &self.activities,
            TableId::Roster => &self.roster,
            TableId::Ledger => &self.ledger,
        }
    }
}

// ---------------------------------------------------------------------------
// Column layouts (0-based column indexes)
// ---------------------------------------------------------------------------

/// Intake table: Timestamp, Email, ActivityKey, Patrol, Name1..Name5,
/// MissedNames, Status, OverrideNights, OverrideMiles, OverrideService.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntakeLayout {
    pub activity_key: usize,
    pub names: ColumnRange,
    pub missed: usize,
    pub status: usize,
    pub override_nights: usize,
    pub override_miles: usize,
    pub override_service: usize,
}

impl Default for IntakeLayout {
    fn default() -> Self {
        Self {
            activity_key: 2,
            names: ColumnRange { start: 4, end: 8 },
            missed: 9,
            status: 10,
            override_nights: 11,
            override_miles: 12,
            override_service: 13,
        }
    }
}

impl IntakeLayout {
    pub fn name_columns(&self) -> RangeInclusive<usize> {
        self.names.start..=self.names.end
    }
}

/// Inclusive, contiguous run of columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnRange {
    pub start: usize,
    pub end: usize,
}

/// Activity table: EventId, Date, Activity, Type, Status, Nights,
/// ServiceHours, Miles.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActivityLayout {
    /// Column matched against submission activity keys.
    pub key: usize,
    /// Column copied into the ledger as the event id.
    pub id: usize,
    pub date: usize,
    pub nights: usize,
    pub service: usize,
    pub miles: usize,
}

impl Default for ActivityLayout {
    fn default() -> Self {
        Self { key: 0, id: 0, date: 1, nights: 5, service: 6, miles: 7 }
    }
}

/// Roster table: FullName, MemberId, PatrolId, ...
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RosterLayout {
    /// Column matched against submitted names.
    pub key: usize,
    /// Column copied into the ledger as the member name.
    pub name: usize,
    pub id: usize,
}

impl Default for RosterLayout {
    fn default() -> Self {
        Self { key: 0, name: 0, id: 1 }
    }
}

/// Cell text at `col`, empty when the row is shorter.
pub(crate) fn cell(row: &[String], col: usize) -> &str {
    row.get(col).map(String::as_str).unwrap_or("")
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

const STARTER_TOML: &str = r#"# rollcall posting config
name = "attendance"

# Paths are relative to this file.
[tables]
intake = "form-responses.csv"
activities = "db-activities.csv"
roster = "db-roster.csv"
ledger = "db-attendance.csv"

# Column positions are 0-based (A = 0). The values below are the defaults;
# delete a section to keep them.
[intake]
activity_key = 2
names = { start = 4, end = 8 }
missed = 9
status = 10
override_nights = 11
override_miles = 12
override_service = 13

[activities]
key = 0
id = 0
date = 1
nights = 5
service = 6
miles = 7

[roster]
key = 0
name = 0
id = 1
"#;

impl PostingConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: PostingConfig = toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Commented starter config with the default layout.
    pub fn default_toml() -> &'static str {
        STARTER_TOML
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for table in TableId::ALL {
            if self.tables.path_for(table).trim().is_empty() {
                return Err(ConfigError::Validation(format!("tables.{table}: path is empty")));
            }
        }

        let intake = &self.intake;
        if intake.names.start > intake.names.end {
            return Err(ConfigError::Validation(format!(
                "intake.names: start ({}) is after end ({})",
                intake.names.start, intake.names.end
            )));
        }

        // The status column is written back, so it must not share a column
        // with anything read from the submission.
        if intake.name_columns().contains(&intake.status) {
            return Err(ConfigError::Validation(format!(
                "intake.status ({}) falls inside the name columns {}..={}",
                intake.status, intake.names.start, intake.names.end
            )));
        }
        let inputs = [
            ("activity_key", intake.activity_key),
            ("missed", intake.missed),
            ("override_nights", intake.override_nights),
            ("override_miles", intake.override_miles),
            ("override_service", intake.override_service),
        ];
        if let Some((field, _)) = inputs.iter().find(|(_, col)| *col == intake.status) {
            return Err(ConfigError::Validation(format!(
                "intake.status ({}) is the same column as intake.{field}",
                intake.status
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
name = "Troop 42"

[tables]
intake = "form.csv"
activities = "activities.csv"
roster = "roster.csv"
ledger = "attendance.csv"
"#;

    #[test]
    fn parse_minimal_uses_default_layout() {
        let config = PostingConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.name, "Troop 42");
        assert_eq!(config.tables.path_for(TableId::Ledger), "attendance.csv");
        assert_eq!(config.intake, IntakeLayout::default());
        assert_eq!(config.intake.name_columns(), 4..=8);
        assert_eq!(config.activities.miles, 7);
        assert_eq!(config.roster.id, 1);
    }

    #[test]
    fn name_defaults_when_missing() {
        let input = MINIMAL.replace("name = \"Troop 42\"", "");
        let config = PostingConfig::from_toml(&input).unwrap();
        assert_eq!(config.name, "attendance");
    }

    #[test]
    fn partial_layout_section_keeps_other_defaults() {
        let input = format!("{MINIMAL}\n[intake]\nstatus = 14\n");
        let config = PostingConfig::from_toml(&input).unwrap();
        assert_eq!(config.intake.status, 14);
        assert_eq!(config.intake.activity_key, 2);
        assert_eq!(config.intake.names, ColumnRange { start: 4, end: 8 });
    }

    #[test]
    fn starter_config_is_valid() {
        let config = PostingConfig::from_toml(PostingConfig::default_toml()).unwrap();
        assert_eq!(config.intake, IntakeLayout::default());
        assert_eq!(config.activities, ActivityLayout::default());
        assert_eq!(config.roster, RosterLayout::default());
    }

    #[test]
    fn reject_status_inside_name_columns() {
        let input = format!("{MINIMAL}\n[intake]\nstatus = 6\n");
        let err = PostingConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("inside the name columns"), "{err}");
    }

    #[test]
    fn reject_status_on_override_column() {
        let input = format!("{MINIMAL}\n[intake]\nstatus = 12\n");
        let err = PostingConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("intake.override_miles"), "{err}");
    }

    #[test]
    fn reject_inverted_name_range() {
        let input = format!("{MINIMAL}\n[intake]\nnames = {{ start = 8, end = 4 }}\n");
        let err = PostingConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("start (8) is after end (4)"), "{err}");
    }

    #[test]
    fn reject_empty_table_path() {
        let input = MINIMAL.replace("\"roster.csv\"", "\"  \"");
        let err = PostingConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("tables.roster"), "{err}");
    }

    #[test]
    fn reject_unknown_field() {
        let input = format!("{MINIMAL}\n[roster]\npatrol = 2\n");
        let err = PostingConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn reject_missing_tables() {
        let err = PostingConfig::from_toml("name = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn cell_reads_past_end_as_empty() {
        let row = vec!["a".to_string()];
        assert_eq!(cell(&row, 0), "a");
        assert_eq!(cell(&row, 5), "");
    }
}
