//! `rollcall post|validate|init`: attendance batch posting.

use std::path::{Path, PathBuf};

use rollcall_io::CsvStore;
use rollcall_recon::engine::{load_references, load_submissions, post_pending, PostOptions};
use rollcall_recon::{BatchReport, MemoryStore, PostingConfig, PostingError};

use crate::exit_codes::{
    posting_exit_code, EXIT_ERROR, EXIT_POST_INVALID_CONFIG, EXIT_POST_READ, EXIT_POST_UNRESOLVED, EXIT_USAGE,
};
use crate::CliError;

fn post_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn load_config(config_path: &Path) -> Result<PostingConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        post_err(EXIT_POST_INVALID_CONFIG, format!("cannot read config {}: {e}", config_path.display()))
            .with_hint("run `rollcall init` to write a starter config")
    })?;
    let config =
        PostingConfig::from_toml(&config_str).map_err(|e| post_err(EXIT_POST_INVALID_CONFIG, e.to_string()))?;
    log::debug!("loaded config '{}' from {}", config.name, config_path.display());
    Ok(config)
}

/// Resolve table paths relative to the config file's directory.
fn open_store(config_path: &Path, config: &PostingConfig) -> CsvStore {
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    CsvStore::from_fn(|table| {
        let path = base_dir.join(config.tables.path_for(table));
        log::debug!("{table} table: {}", path.display());
        path
    })
}

fn posting_err(err: PostingError) -> CliError {
    let hint = match &err {
        PostingError::MarkPosted { .. } => {
            Some("the ledger was appended; mark the reconciled intake rows \"Posted\" by hand before re-running".to_string())
        }
        _ => None,
    };
    CliError { code: posting_exit_code(&err), message: err.to_string(), hint }
}

pub fn cmd_post(
    config_path: PathBuf,
    dry_run: bool,
    json_output: bool,
    output_file: Option<PathBuf>,
    strict: bool,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let mut store = open_store(&config_path, &config);
    let options = PostOptions { dry_run };

    let report = if dry_run {
        // Post against an in-memory copy so the files stay untouched.
        let mut snapshot = MemoryStore::snapshot(&store).map_err(|e| posting_err(e.into()))?;
        log::debug!("dry run: posting against an in-memory copy of the tables");
        post_pending(&mut snapshot, &config, &options)
    } else {
        post_pending(&mut store, &config, &options)
    }
    .map_err(posting_err)?;

    let json_str = serde_json::to_string_pretty(&report)
        .map_err(|e| post_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| post_err(EXIT_ERROR, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    print_summary(&report);

    if strict && report.summary.has_unresolved() {
        return Err(post_err(EXIT_POST_UNRESOLVED, "unresolved submissions found (--strict)"));
    }
    Ok(())
}

/// Human summary to stderr.
fn print_summary(report: &BatchReport) {
    let s = &report.summary;
    let prefix = if report.meta.dry_run { "dry run: would have " } else { "" };

    if s.posted_rows == 0 {
        eprintln!("no valid pending rows found");
    } else {
        eprintln!("{prefix}processed {} staging rows ({} ledger records)", s.posted_rows, s.records);
    }

    let unresolved = s.unresolved_activities + s.invalid_overrides;
    if unresolved > 0 || s.unresolved_members > 0 || s.reference_warnings > 0 {
        eprintln!(
            "{} row(s) left pending, {} unmatched name(s), {} reference warning(s)",
            unresolved, s.unresolved_members, s.reference_warnings,
        );
    }
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let store = open_store(&config_path, &config);

    let references = load_references(&store, &config).map_err(|e| post_err(EXIT_POST_READ, e.to_string()))?;
    let submissions = load_submissions(&store, &config).map_err(|e| post_err(EXIT_POST_READ, e.to_string()))?;
    let pending = submissions.iter().filter(|s| !s.is_posted()).count();

    eprintln!(
        "valid: '{}' with {} activities, {} members, {} pending of {} submission(s)",
        config.name,
        references.activities.len(),
        references.members.len(),
        pending,
        submissions.len(),
    );
    if !references.warnings.is_empty() {
        eprintln!("{} reference warning(s):", references.warnings.len());
        for warning in &references.warnings {
            eprintln!("  {warning}");
        }
    }
    Ok(())
}

pub fn cmd_init(config_path: PathBuf, force: bool) -> Result<(), CliError> {
    if config_path.exists() && !force {
        return Err(post_err(EXIT_USAGE, format!("{} already exists", config_path.display()))
            .with_hint("pass --force to overwrite"));
    }
    std::fs::write(&config_path, PostingConfig::default_toml())
        .map_err(|e| post_err(EXIT_ERROR, format!("cannot write {}: {e}", config_path.display())))?;
    eprintln!("wrote {}", config_path.display());
    Ok(())
}
