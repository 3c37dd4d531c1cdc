//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scheduled jobs rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | post             | Posting-specific codes                   |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use rollcall_recon::PostingError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, refusing to overwrite a file.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Post (3-9)
// =============================================================================

/// Config file missing, unparseable, or failing validation.
pub const EXIT_POST_INVALID_CONFIG: u8 = 3;

/// An input table could not be read. Nothing was written.
pub const EXIT_POST_READ: u8 = 4;

/// Ledger append or status write-back failed.
pub const EXIT_POST_WRITE: u8 = 5;

/// `--strict`: the run finished but some rows are unresolved
/// (unknown activity, unknown member, invalid override).
pub const EXIT_POST_UNRESOLVED: u8 = 6;

/// Map a posting failure to its exit code.
pub fn posting_exit_code(err: &PostingError) -> u8 {
    match err {
        PostingError::Store(_) => EXIT_POST_READ,
        PostingError::LedgerAppend(_) | PostingError::MarkPosted { .. } => EXIT_POST_WRITE,
    }
}
