//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Code | Description                                  |
//! |------|----------------------------------------------|
//! | 0    | Success                                      |
//! | 1    | General error (unspecified)                  |
//! | 2    | CLI usage error (bad args, missing file)     |
//! | 3    | Parse error reading a source payload         |
//! | 4    | Invalid merge policy config                  |
//! | 5    | Duplicates found (duplicates command)        |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant below
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
#[allow(dead_code)]
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Parse error - a source payload file could not be read or decoded.
pub const EXIT_PARSE: u8 = 3;

/// Invalid merge policy config (TOML parse or validation failure).
pub const EXIT_INVALID_CONFIG: u8 = 4;

/// Duplicates found. Like `diff(1)`, a non-zero exit means "overlap exists" —
/// the audit itself succeeded.
pub const EXIT_DUPLICATES_FOUND: u8 = 5;
