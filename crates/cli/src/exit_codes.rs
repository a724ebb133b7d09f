//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                                      |
//! |------|--------------------------------------------------------------|
//! | 0    | Success, every submitted act was found                       |
//! | 1    | General error (unspecified)                                  |
//! | 2    | Usage error (bad args, invalid settings file)                |
//! | 3    | Reconciliation completed, missing acts found                 |
//! | 4    | Input rejected (upload checks, headers, no rows, id limits)  |
//! | 5    | I/O failure reading input or writing output                  |
//! | 6    | Database unavailable (open, query, special-status lookup)    |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `CliError` mapping in `main.rs`

/// Success - command completed, nothing missing.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments or settings.
/// clap also exits with 2 on argument errors.
pub const EXIT_USAGE: u8 = 2;

/// Reconciliation ran to completion and at least one act is missing.
/// Like `diff(1)`, a non-zero code that is not a failure.
pub const EXIT_MISSING_ACTS: u8 = 3;

/// The submitted file was refused before matching.
pub const EXIT_INPUT_REJECTED: u8 = 4;

/// Reading the input or writing an output file failed.
pub const EXIT_IO: u8 = 5;

/// The act database could not be opened or queried.
pub const EXIT_DB_UNAVAILABLE: u8 = 6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let mut codes = vec![
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_MISSING_ACTS,
            EXIT_INPUT_REJECTED,
            EXIT_IO,
            EXIT_DB_UNAVAILABLE,
        ];
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 7);
    }
}
