//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: cron jobs and deploy
//! scripts rely on them.
//!
//! # Exit Codes
//!
//! | Code | Meaning                                                      |
//! |------|--------------------------------------------------------------|
//! | 0    | Every category reconciled                                    |
//! | 1    | General error (unspecified)                                  |
//! | 2    | CLI usage error (bad args)                                   |
//! | 3    | Partial failure: some category failed a fetch or a batch     |
//! | 4    | Failure: every processed category failed                     |
//! | 5    | Store credentials or project missing, nothing attempted      |
//! | 6    | Invalid config file                                          |
//! | 7    | Cancelled (Ctrl-C) between batches                           |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant error handling

use sitebook_recon::RunStatus;

/// Success - every category reconciled.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments.
pub const EXIT_USAGE: u8 = 2;

/// At least one category hit a fetch or batch-commit failure, others ran.
pub const EXIT_RECON_PARTIAL: u8 = 3;

/// Every processed category failed.
pub const EXIT_RECON_FAILED: u8 = 4;

/// No access token / project (neither flag nor env var, no emulator).
pub const EXIT_STORE_NOT_AUTH: u8 = 5;

/// Config file unreadable or invalid.
pub const EXIT_INVALID_CONFIG: u8 = 6;

/// Run interrupted; committed batches stay applied.
pub const EXIT_CANCELLED: u8 = 7;

/// Map a finished run to its exit code.
pub fn run_exit_code(status: RunStatus) -> u8 {
    match status {
        RunStatus::Success => EXIT_SUCCESS,
        RunStatus::PartialFailure => EXIT_RECON_PARTIAL,
        RunStatus::Failure => EXIT_RECON_FAILED,
        RunStatus::Cancelled => EXIT_CANCELLED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_success_exits_zero() {
        assert_eq!(run_exit_code(RunStatus::Success), 0);
        for status in [RunStatus::PartialFailure, RunStatus::Failure, RunStatus::Cancelled] {
            assert_ne!(run_exit_code(status), 0, "{status}");
        }
    }
}
