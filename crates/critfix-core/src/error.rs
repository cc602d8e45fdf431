//! Repair error taxonomy.

use thiserror::Error;

/// Errors raised while repairing a backup.
///
/// All of these are recoverable: changing the inputs and re-running is
/// always possible, and a failed repair never produces a partial artifact.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid hex data (odd length or non-hex digit)")]
    InvalidHex,

    #[error("required field '{0}' not found")]
    MissingField(String),

    #[error("field tag '{0}' not found in critical data payload")]
    MissingTag(&'static str),

    #[error("profile '{0}' does not resolve to usable key material")]
    InvalidProfile(String),

    #[error("missing inputs: {0}")]
    MissingInputs(&'static str),
}
