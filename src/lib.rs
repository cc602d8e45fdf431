//! critfix: repair toolkit for `critical_data` phone backups.
//!
//! Facade over [`critfix_core`]. See `crates/critfix-core` for the repair
//! logic and `crates/critfix-cli` for the command-line frontend.

pub use critfix_core::*;
