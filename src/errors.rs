//! Submodule defining the errors used across the crate.
//!
//! Per-statement parse failures live in [`crate::sql::ParseError`]; they are
//! recovered from by skipping the statement and never surface here.

use alloc::string::String;

/// Errors that stop a history script from being produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The user source is neither `current_user` nor `session`.
    #[error("Invalid user source `{0}`: expected `current_user` or `session`")]
    InvalidUserSource(String),
    /// The input contained no usable `CREATE TABLE` statement.
    #[error("No CREATE TABLE statements found in the input")]
    NoTables,
}
