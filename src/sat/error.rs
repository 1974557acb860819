#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Error types for input handling.
//!
//! Only genuinely exceptional conditions are errors: I/O failures and
//! malformed input. SAT, UNSAT and Undef are ordinary solve results.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("failed to read '{path}'")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed literal '{token}' on line {line}")]
    ParseLit { token: String, line: usize },

    #[error("no clauses found in '{path}'")]
    EmptyInput { path: String },
}
