#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A parser for the DIMACS CNF file format.
//!
//! The format consists of comment lines starting with `c`, a problem line
//! `p cnf <num_vars> <num_clauses>`, and clause lines of whitespace
//! separated integer literals each terminated by `0`. A `%` line marks
//! end-of-data in some competition files. Clauses may span lines, so the
//! parser accumulates tokens until each terminating `0`.

use crate::sat::cnf::Cnf;
use crate::sat::error::SolverError;
use std::io::{self, BufRead};
use std::path::Path;

/// Parses DIMACS data from any `BufRead` source.
///
/// # Errors
///
/// Returns `SolverError::ParseLit` for a token that is neither a literal
/// nor part of a recognised header line.
pub fn parse_dimacs<R: BufRead>(reader: R) -> Result<Cnf, SolverError> {
    let mut declared_vars = 0_usize;
    let mut clauses: Vec<Vec<i32>> = Vec::new();
    let mut current: Vec<i32> = Vec::new();

    for (line_no, line) in reader.lines().map_while(Result::ok).enumerate() {
        let mut parts = line.split_whitespace().peekable();
        match parts.peek() {
            None | Some(&"c") => continue,
            Some(&"%") => break,
            Some(&"p") => {
                // p cnf <vars> <clauses>; only the variable count matters.
                declared_vars = parts
                    .nth(2)
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(0);
                continue;
            }
            Some(_) => {}
        }

        for token in parts {
            let lit = token.parse::<i32>().map_err(|_| SolverError::ParseLit {
                token: token.to_owned(),
                line: line_no + 1,
            })?;
            if lit == 0 {
                clauses.push(std::mem::take(&mut current));
            } else {
                current.push(lit);
            }
        }
    }
    // An unterminated trailing clause is accepted.
    if !current.is_empty() {
        clauses.push(current);
    }

    Ok(Cnf::new(clauses, declared_vars))
}

/// Parses DIMACS data held in a string.
///
/// # Errors
///
/// See [`parse_dimacs`].
pub fn parse_dimacs_text(text: &str) -> Result<Cnf, SolverError> {
    parse_dimacs(io::Cursor::new(text))
}

/// Parses the DIMACS file at `path`.
///
/// # Errors
///
/// `SolverError::Io` if the file cannot be opened, `SolverError::ParseLit`
/// for malformed content, and `SolverError::EmptyInput` when no clause and
/// no problem line was found.
pub fn parse_file(path: &Path) -> Result<Cnf, SolverError> {
    let file = std::fs::File::open(path).map_err(|source| SolverError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let cnf = parse_dimacs(io::BufReader::new(file))?;
    if cnf.is_empty() && cnf.num_vars == 0 {
        return Err(SolverError::EmptyInput {
            path: path.display().to_string(),
        });
    }
    Ok(cnf)
}
