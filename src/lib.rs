//! A parallel CDCL (Conflict-Driven Clause Learning) SAT solver.
//!
//! Given a formula in conjunctive normal form and an optional list of
//! assumption literals, the solver decides satisfiability. On SAT it
//! produces a total assignment extending the assumptions; on UNSAT under
//! assumptions it produces a conflicting subset of the assumptions.
//!
//! Several search workers run the same formula in parallel with diversified
//! heuristics, exchanging learnt unit, binary and longer clauses through
//! shared append-only logs.

/// The `sat` module implements the solver core: representation, propagation,
/// conflict analysis, the per-worker search engine and the parallel
/// coordinator.
pub mod sat;
