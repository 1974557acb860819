#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(unsafe_code)]
//! Three-valued assignment state for the solver.
//!
//! For each variable the solver tracks a current [`Value`], the decision
//! level at which it was assigned, and the [`Reason`] that forced the
//! assignment (or `Reason::None` for decisions and assumptions).

use crate::sat::clause_arena::ClauseRef;
use crate::sat::literal::{Lit, Variable};

/// A three-valued truth value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Value {
    /// Assigned true.
    True,
    /// Assigned false.
    False,
    /// Not assigned.
    #[default]
    Undef,
}

impl Value {
    /// `true` iff the value is `True`.
    #[must_use]
    pub const fn is_true(self) -> bool {
        matches!(self, Self::True)
    }

    /// `true` iff the value is `False`.
    #[must_use]
    pub const fn is_false(self) -> bool {
        matches!(self, Self::False)
    }

    /// `true` iff the value is `Undef`.
    #[must_use]
    pub const fn is_undef(self) -> bool {
        matches!(self, Self::Undef)
    }

    #[must_use]
    pub const fn from_bool(b: bool) -> Self {
        if b {
            Self::True
        } else {
            Self::False
        }
    }
}

impl From<Value> for Option<bool> {
    fn from(v: Value) -> Self {
        match v {
            Value::True => Some(true),
            Value::False => Some(false),
            Value::Undef => None,
        }
    }
}

/// Why a variable was assigned.
///
/// Binary and ternary reasons carry the other literals of the forcing
/// clause directly; long reasons refer into the clause arena together with
/// the position of the assigned literal inside the clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Reason {
    /// A decision or assumption; no forcing clause.
    #[default]
    None,
    /// Forced by a binary clause; the payload is the other (false) literal.
    Binary(Lit),
    /// Forced by a ternary clause; the payload is the two other literals.
    Ternary(Lit, Lit),
    /// Forced by a long clause in the arena. `watch_idx` records the
    /// position of the assigned literal inside the clause.
    Long {
        cref: ClauseRef,
        watch_idx: u32,
    },
}

/// Per-variable assignment state: value, decision level and reason.
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    values: Vec<Value>,
    levels: Vec<u32>,
    reasons: Vec<Reason>,
}

impl Assignment {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            values: vec![Value::Undef; num_vars],
            levels: vec![0; num_vars],
            reasons: vec![Reason::None; num_vars],
        }
    }

    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.values.len()
    }

    /// The current value of a variable.
    #[inline]
    #[must_use]
    pub fn value(&self, var: Variable) -> Value {
        // Safety: variables are created in [0, num_vars) and the tables are
        // sized to num_vars.
        unsafe { *self.values.get_unchecked(var as usize) }
    }

    /// The current value of a literal under the assignment.
    #[inline]
    #[must_use]
    pub fn lit_value(&self, lit: Lit) -> Value {
        match self.value(lit.variable()) {
            Value::Undef => Value::Undef,
            Value::True => Value::from_bool(lit.polarity()),
            Value::False => Value::from_bool(!lit.polarity()),
        }
    }

    /// The decision level at which a variable was assigned.
    #[inline]
    #[must_use]
    pub fn level(&self, var: Variable) -> u32 {
        // Safety: see `value`.
        unsafe { *self.levels.get_unchecked(var as usize) }
    }

    /// The reason recorded for a variable's assignment.
    #[inline]
    #[must_use]
    pub fn reason(&self, var: Variable) -> Reason {
        // Safety: see `value`.
        unsafe { *self.reasons.get_unchecked(var as usize) }
    }

    /// Makes a literal true at the given level with the given reason.
    #[inline]
    pub fn assign(&mut self, lit: Lit, level: u32, reason: Reason) {
        let var = lit.variable() as usize;
        debug_assert!(self.values[var].is_undef(), "double assignment of {lit}");
        // Safety: see `value`.
        unsafe {
            *self.values.get_unchecked_mut(var) = Value::from_bool(lit.polarity());
            *self.levels.get_unchecked_mut(var) = level;
            *self.reasons.get_unchecked_mut(var) = reason;
        }
    }

    /// Clears a variable back to `Undef` and drops its reason.
    #[inline]
    pub fn unassign(&mut self, var: Variable) {
        let var = var as usize;
        debug_assert!(!self.values[var].is_undef());
        // Safety: see `value`.
        unsafe {
            *self.values.get_unchecked_mut(var) = Value::Undef;
            *self.reasons.get_unchecked_mut(var) = Reason::None;
        }
    }

    /// Number of currently assigned variables.
    #[must_use]
    pub fn num_assigned(&self) -> usize {
        self.values.iter().filter(|v| !v.is_undef()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_queries() {
        assert!(Value::True.is_true());
        assert!(Value::False.is_false());
        assert!(Value::Undef.is_undef());
        assert_eq!(Option::<bool>::from(Value::True), Some(true));
        assert_eq!(Option::<bool>::from(Value::Undef), None);
    }

    #[test]
    fn test_assign_unassign() {
        let mut a = Assignment::new(4);
        let l = Lit::new(2, false);
        a.assign(l, 3, Reason::Binary(Lit::new(0, true)));

        assert_eq!(a.value(2), Value::False);
        assert_eq!(a.lit_value(l), Value::True);
        assert_eq!(a.lit_value(l.negated()), Value::False);
        assert_eq!(a.level(2), 3);
        assert_eq!(a.reason(2), Reason::Binary(Lit::new(0, true)));
        assert_eq!(a.num_assigned(), 1);

        a.unassign(2);
        assert!(a.value(2).is_undef());
        assert_eq!(a.reason(2), Reason::None);
        assert_eq!(a.num_assigned(), 0);
    }

    #[test]
    fn test_lit_value_undef() {
        let a = Assignment::new(1);
        assert!(a.lit_value(Lit::new(0, true)).is_undef());
    }
}
