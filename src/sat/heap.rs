#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::cast_possible_truncation)]
//! Activity-ordered variable selection.
//!
//! A binary max-heap of variables keyed by a decaying activity score.
//! Activities are bumped for variables on the conflict side and decayed
//! multiplicatively after every conflict (implemented by growing the
//! increment and rescaling when it overflows). Ties are broken towards the
//! smaller variable index so selection order is fully determined.

use crate::sat::literal::Variable;
use rand::rngs::StdRng;
use rand::Rng;

const NOT_IN_HEAP: u32 = u32::MAX;
const RESCALE_LIMIT: f64 = 1e100;

#[derive(Debug, Clone, Default)]
pub struct VsidsHeap {
    heap: Vec<Variable>,
    position: Vec<u32>,
    activity: Vec<f64>,
    inc: f64,
    decay: f64,
}

impl VsidsHeap {
    #[must_use]
    pub fn new(num_vars: usize, decay: f64) -> Self {
        let mut h = Self {
            heap: Vec::with_capacity(num_vars),
            position: vec![NOT_IN_HEAP; num_vars],
            activity: vec![0.0; num_vars],
            inc: 1.0,
            decay,
        };
        for v in 0..num_vars as u32 {
            h.insert(v);
        }
        h
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[must_use]
    pub fn in_heap(&self, var: Variable) -> bool {
        self.position[var as usize] != NOT_IN_HEAP
    }

    #[must_use]
    pub fn activity(&self, var: Variable) -> f64 {
        self.activity[var as usize]
    }

    /// Higher activity first; ties towards the smaller variable index.
    fn before(&self, a: Variable, b: Variable) -> bool {
        let (aa, ab) = (self.activity[a as usize], self.activity[b as usize]);
        aa > ab || (aa == ab && a < b)
    }

    fn sift_up(&mut self, mut i: usize) {
        let var = self.heap[i];
        while i > 0 {
            let parent = (i - 1) / 2;
            if !self.before(var, self.heap[parent]) {
                break;
            }
            self.heap[i] = self.heap[parent];
            self.position[self.heap[i] as usize] = i as u32;
            i = parent;
        }
        self.heap[i] = var;
        self.position[var as usize] = i as u32;
    }

    fn sift_down(&mut self, mut i: usize) {
        let var = self.heap[i];
        loop {
            let left = 2 * i + 1;
            if left >= self.heap.len() {
                break;
            }
            let right = left + 1;
            let child = if right < self.heap.len() && self.before(self.heap[right], self.heap[left])
            {
                right
            } else {
                left
            };
            if !self.before(self.heap[child], var) {
                break;
            }
            self.heap[i] = self.heap[child];
            self.position[self.heap[i] as usize] = i as u32;
            i = child;
        }
        self.heap[i] = var;
        self.position[var as usize] = i as u32;
    }

    /// Inserts a variable unless it is already queued.
    pub fn insert(&mut self, var: Variable) {
        if self.in_heap(var) {
            return;
        }
        self.heap.push(var);
        self.sift_up(self.heap.len() - 1);
    }

    /// Removes and returns the maximum-activity variable.
    pub fn pop_max(&mut self) -> Option<Variable> {
        let top = *self.heap.first()?;
        self.position[top as usize] = NOT_IN_HEAP;
        let last = self.heap.pop().expect("non-empty");
        if !self.heap.is_empty() {
            self.heap[0] = last;
            self.position[last as usize] = 0;
            self.sift_down(0);
        }
        Some(top)
    }

    /// A uniformly random queued variable, left in place.
    pub fn random_entry(&self, rng: &mut StdRng) -> Option<Variable> {
        if self.heap.is_empty() {
            None
        } else {
            Some(self.heap[rng.gen_range(0..self.heap.len())])
        }
    }

    /// Bumps a variable's activity, rescaling everything when the scores
    /// outgrow the floating-point range.
    pub fn bump(&mut self, var: Variable) {
        self.activity[var as usize] += self.inc;
        if self.activity[var as usize] > RESCALE_LIMIT {
            for a in &mut self.activity {
                *a /= RESCALE_LIMIT;
            }
            self.inc /= RESCALE_LIMIT;
        }
        if self.in_heap(var) {
            self.sift_up(self.position[var as usize] as usize);
        }
    }

    /// Applies the multiplicative activity decay.
    pub fn decay(&mut self) {
        self.inc /= self.decay;
    }

    /// Drops every queued variable failing the predicate.
    pub fn retain(&mut self, keep: impl Fn(Variable) -> bool) {
        let vars: Vec<Variable> = self.heap.clone();
        self.heap.clear();
        for &v in &vars {
            self.position[v as usize] = NOT_IN_HEAP;
        }
        for v in vars {
            if keep(v) {
                self.insert(v);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_pop_order_follows_activity() {
        let mut h = VsidsHeap::new(4, 0.95);
        h.bump(2);
        h.bump(2);
        h.bump(0);

        assert_eq!(h.pop_max(), Some(2));
        assert_eq!(h.pop_max(), Some(0));
        // remaining activities equal; tie-break by index
        assert_eq!(h.pop_max(), Some(1));
        assert_eq!(h.pop_max(), Some(3));
        assert_eq!(h.pop_max(), None);
    }

    #[test]
    fn test_reinsert_after_pop() {
        let mut h = VsidsHeap::new(3, 0.95);
        let v = h.pop_max().unwrap();
        assert!(!h.in_heap(v));
        h.insert(v);
        assert!(h.in_heap(v));
        assert_eq!(h.len(), 3);
        h.insert(v);
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn test_decay_amplifies_later_bumps() {
        let mut h = VsidsHeap::new(2, 0.5);
        h.bump(0);
        h.decay();
        h.bump(1);
        // after one decay the increment doubles, so var 1 outranks var 0
        assert_eq!(h.pop_max(), Some(1));
    }

    #[test]
    fn test_random_entry_in_range(){
        let mut h = VsidsHeap::new(8, 0.95);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..32 {
            let v = h.random_entry(&mut rng).unwrap();
            assert!(v < 8);
        }
        h.retain(|v| v % 2 == 0);
        assert_eq!(h.len(), 4);
        for _ in 0..32 {
            assert!(h.random_entry(&mut rng).unwrap() % 2 == 0);
        }
    }
}
