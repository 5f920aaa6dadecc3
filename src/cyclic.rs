//! Exclusion predicates of cyclic variables.
//!
//! The exclusion of a variable of width `n` is stored over the local decision
//! variables `1..=n` (bit `i` is variable `i + 1`), independent of the level layout of
//! any particular solve, and renamed onto the actual levels when it is applied.

use std::collections::HashMap;

use log::debug;

use crate::bdd::Bdd;
use crate::levels::LevelMap;
use crate::reference::Ref;
use crate::value::BitVector;
use crate::variable::{VarId, Variable};

#[derive(Debug, Clone, Default)]
pub struct CyclicTracker {
    exclusions: HashMap<VarId, Ref>,
}

impl CyclicTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values of `var` still allowed in the current cycle, over the levels of `levels`.
    pub fn exclusion(&self, bdd: &Bdd, var: &Variable, levels: &LevelMap) -> Ref {
        let local = self.exclusions.get(&var.id).copied().unwrap_or(bdd.one);
        if bdd.is_terminal(local) {
            return local;
        }
        match levels.levels(var.id) {
            Some(levels) if levels.len() == var.width => {
                bdd.rename(local, |v| levels[v as usize - 1].var().id())
            }
            _ => bdd.one,
        }
    }

    /// Exclude `value` of `var` from the rest of the cycle.
    ///
    /// Returns `true` if that exhausted the domain, in which case a new cycle begins.
    pub fn record(&mut self, bdd: &Bdd, var: &Variable, value: &BitVector) -> bool {
        let current = self.exclusions.get(&var.id).copied().unwrap_or(bdd.one);
        let literals = (0..var.width).map(|i| {
            let v = i as i32 + 1;
            if value.bit(i) {
                v
            } else {
                -v
            }
        });
        let next = bdd.apply_and(current, -bdd.cube(literals));
        if bdd.is_zero(next) {
            debug!("Cycle of {} exhausted", var.name);
            self.exclusions.remove(&var.id);
            true
        } else {
            self.exclusions.insert(var.id, next);
            false
        }
    }

    /// Start a new cycle for `var`.
    pub fn reset(&mut self, var: VarId) {
        self.exclusions.remove(&var);
    }

    pub fn clear(&mut self) {
        self.exclusions.clear();
    }

    pub fn is_open(&self, var: VarId) -> bool {
        self.exclusions.contains_key(&var)
    }

    pub fn roots(&self) -> impl Iterator<Item = Ref> + '_ {
        self.exclusions.values().copied()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_exhaust_and_reset() {
        let bdd = Bdd::default();
        let var = Variable::new(0, "v", 2).cyclic();
        let mut tracker = CyclicTracker::new();

        for value in [2, 0, 3] {
            assert!(!tracker.record(&bdd, &var, &BitVector::from_u64(2, value)));
        }
        assert!(tracker.is_open(var.id));
        assert!(tracker.record(&bdd, &var, &BitVector::from_u64(2, 1)));
        assert!(!tracker.is_open(var.id));
    }

    #[test]
    fn test_exclusion_renamed_to_levels() {
        let bdd = Bdd::default();
        let vars = [Variable::new(0, "a", 2), Variable::new(1, "v", 2).cyclic()];
        let levels = LevelMap::interleave(&vars);
        let mut tracker = CyclicTracker::new();
        assert_eq!(tracker.exclusion(&bdd, &vars[1], &levels), bdd.one);

        tracker.record(&bdd, &vars[1], &BitVector::from_u64(2, 1));
        let excl = tracker.exclusion(&bdd, &vars[1], &levels);
        // Bits of `v` sit on decision variables 2 and 4.
        assert_eq!(excl, -bdd.cube([2, -4]));
        assert_eq!(tracker.roots().count(), 1);

        tracker.reset(vars[1].id);
        assert_eq!(tracker.exclusion(&bdd, &vars[1], &levels), bdd.one);
    }
}
