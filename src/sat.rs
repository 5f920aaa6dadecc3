use std::collections::HashMap;

use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::reference::Ref;

impl Bdd {
    /// Number of satisfying assignments of `node` over the variables `1..=num_vars`.
    pub fn sat_count(&self, node: Ref, num_vars: usize) -> BigUint {
        Weights::new(num_vars).count(self, node)
    }
}

/// Memoized satisfying-assignment counts over a fixed number of variables.
///
/// The count of a node is `(count(low) + count(high)) / 2`, scaled so that the
/// constant `true` counts every one of the `2^num_vars` assignments. The count of a
/// complemented edge is the complement of the count. Skipped variables therefore
/// contribute their factor of two automatically, which is what makes these counts
/// usable as branch weights in a random walk.
#[derive(Debug, Clone)]
pub struct Weights {
    max: BigUint,
    cache: HashMap<u32, BigUint>,
}

impl Weights {
    pub fn new(num_vars: usize) -> Self {
        Self {
            max: BigUint::from(1u32) << num_vars,
            cache: HashMap::new(),
        }
    }

    /// Total number of assignments, `2^num_vars`.
    pub fn max(&self) -> &BigUint {
        &self.max
    }

    pub fn count(&mut self, bdd: &Bdd, node: Ref) -> BigUint {
        let count = self.count_regular(bdd, node.id());
        if node.is_negated() {
            &self.max - count
        } else {
            count
        }
    }

    fn count_regular(&mut self, bdd: &Bdd, id: u32) -> BigUint {
        if id == 0 {
            return self.max.clone();
        }
        if let Some(count) = self.cache.get(&id) {
            return count.clone();
        }
        let low = self.count(bdd, bdd.low(id));
        let high = self.count(bdd, bdd.high(id));
        let count: BigUint = (low + high) >> 1;
        self.cache.insert(id, count.clone());
        count
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_sat_count_terminals() {
        let bdd = Bdd::default();
        assert_eq!(bdd.sat_count(bdd.zero, 3), BigUint::ZERO);
        assert_eq!(bdd.sat_count(bdd.one, 3), BigUint::from(8u32));
        assert_eq!(bdd.sat_count(bdd.one, 0), BigUint::from(1u32));
    }

    #[test]
    fn test_sat_count_and() {
        let bdd = Bdd::default();
        let f = bdd.apply_and(bdd.mk_var(1), bdd.mk_var(3));
        assert_eq!(bdd.sat_count(f, 3), BigUint::from(2u32));
        assert_eq!(bdd.sat_count(-f, 3), BigUint::from(6u32));
        assert_eq!(bdd.sat_count(f, 10), BigUint::from(256u32));
    }

    #[test]
    fn test_sat_count_xor_chain() {
        let bdd = Bdd::default();
        let f = (1..=5).map(|v| bdd.mk_var(v)).fold(bdd.zero, |acc, x| bdd.apply_xor(acc, x));
        assert_eq!(bdd.sat_count(f, 5), BigUint::from(16u32));
        assert_eq!(bdd.sat_count(-f, 5), BigUint::from(16u32));
    }

    #[test]
    fn test_sat_count_wide() {
        let bdd = Bdd::default();
        let f = bdd.mk_var(1);
        assert_eq!(bdd.sat_count(f, 100), BigUint::from(1u32) << 99);
    }
}
