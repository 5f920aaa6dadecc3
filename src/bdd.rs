//! The decision-diagram manager.
//!
//! [`Bdd`] owns the unique table and the computed table. Every function is a [`Ref`]
//! into the manager, with complement edges: the high edge of a stored node is never
//! complemented, which keeps the representation canonical for a fixed variable order.
//! Variables are compared by their number, smaller numbers are closer to the root.
//!
//! ```
//! use bdd_randsolver::bdd::Bdd;
//!
//! let bdd = Bdd::default();
//! let x1 = bdd.mk_var(1);
//! let x2 = bdd.mk_var(2);
//! let f = bdd.apply_and(x1, -x2);
//! assert_eq!(f, bdd.cube([1, -2]));
//! assert!(bdd.eval(f, |v| v == 1));
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;

use log::debug;

use crate::cache::Cache;
use crate::node::Node;
use crate::reference::Ref;
use crate::table::Table;

/// Sizing of a [`Bdd`] manager.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BddConfig {
    /// Initial number of hash buckets of the unique table, as a power of two. The table grows on demand.
    pub storage_bits: usize,
    /// Size of the computed table, as a power of two.
    pub cache_bits: usize,
}

impl Default for BddConfig {
    fn default() -> Self {
        Self {
            storage_bits: 16,
            cache_bits: 16,
        }
    }
}

impl BddConfig {
    pub fn with_storage_bits(mut self, bits: usize) -> Self {
        self.storage_bits = bits;
        self
    }

    pub fn with_cache_bits(mut self, bits: usize) -> Self {
        self.cache_bits = bits;
        self
    }
}

pub struct Bdd {
    table: RefCell<Table>,
    cache: RefCell<Cache<(Ref, Ref, Ref), Ref>>,
    pub zero: Ref,
    pub one: Ref,
}

impl Bdd {
    pub fn new(config: BddConfig) -> Self {
        Self {
            table: RefCell::new(Table::new(config.storage_bits)),
            cache: RefCell::new(Cache::new(config.cache_bits)),
            zero: Ref::ZERO,
            one: Ref::ONE,
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::new(BddConfig::default())
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table.borrow();
        let cache = self.cache.borrow();
        f.debug_struct("Bdd")
            .field("nodes", &table.len())
            .field("capacity", &table.capacity())
            .field("buckets", &table.num_buckets())
            .field("cache_hits", &cache.hits())
            .field("cache_misses", &cache.misses())
            .finish()
    }
}

impl Bdd {
    /// Number of live nodes, terminal included.
    pub fn node_count(&self) -> usize {
        self.table.borrow().len()
    }

    pub fn variable(&self, id: u32) -> u32 {
        self.table.borrow().node(id).variable
    }
    pub fn low(&self, id: u32) -> Ref {
        self.table.borrow().node(id).low
    }
    pub fn high(&self, id: u32) -> Ref {
        self.table.borrow().node(id).high
    }

    pub fn low_node(&self, node: Ref) -> Ref {
        let low = self.low(node.id());
        if node.is_negated() {
            -low
        } else {
            low
        }
    }
    pub fn high_node(&self, node: Ref) -> Ref {
        let high = self.high(node.id());
        if node.is_negated() {
            -high
        } else {
            high
        }
    }

    pub fn is_zero(&self, node: Ref) -> bool {
        node == self.zero
    }
    pub fn is_one(&self, node: Ref) -> bool {
        node == self.one
    }
    pub fn is_terminal(&self, node: Ref) -> bool {
        node.id() == 0
    }

    /// Constant function for `value`.
    pub fn constant(&self, value: bool) -> Ref {
        if value {
            self.one
        } else {
            self.zero
        }
    }

    pub fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");

        if high.is_negated() {
            return -self.mk_node(v, -low, -high);
        }
        if low == high {
            return low;
        }

        let id = self.table.borrow_mut().put(Node { variable: v, low, high });
        Ref::positive(id)
    }

    pub fn mk_var(&self, v: u32) -> Ref {
        self.mk_node(v, self.zero, self.one)
    }

    /// Conjunction of literals, given in DIMACS style (`-3` is "not x3").
    pub fn cube(&self, literals: impl IntoIterator<Item = i32>) -> Ref {
        let mut literals = literals.into_iter().collect::<Vec<_>>();
        literals.sort_by_key(|&lit| std::cmp::Reverse(lit.unsigned_abs()));
        debug!("cube(literals = {:?})", literals);
        let mut current = self.one;
        for lit in literals {
            assert_ne!(lit, 0, "Variable index should not be zero");
            let v = lit.unsigned_abs();
            current = if lit < 0 {
                self.mk_node(v, current, self.zero)
            } else {
                self.mk_node(v, self.zero, current)
            };
        }
        current
    }

    pub fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        if self.is_terminal(node) || v < self.variable(node.id()) {
            return (node, node);
        }
        debug_assert_eq!(v, self.variable(node.id()));
        (self.low_node(node), self.high_node(node))
    }

    /// If-then-else: `(f ∧ g) ∨ (¬f ∧ h)`.
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Ref {
        // Terminal cases.
        if self.is_one(f) {
            return g;
        }
        if self.is_zero(f) {
            return h;
        }
        if g == h {
            return g;
        }
        if self.is_one(g) && self.is_zero(h) {
            return f;
        }
        if self.is_zero(g) && self.is_one(h) {
            return -f;
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,G,~F) => ite(F,G,1)
        let (mut f, mut g, mut h) = (f, g, h);
        if g == f {
            g = self.one;
        } else if g == -f {
            g = self.zero;
        }
        if h == f {
            h = self.zero;
        } else if h == -f {
            h = self.one;
        }
        if g == h {
            return g;
        }
        if self.is_one(g) && self.is_zero(h) {
            return f;
        }
        if self.is_zero(g) && self.is_one(h) {
            return -f;
        }

        // Equivalent pairs, picking the one with the smallest top variable:
        //   ite(F,1,H) == ite(H,1,F)
        //   ite(F,G,0) == ite(G,F,0)
        //   ite(F,G,1) == ite(~G,~F,1)
        //   ite(F,0,H) == ite(~H,0,~F)
        //   ite(F,G,~G) == ite(G,F,~F)
        let i = self.variable(f.id());
        let j = self.variable(g.id());
        let k = self.variable(h.id());
        if self.is_one(g) && k != 0 && k < i {
            debug!("ite(F,1,H) => ite(H,1,F)");
            (f, h) = (h, f);
        } else if self.is_zero(h) && j != 0 && j < i {
            debug!("ite(F,G,0) => ite(G,F,0)");
            (f, g) = (g, f);
        } else if self.is_one(h) && j != 0 && j < i {
            debug!("ite(F,G,1) => ite(~G,~F,1)");
            (f, g) = (-g, -f);
        } else if self.is_zero(g) && k != 0 && k < i {
            debug!("ite(F,0,H) => ite(~H,0,~F)");
            (f, h) = (-h, -f);
        } else if g == -h && j != 0 && j < i {
            debug!("ite(F,G,~G) => ite(G,F,~F)");
            (f, g, h) = (g, f, -f);
        }

        // Make `f` and `g` regular:
        //   ite(~F,G,H) => ite(F,H,G)
        //   ite(F,~G,H) => ~ite(F,G,~H)
        if f.is_negated() {
            f = -f;
            std::mem::swap(&mut g, &mut h);
        }
        let negate = g.is_negated();
        if negate {
            g = -g;
            h = -h;
        }

        let key = (f, g, h);
        if let Some(&res) = self.cache.borrow().get(&key) {
            return if negate { -res } else { res };
        }

        let m = [f, g, h]
            .iter()
            .map(|r| self.variable(r.id()))
            .filter(|&v| v != 0)
            .min()
            .unwrap_or(0);
        debug_assert_ne!(m, 0);

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);
        let e = self.apply_ite(f0, g0, h0);
        let t = self.apply_ite(f1, g1, h1);
        let res = self.mk_node(m, e, t);
        self.cache.borrow_mut().insert(key, res);

        if negate {
            -res
        } else {
            res
        }
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.zero)
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, self.one, v)
    }

    pub fn apply_xor(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, -v, v)
    }

    pub fn apply_eq(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, -v)
    }

    pub fn apply_imply(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.one)
    }

    pub fn apply_and_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        let mut res = self.one;
        for node in nodes {
            res = self.apply_and(res, node);
            if self.is_zero(res) {
                break;
            }
        }
        res
    }

    pub fn apply_or_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        let mut res = self.zero;
        for node in nodes {
            res = self.apply_or(res, node);
            if self.is_one(res) {
                break;
            }
        }
        res
    }

    /// Rebuild `f` with every decision variable `v` replaced by `map(v)`.
    ///
    /// The mapping does not have to preserve the variable order.
    pub fn rename(&self, f: Ref, map: impl Fn(u32) -> u32) -> Ref {
        let mut cache = HashMap::new();
        self.rename_(f, &map, &mut cache)
    }

    fn rename_(&self, f: Ref, map: &impl Fn(u32) -> u32, cache: &mut HashMap<u32, Ref>) -> Ref {
        if self.is_terminal(f) {
            return f;
        }
        let res = match cache.get(&f.id()) {
            Some(&res) => res,
            None => {
                let node = *self.table.borrow().node(f.id());
                let low = self.rename_(node.low, map, cache);
                let high = self.rename_(node.high, map, cache);
                let res = self.apply_ite(self.mk_var(map(node.variable)), high, low);
                cache.insert(f.id(), res);
                res
            }
        };
        if f.is_negated() {
            -res
        } else {
            res
        }
    }

    /// Evaluate `f` under the assignment `value(variable)`.
    pub fn eval(&self, f: Ref, value: impl Fn(u32) -> bool) -> bool {
        let mut current = f;
        while !self.is_terminal(current) {
            current = if value(self.variable(current.id())) {
                self.high_node(current)
            } else {
                self.low_node(current)
            };
        }
        self.is_one(current)
    }

    /// Ids of all nodes reachable from `nodes`, terminal included.
    pub fn descendants(&self, nodes: impl IntoIterator<Item = Ref>) -> HashSet<u32> {
        let mut visited = HashSet::new();
        visited.insert(0);
        let mut queue = VecDeque::from_iter(nodes);
        while let Some(node) = queue.pop_front() {
            let id = node.id();
            if visited.insert(id) {
                queue.push_back(self.low(id));
                queue.push_back(self.high(id));
            }
        }
        visited
    }

    pub fn size(&self, f: Ref) -> usize {
        self.descendants([f]).len()
    }

    /// Free every node not reachable from `roots`. Returns the number of freed nodes.
    ///
    /// Handles not reachable from `roots` are invalid afterwards.
    pub fn collect_garbage(&self, roots: &[Ref]) -> usize {
        self.cache.borrow_mut().clear();
        let alive = self.descendants(roots.iter().copied());
        let freed = self.table.borrow_mut().sweep(&alive);
        debug!("Collected garbage: {} alive, {} freed", alive.len(), freed);
        freed
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_var() {
        let bdd = Bdd::default();

        let x = bdd.mk_var(1);

        assert_eq!(bdd.variable(x.id()), 1);
        assert_eq!(bdd.high_node(x), bdd.one);
        assert_eq!(bdd.low_node(x), bdd.zero);

        let not_x = -x;
        assert_eq!(bdd.high_node(not_x), bdd.zero);
        assert_eq!(bdd.low_node(not_x), bdd.one);
    }

    #[test]
    fn test_terminal() {
        let bdd = Bdd::default();

        assert!(bdd.is_terminal(bdd.zero));
        assert!(bdd.is_zero(bdd.zero));
        assert!(!bdd.is_one(bdd.zero));
        assert!(bdd.is_terminal(bdd.one));
        assert!(bdd.is_one(bdd.one));
        assert_eq!(bdd.variable(bdd.one.id()), 0);
        assert_eq!(bdd.constant(false), bdd.zero);
    }

    #[test]
    fn test_cube() {
        let bdd = Bdd::default();

        let x1 = bdd.mk_var(1);
        let x2 = bdd.mk_var(2);
        let x3 = bdd.mk_var(3);

        let f = bdd.apply_and(bdd.apply_and(x1, x2), x3);
        assert_eq!(f, bdd.cube([3, 1, 2]));

        let f = bdd.apply_and(bdd.apply_and(x1, -x2), -x3);
        assert_eq!(f, bdd.cube([1, -2, -3]));
    }

    #[test]
    fn test_de_morgan() {
        let bdd = Bdd::default();

        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);

        assert_eq!(-bdd.apply_and(x, y), bdd.apply_or(-x, -y));
        assert_eq!(-bdd.apply_or(x, y), bdd.apply_and(-x, -y));
    }

    #[test]
    fn test_xor() {
        let bdd = Bdd::default();

        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let f = bdd.apply_and(x, y);

        assert_eq!(bdd.apply_xor(f, f), bdd.zero);
        assert_eq!(bdd.apply_xor(f, -f), bdd.one);
        assert_eq!(bdd.apply_xor(x, -y), -bdd.apply_xor(x, y));
        assert_eq!(bdd.apply_eq(x, y), -bdd.apply_xor(x, y));
    }

    #[test]
    fn test_apply_ite() {
        let bdd = Bdd::default();

        let g = bdd.mk_var(2);
        let h = bdd.mk_var(3);
        assert_eq!(bdd.apply_ite(bdd.one, g, h), g);
        assert_eq!(bdd.apply_ite(bdd.zero, g, h), h);

        let f = bdd.mk_node(4, bdd.one, h);
        assert_eq!(bdd.apply_ite(f, f, h), bdd.apply_or(f, h));
        assert_eq!(bdd.apply_ite(f, g, f), bdd.apply_and(f, g));
        assert_eq!(bdd.apply_ite(f, -g, bdd.one), -bdd.apply_and(f, g));
        assert_eq!(bdd.apply_ite(f, bdd.zero, -h), -bdd.apply_or(f, h));

        let f = bdd.mk_var(5);
        assert_eq!(bdd.apply_ite(f, g, g), g);
        assert_eq!(bdd.apply_ite(f, bdd.one, bdd.zero), f);
        assert_eq!(bdd.apply_ite(f, bdd.zero, bdd.one), -f);

        let f = bdd.mk_var(6);
        let g = bdd.mk_var(7);
        let h = bdd.mk_var(8);
        let expected = bdd.mk_node(6, -g, -h);
        assert_eq!(bdd.apply_ite(-f, -g, -h), expected);
    }

    #[test]
    fn test_ite_matches_truth_table() {
        let bdd = Bdd::default();

        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let z = bdd.mk_var(3);
        let f = bdd.apply_ite(bdd.apply_xor(x, z), -y, bdd.apply_or(y, z));

        for bits in 0..8u32 {
            let (a, b, c) = (bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
            let expected = if a ^ c { !b } else { b || c };
            assert_eq!(bdd.eval(f, |v| bits & (1 << (v - 1)) != 0), expected);
        }
    }

    #[test]
    fn test_rename() {
        let bdd = Bdd::default();

        let f = bdd.apply_and(bdd.mk_var(1), -bdd.mk_var(2));
        let g = bdd.rename(f, |v| 10 - v);
        assert_eq!(g, bdd.cube([9, -8]));

        let h = bdd.rename(-f, |v| v + 2);
        assert_eq!(h, -bdd.cube([3, -4]));
    }

    #[test]
    fn test_collect_garbage_keeps_roots() {
        let bdd = Bdd::default();

        let x1 = bdd.mk_var(1);
        let x2 = bdd.mk_var(2);
        let x3 = bdd.mk_var(3);
        let keep = bdd.apply_xor(x1, x2);
        let _drop = bdd.apply_and(bdd.apply_or(x2, x3), x1);
        let before = bdd.node_count();
        let keep_nodes = bdd.descendants([keep]);

        let freed = bdd.collect_garbage(&[keep]);
        assert!(freed > 0);
        assert_eq!(bdd.node_count(), before - freed);
        assert_eq!(bdd.node_count(), keep_nodes.len());
        assert_eq!(bdd.descendants([keep]), keep_nodes);
        for bits in 0..4u32 {
            let expected = (bits & 1 != 0) ^ (bits & 2 != 0);
            assert_eq!(bdd.eval(keep, |v| bits & (1 << (v - 1)) != 0), expected);
        }

        // Rebuilding the same function finds the surviving nodes.
        let again = bdd.apply_xor(bdd.mk_var(1), bdd.mk_var(2));
        assert_eq!(again, keep);
    }
}
