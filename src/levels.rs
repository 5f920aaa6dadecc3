//! Interleaved level allocation.
//!
//! Each random variable gets one level per bit. Levels are handed out bit-major:
//! all the bits `0` first (in variable order), then all the bits `1`, and so on, so
//! that bit `i` of every variable sits next to bit `i` of the others. Narrower
//! variables simply drop out once their bits are exhausted.
//!
//! Level `L` is decision variable `L + 1` in the [`Bdd`].

use std::collections::HashMap;

use crate::bdd::Bdd;
use crate::bitvec::Bvd;
use crate::types::Level;
use crate::value::{Assignment, BitVector};
use crate::variable::{VarId, Variable};

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct LevelMap {
    /// Levels of each variable, least significant bit first.
    levels: Vec<Vec<Level>>,
    ids: Vec<VarId>,
    index: HashMap<VarId, usize>,
    /// Owner `(variable index, bit)` of each level.
    owners: Vec<(usize, usize)>,
}

impl LevelMap {
    pub fn interleave(variables: &[Variable]) -> Self {
        let mut map = LevelMap {
            levels: vec![Vec::new(); variables.len()],
            ids: variables.iter().map(|v| v.id).collect(),
            index: variables.iter().enumerate().map(|(i, v)| (v.id, i)).collect(),
            owners: Vec::new(),
        };
        let max_width = variables.iter().map(|v| v.width).max().unwrap_or(0);
        for bit in 0..max_width {
            for (i, var) in variables.iter().enumerate() {
                if bit < var.width {
                    let level = Level::new(map.owners.len());
                    map.levels[i].push(level);
                    map.owners.push((i, bit));
                }
            }
        }
        map
    }

    pub fn num_levels(&self) -> usize {
        self.owners.len()
    }

    pub fn contains(&self, var: VarId) -> bool {
        self.index.contains_key(&var)
    }

    pub fn levels(&self, var: VarId) -> Option<&[Level]> {
        self.index.get(&var).map(|&i| self.levels[i].as_slice())
    }

    /// Variable and bit position stored at `level`.
    pub fn owner(&self, level: Level) -> Option<(VarId, usize)> {
        self.owners.get(level.index()).map(|&(i, bit)| (self.ids[i], bit))
    }

    /// Symbolic vector of `var`, one decision variable per bit.
    pub fn vector(&self, bdd: &Bdd, var: &Variable) -> Option<Bvd> {
        let levels = self.levels(var.id)?;
        let bits = levels.iter().map(|level| bdd.mk_var(level.var().id())).collect();
        Some(Bvd::new(bits, var.signed))
    }

    /// Reassemble per-variable values from one value per level.
    pub fn decode(&self, bits: &[bool]) -> Assignment {
        debug_assert_eq!(bits.len(), self.num_levels());
        let mut assignment = Assignment::new();
        for (i, levels) in self.levels.iter().enumerate() {
            let value = BitVector::from_bits(levels.iter().map(|level| bits[level.index()]));
            assignment.insert(self.ids[i], value);
        }
        assignment
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_interleave() {
        let vars = [Variable::new(0, "a", 3), Variable::new(1, "b", 1), Variable::new(2, "c", 2)];
        let map = LevelMap::interleave(&vars);
        assert_eq!(map.num_levels(), 6);
        let idx = |id: u32| map.levels(VarId(id)).unwrap().iter().map(|l| l.index()).collect::<Vec<_>>();
        assert_eq!(idx(0), vec![0, 3, 5]);
        assert_eq!(idx(1), vec![1]);
        assert_eq!(idx(2), vec![2, 4]);
        assert_eq!(map.owner(Level::new(4)), Some((VarId(2), 1)));
        assert_eq!(map.owner(Level::new(6)), None);
        assert!(map.levels(VarId(9)).is_none());
    }

    #[test]
    fn test_decode() {
        let vars = [Variable::new(0, "a", 2), Variable::new(1, "b", 2)];
        let map = LevelMap::interleave(&vars);
        // Levels: a0 b0 a1 b1.
        let assignment = map.decode(&[true, false, true, true]);
        assert_eq!(assignment.get_u64(VarId(0)), Some(3));
        assert_eq!(assignment.get_u64(VarId(1)), Some(2));
    }

    #[test]
    fn test_vector() {
        let bdd = Bdd::default();
        let vars = [Variable::new(0, "a", 2).signed(), Variable::new(1, "b", 1)];
        let map = LevelMap::interleave(&vars);
        let a = map.vector(&bdd, &vars[0]).unwrap();
        assert!(a.is_signed());
        assert_eq!(a.bits(), &[bdd.mk_var(1), bdd.mk_var(3)]);
        let b = map.vector(&bdd, &vars[1]).unwrap();
        assert_eq!(b.bits(), &[bdd.mk_var(2)]);
    }
}
