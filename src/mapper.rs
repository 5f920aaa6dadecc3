//! Random-mapped types.
//!
//! A variable can stand for a value of some host type that is not a plain integer,
//! such as an enumeration. Its [`RandomMapper`] provides the innate constraint of that
//! type, written over [`VarId::PLACEHOLDER`], and converts between host values and
//! the integer the solver works with.

use std::collections::HashMap;
use std::fmt::Debug;

use crate::expr::ConstraintExpr;
use crate::value::BitVector;
use crate::variable::VarId;

pub trait RandomMapper: Debug {
    /// Constraints every value of the mapped type satisfies, over [`VarId::PLACEHOLDER`].
    fn constraints(&self) -> Vec<ConstraintExpr>;

    /// Bits needed to hold every legal value.
    fn width(&self) -> usize;

    /// Innate constraints applied to variable `id`.
    fn constraints_for(&self, id: VarId) -> Vec<ConstraintExpr> {
        self.constraints()
            .iter()
            .map(|e| e.substitute(&|v: VarId| (v == VarId::PLACEHOLDER).then_some(ConstraintExpr::Var(id))))
            .collect()
    }
}

/// Enumeration mapped to dense ordinals `0..n`, skipping excluded variants.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EnumMapper {
    variants: Vec<String>,
}

impl EnumMapper {
    pub fn new<S: Into<String>>(variants: impl IntoIterator<Item = S>) -> Self {
        Self::with_excluded(variants, Vec::<String>::new())
    }

    pub fn with_excluded<S: Into<String>, X: AsRef<str>>(
        variants: impl IntoIterator<Item = S>,
        excluded: impl IntoIterator<Item = X>,
    ) -> Self {
        let excluded: Vec<X> = excluded.into_iter().collect();
        let variants = variants
            .into_iter()
            .map(Into::into)
            .filter(|v: &String| !excluded.iter().any(|x| x.as_ref() == v))
            .collect();
        Self { variants }
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Ordinal of `variant`, `None` if it is unknown or excluded.
    pub fn ordinal(&self, variant: &str) -> Option<u64> {
        self.variants.iter().position(|v| v == variant).map(|i| i as u64)
    }

    pub fn variant(&self, ordinal: u64) -> Option<&str> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|i| self.variants.get(i))
            .map(String::as_str)
    }

    pub fn encode(&self, variant: &str) -> Option<BitVector> {
        self.ordinal(variant).map(|i| BitVector::from_u64(self.width(), i))
    }

    pub fn decode(&self, value: &BitVector) -> Option<&str> {
        value.to_u64().and_then(|i| self.variant(i))
    }
}

impl RandomMapper for EnumMapper {
    fn constraints(&self) -> Vec<ConstraintExpr> {
        let n = self.variants.len() as u64;
        let last = BitVector::from_u64(self.width(), n.saturating_sub(1));
        if n == 0 {
            return vec![ConstraintExpr::bool(false)];
        }
        vec![ConstraintExpr::Var(VarId::PLACEHOLDER).le(last)]
    }

    fn width(&self) -> usize {
        let n = self.variants.len().saturating_sub(1);
        ((usize::BITS - n.leading_zeros()) as usize).max(1)
    }
}

/// Two-state bit: a one-bit value that is either `0` or `1`. No constraint needed.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct BitMapper;

impl RandomMapper for BitMapper {
    fn constraints(&self) -> Vec<ConstraintExpr> {
        Vec::new()
    }

    fn width(&self) -> usize {
        1
    }
}

/// Mappers by type name.
#[derive(Debug, Default)]
pub struct MapperRegistry {
    mappers: HashMap<String, Box<dyn RandomMapper>>,
}

impl MapperRegistry {
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register("bit", BitMapper);
        registry
    }

    /// Register `mapper` under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, mapper: impl RandomMapper + 'static) {
        self.mappers.insert(name.into(), Box::new(mapper));
    }

    pub fn get(&self, name: &str) -> Option<&dyn RandomMapper> {
        self.mappers.get(name).map(|m| m.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.mappers.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_enum_ordinals() {
        let m = EnumMapper::with_excluded(["Read", "Write", "Flush", "Nop"], ["Flush"]);
        assert_eq!(m.len(), 3);
        assert_eq!(m.width(), 2);
        assert_eq!(m.ordinal("Read"), Some(0));
        assert_eq!(m.ordinal("Nop"), Some(2));
        assert_eq!(m.ordinal("Flush"), None);
        assert_eq!(m.variant(1), Some("Write"));
        assert_eq!(m.variant(3), None);
        let v = m.encode("Nop").unwrap();
        assert_eq!(m.decode(&v), Some("Nop"));
    }

    #[test]
    fn test_enum_constraints() {
        let m = EnumMapper::new(["A", "B", "C"]);
        let c = m.constraints_for(VarId(4));
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].to_string(), "(v4 <= 2'd2)");

        assert_eq!(EnumMapper::new(["Only"]).width(), 1);
        assert_eq!(EnumMapper::new(Vec::<String>::new()).constraints(), vec![ConstraintExpr::bool(false)]);
    }

    #[test]
    fn test_registry() {
        let mut registry = MapperRegistry::new();
        assert!(registry.contains("bit"));
        registry.register("op", EnumMapper::new(["A", "B"]));
        assert_eq!(registry.get("op").map(|m| m.width()), Some(1));
        assert!(registry.get("missing").is_none());
    }
}
