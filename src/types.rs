//! Newtypes for decision variables and their ordering positions.
//!
//! The solver lays out every bit of every random variable at a fixed position
//! ("level") of the variable ordering. Decision variables of the [`Bdd`][crate::bdd::Bdd]
//! are 1-indexed, so a level maps to the decision variable `level + 1`.
use std::fmt;

/// A decision variable of the BDD (1-indexed, 0 is reserved for the terminal).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    /// # Panics
    ///
    /// Panics if `id == 0`.
    pub fn new(id: u32) -> Self {
        assert_ne!(id, 0, "Variable IDs must be >= 1");
        Var(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }

    /// Level this decision variable occupies.
    pub fn level(self) -> Level {
        Level(self.0 as usize - 1)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

/// A position in the variable ordering (0-indexed, level 0 is closest to the root).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Level(usize);

impl Level {
    pub fn new(index: usize) -> Self {
        Level(index)
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn next(self) -> Self {
        Level(self.0 + 1)
    }

    /// Decision variable placed at this level.
    pub fn var(self) -> Var {
        Var(self.0 as u32 + 1)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

impl From<usize> for Level {
    fn from(index: usize) -> Self {
        Level(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_creation() {
        let v1 = Var::new(1);
        let v2 = Var::new(2);
        assert_eq!(v1.id(), 1);
        assert!(v1 < v2);
    }

    #[test]
    #[should_panic(expected = "Variable IDs must be >= 1")]
    fn test_var_zero_panics() {
        Var::new(0);
    }

    #[test]
    fn test_level_var_roundtrip() {
        let l0 = Level::new(0);
        assert_eq!(l0.var(), Var::new(1));
        assert_eq!(l0.next().var().level(), Level::new(1));
        assert_eq!(Var::new(5).level().index(), 4);
    }
}
