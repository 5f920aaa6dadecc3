use std::fmt::{Display, Formatter};
use std::ops::Neg;

/// Edge handle into the [`Bdd`][crate::bdd::Bdd] node table.
///
/// The lowest bit is the complement flag, the remaining bits hold the node id.
/// Node `0` is the single terminal, so `Ref(0)` is the constant `true` and `Ref(1)`
/// is the constant `false`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Ref(u32);

impl Ref {
    pub const ONE: Ref = Ref(0);
    pub const ZERO: Ref = Ref(1);

    pub const fn new(id: u32, negated: bool) -> Self {
        Self((id << 1) | negated as u32)
    }

    pub const fn positive(id: u32) -> Self {
        Self::new(id, false)
    }

    /// Node id this edge points to.
    pub const fn id(self) -> u32 {
        self.0 >> 1
    }

    pub const fn is_negated(self) -> bool {
        self.0 & 1 != 0
    }

    /// The same edge with the complement flag cleared.
    pub const fn regular(self) -> Self {
        Self(self.0 & !1)
    }

    /// Raw encoding, used for hashing.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(self.0 ^ 1)
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", if self.is_negated() { "~" } else { "" }, self.id())
    }
}
