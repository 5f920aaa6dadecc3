use crate::reference::Ref;
use crate::utils::{pairing3, MyHash};

/// Decision node: tests `variable`, continues with `high` when it is set and with `low` otherwise.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Node {
    pub variable: u32,
    pub low: Ref,
    pub high: Ref,
}

impl Node {
    pub const TERMINAL: Node = Node {
        variable: 0,
        low: Ref::ONE,
        high: Ref::ONE,
    };
}

impl MyHash for Node {
    fn hash(&self) -> u64 {
        pairing3(self.variable as u64, self.low.raw() as u64, self.high.raw() as u64)
    }
}
