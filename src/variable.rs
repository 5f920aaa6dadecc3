use std::fmt::{Display, Formatter};

use crate::error::{Result, SolveError};

/// Caller-supplied identity of a variable.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VarId(pub u32);

impl VarId {
    /// Stand-in for "the mapped variable" inside [`RandomMapper`][crate::mapper::RandomMapper] constraints.
    pub const PLACEHOLDER: VarId = VarId(u32::MAX);
}

impl From<u32> for VarId {
    fn from(id: u32) -> Self {
        VarId(id)
    }
}

impl Display for VarId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if *self == VarId::PLACEHOLDER {
            write!(f, "_")
        } else {
            write!(f, "v{}", self.0)
        }
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum VarMode {
    /// Any legal value on every sample.
    #[default]
    Free,
    /// No value repeats until every legal value has been produced once.
    Cyclic,
}

/// Descriptor of one random variable.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Variable {
    pub id: VarId,
    pub name: String,
    pub width: usize,
    pub signed: bool,
    pub mode: VarMode,
    /// Name of the [`RandomMapper`][crate::mapper::RandomMapper] whose innate constraint applies.
    pub mapper: Option<String>,
}

impl Variable {
    /// Unsigned, free variable.
    pub fn new(id: impl Into<VarId>, name: impl Into<String>, width: usize) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            width,
            signed: false,
            mode: VarMode::Free,
            mapper: None,
        }
    }

    pub fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    pub fn cyclic(mut self) -> Self {
        self.mode = VarMode::Cyclic;
        self
    }

    pub fn mapped(mut self, mapper: impl Into<String>) -> Self {
        self.mapper = Some(mapper.into());
        self
    }

    pub fn is_cyclic(&self) -> bool {
        self.mode == VarMode::Cyclic
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(SolveError::InvalidVariable(format!("'{}' has zero width", self.name)));
        }
        if self.id == VarId::PLACEHOLDER {
            return Err(SolveError::InvalidVariable(format!("'{}' uses the reserved id", self.name)));
        }
        Ok(())
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}{}",
            self.name,
            if self.signed { "i" } else { "u" },
            self.width
        )?;
        if self.is_cyclic() {
            write!(f, " (cyclic)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let v = Variable::new(3, "count", 4).signed().cyclic();
        assert_eq!(v.id, VarId(3));
        assert!(v.signed);
        assert!(v.is_cyclic());
        assert_eq!(v.to_string(), "count: i4 (cyclic)");
    }

    #[test]
    fn test_validate() {
        assert!(Variable::new(0, "ok", 1).validate().is_ok());
        assert!(matches!(
            Variable::new(0, "empty", 0).validate(),
            Err(SolveError::InvalidVariable(_))
        ));
        assert!(Variable::new(VarId::PLACEHOLDER, "bad", 8).validate().is_err());
    }
}
