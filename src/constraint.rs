use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use crate::error::{Result, SolveError};
use crate::expr::ConstraintExpr;
use crate::variable::{VarId, Variable};

/// Conjunction of constraint expressions.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct ConstraintSet {
    exprs: Vec<ConstraintExpr>,
}

/// Metadata derived from a [`ConstraintSet`] before solving.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ConstraintInfo {
    /// Widest literal kind or variable referenced. Default width of arithmetic results.
    pub max_width: usize,
    /// Narrowest width that still holds every literal value and variable.
    pub min_width: usize,
    pub variables: BTreeSet<VarId>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, expr: impl Into<ConstraintExpr>) {
        self.exprs.push(expr.into());
    }

    pub fn with(mut self, expr: impl Into<ConstraintExpr>) -> Self {
        self.push(expr);
        self
    }

    pub fn exprs(&self) -> &[ConstraintExpr] {
        &self.exprs
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    pub fn extend(&mut self, other: &ConstraintSet) {
        self.exprs.extend(other.exprs.iter().cloned());
    }

    pub fn referenced_vars(&self) -> BTreeSet<VarId> {
        let mut vars = BTreeSet::new();
        for expr in &self.exprs {
            expr.walk(&mut |e| {
                if let ConstraintExpr::Var(id) = e {
                    vars.insert(*id);
                }
            });
        }
        vars
    }

    pub fn substitute(&self, f: &impl Fn(VarId) -> Option<ConstraintExpr>) -> ConstraintSet {
        self.exprs.iter().map(|e| e.substitute(f)).collect()
    }

    /// Check every node and collect width and variable metadata.
    ///
    /// `lookup` resolves a variable reference to its descriptor. Literal kinds the solver
    /// cannot represent, unknown variables, empty membership sets and implications
    /// with fewer than two operands are rejected.
    pub fn analyze<'a>(&self, lookup: impl Fn(VarId) -> Option<&'a Variable>) -> Result<ConstraintInfo> {
        let mut info = ConstraintInfo::default();
        let mut error = None;
        for expr in &self.exprs {
            expr.walk(&mut |e| {
                if error.is_some() {
                    return;
                }
                if let Err(err) = Self::check(e, &lookup, &mut info) {
                    error = Some(err);
                }
            });
            if let Some(err) = error {
                return Err(err);
            }
        }
        Ok(info)
    }

    fn check<'a>(
        expr: &ConstraintExpr,
        lookup: &impl Fn(VarId) -> Option<&'a Variable>,
        info: &mut ConstraintInfo,
    ) -> Result<()> {
        match expr {
            ConstraintExpr::Literal(lit) => {
                let (value, _) = lit.to_value().ok_or_else(|| {
                    SolveError::InvalidConstraint(format!("{} literal `{}` is not supported", lit.kind(), lit))
                })?;
                if value.width() == 0 {
                    return Err(SolveError::InvalidConstraint("zero-width literal".to_string()));
                }
                info.max_width = info.max_width.max(value.width());
                info.min_width = info.min_width.max(value.min_width());
            }
            ConstraintExpr::Var(id) => {
                let var = lookup(*id).ok_or(SolveError::UnknownVariable(*id))?;
                info.max_width = info.max_width.max(var.width);
                info.min_width = info.min_width.max(var.width);
                info.variables.insert(*id);
            }
            ConstraintExpr::Inside { members, .. } if members.is_empty() => {
                return Err(SolveError::InvalidConstraint(format!("empty set in `{}`", expr)));
            }
            ConstraintExpr::Implies(exprs) if exprs.len() < 2 => {
                return Err(SolveError::InvalidConstraint(format!(
                    "implication needs at least two operands, got {}",
                    exprs.len()
                )));
            }
            ConstraintExpr::Unary(..)
            | ConstraintExpr::Binary(..)
            | ConstraintExpr::Inside { .. }
            | ConstraintExpr::Implies(_) => {}
        }
        Ok(())
    }
}

impl FromIterator<ConstraintExpr> for ConstraintSet {
    fn from_iter<T: IntoIterator<Item = ConstraintExpr>>(iter: T) -> Self {
        Self {
            exprs: iter.into_iter().collect(),
        }
    }
}

impl Display for ConstraintSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, e) in self.exprs.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", e)?;
        }
        write!(f, "}}")
    }
}

/// A constraint block that can be switched on and off by name.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct NamedConstraint {
    pub name: String,
    pub exprs: ConstraintSet,
}

impl NamedConstraint {
    pub fn new(name: impl Into<String>, exprs: impl IntoIterator<Item = ConstraintExpr>) -> Self {
        Self {
            name: name.into(),
            exprs: exprs.into_iter().collect(),
        }
    }
}
