//! Constraint expression trees.
//!
//! A [`ConstraintExpr`] is what a front end (parser, code generator or hand-written
//! setup) hands to the solver. Trees can be built with the constructors below and
//! the arithmetic/bitwise operators of `std::ops`:
//!
//! ```
//! use bdd_randsolver::expr::ConstraintExpr as E;
//!
//! let a = E::var(0);
//! let b = E::var(1);
//! let c = (a.clone() + b).equal(10).and(a.inside([E::range(1, 4)]));
//! assert_eq!(c.to_string(), "(((v0 + v1) == 10) && (v0 inside {[1:4]}))");
//! ```

use std::fmt::{Display, Formatter};
use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Rem, Shl, Shr, Sub};

use crate::value::BitVector;
use crate::variable::VarId;

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Literal {
    /// 1 bit, unsigned.
    Bool(bool),
    /// 8 bits, unsigned.
    Char(u8),
    /// 32 bits, signed.
    Int(i32),
    /// 64 bits, signed.
    Long(i64),
    /// Any width.
    Bits { value: BitVector, signed: bool },
    /// Rejected by the solver.
    String(String),
    /// Rejected by the solver; stored as raw bits.
    Float(u32),
    /// Rejected by the solver; stored as raw bits.
    Double(u64),
    /// Rejected by the solver.
    Null,
}

impl Literal {
    /// Bit pattern and signedness, or `None` for literal kinds the solver rejects.
    pub fn to_value(&self) -> Option<(BitVector, bool)> {
        match self {
            Literal::Bool(b) => Some((BitVector::from_u64(1, *b as u64), false)),
            Literal::Char(c) => Some((BitVector::from_u64(8, *c as u64), false)),
            Literal::Int(i) => Some((BitVector::from_i64(32, *i as i64), true)),
            Literal::Long(l) => Some((BitVector::from_i64(64, *l), true)),
            Literal::Bits { value, signed } => Some((value.clone(), *signed)),
            Literal::String(_) | Literal::Float(_) | Literal::Double(_) | Literal::Null => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Literal::Bool(_) => "bool",
            Literal::Char(_) => "char",
            Literal::Int(_) => "int",
            Literal::Long(_) => "long",
            Literal::Bits { .. } => "bitvector",
            Literal::String(_) => "string",
            Literal::Float(_) => "float",
            Literal::Double(_) => "double",
            Literal::Null => "null",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UnaryOp {
    Not,
    BitNot,
    Plus,
    Minus,
    ReduceAnd,
    ReduceOr,
    ReduceXor,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BinaryOp {
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    /// Sign-extending right shift.
    Shr,
    /// Zero-filling right shift.
    UShr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::ReduceAnd => "&",
            UnaryOp::ReduceOr => "|",
            UnaryOp::ReduceXor => "^",
        }
    }
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

/// Member of a set-membership test.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum SetMember {
    Value(ConstraintExpr),
    /// Inclusive range `[low:high]`.
    Range(ConstraintExpr, ConstraintExpr),
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ConstraintExpr {
    Literal(Literal),
    Var(VarId),
    Unary(UnaryOp, Box<ConstraintExpr>),
    Binary(BinaryOp, Box<ConstraintExpr>, Box<ConstraintExpr>),
    Inside {
        expr: Box<ConstraintExpr>,
        members: Vec<SetMember>,
        negated: bool,
    },
    /// `a -> b -> c`, folded from the left.
    Implies(Vec<ConstraintExpr>),
}

impl ConstraintExpr {
    pub fn var(id: impl Into<VarId>) -> Self {
        ConstraintExpr::Var(id.into())
    }

    pub fn bool(value: bool) -> Self {
        ConstraintExpr::Literal(Literal::Bool(value))
    }

    pub fn char(value: u8) -> Self {
        ConstraintExpr::Literal(Literal::Char(value))
    }

    pub fn int(value: i32) -> Self {
        ConstraintExpr::Literal(Literal::Int(value))
    }

    pub fn long(value: i64) -> Self {
        ConstraintExpr::Literal(Literal::Long(value))
    }

    pub fn bits(value: BitVector) -> Self {
        ConstraintExpr::Literal(Literal::Bits { value, signed: false })
    }

    pub fn signed_bits(value: BitVector) -> Self {
        ConstraintExpr::Literal(Literal::Bits { value, signed: true })
    }

    pub fn unary(op: UnaryOp, expr: impl Into<ConstraintExpr>) -> Self {
        ConstraintExpr::Unary(op, Box::new(expr.into()))
    }

    pub fn binary(op: BinaryOp, lhs: impl Into<ConstraintExpr>, rhs: impl Into<ConstraintExpr>) -> Self {
        ConstraintExpr::Binary(op, Box::new(lhs.into()), Box::new(rhs.into()))
    }

    pub fn range(low: impl Into<ConstraintExpr>, high: impl Into<ConstraintExpr>) -> SetMember {
        SetMember::Range(low.into(), high.into())
    }

    pub fn implies_all(exprs: impl IntoIterator<Item = ConstraintExpr>) -> Self {
        ConstraintExpr::Implies(exprs.into_iter().collect())
    }

    pub fn logical_not(self) -> Self {
        Self::unary(UnaryOp::Not, self)
    }

    pub fn bit_not(self) -> Self {
        Self::unary(UnaryOp::BitNot, self)
    }

    pub fn and(self, rhs: impl Into<ConstraintExpr>) -> Self {
        Self::binary(BinaryOp::And, self, rhs)
    }

    pub fn or(self, rhs: impl Into<ConstraintExpr>) -> Self {
        Self::binary(BinaryOp::Or, self, rhs)
    }

    pub fn implies(self, rhs: impl Into<ConstraintExpr>) -> Self {
        ConstraintExpr::Implies(vec![self, rhs.into()])
    }

    pub fn equal(self, rhs: impl Into<ConstraintExpr>) -> Self {
        Self::binary(BinaryOp::Eq, self, rhs)
    }

    pub fn not_equal(self, rhs: impl Into<ConstraintExpr>) -> Self {
        Self::binary(BinaryOp::Ne, self, rhs)
    }

    pub fn lt(self, rhs: impl Into<ConstraintExpr>) -> Self {
        Self::binary(BinaryOp::Lt, self, rhs)
    }

    pub fn le(self, rhs: impl Into<ConstraintExpr>) -> Self {
        Self::binary(BinaryOp::Le, self, rhs)
    }

    pub fn gt(self, rhs: impl Into<ConstraintExpr>) -> Self {
        Self::binary(BinaryOp::Gt, self, rhs)
    }

    pub fn ge(self, rhs: impl Into<ConstraintExpr>) -> Self {
        Self::binary(BinaryOp::Ge, self, rhs)
    }

    pub fn ushr(self, rhs: impl Into<ConstraintExpr>) -> Self {
        Self::binary(BinaryOp::UShr, self, rhs)
    }

    pub fn inside(self, members: impl IntoIterator<Item = SetMember>) -> Self {
        ConstraintExpr::Inside {
            expr: Box::new(self),
            members: members.into_iter().collect(),
            negated: false,
        }
    }

    pub fn not_inside(self, members: impl IntoIterator<Item = SetMember>) -> Self {
        ConstraintExpr::Inside {
            expr: Box::new(self),
            members: members.into_iter().collect(),
            negated: true,
        }
    }

    /// Visit this node and every sub-expression, parents first.
    pub fn walk(&self, f: &mut impl FnMut(&ConstraintExpr)) {
        f(self);
        match self {
            ConstraintExpr::Literal(_) | ConstraintExpr::Var(_) => {}
            ConstraintExpr::Unary(_, e) => e.walk(f),
            ConstraintExpr::Binary(_, lhs, rhs) => {
                lhs.walk(f);
                rhs.walk(f);
            }
            ConstraintExpr::Inside { expr, members, .. } => {
                expr.walk(f);
                for member in members {
                    match member {
                        SetMember::Value(e) => e.walk(f),
                        SetMember::Range(low, high) => {
                            low.walk(f);
                            high.walk(f);
                        }
                    }
                }
            }
            ConstraintExpr::Implies(exprs) => {
                for e in exprs {
                    e.walk(f);
                }
            }
        }
    }

    /// Copy of this tree with every variable reference for which `f` returns
    /// `Some(replacement)` replaced.
    pub fn substitute(&self, f: &impl Fn(VarId) -> Option<ConstraintExpr>) -> ConstraintExpr {
        match self {
            ConstraintExpr::Literal(_) => self.clone(),
            ConstraintExpr::Var(id) => f(*id).unwrap_or_else(|| self.clone()),
            ConstraintExpr::Unary(op, e) => ConstraintExpr::Unary(*op, Box::new(e.substitute(f))),
            ConstraintExpr::Binary(op, lhs, rhs) => {
                ConstraintExpr::Binary(*op, Box::new(lhs.substitute(f)), Box::new(rhs.substitute(f)))
            }
            ConstraintExpr::Inside { expr, members, negated } => ConstraintExpr::Inside {
                expr: Box::new(expr.substitute(f)),
                members: members
                    .iter()
                    .map(|m| match m {
                        SetMember::Value(e) => SetMember::Value(e.substitute(f)),
                        SetMember::Range(low, high) => SetMember::Range(low.substitute(f), high.substitute(f)),
                    })
                    .collect(),
                negated: *negated,
            },
            ConstraintExpr::Implies(exprs) => ConstraintExpr::Implies(exprs.iter().map(|e| e.substitute(f)).collect()),
        }
    }
}

impl From<VarId> for ConstraintExpr {
    fn from(id: VarId) -> Self {
        ConstraintExpr::Var(id)
    }
}

impl From<bool> for ConstraintExpr {
    fn from(value: bool) -> Self {
        ConstraintExpr::bool(value)
    }
}

impl From<i32> for ConstraintExpr {
    fn from(value: i32) -> Self {
        ConstraintExpr::int(value)
    }
}

impl From<i64> for ConstraintExpr {
    fn from(value: i64) -> Self {
        ConstraintExpr::long(value)
    }
}

impl From<BitVector> for ConstraintExpr {
    fn from(value: BitVector) -> Self {
        ConstraintExpr::bits(value)
    }
}

impl From<ConstraintExpr> for SetMember {
    fn from(value: ConstraintExpr) -> Self {
        SetMember::Value(value)
    }
}

macro_rules! binary_operator {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<R: Into<ConstraintExpr>> $trait<R> for ConstraintExpr {
            type Output = ConstraintExpr;

            fn $method(self, rhs: R) -> Self::Output {
                ConstraintExpr::binary($op, self, rhs)
            }
        }
    };
}

binary_operator!(Add, add, BinaryOp::Add);
binary_operator!(Sub, sub, BinaryOp::Sub);
binary_operator!(Mul, mul, BinaryOp::Mul);
binary_operator!(Div, div, BinaryOp::Div);
binary_operator!(Rem, rem, BinaryOp::Rem);
binary_operator!(BitAnd, bitand, BinaryOp::BitAnd);
binary_operator!(BitOr, bitor, BinaryOp::BitOr);
binary_operator!(BitXor, bitxor, BinaryOp::BitXor);
binary_operator!(Shl, shl, BinaryOp::Shl);
binary_operator!(Shr, shr, BinaryOp::Shr);

impl Neg for ConstraintExpr {
    type Output = ConstraintExpr;

    fn neg(self) -> Self::Output {
        ConstraintExpr::unary(UnaryOp::Minus, self)
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Char(c) => write!(f, "'{}'", (*c as char).escape_default()),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Long(l) => write!(f, "{}L", l),
            Literal::Bits { value, signed } => {
                write!(f, "{}'{}d{}", value.width(), if *signed { "s" } else { "" }, value.value())
            }
            Literal::String(s) => write!(f, "{:?}", s),
            Literal::Float(bits) => write!(f, "{}f", f32::from_bits(*bits)),
            Literal::Double(bits) => write!(f, "{}d", f64::from_bits(*bits)),
            Literal::Null => write!(f, "null"),
        }
    }
}

impl Display for SetMember {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SetMember::Value(e) => write!(f, "{}", e),
            SetMember::Range(low, high) => write!(f, "[{}:{}]", low, high),
        }
    }
}

impl Display for ConstraintExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintExpr::Literal(lit) => write!(f, "{}", lit),
            ConstraintExpr::Var(id) => write!(f, "{}", id),
            ConstraintExpr::Unary(op, e) => write!(f, "{}{}", op.symbol(), e),
            ConstraintExpr::Binary(op, lhs, rhs) => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
            ConstraintExpr::Inside { expr, members, negated } => {
                if *negated {
                    write!(f, "!")?;
                }
                write!(f, "({} inside {{", expr)?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", member)?;
                }
                write!(f, "}})")
            }
            ConstraintExpr::Implies(exprs) => {
                write!(f, "(")?;
                for (i, e) in exprs.iter().enumerate() {
                    if i > 0 {
                        write!(f, " -> ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type E = ConstraintExpr;

    #[test]
    fn test_display() {
        let e = (E::var(0) << 2).ge(-E::var(1)).or(E::bool(true).logical_not());
        assert_eq!(e.to_string(), "(((v0 << 2) >= -v1) || !true)");

        let e = E::var(0).not_inside([E::int(1).into(), E::range(3, E::long(5))]);
        assert_eq!(e.to_string(), "!(v0 inside {1, [3:5L]})");

        let e = E::implies_all([E::var(0), E::var(1), E::var(2).equal(E::char(b'a'))]);
        assert_eq!(e.to_string(), "(v0 -> v1 -> (v2 == 'a'))");

        let e = E::signed_bits(BitVector::from_i64(4, -1));
        assert_eq!(e.to_string(), "4'sd15");
    }

    #[test]
    fn test_literal_values() {
        let (v, signed) = Literal::Int(-2).to_value().unwrap();
        assert_eq!(v.width(), 32);
        assert!(signed);
        assert_eq!(v.to_i64(), Some(-2));

        let (v, signed) = Literal::Char(200).to_value().unwrap();
        assert_eq!(v.width(), 8);
        assert!(!signed);

        assert!(Literal::String("x".into()).to_value().is_none());
        assert!(Literal::Double(1.5f64.to_bits()).to_value().is_none());
        assert_eq!(Literal::Null.kind(), "null");
    }

    #[test]
    fn test_walk_and_substitute() {
        let e = (E::var(0) + E::var(1)).inside([E::range(E::var(2), 9)]);
        let mut vars = Vec::new();
        e.walk(&mut |node| {
            if let E::Var(id) = node {
                vars.push(id.0);
            }
        });
        assert_eq!(vars, vec![0, 1, 2]);

        let s = e.substitute(&|id: VarId| (id == VarId(1)).then(|| E::int(7)));
        assert_eq!(s.to_string(), "((v0 + 7) inside {[v2:9]})");
    }

    #[test]
    fn test_structural_equality() {
        let a = E::var(0).equal(5);
        let b = E::var(0).equal(5);
        let c = E::var(0).equal(E::long(5));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
