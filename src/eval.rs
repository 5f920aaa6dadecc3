//! Lowering of constraint expressions to decision diagrams.
//!
//! Every node evaluates either to a boolean function or to a [`Bvd`]. Operators
//! convert between the two as needed: a boolean used as a number is a one-bit
//! unsigned vector, a vector used as a boolean means "non-zero".
//!
//! Some operators only make sense under side conditions that the expression does not
//! state. The amount of a symbolic signed shift must be non-negative: this is
//! collected as an *implicit* constraint while evaluating and conjoined into the result.
//! A symbolic divisor gets no such constraint, its zero case keeps whatever value the
//! division circuit gives (an all-ones quotient, the dividend as remainder).
//!
//! Both operands of every operator are evaluated, logical ones included, so that an
//! arithmetic error anywhere in an expression is reported.
//!
//! Evaluating an implicit constraint may produce further ones, so [`Evaluator::evaluate`]
//! keeps going until no new constraint shows up.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::bdd::Bdd;
use crate::bitvec::Bvd;
use crate::error::{Result, SolveError};
use crate::expr::{BinaryOp, ConstraintExpr, Literal, SetMember, UnaryOp};
use crate::reference::Ref;
use crate::variable::VarId;

/// Result of evaluating one expression node.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Value {
    Bool(Ref),
    Vector(Bvd),
}

pub struct Evaluator<'a> {
    bdd: &'a Bdd,
    vars: HashMap<VarId, Bvd>,
    /// Result width of arithmetic operators.
    width: usize,
    pending: Vec<ConstraintExpr>,
    seen: HashSet<ConstraintExpr>,
}

impl<'a> Evaluator<'a> {
    pub fn new(bdd: &'a Bdd, width: usize) -> Self {
        Self {
            bdd,
            vars: HashMap::new(),
            width,
            pending: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Bind variable `id` to the vector `value`.
    pub fn bind(&mut self, id: VarId, value: Bvd) {
        self.vars.insert(id, value);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Conjunction of `exprs` and of every implicit constraint they entail.
    pub fn evaluate_all<'e>(&mut self, exprs: impl IntoIterator<Item = &'e ConstraintExpr>) -> Result<Ref> {
        let mut result = self.bdd.one;
        for expr in exprs {
            let value = self.eval(expr)?;
            result = self.bdd.apply_and(result, self.to_bool(value));
        }
        while let Some(implicit) = self.pending.pop() {
            debug!("Implicit constraint: {}", implicit);
            let value = self.eval(&implicit)?;
            result = self.bdd.apply_and(result, self.to_bool(value));
        }
        Ok(result)
    }

    pub fn evaluate(&mut self, expr: &ConstraintExpr) -> Result<Ref> {
        self.evaluate_all([expr])
    }

    /// Implicit constraints collected so far and not yet evaluated.
    pub fn pending(&self) -> &[ConstraintExpr] {
        &self.pending
    }

    fn imply(&mut self, expr: ConstraintExpr) {
        if self.seen.insert(expr.clone()) {
            self.pending.push(expr);
        }
    }

    pub fn to_bool(&self, value: Value) -> Ref {
        match value {
            Value::Bool(f) => f,
            Value::Vector(v) => self.bdd.bv_reduce_or(&v),
        }
    }

    pub fn to_vec(&self, value: Value) -> Bvd {
        match value {
            Value::Bool(f) => Bvd::from_bool(f),
            Value::Vector(v) => v,
        }
    }

    fn eval_bool(&mut self, expr: &ConstraintExpr) -> Result<Ref> {
        let value = self.eval(expr)?;
        Ok(self.to_bool(value))
    }

    fn eval_vec(&mut self, expr: &ConstraintExpr) -> Result<Bvd> {
        let value = self.eval(expr)?;
        Ok(self.to_vec(value))
    }

    pub fn eval(&mut self, expr: &ConstraintExpr) -> Result<Value> {
        let bdd = self.bdd;
        match expr {
            ConstraintExpr::Literal(Literal::Bool(b)) => Ok(Value::Bool(bdd.constant(*b))),
            ConstraintExpr::Literal(lit) => {
                let (value, signed) = lit.to_value().ok_or_else(|| {
                    SolveError::InvalidConstraint(format!("{} literal `{}` is not supported", lit.kind(), lit))
                })?;
                Ok(Value::Vector(Bvd::constant(&value, signed)))
            }
            ConstraintExpr::Var(id) => self
                .vars
                .get(id)
                .cloned()
                .map(Value::Vector)
                .ok_or(SolveError::UnknownVariable(*id)),
            ConstraintExpr::Unary(op, e) => self.eval_unary(*op, e),
            ConstraintExpr::Binary(op, lhs, rhs) => self.eval_binary(*op, lhs, rhs),
            ConstraintExpr::Inside { expr, members, negated } => {
                let v = self.eval_vec(expr)?;
                let mut any = bdd.zero;
                for member in members {
                    let hit = match member {
                        SetMember::Value(e) => {
                            let m = self.eval_vec(e)?;
                            bdd.bv_eq(&v, &m)
                        }
                        SetMember::Range(low, high) => {
                            let low = self.eval_vec(low)?;
                            let high = self.eval_vec(high)?;
                            bdd.apply_and(bdd.bv_ge(&v, &low), bdd.bv_le(&v, &high))
                        }
                    };
                    any = bdd.apply_or(any, hit);
                }
                Ok(Value::Bool(if *negated { -any } else { any }))
            }
            ConstraintExpr::Implies(exprs) => {
                let (first, rest) = exprs.split_first().ok_or_else(|| {
                    SolveError::InvalidConstraint("implication needs at least two operands".to_string())
                })?;
                if rest.is_empty() {
                    return Err(SolveError::InvalidConstraint(
                        "implication needs at least two operands".to_string(),
                    ));
                }
                let mut acc = self.eval_bool(first)?;
                for e in rest {
                    let f = self.eval_bool(e)?;
                    acc = bdd.apply_imply(acc, f);
                }
                Ok(Value::Bool(acc))
            }
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, e: &ConstraintExpr) -> Result<Value> {
        let bdd = self.bdd;
        let value = self.eval(e)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(-self.to_bool(value)),
            UnaryOp::BitNot => match value {
                Value::Bool(f) => Value::Bool(-f),
                Value::Vector(v) => Value::Vector(bdd.bv_not(&v)),
            },
            UnaryOp::Plus => value,
            UnaryOp::Minus => Value::Vector(bdd.bv_neg(&self.to_vec(value))),
            UnaryOp::ReduceAnd => Value::Bool(bdd.bv_reduce_and(&self.to_vec(value))),
            UnaryOp::ReduceOr => Value::Bool(bdd.bv_reduce_or(&self.to_vec(value))),
            UnaryOp::ReduceXor => Value::Bool(bdd.bv_reduce_xor(&self.to_vec(value))),
        })
    }

    fn eval_binary(&mut self, op: BinaryOp, lhs: &ConstraintExpr, rhs: &ConstraintExpr) -> Result<Value> {
        let bdd = self.bdd;
        let a = self.eval(lhs)?;
        let b = self.eval(rhs)?;

        // Booleans stay booleans under logical and bitwise operators and equality.
        if let (Value::Bool(f), Value::Bool(g)) = (&a, &b) {
            let (f, g) = (*f, *g);
            match op {
                BinaryOp::And | BinaryOp::BitAnd => return Ok(Value::Bool(bdd.apply_and(f, g))),
                BinaryOp::Or | BinaryOp::BitOr => return Ok(Value::Bool(bdd.apply_or(f, g))),
                BinaryOp::BitXor | BinaryOp::Ne => return Ok(Value::Bool(bdd.apply_xor(f, g))),
                BinaryOp::Eq => return Ok(Value::Bool(bdd.apply_eq(f, g))),
                _ => {}
            }
        }

        let a = self.to_vec(a);
        let b = self.to_vec(b);
        let width = self.width;
        Ok(match op {
            BinaryOp::And => Value::Bool(bdd.apply_and(bdd.bv_reduce_or(&a), bdd.bv_reduce_or(&b))),
            BinaryOp::Or => Value::Bool(bdd.apply_or(bdd.bv_reduce_or(&a), bdd.bv_reduce_or(&b))),
            BinaryOp::BitAnd => Value::Vector(bdd.bv_and(&a, &b)),
            BinaryOp::BitOr => Value::Vector(bdd.bv_or(&a, &b)),
            BinaryOp::BitXor => Value::Vector(bdd.bv_xor(&a, &b)),
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => {
                if !b.is_const() && b.is_signed() {
                    self.imply(rhs.clone().ge(0));
                }
                Value::Vector(match op {
                    BinaryOp::Shl => bdd.bv_shl(&a, &b)?,
                    BinaryOp::Shr => bdd.bv_shr(&a, &b, true)?,
                    _ => bdd.bv_shr(&a, &b, false)?,
                })
            }
            BinaryOp::Eq => Value::Bool(bdd.bv_eq(&a, &b)),
            BinaryOp::Ne => Value::Bool(bdd.bv_neq(&a, &b)),
            BinaryOp::Lt => Value::Bool(bdd.bv_lt(&a, &b)),
            BinaryOp::Le => Value::Bool(bdd.bv_le(&a, &b)),
            BinaryOp::Gt => Value::Bool(bdd.bv_gt(&a, &b)),
            BinaryOp::Ge => Value::Bool(bdd.bv_ge(&a, &b)),
            BinaryOp::Add => Value::Vector(bdd.bv_add(&a, &b, width)),
            BinaryOp::Sub => Value::Vector(bdd.bv_sub(&a, &b, width)),
            BinaryOp::Mul => Value::Vector(bdd.bv_mul(&a, &b, width)),
            BinaryOp::Div => Value::Vector(bdd.bv_div(&a, &b, width)?),
            BinaryOp::Rem => Value::Vector(bdd.bv_rem(&a, &b, width)?),
        })
    }
}
