//! # bdd-randsolver: constrained random values over Binary Decision Diagrams
//!
//! **`bdd-randsolver`** draws random values for a set of bit-vector variables such that
//! a list of constraints holds, with every satisfying assignment equally likely.
//!
//! ## How it works
//!
//! 1. Every random variable gets one decision variable per bit. Bits of different
//!    variables are interleaved (see [`levels`]).
//! 2. Each constraint is lowered to a boolean function over those bits by the
//!    symbolic arithmetic in [`arith`] (see [`eval`]).
//! 3. The conjunction of all constraints is the [`Solution`][crate::solver::Solution]:
//!    its satisfying assignments are exactly the legal values.
//! 4. A random walk from the root, weighted by satisfying-assignment counts, picks one
//!    of them (see [`walk`]).
//!
//! ## Basic usage
//!
//! ```rust
//! use bdd_randsolver::expr::ConstraintExpr as E;
//! use bdd_randsolver::solver::{Problem, Solver};
//! use bdd_randsolver::variable::{VarId, Variable};
//! use rand::SeedableRng;
//!
//! let mut solver = Solver::default();
//! let problem = Problem::new()
//!     .random(Variable::new(0, "a", 8))
//!     .random(Variable::new(1, "b", 8))
//!     .constrain((E::var(0) + E::var(1)).equal(2));
//! let solution = solver.solve(&problem).unwrap();
//!
//! let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(1);
//! let values = solver.commit(&solution, &mut rng).unwrap();
//! let (a, b) = (values.get_u64(VarId(0)).unwrap(), values.get_u64(VarId(1)).unwrap());
//! assert_eq!(a + b, 2);
//! ```
//!
//! ## Core components
//!
//! - **[`bdd`]**: the [`Bdd`][crate::bdd::Bdd] manager with hash-consed nodes and complement edges.
//! - **[`arith`]**: bit-vector operators on [`Bvd`][crate::bitvec::Bvd]s.
//! - **[`expr`]** and **[`constraint`]**: the constraint language.
//! - **[`solver`]**: solve cache, cyclic variables and garbage collection.
//! - **[`randomize`]**: reading and writing host storage.

pub mod arith;
pub mod bdd;
pub mod bitvec;
pub mod cache;
pub mod constraint;
pub mod cyclic;
pub mod dot;
pub mod error;
pub mod eval;
pub mod expr;
pub mod levels;
pub mod mapper;
pub mod node;
pub mod randomize;
pub mod reference;
pub mod sat;
pub mod solver;
pub mod table;
pub mod types;
pub mod utils;
pub mod value;
pub mod variable;
pub mod walk;
