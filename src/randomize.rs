//! Randomization of host storage.
//!
//! A [`RandSpec`] declares which host fields are random, which plain state fields the
//! constraints may read, and the named constraint blocks. [`Solver::randomize`]
//! reads the current values through a [`HostStorage`], solves, and writes every
//! sampled value back, or nothing at all if solving fails.

use std::collections::HashSet;

use log::debug;

use crate::constraint::{ConstraintSet, NamedConstraint};
use crate::error::{Result, SolveError};
use crate::solver::{Problem, Solver};
use crate::value::{Assignment, BitVector};
use crate::variable::{VarId, Variable};
use crate::walk::Entropy;

/// Accessors of the storage the variables live in.
pub trait HostStorage {
    fn read(&self, var: &Variable) -> Option<BitVector>;

    fn write(&mut self, var: &Variable, value: &BitVector);

    /// Called before any value is read.
    fn pre_randomize(&mut self) {}

    /// Called after a successful write-back.
    fn post_randomize(&mut self) {}
}

impl HostStorage for Assignment {
    fn read(&self, var: &Variable) -> Option<BitVector> {
        self.get(var.id).cloned()
    }

    fn write(&mut self, var: &Variable, value: &BitVector) {
        self.insert(var.id, value.clone());
    }
}

/// Declarative description of the random fields of a host object.
#[derive(Debug, Clone, Default)]
pub struct RandSpec {
    random: Vec<Variable>,
    state: Vec<Variable>,
    constraints: Vec<NamedConstraint>,
    disabled_vars: HashSet<VarId>,
    disabled_constraints: HashSet<String>,
}

impl RandSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rand(mut self, var: Variable) -> Self {
        self.random.push(var);
        self
    }

    /// A non-random field the constraints may refer to.
    pub fn state(mut self, var: Variable) -> Self {
        self.state.push(var);
        self
    }

    pub fn constraint(mut self, constraint: NamedConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.random.iter().chain(&self.state)
    }

    pub fn is_rand_enabled(&self, id: VarId) -> bool {
        self.random.iter().any(|v| v.id == id) && !self.disabled_vars.contains(&id)
    }

    pub fn is_constraint_enabled(&self, name: &str) -> bool {
        self.constraints.iter().any(|c| c.name == name) && !self.disabled_constraints.contains(name)
    }

    /// Returns whether the variable was enabled before.
    pub fn enable_rand(&mut self, id: VarId) -> bool {
        !self.disabled_vars.remove(&id)
    }

    /// Returns whether the variable was enabled before.
    pub fn disable_rand(&mut self, id: VarId) -> bool {
        self.disabled_vars.insert(id)
    }

    /// Returns whether the constraint was enabled before.
    pub fn enable_constraint(&mut self, name: &str) -> bool {
        !self.disabled_constraints.remove(name)
    }

    /// Returns whether the constraint was enabled before.
    pub fn disable_constraint(&mut self, name: &str) -> bool {
        self.disabled_constraints.insert(name.to_string())
    }

    pub fn enable_all(&mut self) {
        self.disabled_vars.clear();
        self.disabled_constraints.clear();
    }

    /// Active constraints.
    pub fn active_constraints(&self) -> ConstraintSet {
        let mut set = ConstraintSet::new();
        for c in self.constraints.iter().filter(|c| !self.disabled_constraints.contains(&c.name)) {
            set.extend(&c.exprs);
        }
        set
    }

    /// Solve request for the current state of `host`.
    ///
    /// Disabled random variables and state variables are fixed to their current value.
    pub fn to_problem<H: HostStorage + ?Sized>(&self, host: &H) -> Result<Problem> {
        let mut problem = Problem::new().with_constraints(&self.active_constraints());
        let referenced = problem.constraints.referenced_vars();
        for var in &self.random {
            if !self.disabled_vars.contains(&var.id) {
                problem = problem.random(var.clone());
            } else if referenced.contains(&var.id) {
                let value = host.read(var).ok_or(SolveError::UnknownVariable(var.id))?;
                problem = problem.fixed(var.clone(), value);
            }
        }
        for var in self.state.iter().filter(|v| referenced.contains(&v.id)) {
            let value = host.read(var).ok_or(SolveError::UnknownVariable(var.id))?;
            problem = problem.fixed(var.clone(), value);
        }
        Ok(problem)
    }
}

impl Solver {
    /// Randomize the enabled random variables of `spec` in `host`.
    ///
    /// Host storage is written only once every value has been sampled.
    pub fn randomize<H, E>(&mut self, spec: &RandSpec, host: &mut H, entropy: &mut E) -> Result<Assignment>
    where
        H: HostStorage + ?Sized,
        E: Entropy + ?Sized,
    {
        host.pre_randomize();
        let problem = spec.to_problem(&*host)?;
        let solution = self.solve(&problem)?;
        let assignment = self.commit(&solution, entropy)?;
        for var in &problem.random {
            if let Some(value) = assignment.get(var.id) {
                host.write(var, value);
            }
        }
        host.post_randomize();
        debug!("Randomized {} variables", assignment.len());
        Ok(assignment)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use test_log::test;

    use super::*;
    use crate::expr::ConstraintExpr as E;

    #[derive(Default)]
    struct Host {
        values: Assignment,
        pre: usize,
        post: usize,
    }

    impl HostStorage for Host {
        fn read(&self, var: &Variable) -> Option<BitVector> {
            self.values.read(var)
        }

        fn write(&mut self, var: &Variable, value: &BitVector) {
            self.values.write(var, value);
        }

        fn pre_randomize(&mut self) {
            self.pre += 1;
        }

        fn post_randomize(&mut self) {
            self.post += 1;
        }
    }

    fn spec() -> RandSpec {
        RandSpec::new()
            .rand(Variable::new(0, "a", 8))
            .rand(Variable::new(1, "b", 8))
            .state(Variable::new(2, "max", 8))
            .constraint(NamedConstraint::new("bounds", [E::var(0).lt(E::var(2))]))
            .constraint(NamedConstraint::new("order", [E::var(1).gt(E::var(0))]))
    }

    #[test]
    fn test_enable_disable() {
        let mut spec = spec();
        assert!(spec.is_rand_enabled(VarId(0)));
        assert!(spec.disable_rand(VarId(0)));
        assert!(!spec.disable_rand(VarId(0)));
        assert!(!spec.is_rand_enabled(VarId(0)));
        assert!(!spec.enable_rand(VarId(0)));
        assert!(spec.enable_rand(VarId(0)));

        assert!(spec.disable_constraint("order"));
        assert!(!spec.is_constraint_enabled("order"));
        assert_eq!(spec.active_constraints().len(), 1);
        spec.enable_all();
        assert!(spec.is_constraint_enabled("order"));
        assert_eq!(spec.active_constraints().len(), 2);
        assert!(!spec.is_constraint_enabled("missing"));
    }

    #[test]
    fn test_randomize_writes_back() {
        let spec = spec();
        let mut host = Host::default();
        host.values.insert(VarId(2), BitVector::from_u64(8, 10));
        let mut solver = Solver::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..20 {
            let a = solver.randomize(&spec, &mut host, &mut rng).unwrap();
            let (x, y) = (a.get_u64(VarId(0)).unwrap(), a.get_u64(VarId(1)).unwrap());
            assert!(x < 10 && y > x);
            assert_eq!(host.values.get_u64(VarId(0)), Some(x));
            assert_eq!(host.values.get_u64(VarId(1)), Some(y));
        }
        assert_eq!(host.pre, 20);
        assert_eq!(host.post, 20);
    }

    #[test]
    fn test_missing_state_value() {
        let spec = spec();
        let mut host = Host::default();
        let mut solver = Solver::default();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let res = solver.randomize(&spec, &mut host, &mut rng);
        assert_eq!(res.err(), Some(SolveError::UnknownVariable(VarId(2))));
        assert!(host.values.is_empty());
        assert_eq!(host.post, 0);
    }
}
