//! Solver sessions.
//!
//! A [`Solver`] owns the decision-diagram manager, the cache of solved predicates,
//! the exclusions of cyclic variables and the registry of random mappers. Solving a
//! [`Problem`] gives a [`Solution`], the set of every satisfying assignment, and
//! committing a solution draws one [`Assignment`] from it.
//!
//! ```
//! use bdd_randsolver::expr::ConstraintExpr as E;
//! use bdd_randsolver::solver::{Problem, Solver};
//! use bdd_randsolver::variable::{VarId, Variable};
//! use rand::SeedableRng;
//!
//! let mut solver = Solver::default();
//! let problem = Problem::new()
//!     .random(Variable::new(0, "v", 8))
//!     .constrain(E::var(0).ge(5).and(E::var(0).le(10)));
//! let solution = solver.solve(&problem).unwrap();
//! assert_eq!(solution.count(), num_bigint::BigUint::from(6u32));
//!
//! let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(42);
//! let assignment = solver.commit(&solution, &mut rng).unwrap();
//! let v = assignment.get_u64(VarId(0)).unwrap();
//! assert!((5..=10).contains(&v));
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use log::{debug, info};
use num_bigint::BigUint;

use crate::bdd::{Bdd, BddConfig};
use crate::constraint::ConstraintSet;
use crate::cyclic::CyclicTracker;
use crate::dot::DotConfig;
use crate::error::{Result, SolveError};
use crate::eval::Evaluator;
use crate::expr::{ConstraintExpr, Literal};
use crate::levels::LevelMap;
use crate::mapper::{MapperRegistry, RandomMapper};
use crate::reference::Ref;
use crate::sat::Weights;
use crate::types::Var;
use crate::value::{Assignment, BitVector};
use crate::variable::{VarId, Variable};
use crate::walk::{random_walk, Entropy};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SolverConfig {
    pub bdd: BddConfig,
    /// Collect garbage at the start of a solve once the node table holds more nodes than this.
    pub gc_threshold: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            bdd: BddConfig::default(),
            gc_threshold: 1 << 20,
        }
    }
}

impl SolverConfig {
    pub fn with_bdd(mut self, bdd: BddConfig) -> Self {
        self.bdd = bdd;
        self
    }

    pub fn with_gc_threshold(mut self, threshold: usize) -> Self {
        self.gc_threshold = threshold;
        self
    }
}

/// One solve request: constraints, the variables to randomize, and the current
/// values of the referenced variables that stay fixed.
#[derive(Debug, Clone, Default)]
pub struct Problem {
    pub constraints: ConstraintSet,
    pub random: Vec<Variable>,
    pub fixed: Vec<(Variable, BitVector)>,
}

impl Problem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn random(mut self, var: Variable) -> Self {
        self.random.push(var);
        self
    }

    pub fn fixed(mut self, var: Variable, value: BitVector) -> Self {
        self.fixed.push((var, value));
        self
    }

    pub fn constrain(mut self, expr: impl Into<ConstraintExpr>) -> Self {
        self.constraints.push(expr);
        self
    }

    pub fn with_constraints(mut self, set: &ConstraintSet) -> Self {
        self.constraints.extend(set);
        self
    }
}

/// Set of satisfying assignments of a solved [`Problem`].
///
/// Cheap to clone. Keeps its nodes alive in the solver until dropped.
#[derive(Debug, Clone)]
pub struct Solution(Rc<SolutionData>);

#[derive(Debug)]
struct SolutionData {
    bdd: Rc<Bdd>,
    root: Ref,
    levels: LevelMap,
    variables: Vec<Variable>,
    weights: RefCell<Weights>,
}

impl Solution {
    fn new(bdd: Rc<Bdd>, root: Ref, levels: LevelMap, variables: Vec<Variable>) -> Self {
        let weights = RefCell::new(Weights::new(levels.num_levels()));
        Self(Rc::new(SolutionData {
            bdd,
            root,
            levels,
            variables,
            weights,
        }))
    }

    pub fn root(&self) -> Ref {
        self.0.root
    }

    pub fn variables(&self) -> &[Variable] {
        &self.0.variables
    }

    pub fn levels(&self) -> &LevelMap {
        &self.0.levels
    }

    /// Number of satisfying assignments.
    pub fn count(&self) -> BigUint {
        self.0.weights.borrow_mut().count(&self.0.bdd, self.0.root)
    }

    /// Number of nodes of the predicate, terminal included.
    pub fn size(&self) -> usize {
        self.0.bdd.size(self.0.root)
    }

    /// Graphviz rendering with nodes labelled `name[bit]`.
    pub fn to_dot(&self) -> std::result::Result<String, std::fmt::Error> {
        let data = &self.0;
        let label = |v: u32| match data.levels.owner(Var::new(v).level()) {
            Some((id, bit)) => {
                let name = data.variables.iter().find(|var| var.id == id).map_or("?", |var| var.name.as_str());
                format!("{}[{}]", name, bit)
            }
            None => format!("x{}", v),
        };
        data.bdd.to_dot_with(&[data.root], &DotConfig::default(), label)
    }

    /// Draw one assignment, uniformly among all satisfying ones.
    pub fn sample<E: Entropy + ?Sized>(&self, entropy: &mut E) -> Option<Assignment> {
        let data = &self.0;
        let mut weights = data.weights.borrow_mut();
        let bits = random_walk(&data.bdd, data.root, &mut weights, data.levels.num_levels(), entropy)?;
        Some(data.levels.decode(&bits))
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
struct SolveKey {
    constraints: ConstraintSet,
    variables: Vec<Variable>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    /// Predicate without cyclic exclusions.
    root: Ref,
    /// Values of the fixed variables the predicate was built with.
    fixed: Vec<(VarId, BitVector)>,
}

/// A problem after mapper expansion and analysis.
struct Prepared {
    constraints: ConstraintSet,
    /// Constraints with the fixed variables replaced by their values.
    substituted: ConstraintSet,
    fixed: Vec<(VarId, BitVector)>,
    width: usize,
}

#[derive(Debug)]
pub struct Solver {
    bdd: Rc<Bdd>,
    config: SolverConfig,
    cache: HashMap<SolveKey, CacheEntry>,
    cyclic: CyclicTracker,
    mappers: MapperRegistry,
    issued: Vec<Weak<SolutionData>>,
}

impl Default for Solver {
    fn default() -> Self {
        Solver::new(SolverConfig::default())
    }
}

/// Literal holding `value` as a value of `var`.
fn literal(var: &Variable, value: &BitVector) -> ConstraintExpr {
    ConstraintExpr::Literal(Literal::Bits {
        value: value.resize(var.width, var.signed),
        signed: var.signed,
    })
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            bdd: Rc::new(Bdd::new(config.bdd)),
            config,
            cache: HashMap::new(),
            cyclic: CyclicTracker::new(),
            mappers: MapperRegistry::new(),
            issued: Vec::new(),
        }
    }

    pub fn bdd(&self) -> &Bdd {
        &self.bdd
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn register_mapper(&mut self, name: impl Into<String>, mapper: impl RandomMapper + 'static) {
        self.mappers.register(name, mapper);
    }

    pub fn mappers(&self) -> &MapperRegistry {
        &self.mappers
    }

    fn prepare(&self, problem: &Problem) -> Result<Prepared> {
        let mut known = HashMap::new();
        for var in problem.random.iter().chain(problem.fixed.iter().map(|(var, _)| var)) {
            var.validate()?;
            if known.insert(var.id, var).is_some() {
                return Err(SolveError::InvalidVariable(format!("'{}' reuses id {}", var.name, var.id)));
            }
        }

        let mut constraints = problem.constraints.clone();
        for var in &problem.random {
            if let Some(name) = &var.mapper {
                let mapper = self.mappers.get(name).ok_or_else(|| {
                    SolveError::InvalidVariable(format!("'{}' uses unknown mapper '{}'", var.name, name))
                })?;
                for expr in mapper.constraints_for(var.id) {
                    constraints.push(expr);
                }
            }
        }

        let info = constraints.analyze(|id| known.get(&id).copied())?;

        let fixed: Vec<(VarId, BitVector)> = problem
            .fixed
            .iter()
            .filter(|(var, _)| info.variables.contains(&var.id))
            .map(|(var, value)| (var.id, value.resize(var.width, var.signed)))
            .collect();
        let values: HashMap<VarId, ConstraintExpr> = problem
            .fixed
            .iter()
            .map(|(var, value)| (var.id, literal(var, value)))
            .collect();
        let substituted = constraints.substitute(&|id: VarId| values.get(&id).cloned());

        Ok(Prepared {
            constraints,
            substituted,
            fixed,
            width: info.max_width.max(1),
        })
    }

    /// Build the set of assignments of `problem.random` that satisfy every constraint.
    ///
    /// The predicate is cached by constraints and variables, and rebuilt when a fixed
    /// value it depends on changes. Exclusions of cyclic variables are applied on
    /// top of the cached predicate on every call.
    pub fn solve(&mut self, problem: &Problem) -> Result<Solution> {
        if self.bdd.node_count() > self.config.gc_threshold {
            self.collect_garbage();
        }
        self.issued.retain(|s| s.strong_count() > 0);

        let prepared = self.prepare(problem)?;
        let levels = LevelMap::interleave(&problem.random);
        let key = SolveKey {
            constraints: prepared.constraints,
            variables: problem.random.clone(),
        };

        let cached = self
            .cache
            .get(&key)
            .filter(|entry| entry.fixed == prepared.fixed)
            .map(|entry| entry.root);
        let base = match cached {
            Some(root) => {
                debug!("Cache hit for {}", key.constraints);
                root
            }
            None => {
                debug!("Solving {} over {} levels", key.constraints, levels.num_levels());
                let mut evaluator = Evaluator::new(&self.bdd, prepared.width);
                for var in &problem.random {
                    if let Some(vector) = levels.vector(&self.bdd, var) {
                        evaluator.bind(var.id, vector);
                    }
                }
                let root = evaluator.evaluate_all(prepared.substituted.exprs())?;
                if self.bdd.is_zero(root) {
                    return Err(SolveError::Unsatisfiable);
                }
                self.cache.insert(
                    key,
                    CacheEntry {
                        root,
                        fixed: prepared.fixed,
                    },
                );
                root
            }
        };

        let mut root = base;
        for var in problem.random.iter().filter(|var| var.is_cyclic()) {
            let exclusion = self.cyclic.exclusion(&self.bdd, var, &levels);
            let next = self.bdd.apply_and(root, exclusion);
            if self.bdd.is_zero(next) {
                info!("No values of {} left in this cycle, starting a new one", var.name);
                self.cyclic.reset(var.id);
            } else {
                root = next;
            }
        }

        let solution = Solution::new(Rc::clone(&self.bdd), root, levels, problem.random.clone());
        self.issued.push(Rc::downgrade(&solution.0));
        Ok(solution)
    }

    /// Draw one assignment from `solution` and advance the cycles of its cyclic variables.
    pub fn commit<E: Entropy + ?Sized>(&mut self, solution: &Solution, entropy: &mut E) -> Result<Assignment> {
        let assignment = solution.sample(entropy).ok_or(SolveError::Unsatisfiable)?;
        for var in solution.variables().iter().filter(|var| var.is_cyclic()) {
            if let Some(value) = assignment.get(var.id) {
                if self.cyclic.record(&self.bdd, var, value) {
                    info!("Cycle of {} complete", var.name);
                }
            }
        }
        debug!("Sampled {}", assignment);
        Ok(assignment)
    }

    /// Whether `assignment`, together with the fixed values of `problem`, satisfies its constraints.
    pub fn satisfies(&self, problem: &Problem, assignment: &Assignment) -> Result<bool> {
        let prepared = self.prepare(problem)?;
        let values = problem
            .random
            .iter()
            .map(|var| {
                let value = assignment.get(var.id).ok_or(SolveError::UnknownVariable(var.id))?;
                Ok((var.id, literal(var, value)))
            })
            .collect::<Result<HashMap<_, _>>>()?;
        let constraints = prepared.substituted.substitute(&|id: VarId| values.get(&id).cloned());
        let mut evaluator = Evaluator::new(&self.bdd, prepared.width);
        let f = evaluator.evaluate_all(constraints.exprs())?;
        Ok(self.bdd.is_one(f))
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Forget every cyclic exclusion. Each cyclic variable starts a new cycle.
    pub fn reset_cycles(&mut self) {
        self.cyclic.clear();
    }

    /// Free every node not reachable from a live [`Solution`], a cached predicate or a
    /// cyclic exclusion. Returns the number of freed nodes.
    pub fn collect_garbage(&mut self) -> usize {
        self.issued.retain(|s| s.strong_count() > 0);
        let mut roots: Vec<Ref> = self.issued.iter().filter_map(Weak::upgrade).map(|s| s.root).collect();
        roots.extend(self.cache.values().map(|entry| entry.root));
        roots.extend(self.cyclic.roots());
        let freed = self.bdd.collect_garbage(&roots);
        info!("Garbage collection freed {} nodes, {} left", freed, self.bdd.node_count());
        freed
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use test_log::test;

    use super::*;
    use crate::expr::ConstraintExpr as E;
    use crate::mapper::EnumMapper;

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    #[test]
    fn test_solve_single_value() {
        let mut solver = Solver::default();
        let problem = Problem::new()
            .random(Variable::new(0, "v", 8))
            .constrain(E::var(0).equal(5));
        let solution = solver.solve(&problem).unwrap();
        assert_eq!(solution.count(), BigUint::from(1u32));
        let mut rng = rng(1);
        for _ in 0..20 {
            let a = solver.commit(&solution, &mut rng).unwrap();
            assert_eq!(a.get_u64(VarId(0)), Some(5));
        }
    }

    #[test]
    fn test_unsatisfiable_not_cached() {
        let mut solver = Solver::default();
        let problem = Problem::new()
            .random(Variable::new(0, "v", 2))
            .constrain(E::var(0).gt(3));
        assert_eq!(solver.solve(&problem).err(), Some(SolveError::Unsatisfiable));
        assert_eq!(solver.cache_len(), 0);
    }

    #[test]
    fn test_cache_reuse_and_fixed_values() {
        let mut solver = Solver::default();
        let limit = Variable::new(1, "limit", 4);
        let problem = |n| {
            Problem::new()
                .random(Variable::new(0, "v", 4))
                .fixed(limit.clone(), BitVector::from_u64(4, n))
                .constrain(E::var(0).lt(E::var(1)))
        };

        let s1 = solver.solve(&problem(3)).unwrap();
        let s2 = solver.solve(&problem(3)).unwrap();
        assert_eq!(s1.root(), s2.root());
        assert_eq!(solver.cache_len(), 1);

        let s3 = solver.solve(&problem(5)).unwrap();
        assert_eq!(s3.count(), BigUint::from(5u32));
        assert_eq!(solver.cache_len(), 1);
    }

    #[test]
    fn test_unreferenced_fixed_values_ignored() {
        let mut solver = Solver::default();
        let other = Variable::new(1, "other", 8);
        let problem = |n| {
            Problem::new()
                .random(Variable::new(0, "v", 4))
                .fixed(other.clone(), BitVector::from_u64(8, n))
                .constrain(E::var(0).lt(4))
        };
        let s1 = solver.solve(&problem(1)).unwrap();
        let s2 = solver.solve(&problem(2)).unwrap();
        assert_eq!(s1.root(), s2.root());
    }

    #[test]
    fn test_invalid_problems() {
        let mut solver = Solver::default();
        let dup = Problem::new()
            .random(Variable::new(0, "a", 4))
            .random(Variable::new(0, "b", 4));
        assert!(matches!(solver.solve(&dup), Err(SolveError::InvalidVariable(_))));

        let unknown = Problem::new().random(Variable::new(0, "a", 4)).constrain(E::var(1).equal(0));
        assert_eq!(solver.solve(&unknown).err(), Some(SolveError::UnknownVariable(VarId(1))));

        let mapper = Problem::new().random(Variable::new(0, "a", 4).mapped("missing"));
        assert!(matches!(solver.solve(&mapper), Err(SolveError::InvalidVariable(_))));
    }

    #[test]
    fn test_mapped_variable() {
        let mut solver = Solver::default();
        let mapper = EnumMapper::new(["Idle", "Busy", "Done"]);
        solver.register_mapper("state", mapper.clone());
        let var = Variable::new(0, "state", mapper.width()).mapped("state");
        let problem = Problem::new().random(var);
        let solution = solver.solve(&problem).unwrap();
        assert_eq!(solution.count(), BigUint::from(3u32));

        let mut rng = rng(2);
        let mut seen = HashSet::new();
        for _ in 0..50 {
            let a = solver.commit(&solution, &mut rng).unwrap();
            let name = mapper.decode(a.get(VarId(0)).unwrap()).unwrap();
            seen.insert(name.to_string());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_satisfies() {
        let solver = Solver::default();
        let problem = Problem::new()
            .random(Variable::new(0, "a", 8))
            .random(Variable::new(1, "b", 8))
            .constrain((E::var(0) + E::var(1)).equal(10));
        let mut good = Assignment::new();
        good.insert(VarId(0), BitVector::from_u64(8, 3));
        good.insert(VarId(1), BitVector::from_u64(8, 7));
        assert_eq!(solver.satisfies(&problem, &good), Ok(true));

        let mut bad = good.clone();
        bad.insert(VarId(1), BitVector::from_u64(8, 8));
        assert_eq!(solver.satisfies(&problem, &bad), Ok(false));

        let mut partial = Assignment::new();
        partial.insert(VarId(0), BitVector::from_u64(8, 3));
        assert_eq!(solver.satisfies(&problem, &partial), Err(SolveError::UnknownVariable(VarId(1))));
    }

    #[test]
    fn test_garbage_collection_keeps_live_solutions() {
        let mut solver = Solver::new(SolverConfig::default().with_gc_threshold(0));
        let v = Variable::new(0, "v", 8);
        let kept = solver
            .solve(&Problem::new().random(v.clone()).constrain(E::var(0).equal(42)))
            .unwrap();
        {
            let dropped = solver
                .solve(&Problem::new().random(v.clone()).constrain((E::var(0) * 3).lt(100)))
                .unwrap();
            assert!(dropped.count() > BigUint::from(1u32));
        }
        solver.clear_cache();
        let freed = solver.collect_garbage();
        assert!(freed > 0);

        let mut rng = rng(3);
        let a = solver.commit(&kept, &mut rng).unwrap();
        assert_eq!(a.get_u64(VarId(0)), Some(42));
        assert_eq!(kept.count(), BigUint::from(1u32));

        // A solve after collection rebuilds from scratch.
        let again = solver
            .solve(&Problem::new().random(v).constrain(E::var(0).equal(42)))
            .unwrap();
        assert_eq!(again.root(), kept.root());
    }

    #[test]
    fn test_solution_to_dot() {
        let mut solver = Solver::default();
        let problem = Problem::new()
            .random(Variable::new(0, "a", 2))
            .random(Variable::new(1, "b", 2))
            .constrain(E::var(0).equal(E::var(1)));
        let solution = solver.solve(&problem).unwrap();
        let dot = solution.to_dot().unwrap();
        assert!(dot.contains("a[0]"));
        assert!(dot.contains("b[1]"));
        assert!(solution.size() > 2);
    }
}
