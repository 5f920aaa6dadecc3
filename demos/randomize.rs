//! Randomize a bus transaction a number of times and print the values.
//!
//! Run with:
//! ```bash
//! cargo run --example randomize -- --count 10 --max-len 32
//! ```

use std::collections::BTreeMap;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use bdd_randsolver::constraint::NamedConstraint;
use bdd_randsolver::expr::{ConstraintExpr as E, SetMember};
use bdd_randsolver::mapper::{EnumMapper, RandomMapper};
use bdd_randsolver::randomize::RandSpec;
use bdd_randsolver::solver::{Solver, SolverConfig};
use bdd_randsolver::value::{Assignment, BitVector};
use bdd_randsolver::variable::{VarId, Variable};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of transactions.
    #[arg(long, value_name = "INT", default_value = "10")]
    count: usize,

    /// Upper bound of the payload length (state field).
    #[arg(long, value_name = "INT", default_value = "32")]
    max_len: u64,

    /// Seed of the random generator.
    #[arg(long, value_name = "INT", default_value = "42")]
    seed: u64,

    /// Disable the alignment constraint.
    #[arg(long)]
    unaligned: bool,

    /// Print the solved predicate in DOT format.
    #[arg(long)]
    dot: bool,
}

const KIND: VarId = VarId(0);
const ADDR: VarId = VarId(1);
const LEN: VarId = VarId(2);
const MAX_LEN: VarId = VarId(3);

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let args = Cli::parse();
    println!("args = {:?}", args);

    let kinds = EnumMapper::with_excluded(["Read", "Write", "Atomic", "Reserved"], ["Reserved"]);
    let mut solver = Solver::new(SolverConfig::default());
    solver.register_mapper("kind", kinds.clone());

    let kind = Variable::new(KIND, "kind", kinds.width()).mapped("kind");
    let addr = Variable::new(ADDR, "addr", 16);
    let len = Variable::new(LEN, "len", 8);
    let max_len = Variable::new(MAX_LEN, "max_len", 8);

    let atomic = kinds.ordinal("Atomic").unwrap_or(0) as i32;
    let mut spec = RandSpec::new()
        .rand(kind)
        .rand(addr)
        .rand(len)
        .state(max_len)
        .constraint(NamedConstraint::new(
            "length",
            [E::var(LEN).inside([E::range(1, E::var(MAX_LEN))])],
        ))
        .constraint(NamedConstraint::new(
            "atomic",
            [E::var(KIND)
                .equal(atomic)
                .implies(E::var(LEN).inside([SetMember::Value(E::int(4)), SetMember::Value(E::int(8))]))],
        ))
        .constraint(NamedConstraint::new("aligned", [(E::var(ADDR) & 7).equal(0)]));
    if args.unaligned {
        spec.disable_constraint("aligned");
    }

    let mut host = Assignment::new();
    host.insert(MAX_LEN, BitVector::from_u64(8, args.max_len));

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut histogram = BTreeMap::<String, usize>::new();
    for i in 0..args.count {
        let values = solver.randomize(&spec, &mut host, &mut rng)?;
        let kind = values.get(KIND).and_then(|v| kinds.decode(v)).unwrap_or("?");
        *histogram.entry(kind.to_string()).or_default() += 1;
        println!(
            "#{:<3} kind = {:<6} addr = 0x{:04x} len = {}",
            i,
            kind,
            values.get_u64(ADDR).unwrap_or(0),
            values.get_u64(LEN).unwrap_or(0)
        );
    }
    println!("kinds: {:?}", histogram);

    if args.dot {
        let problem = spec.to_problem(&host)?;
        let solution = solver.solve(&problem)?;
        println!("solutions: {}, nodes: {}", solution.count(), solution.size());
        println!("{}", solution.to_dot()?);
    }

    println!("solver = {:?}", solver.bdd());
    Ok(())
}
