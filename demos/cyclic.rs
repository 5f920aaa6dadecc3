//! Cyclic randomization: no value repeats until every legal value has been drawn.
//!
//! Run with:
//! ```bash
//! cargo run --example cyclic -- --width 3 --cycles 2
//! ```

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use bdd_randsolver::expr::ConstraintExpr as E;
use bdd_randsolver::solver::{Problem, Solver};
use bdd_randsolver::variable::{VarId, Variable};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Width of the cyclic variable, in bits.
    #[arg(long, value_name = "INT", default_value = "3")]
    width: usize,

    /// Exclusive upper bound of the values (defaults to `2^width`).
    #[arg(long, value_name = "INT")]
    bound: Option<i64>,

    /// Number of cycles to print.
    #[arg(long, value_name = "INT", default_value = "2")]
    cycles: usize,

    /// Seed of the random generator.
    #[arg(long, value_name = "INT", default_value = "1")]
    seed: u64,
}

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

    let id = VarId(0);
    let mut problem = Problem::new().random(Variable::new(id, "v", args.width).cyclic());
    if let Some(bound) = args.bound {
        problem = problem.constrain(E::var(id).lt(E::long(bound)));
    }

    let mut solver = Solver::default();
    let domain = solver.solve(&problem)?.count();
    println!("domain size = {}", domain);

    let per_cycle = usize::try_from(&domain)?;
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    for cycle in 0..args.cycles {
        let mut values = Vec::with_capacity(per_cycle);
        for _ in 0..per_cycle {
            let solution = solver.solve(&problem)?;
            let assignment = solver.commit(&solution, &mut rng)?;
            values.push(assignment.get_u64(id).unwrap_or(0));
        }
        println!("cycle {}: {:?}", cycle, values);
    }

    Ok(())
}
