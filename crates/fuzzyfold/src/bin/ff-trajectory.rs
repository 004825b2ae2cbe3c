use std::process::ExitCode;
use clap::Parser;
use colored::*;
use anyhow::Result;

use ff_structure::PairTable;
use ff_energy::EnergyModel;
use ff_kinetics::LoopStructure;
use ff_kinetics::LoopStructureSSA;
use ff_kinetics::MinimalStandardRng;

use fuzzyfold::input_parsers::read_fasta_like_input;
use fuzzyfold::energy_parsers::EnergyModelArguments;
use fuzzyfold::kinetics_parsers::RateModelParams;

#[derive(Debug, Parser)]
#[command(name = "ff-trajectory")]
#[command(version, about = "Stochastic Simulation Algorithm for RNA folding")]
pub struct Cli {
    /// Input file (FASTA-like), or "-" for stdin
    #[arg(value_name = "INPUT", default_value = "-")]
    input: String,

    /// Simulation stop time.
    #[arg(long, default_value_t = 1.0)]
    t_end: f64,

    /// PRNG seed; identical seed and input reproduce a byte-identical
    /// trajectory.
    #[arg(long, default_value_t = 1)]
    seed: u32,

    /// Target dot-bracket structure; the trajectory stops as soon as the
    /// structure matches this exactly, instead of running to `t-end`.
    #[arg(long)]
    target: Option<String>,

    #[command(flatten, next_help_heading = "Kinetic model parameters")]
    kinetics: RateModelParams,

    #[command(flatten, next_help_heading = "Energy model parameters")]
    energy: EnergyModelArguments,
}

fn run(cli: Cli) -> Result<()> {
    let emodel = cli.energy.build_model()?;
    let rmodel = cli.kinetics.build(emodel.temperature());

    let (header, sequence, structure) = read_fasta_like_input(&cli.input)?;
    let pairings = PairTable::try_from(&structure)?;
    if let Some(h) = header {
        println!("{}", h.yellow())
    }
    println!("{}", sequence);

    let loops = LoopStructure::try_from((&sequence[..], &pairings, &emodel))
        .map_err(anyhow::Error::msg)?;
    let mut simulator = LoopStructureSSA::from((loops, &rmodel));
    let mut rng = MinimalStandardRng::new(cli.seed);

    simulator.simulate_to_target(&mut rng, cli.t_end, cli.target.as_deref(), |t, flux, ls| {
        println!("{:14.8e}\t{}\t{:>8.2}\t{:14.8e}", t, ls, ls.energy() as f64 / 100.0, flux);
        true
    })?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(fuzzyfold::exit_code_for_error(&e))
        }
    }
}
