use std::process::ExitCode;
use clap::Parser;
use colored::*;
use anyhow::Result;
use serde::Serialize;
use rayon::prelude::*;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use ff_structure::PairTable;
use ff_energy::EnergyModel;
use ff_kinetics::LoopStructure;
use ff_kinetics::LoopStructureSSA;
use ff_kinetics::MinimalStandardRng;

use fuzzyfold::input_parsers::read_fasta_like_input;
use fuzzyfold::energy_parsers::EnergyModelArguments;
use fuzzyfold::kinetics_parsers::RateModelParams;

/// Structure occupancy across an ensemble of independent trajectories, at
/// one point on the logarithmic output-time ladder.
#[derive(Debug, Serialize)]
pub struct TimecourseFrame {
    pub time: f64,
    pub structures: std::collections::BTreeMap<String, usize>,
}

#[derive(Debug, Serialize)]
pub struct TimecourseReport {
    pub sequence: String,
    pub num_sims: usize,
    pub frames: Vec<TimecourseFrame>,
}

#[derive(Debug, Parser)]
#[command(name = "ff-timecourse")]
#[command(version, about = "Ensemble structure-occupancy timecourse from independent SSA trajectories")]
pub struct Cli {
    /// Input file (FASTA-like), or "-" for stdin
    #[arg(value_name = "INPUT", default_value = "-")]
    input: String,

    /// Number of independent trajectories to simulate.
    #[arg(short, long, default_value_t = 100)]
    num_sims: usize,

    /// Simulation stop time, shared by every trajectory.
    #[arg(long, default_value_t = 1.0)]
    t_end: f64,

    /// Seed for the ensemble's random number generators; trajectory `k`
    /// is seeded from `seed + k` so a run is fully reproducible.
    #[arg(long, default_value_t = 1)]
    seed: u32,

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

    let pb = ProgressBar::new(cli.num_sims as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );

    // Each trajectory records (time, structure) at every output-ladder
    // frame; since the ladder is deterministic, frame `k` lines up across
    // trajectories regardless of how many events each one fired.
    let trajectories: Vec<Vec<(f64, String)>> = (0..cli.num_sims)
        .into_par_iter()
        .map_init(
            || pb.clone(),
            |pb, k| {
                let loops = LoopStructure::try_from((&sequence[..], &pairings, &emodel))
                    .expect("structure decomposition of a previously-validated input");
                let mut simulator = LoopStructureSSA::from((loops, &rmodel));
                let mut rng = MinimalStandardRng::new(cli.seed.wrapping_add(k as u32));

                let mut frames = Vec::new();
                simulator
                    .simulate(&mut rng, cli.t_end, |t, _flux, ls| {
                        frames.push((t, ls.to_string()));
                        true
                    })
                    .expect("simulation engine invariant violated");

                pb.inc(1);
                frames
            },
        )
        .collect();
    pb.finish_with_message("All simulations complete!");

    let num_frames = trajectories.iter().map(|t| t.len()).max().unwrap_or(0);
    let mut frames = Vec::with_capacity(num_frames);
    for idx in 0..num_frames {
        let mut occupancy = std::collections::BTreeMap::new();
        let mut time = 0.0;
        for trajectory in &trajectories {
            // Trajectories that ended early (no more flux) hold their
            // structure at whatever frame they last reached.
            let (t, s) = trajectory
                .get(idx)
                .or_else(|| trajectory.last())
                .expect("a trajectory always emits at least its initial frame");
            time = *t;
            *occupancy.entry(s.clone()).or_insert(0) += 1;
        }
        frames.push(TimecourseFrame { time, structures: occupancy });
    }

    let report = TimecourseReport {
        sequence: sequence.to_string(),
        num_sims: cli.num_sims,
        frames,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
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
