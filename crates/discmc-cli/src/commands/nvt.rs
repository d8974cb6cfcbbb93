use crate::cli::Cli;
use crate::error::{CliError, Result};
use discmc::core::forcefield::ForceField;
use discmc::core::io;
use discmc::core::topology::Topology;
use discmc::engine::progress::{Progress, ProgressReporter, RunReport};
use discmc::workflows::nvt::{self, NvtParams};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

pub fn run(args: &Cli) -> Result<()> {
    let forcefield = match &args.forcefield {
        Some(path) => ForceField::load(path)?,
        None => ForceField::uniform_discs(),
    };
    let topology = match &args.topology {
        Some(path) => Topology::load(path)?,
        None => Topology::uniform_discs(),
    };
    topology.validate_against(&forcefield)?;

    info!("Loading initial configuration from {:?}", args.initial_config);
    let mut config =
        io::read_from_path(&args.initial_config, topology).map_err(|e| CliError::ConfigRead {
            path: args.initial_config.clone(),
            source: e,
        })?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let params = NvtParams {
        n_steps: args.n_steps,
        print_frequency: args.print_frequency,
        beta: args.beta,
        pressure: args.pressure,
    };

    let reporter = ProgressReporter::with_callback(Box::new(print_progress));
    let summary = nvt::run(&mut config, &forcefield, &params, &mut rng, &reporter)?;

    info!(
        "Writing final configuration (energy {:.6}) to {:?}",
        summary.final_energy, args.final_config
    );
    io::write_to_path(&config, &args.final_config).map_err(|e| CliError::ConfigWrite {
        path: args.final_config.clone(),
        source: e,
    })?;

    Ok(())
}

/// The progress log stream: a three-line block per report, written to
/// standard output.
fn print_progress(event: Progress) {
    match event {
        Progress::Loaded { report } => {
            println!("Configuration loaded");
            print_state_block(&report);
        }
        Progress::Relaxed { steps, report } => {
            println!("After initial adjustments ({steps} steps):");
            print_state_block(&report);
        }
        Progress::Sampled { report } => {
            println!(
                "After {} steps N = {}, P = {}, beta = {}",
                report.step, report.n_objects, report.pressure, report.beta
            );
            println!(
                "Area = {}, Density = {} Energy = {}",
                report.area, report.density, report.energy
            );
            println!(
                "Moves {} in {}, Dist_max = {}",
                report.accepted, report.attempted, report.dl_max
            );
        }
        Progress::Finished { .. } => {
            println!();
            println!("...Done...");
        }
    }
}

fn print_state_block(report: &RunReport) {
    println!(
        "N objects = {:9} Pressure = {:9}   Beta = {:9}",
        report.n_objects, report.pressure, report.beta
    );
    println!(
        "Area      = {:9}  Density = {:9} Energy = {:9}",
        report.area, report.density, report.energy
    );
}
