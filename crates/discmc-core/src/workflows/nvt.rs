use crate::core::forcefield::ForceField;
use crate::core::models::Configuration;
use crate::engine::error::EngineError;
use crate::engine::integrator::Integrator;
use crate::engine::progress::{Progress, ProgressReporter, RunReport};
use crate::engine::relaxation;
use rand::Rng;
use tracing::{info, instrument};

/// Parameters of one canonical-ensemble run.
///
/// `pressure` is carried for interface compatibility with other ensembles
/// (NPT, Gibbs) and reported back, but never consulted by the sampler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NvtParams {
    pub n_steps: usize,
    pub print_frequency: usize,
    pub beta: f64,
    pub pressure: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub final_energy: f64,
    pub relaxation_steps: usize,
    pub accepted: u64,
    pub attempted: u64,
    pub dl_max: f64,
}

/// Runs the complete NVT procedure on a loaded configuration: the load
/// report, the overlap-relaxation phase when the initial energy sits at
/// the big sentinel, the main Metropolis loop in `print_frequency` chunks,
/// and the final summary.
///
/// All progress data flows through `reporter`; the driver owns formatting.
#[instrument(skip_all, name = "nvt_workflow", fields(n_steps = params.n_steps, beta = params.beta))]
pub fn run(
    config: &mut Configuration,
    forcefield: &ForceField,
    params: &NvtParams,
    rng: &mut impl Rng,
    reporter: &ProgressReporter,
) -> Result<RunSummary, EngineError> {
    let mut relief_integrator = Integrator::new(config.x_size().min(config.y_size()) / 2.0);

    let energy = config.energy(forcefield);
    reporter.report(Progress::Loaded {
        report: make_report(0, config, params, &relief_integrator, energy),
    });
    info!(energy, n_objects = config.n_objects(), "configuration loaded");

    let relaxation_steps = relaxation::relieve_overlaps(
        config,
        forcefield,
        &mut relief_integrator,
        params.beta,
        params.pressure,
        rng,
    )?;
    if relaxation_steps > 0 {
        let energy = config.energy(forcefield);
        reporter.report(Progress::Relaxed {
            steps: relaxation_steps,
            report: make_report(0, config, params, &relief_integrator, energy),
        });
    }

    // The relief integrator is discarded here; only its adapted step width
    // carries into the sampling loop, so the reported acceptance counters
    // cover main-loop trials alone.
    let mut integrator = Integrator::new(relief_integrator.dl_max);

    let mut completed = 0usize;
    while completed < params.n_steps {
        let chunk = if params.print_frequency == 0 {
            params.n_steps - completed
        } else {
            params.print_frequency.min(params.n_steps - completed)
        };
        integrator.run(
            config,
            forcefield,
            params.beta,
            params.pressure,
            chunk,
            rng,
        );
        completed += chunk;

        let energy = config.energy(forcefield);
        reporter.report(Progress::Sampled {
            report: make_report(completed, config, params, &integrator, energy),
        });
    }

    let final_energy = config.energy(forcefield);
    reporter.report(Progress::Finished {
        report: make_report(completed, config, params, &integrator, final_energy),
    });
    info!(final_energy, "run complete");

    Ok(RunSummary {
        final_energy,
        relaxation_steps,
        accepted: integrator.n_good,
        attempted: integrator.n_good + integrator.n_bad,
        dl_max: integrator.dl_max,
    })
}

fn make_report(
    step: usize,
    config: &Configuration,
    params: &NvtParams,
    integrator: &Integrator,
    energy: f64,
) -> RunReport {
    let area = config.area();
    RunReport {
        step,
        n_objects: config.n_objects(),
        pressure: params.pressure,
        beta: params.beta,
        area,
        density: config.n_objects() as f64 / area,
        energy,
        accepted: integrator.n_good,
        attempted: integrator.n_good + integrator.n_bad,
        dl_max: integrator.dl_max,
    }
}
