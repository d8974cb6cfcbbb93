use crate::core::forcefield::ForceField;
use crate::core::models::Configuration;
use crate::engine::error::EngineError;
use crate::engine::integrator::Integrator;
use rand::Rng;
use tracing::{info, instrument};

/// Jiggles a freshly loaded configuration until its energy drops below the
/// big sentinel, relieving hard overlaps introduced by save/load round
/// trips or careless initial placement.
///
/// The ordinary Metropolis rule is used in batches of `2 * N` steps; a
/// `delta_e` measured from the sentinel naturally favours overlap-reducing
/// moves, so no special downhill-only logic is needed. Fails once more than
/// `2000 * N` steps have been consumed without relief.
///
/// Returns the number of steps taken (zero when the configuration was
/// already overlap-free).
#[instrument(level = "info", skip_all, fields(beta))]
pub fn relieve_overlaps(
    config: &mut Configuration,
    forcefield: &ForceField,
    integrator: &mut Integrator,
    beta: f64,
    pressure: f64,
    rng: &mut impl Rng,
) -> Result<usize, EngineError> {
    let n = config.n_objects();
    if n == 0 {
        return Ok(0);
    }

    let batch = 2 * n;
    let budget = 2000 * n;
    let mut steps_taken = 0usize;

    while config.energy(forcefield) >= forcefield.big_energy() {
        if steps_taken > budget {
            return Err(EngineError::RelaxationExceeded {
                steps_taken,
                budget,
            });
        }
        integrator.run(config, forcefield, beta, pressure, batch, rng);
        steps_taken += batch;
    }

    if steps_taken > 0 {
        info!(steps_taken, "initial overlaps relieved");
    }
    Ok(steps_taken)
}
