use crate::core::forcefield::ForceField;
use crate::core::models::Configuration;
use rand::Rng;
use std::f64::consts::TAU;
use tracing::{debug, instrument};

/// Fraction of trial moves the step-size controller aims to accept.
pub const TARGET_ACCEPTANCE: f64 = 0.5;

/// Multiplier applied to `dl_max` at every adaptation point.
const STEP_ADJUST: f64 = 1.1;

/// Floor for `dl_max`; the ceiling is half the smaller domain extent.
const DL_MIN: f64 = 1e-6;

/// The Metropolis driver for the canonical ensemble.
///
/// Owns nothing beyond its acceptance counters and the adaptive maximum
/// step `dl_max`; the configuration is borrowed per [`Integrator::run`]
/// call and the random source is supplied by the caller, which keeps
/// seeding (and therefore reproducibility) a caller concern.
#[derive(Debug, Clone)]
pub struct Integrator {
    pub dl_max: f64,
    pub n_good: u64,
    pub n_bad: u64,
    window_good: u64,
    window_total: u64,
}

impl Integrator {
    pub fn new(dl_max: f64) -> Self {
        Self {
            dl_max,
            n_good: 0,
            n_bad: 0,
            window_good: 0,
            window_total: 0,
        }
    }

    /// Accepted fraction over the whole lifetime of this integrator.
    pub fn acceptance(&self) -> f64 {
        let attempted = self.n_good + self.n_bad;
        if attempted == 0 {
            return 0.0;
        }
        self.n_good as f64 / attempted as f64
    }

    /// Runs `n_steps` Metropolis trial moves on `config` at inverse
    /// temperature `beta`.
    ///
    /// Each step selects one object uniformly, snapshots its pose, applies
    /// the compound trial (a translation of at most `dl_max` per axis
    /// followed by a full rotation), and accepts with probability
    /// `min(1, exp(-beta * delta_e))`. Rejected trials restore the pose and
    /// re-dirty the touched neighbourhood. Under hard walls a translation
    /// that leaves the box is refused outright and counted as rejected.
    ///
    /// `pressure` is accepted for interface compatibility with other
    /// ensembles and never consulted here. An empty configuration runs no
    /// moves.
    #[instrument(level = "debug", skip_all, fields(n_steps, beta))]
    pub fn run(
        &mut self,
        config: &mut Configuration,
        forcefield: &ForceField,
        beta: f64,
        _pressure: f64,
        n_steps: usize,
        rng: &mut impl Rng,
    ) {
        let n = config.n_objects();
        if n == 0 {
            return;
        }
        let dl_ceiling = config.x_size().min(config.y_size()) / 2.0;

        let mut energy = config.energy(forcefield);
        for _ in 0..n_steps {
            let index = rng.gen_range(0..n);
            let pose = config.pose(index);

            if !config.displace(index, self.dl_max, forcefield, rng) {
                self.record(false);
                self.adapt(n as u64, dl_ceiling);
                continue;
            }
            config.rotate(index, TAU, forcefield, rng);

            let trial_energy = config.energy(forcefield);
            let delta = trial_energy - energy;
            let accept = delta <= 0.0 || rng.gen::<f64>() < (-beta * delta).exp();

            if accept {
                energy = trial_energy;
            } else {
                config.restore_pose(index, pose, forcefield);
            }
            self.record(accept);
            self.adapt(n as u64, dl_ceiling);
        }
    }

    fn record(&mut self, accepted: bool) {
        if accepted {
            self.n_good += 1;
            self.window_good += 1;
        } else {
            self.n_bad += 1;
        }
        self.window_total += 1;
    }

    /// Every `cadence` trials, nudge `dl_max` toward the target acceptance:
    /// widen when more than half the window was accepted, narrow otherwise.
    /// The proposal stays symmetric and the adjustment only looks at
    /// history, so the chain is not biased.
    fn adapt(&mut self, cadence: u64, dl_ceiling: f64) {
        if self.window_total < cadence {
            return;
        }
        let fraction = self.window_good as f64 / self.window_total as f64;
        if fraction > TARGET_ACCEPTANCE {
            self.dl_max *= STEP_ADJUST;
        } else {
            self.dl_max /= STEP_ADJUST;
        }
        self.dl_max = self.dl_max.clamp(DL_MIN, dl_ceiling);
        debug!(fraction, dl_max = self.dl_max, "step size adapted");
        self.window_good = 0;
        self.window_total = 0;
    }
}
