use crate::core::forcefield::ForceField;
use crate::core::topology::{AtomSite, Topology};
use nalgebra::{Point2, Rotation2, Vector2};
use rand::Rng;
use std::f64::consts::TAU;

/// A snapshot of an object's placement, recorded before a trial move so a
/// rejected move can be undone cheaply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Point2<f64>,
    pub orientation: f64,
}

/// A placed rigid body: an object type from the topology, a centre, and an
/// orientation, together with the cached sum of its interactions with every
/// other object (and the walls) and the dirty flag guarding that cache.
///
/// The `recalculate` flag is the sole coordinator of incremental energy
/// work: every mutation of the centre or orientation raises it, and only
/// [`Object::set_energy`] clears it.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    o_type: usize,
    position: Point2<f64>,
    orientation: f64,
    cached_energy: f64,
    recalculate: bool,
}

impl Object {
    pub fn new(o_type: usize, x: f64, y: f64, orientation: f64) -> Self {
        Self {
            o_type,
            position: Point2::new(x, y),
            orientation: orientation.rem_euclid(TAU),
            cached_energy: 0.0,
            recalculate: true,
        }
    }

    pub fn o_type(&self) -> usize {
        self.o_type
    }

    pub fn position(&self) -> Point2<f64> {
        self.position
    }

    pub fn orientation(&self) -> f64 {
        self.orientation
    }

    pub fn pose(&self) -> Pose {
        Pose {
            position: self.position,
            orientation: self.orientation,
        }
    }

    /// Reinstates a recorded pose and marks the cached energy stale.
    pub fn restore_pose(&mut self, pose: Pose) {
        self.position = pose.position;
        self.orientation = pose.orientation;
        self.recalculate = true;
    }

    /// Draws a displacement uniformly from `[-dl_max, +dl_max]` on each
    /// axis and applies it. Under periodic boundaries the centre is wrapped
    /// back into `[0, x_size) x [0, y_size)`; under walls a trial that
    /// leaves the box is refused without touching the object and `false` is
    /// returned so the caller can count it as a rejected move.
    pub fn displace(
        &mut self,
        rng: &mut impl Rng,
        dl_max: f64,
        x_size: f64,
        y_size: f64,
        periodic: bool,
    ) -> bool {
        let dx = rng.gen_range(-dl_max..=dl_max);
        let dy = rng.gen_range(-dl_max..=dl_max);
        let trial = self.position + Vector2::new(dx, dy);

        if periodic {
            self.position = Point2::new(trial.x.rem_euclid(x_size), trial.y.rem_euclid(y_size));
        } else {
            if trial.x < 0.0 || trial.x > x_size || trial.y < 0.0 || trial.y > y_size {
                return false;
            }
            self.position = trial;
        }
        self.recalculate = true;
        true
    }

    /// Adds a uniform draw from `[-theta_max/2, +theta_max/2]` to the
    /// orientation, kept in `[0, 2pi)`.
    pub fn rotate(&mut self, rng: &mut impl Rng, theta_max: f64) {
        let dtheta = rng.gen_range(-theta_max / 2.0..=theta_max / 2.0);
        self.orientation = (self.orientation + dtheta).rem_euclid(TAU);
        self.recalculate = true;
    }

    /// Scales the centre by `factor`, as part of an isotropic rescale of the
    /// enclosing configuration. Not exercised by the NVT driver.
    pub fn expand(&mut self, factor: f64) {
        self.position = Point2::from(self.position.coords * factor);
        self.recalculate = true;
    }

    /// World coordinates of one of this object's atoms.
    pub fn world_atom(&self, site: &AtomSite) -> Point2<f64> {
        self.position + Rotation2::new(self.orientation) * Vector2::new(site.x, site.y)
    }

    /// Sum of the pair energies between every atom of this object and every
    /// atom of `other`, with `shift` applied to a local copy of `other`'s
    /// centre. The shift carries the minimum-image translation chosen by
    /// the configuration; the stored partner is never mutated.
    pub fn interaction(
        &self,
        forcefield: &ForceField,
        topology: &Topology,
        other: &Object,
        shift: Vector2<f64>,
    ) -> f64 {
        let rotation = Rotation2::new(self.orientation);
        let other_rotation = Rotation2::new(other.orientation);
        let other_centre = other.position + shift;

        let mut value = 0.0;
        for site in topology.atoms(self.o_type) {
            let p = self.position + rotation * Vector2::new(site.x, site.y);
            for other_site in topology.atoms(other.o_type) {
                let q = other_centre + other_rotation * Vector2::new(other_site.x, other_site.y);
                value +=
                    forcefield.pair_energy(site.atom_type, other_site.atom_type, (p - q).norm());
            }
        }
        value
    }

    /// Wall repulsion for a non-periodic domain: the big sentinel if any
    /// atom disc crosses a wall, zero otherwise.
    pub fn wall_energy(
        &self,
        forcefield: &ForceField,
        topology: &Topology,
        x_size: f64,
        y_size: f64,
    ) -> f64 {
        for site in topology.atoms(self.o_type) {
            let p = self.world_atom(site);
            let r = forcefield.size(site.atom_type);
            if p.x < r || p.x > x_size - r || p.y < r || p.y > y_size - r {
                return forcefield.big_energy();
            }
        }
        0.0
    }

    /// Centre-to-centre distance, under the minimum-image convention when
    /// periodic.
    pub fn distance(&self, other: &Object, x_size: f64, y_size: f64, periodic: bool) -> f64 {
        let mut delta = other.position - self.position;
        if periodic {
            delta.x -= x_size * (delta.x / x_size).round();
            delta.y -= y_size * (delta.y / y_size).round();
        }
        delta.norm()
    }

    pub fn energy(&self) -> f64 {
        self.cached_energy
    }

    /// Stores a freshly computed interaction sum and clears the dirty flag.
    pub fn set_energy(&mut self, value: f64) {
        self.cached_energy = value;
        self.recalculate = false;
    }

    pub fn mark_dirty(&mut self) {
        self.recalculate = true;
    }

    pub fn needs_recalculation(&self) -> bool {
        self.recalculate
    }
}
