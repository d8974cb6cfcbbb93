use crate::core::forcefield::ForceField;
use crate::core::models::object::{Object, Pose};
use crate::core::topology::Topology;
use nalgebra::{Point2, Vector2};
use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Domain extents must be positive, got {x_size} x {y_size}")]
    NonPositiveDomain { x_size: f64, y_size: f64 },
}

/// The complete state of a simulation: the rectangular domain and its
/// boundary policy, the ordered collection of placed objects, the owned
/// topology describing them, and the cached total interaction energy.
///
/// Energy bookkeeping is incremental. Every object carries the sum of its
/// interactions with all partners (so each pair is stored twice), and
/// [`Configuration::energy`] re-evaluates only objects whose dirty flag is
/// raised before halving the grand sum. The documented precondition is that
/// the dirty set reflects every structural change since the previous call;
/// all mutating operations on this type uphold it, including invalidating
/// the neighbourhood of both the departure and the arrival point of a move.
#[derive(Debug, Clone)]
pub struct Configuration {
    x_size: f64,
    y_size: f64,
    periodic: bool,
    objects: Vec<Object>,
    topology: Topology,
    saved_energy: f64,
    unchanged: bool,
}

impl Configuration {
    /// An empty periodic configuration over a validated domain.
    pub fn new(x_size: f64, y_size: f64, topology: Topology) -> Result<Self, ConfigurationError> {
        if !(x_size > 0.0 && y_size > 0.0) {
            return Err(ConfigurationError::NonPositiveDomain { x_size, y_size });
        }
        Ok(Self {
            x_size,
            y_size,
            periodic: true,
            objects: Vec::new(),
            topology,
            saved_energy: 0.0,
            unchanged: false,
        })
    }

    pub fn x_size(&self) -> f64 {
        self.x_size
    }

    pub fn y_size(&self) -> f64 {
        self.y_size
    }

    pub fn area(&self) -> f64 {
        self.x_size * self.y_size
    }

    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    /// Switches the boundary policy and invalidates every cached sum.
    pub fn set_periodic(&mut self, periodic: bool) {
        self.periodic = periodic;
        self.invalidate_all();
    }

    pub fn n_objects(&self) -> usize {
        self.objects.len()
    }

    pub fn object(&self, index: usize) -> &Object {
        &self.objects[index]
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// The highest object type in use, `None` when the configuration holds
    /// no objects.
    pub fn object_types(&self) -> Option<usize> {
        self.objects.iter().map(Object::o_type).max()
    }

    /// Takes ownership of an object. The newcomer arrives dirty, so the
    /// next energy call picks it up; its partners are invalidated here.
    pub fn add_object(&mut self, object: Object) {
        self.objects.push(object);
        let index = self.objects.len() - 1;
        let position = self.objects[index].position();
        self.invalidate_near(position, f64::INFINITY, index);
        self.unchanged = false;
    }

    /// Replaces the owned topology and invalidates every cached sum.
    pub fn set_topology(&mut self, topology: Topology) {
        self.topology = topology;
        self.invalidate_all();
    }

    pub fn is_unchanged(&self) -> bool {
        self.unchanged
    }

    /// Total interaction energy under the current force field.
    ///
    /// Objects flagged for recalculation are re-evaluated against every
    /// partner, using the minimum image of the partner's centre when
    /// periodic (the partner is shifted as a rigid body around its chosen
    /// image; atoms are never imaged independently) and the wall term when
    /// not. The per-object sums count every pair twice, so the returned
    /// total is half their grand sum. Idempotent between state changes.
    pub fn energy(&mut self, forcefield: &ForceField) -> f64 {
        if !self.unchanged {
            let dirty: Vec<usize> = (0..self.objects.len())
                .filter(|&i| self.objects[i].needs_recalculation())
                .collect();

            let mut refreshed = Vec::with_capacity(dirty.len());
            for &i in &dirty {
                let subject = &self.objects[i];
                let mut value = 0.0;
                for (j, partner) in self.objects.iter().enumerate() {
                    if j == i {
                        continue;
                    }
                    let shift = if self.periodic {
                        self.minimum_image_shift(subject.position(), partner.position())
                    } else {
                        Vector2::zeros()
                    };
                    value += subject.interaction(forcefield, &self.topology, partner, shift);
                }
                if !self.periodic {
                    value +=
                        subject.wall_energy(forcefield, &self.topology, self.x_size, self.y_size);
                }
                refreshed.push(value);
            }
            for (&i, value) in dirty.iter().zip(refreshed) {
                self.objects[i].set_energy(value);
            }

            self.saved_energy = self.objects.iter().map(Object::energy).sum();
            self.unchanged = true;
        }
        self.saved_energy / 2.0
    }

    /// Translation that brings `partner` onto its image nearest `subject`.
    fn minimum_image_shift(&self, subject: Point2<f64>, partner: Point2<f64>) -> Vector2<f64> {
        let delta = partner - subject;
        Vector2::new(
            -self.x_size * (delta.x / self.x_size).round(),
            -self.y_size * (delta.y / self.y_size).round(),
        )
    }

    /// Centre-to-centre distance at which two objects may still interact:
    /// the cutoff plus the reach of each body past its centre.
    fn invalidation_reach(&self, forcefield: &ForceField) -> f64 {
        forcefield.cutoff() + 2.0 * self.topology.interaction_reach(forcefield)
    }

    /// Marks every object within `distance` of `point` dirty, skipping
    /// `exclude` (the mover, which is flagged by its own mutation).
    fn invalidate_near(&mut self, point: Point2<f64>, distance: f64, exclude: usize) {
        let probe = Object::new(0, point.x, point.y, 0.0);
        let (x_size, y_size, periodic) = (self.x_size, self.y_size, self.periodic);
        for (i, object) in self.objects.iter_mut().enumerate() {
            if i == exclude {
                continue;
            }
            if probe.distance(object, x_size, y_size, periodic) < distance {
                object.mark_dirty();
            }
        }
    }

    fn invalidate_all(&mut self) {
        for object in &mut self.objects {
            object.mark_dirty();
        }
        self.unchanged = false;
    }

    /// Marks every object whose centre lies within `distance` of object
    /// `index`'s centre dirty.
    pub fn invalidate_within(&mut self, distance: f64, index: usize) {
        let centre = self.objects[index].position();
        self.invalidate_near(centre, distance, index);
    }

    pub fn mark_dirty(&mut self, index: usize) {
        self.objects[index].mark_dirty();
        self.unchanged = false;
    }

    pub fn pose(&self, index: usize) -> Pose {
        self.objects[index].pose()
    }

    /// Trial translation of object `index`. Returns `false` when a walled
    /// domain refuses the step, leaving all state untouched. On success the
    /// neighbourhoods of both the departure and the arrival point are
    /// invalidated so every stale partner sum is refreshed by the next
    /// energy call.
    pub fn displace(
        &mut self,
        index: usize,
        dl_max: f64,
        forcefield: &ForceField,
        rng: &mut impl Rng,
    ) -> bool {
        let departure = self.objects[index].position();
        let (x_size, y_size, periodic) = (self.x_size, self.y_size, self.periodic);
        let moved = self.objects[index].displace(rng, dl_max, x_size, y_size, periodic);
        if moved {
            let reach = self.invalidation_reach(forcefield);
            self.invalidate_near(departure, reach, index);
            self.invalidate_within(reach, index);
            self.unchanged = false;
        }
        moved
    }

    /// Trial rotation of object `index` by a uniform angle scaled by
    /// `theta_max`. The centre does not move, so one neighbourhood
    /// invalidation suffices.
    pub fn rotate(
        &mut self,
        index: usize,
        theta_max: f64,
        forcefield: &ForceField,
        rng: &mut impl Rng,
    ) {
        self.objects[index].rotate(rng, theta_max);
        let reach = self.invalidation_reach(forcefield);
        self.invalidate_within(reach, index);
        self.unchanged = false;
    }

    /// Undoes a rejected trial: invalidates around the trial placement,
    /// reinstates the recorded pose, and invalidates around the restored
    /// placement so the next energy call starts from clean caches.
    pub fn restore_pose(&mut self, index: usize, pose: Pose, forcefield: &ForceField) {
        let reach = self.invalidation_reach(forcefield);
        self.invalidate_within(reach, index);
        self.objects[index].restore_pose(pose);
        self.invalidate_within(reach, index);
        self.unchanged = false;
    }

    /// Isotropic rescale of the domain and every object centre.
    /// Orientations are unchanged; every cached sum is invalidated.
    pub fn expand(&mut self, factor: f64) {
        self.x_size *= factor;
        self.y_size *= factor;
        for object in &mut self.objects {
            object.expand(factor);
        }
        self.unchanged = false;
    }

    /// Atom-by-atom root mean square distance to a reference configuration.
    /// Returns `None` when the two configurations do not describe the same
    /// sequence of object types.
    pub fn rms(&self, reference: &Configuration) -> Option<f64> {
        if self.objects.len() != reference.objects.len() {
            return None;
        }
        let mut sum = 0.0;
        let mut count = 0usize;
        for (mine, theirs) in self.objects.iter().zip(&reference.objects) {
            if mine.o_type() != theirs.o_type() {
                return None;
            }
            for site in self.topology.atoms(mine.o_type()) {
                let d = mine.world_atom(site) - theirs.world_atom(site);
                sum += d.norm_squared();
                count += 1;
            }
        }
        if count == 0 {
            return Some(0.0);
        }
        Some((sum / count as f64).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Rotation2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f64::consts::TAU;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn periodic_box(objects: &[(f64, f64, f64)]) -> Configuration {
        let mut config = Configuration::new(10.0, 10.0, Topology::uniform_discs()).unwrap();
        for &(x, y, theta) in objects {
            config.add_object(Object::new(0, x, y, theta));
        }
        config
    }

    #[test]
    fn new_rejects_a_degenerate_domain() {
        let result = Configuration::new(0.0, 10.0, Topology::uniform_discs());
        assert!(matches!(
            result,
            Err(ConfigurationError::NonPositiveDomain { .. })
        ));
    }

    #[test]
    fn empty_configuration_has_zero_energy() {
        let ff = ForceField::uniform_discs();
        let mut config = periodic_box(&[]);
        assert_eq!(config.energy(&ff), 0.0);
        assert!(config.is_unchanged());
        assert_eq!(config.area(), 100.0);
    }

    #[test]
    fn single_object_has_zero_energy_under_periodic_boundaries() {
        let ff = ForceField::uniform_discs();
        let mut config = periodic_box(&[(5.0, 5.0, 0.0)]);
        assert_eq!(config.energy(&ff), 0.0);
    }

    #[test]
    fn energy_is_idempotent_and_bit_identical() {
        let ff = ForceField::uniform_discs();
        let mut config = periodic_box(&[(2.0, 2.0, 0.1), (3.4, 2.6, 1.3), (7.0, 8.0, 2.2)]);
        let first = config.energy(&ff);
        assert!(config.is_unchanged());
        let second = config.energy(&ff);
        assert_eq!(first.to_bits(), second.to_bits());
        assert!(config.is_unchanged());
    }

    #[test]
    fn energy_halves_the_double_counted_pair_sum() {
        let ff = ForceField::uniform_discs();
        let topology = Topology::uniform_discs();
        let mut config = periodic_box(&[(2.0, 2.0, 0.0), (3.5, 2.0, 0.0)]);
        let a = Object::new(0, 2.0, 2.0, 0.0);
        let b = Object::new(0, 3.5, 2.0, 0.0);
        let pair = a.interaction(&ff, &topology, &b, Vector2::zeros());
        assert!((config.energy(&ff) - pair).abs() < 1e-12);
    }

    #[test]
    fn energy_uses_the_minimum_image_across_the_boundary() {
        let ff = ForceField::uniform_discs();
        // 1.5 apart through the boundary, far apart directly.
        let mut config = periodic_box(&[(0.5, 5.0, 0.0), (9.0, 5.0, 0.0)]);
        let energy = config.energy(&ff);
        assert!(
            energy < 0.0,
            "images 1.5 apart should attract, got {}",
            energy
        );
    }

    #[test]
    fn overlapping_objects_reach_the_big_sentinel() {
        let ff = ForceField::uniform_discs();
        let mut config = periodic_box(&[(5.0, 5.0, 0.0), (5.0, 5.0, 1.0)]);
        assert!(config.energy(&ff) >= ff.big_energy());
    }

    #[test]
    fn moves_clear_unchanged_and_the_next_energy_call_restores_it() {
        let ff = ForceField::uniform_discs();
        let mut rng = rng();
        let mut config = periodic_box(&[(2.0, 2.0, 0.0), (7.0, 7.0, 0.0)]);
        config.energy(&ff);

        config.displace(0, 0.5, &ff, &mut rng);
        assert!(!config.is_unchanged());
        config.energy(&ff);
        assert!(config.is_unchanged());

        config.rotate(1, TAU, &ff, &mut rng);
        assert!(!config.is_unchanged());
        config.energy(&ff);
        assert!(config.is_unchanged());

        config.expand(1.01);
        assert!(!config.is_unchanged());
        config.energy(&ff);
        assert!(config.is_unchanged());
    }

    #[test]
    fn incremental_energy_matches_a_fresh_evaluation_after_moves() {
        let ff = ForceField::uniform_discs();
        let mut rng = rng();
        let mut config = periodic_box(&[
            (1.0, 1.0, 0.0),
            (2.3, 1.8, 0.4),
            (4.0, 4.2, 2.0),
            (8.5, 9.0, 1.0),
            (5.5, 7.5, 0.7),
        ]);
        config.energy(&ff);

        for step in 0..50 {
            let index = step % config.n_objects();
            config.displace(index, 0.8, &ff, &mut rng);
            config.rotate(index, TAU, &ff, &mut rng);
            let incremental = config.energy(&ff);

            let mut fresh = config.clone();
            for i in 0..fresh.n_objects() {
                fresh.mark_dirty(i);
            }
            let from_scratch = fresh.energy(&ff);
            assert!(
                (incremental - from_scratch).abs() < 1e-9,
                "incremental {} diverged from scratch {} at step {}",
                incremental,
                from_scratch,
                step
            );
        }
    }

    #[test]
    fn restore_pose_returns_the_energy_to_its_old_value() {
        let ff = ForceField::uniform_discs();
        let mut rng = rng();
        let mut config = periodic_box(&[(2.0, 2.0, 0.0), (3.4, 2.2, 0.9), (6.0, 6.0, 0.0)]);
        let before = config.energy(&ff);

        let pose = config.pose(0);
        config.displace(0, 1.5, &ff, &mut rng);
        config.rotate(0, TAU, &ff, &mut rng);
        config.energy(&ff);

        config.restore_pose(0, pose, &ff);
        let after = config.energy(&ff);
        assert!(
            (before - after).abs() < 1e-9,
            "restore left the energy at {} instead of {}",
            after,
            before
        );
    }

    #[test]
    fn translating_every_object_by_the_domain_leaves_energy_unchanged() {
        let ff = ForceField::uniform_discs();
        let mut config = periodic_box(&[(1.0, 9.5, 0.2), (2.1, 0.4, 1.1), (9.8, 9.9, 0.0)]);
        let before = config.energy(&ff);

        let shifted: Vec<Object> = config
            .objects()
            .iter()
            .map(|o| {
                let p = o.position();
                Object::new(
                    o.o_type(),
                    (p.x + 10.0).rem_euclid(10.0),
                    (p.y + 10.0).rem_euclid(10.0),
                    o.orientation(),
                )
            })
            .collect();
        let mut moved = Configuration::new(10.0, 10.0, Topology::uniform_discs()).unwrap();
        for object in shifted {
            moved.add_object(object);
        }
        let after = moved.energy(&ff);
        assert!((before - after).abs() < 1e-9);
    }

    #[test]
    fn rotating_the_whole_configuration_leaves_energy_unchanged() {
        let ff = ForceField::uniform_discs();
        // Interior cluster, so no interaction crosses the boundary.
        let placements = [(4.0, 4.0, 0.0), (5.3, 4.4, 1.0), (4.6, 5.8, 2.5)];
        let mut config = periodic_box(&placements);
        let before = config.energy(&ff);

        let pivot = Point2::new(5.0, 5.0);
        let rotation = Rotation2::new(0.77);
        let mut rotated = Configuration::new(10.0, 10.0, Topology::uniform_discs()).unwrap();
        for &(x, y, theta) in &placements {
            let p = pivot + rotation * (Point2::new(x, y) - pivot);
            rotated.add_object(Object::new(0, p.x, p.y, theta + 0.77));
        }
        let after = rotated.energy(&ff);
        assert!(
            (before - after).abs() < 1e-9,
            "energy moved from {} to {} under a rigid rotation",
            before,
            after
        );
    }

    #[test]
    fn wall_term_appears_only_without_periodic_boundaries() {
        let ff = ForceField::uniform_discs();
        let mut config = periodic_box(&[(0.2, 5.0, 0.0)]);
        assert_eq!(config.energy(&ff), 0.0);

        config.set_periodic(false);
        assert!(!config.is_unchanged());
        // Half the per-object wall sentinel, by the double-count convention.
        assert_eq!(config.energy(&ff), ff.big_energy() / 2.0);
    }

    #[test]
    fn invalidate_within_flags_only_the_neighbourhood() {
        let ff = ForceField::uniform_discs();
        let mut config = periodic_box(&[(1.0, 1.0, 0.0), (2.0, 1.0, 0.0), (8.0, 8.0, 0.0)]);
        config.energy(&ff);

        config.invalidate_within(2.0, 0);
        assert!(config.object(1).needs_recalculation());
        assert!(!config.object(2).needs_recalculation());
        assert!(!config.object(0).needs_recalculation());
    }

    #[test]
    fn object_types_reports_the_highest_type_in_use() {
        let mut config = Configuration::new(10.0, 10.0, Topology::uniform_discs()).unwrap();
        assert_eq!(config.object_types(), None);
        config.add_object(Object::new(0, 1.0, 1.0, 0.0));
        config.add_object(Object::new(0, 2.0, 2.0, 0.0));
        assert_eq!(config.object_types(), Some(0));
    }

    #[test]
    fn rms_measures_atomwise_displacement() {
        let config = periodic_box(&[(2.0, 2.0, 0.0), (5.0, 5.0, 0.0)]);
        let mut moved = config.clone();
        moved.mark_dirty(0);
        let reference = periodic_box(&[(2.0, 5.0, 0.0), (5.0, 8.0, 0.0)]);
        // Every atom displaced by 3 along y.
        let rms = config.rms(&reference).unwrap();
        assert!((rms - 3.0).abs() < 1e-12);
        assert_eq!(config.rms(&moved), Some(0.0));
    }

    #[test]
    fn rms_refuses_mismatched_configurations() {
        let config = periodic_box(&[(2.0, 2.0, 0.0)]);
        let reference = periodic_box(&[(2.0, 2.0, 0.0), (5.0, 5.0, 0.0)]);
        assert_eq!(config.rms(&reference), None);
    }
}
