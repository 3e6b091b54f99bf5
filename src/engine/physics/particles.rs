// Particle systems: groups of small dynamic balls sharing one set of parameters

use super::{SimResult, SimulationError};
use crate::core::math::{Size2D, Vector2D};
use parry2d::bounding_volume::Aabb;
use parry2d::math::{Point, Vector};
use rapier2d::prelude::{RigidBodyHandle, RigidBodySet};
use std::collections::{TryReserveError, VecDeque};

/// Parameters shared by every particle of a system
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSystemDef {
    /// Particle radius in simulation units
    pub radius: f32,
    /// Linear damping applied to each particle
    pub damping_strength: f32,
    /// Multiplier on world gravity
    pub gravity_scale: f32,
    /// Particle density (mass = density × disc area)
    pub density: f32,
    /// Cap on live particles (`None` = unbounded)
    pub max_particle_count: Option<usize>,
    /// When the cap is hit: destroy the oldest particle (true) or drop the new one
    pub destroy_by_age: bool,
}

impl ParticleSystemDef {
    pub fn new(radius: f32, damping_strength: f32, gravity_scale: f32, density: f32) -> Self {
        Self {
            radius,
            damping_strength,
            gravity_scale,
            density,
            max_particle_count: None,
            destroy_by_age: true,
        }
    }

    pub fn with_max_particle_count(mut self, max: usize) -> Self {
        self.max_particle_count = Some(max);
        self
    }

    pub fn with_destroy_by_age(mut self, destroy_by_age: bool) -> Self {
        self.destroy_by_age = destroy_by_age;
        self
    }

    /// Distance between neighbouring particle centres when filling a shape
    pub fn stride(&self) -> f32 {
        self.radius * 2.0
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(SimulationError::invalid(
                "radius",
                format!("must be > 0, got {}", self.radius),
            ));
        }
        if !(self.damping_strength.is_finite() && self.damping_strength >= 0.0) {
            return Err(SimulationError::invalid(
                "damping_strength",
                format!("must be >= 0, got {}", self.damping_strength),
            ));
        }
        if !self.gravity_scale.is_finite() {
            return Err(SimulationError::invalid(
                "gravity_scale",
                format!("must be finite, got {}", self.gravity_scale),
            ));
        }
        if !(self.density.is_finite() && self.density > 0.0) {
            return Err(SimulationError::invalid(
                "density",
                format!("must be > 0, got {}", self.density),
            ));
        }
        if self.max_particle_count == Some(0) {
            return Err(SimulationError::invalid("max_particle_count", "must be at least 1"));
        }
        Ok(())
    }
}

/// Most particles a single box may ask for; rapier addresses bodies with `u32`
const MAX_LATTICE_CELLS: usize = u32::MAX as usize;

/// Particle centres filling an axis-aligned box
///
/// Centres sit on a square lattice with `stride` between neighbours, centred inside
/// the box. Any valid box holds at least one centre, and growing the box never
/// holds fewer. Centres are computed on demand, so a box much larger than the
/// system's cap costs nothing beyond the particles actually created.
#[derive(Debug, Clone, Copy)]
pub struct BoxLattice {
    first: Vector2D,
    stride: f32,
    columns: usize,
    rows: usize,
}

impl BoxLattice {
    /// Lay out a box centred on `position`
    ///
    /// Fails with `InvalidParameter` when the box holds more centres than a world
    /// can address.
    pub fn new(position: Vector2D, size: Size2D, stride: f32) -> SimResult<Self> {
        let half = size.half_extents();
        let region = Aabb::from_half_extents(
            Point::new(position.x, position.y),
            Vector::new(half.x, half.y),
        );
        let extents = region.extents();

        let columns = lattice_cells(extents.x, stride);
        let rows = lattice_cells(extents.y, stride);
        if columns
            .checked_mul(rows)
            .map_or(true, |cells| cells > MAX_LATTICE_CELLS)
        {
            return Err(SimulationError::invalid(
                "size",
                format!(
                    "{}x{} box holds too many particles of stride {}",
                    size.width, size.height, stride
                ),
            ));
        }

        // Offset of the first centre from the box centre
        let centre = region.center();
        let first = Vector2D::new(
            centre.x - (columns as f32 - 1.0) * stride * 0.5,
            centre.y - (rows as f32 - 1.0) * stride * 0.5,
        );

        Ok(Self {
            first,
            stride,
            columns,
            rows,
        })
    }

    /// Number of centres in the box
    pub fn len(&self) -> usize {
        self.columns * self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Centre `i`, row by row from the bottom-left
    pub fn centre(&self, i: usize) -> Vector2D {
        let row = i / self.columns;
        let column = i % self.columns;
        self.first + Vector2D::new(column as f32, row as f32) * self.stride
    }

    /// The last `count` centres, in order
    pub fn tail(&self, count: usize) -> impl Iterator<Item = Vector2D> + '_ {
        let len = self.len();
        (len - count.min(len)..len).map(|i| self.centre(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = Vector2D> + '_ {
        self.tail(self.len())
    }
}

fn lattice_cells(extent: f32, stride: f32) -> usize {
    // Small epsilon so an extent of exactly n strides yields n cells; the float to
    // int cast saturates, which the overflow check above then rejects
    ((extent / stride) + 1e-4).floor().max(1.0) as usize
}

/// Live particles of one system, oldest first
///
/// `positions` and `velocities` are packed caches aligned with `bodies`, refreshed
/// after every step so they can be handed out as plain slices.
pub struct ParticleSystem {
    def: ParticleSystemDef,
    bodies: VecDeque<RigidBodyHandle>,
    positions: Vec<Vector2D>,
    velocities: Vec<Vector2D>,
}

impl ParticleSystem {
    pub fn new(def: ParticleSystemDef) -> Self {
        Self {
            def,
            bodies: VecDeque::new(),
            positions: Vec::new(),
            velocities: Vec::new(),
        }
    }

    pub fn def(&self) -> &ParticleSystemDef {
        &self.def
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn positions(&self) -> &[Vector2D] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vector2D] {
        &self.velocities
    }

    pub fn set_max_particle_count(&mut self, max: Option<usize>) {
        self.def.max_particle_count = max;
    }

    /// Work out how a batch of `requested` new particles fits under the cap
    ///
    /// Returns how many of the requested particles to create (the last ones of the
    /// batch survive) and how many existing particles to destroy, oldest first.
    pub fn plan_creation(&self, requested: usize) -> CreationPlan {
        let Some(max) = self.def.max_particle_count else {
            return CreationPlan {
                create: requested,
                evict: 0,
            };
        };

        if self.def.destroy_by_age {
            let create = requested.min(max);
            let evict = (self.len() + create).saturating_sub(max);
            CreationPlan { create, evict }
        } else {
            CreationPlan {
                create: requested.min(max.saturating_sub(self.len())),
                evict: 0,
            }
        }
    }

    /// Particles to destroy so the live count fits under the cap
    pub fn excess(&self) -> usize {
        self.def
            .max_particle_count
            .map_or(0, |max| self.len().saturating_sub(max))
    }

    /// Grow storage ahead of a batch of creations
    pub fn reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.bodies.try_reserve(additional)?;
        self.positions.try_reserve(additional)?;
        self.velocities.try_reserve(additional)?;
        Ok(())
    }

    pub fn push(&mut self, body: RigidBodyHandle, position: Vector2D, velocity: Vector2D) {
        self.bodies.push_back(body);
        self.positions.push(position);
        self.velocities.push(velocity);
    }

    /// Detach the `count` oldest particles, returning their bodies for removal
    pub fn drain_oldest(&mut self, count: usize) -> Vec<RigidBodyHandle> {
        let count = count.min(self.len());
        self.positions.drain(..count);
        self.velocities.drain(..count);
        self.bodies.drain(..count).collect()
    }

    /// Detach every particle
    pub fn drain_all(&mut self) -> Vec<RigidBodyHandle> {
        self.drain_oldest(self.len())
    }

    /// Re-read positions and velocities from the engine
    pub fn refresh(&mut self, bodies: &RigidBodySet) {
        for ((handle, position), velocity) in self
            .bodies
            .iter()
            .zip(self.positions.iter_mut())
            .zip(self.velocities.iter_mut())
        {
            if let Some(body) = bodies.get(*handle) {
                let t = body.translation();
                let v = body.linvel();
                *position = Vector2D::new(t.x, t.y);
                *velocity = Vector2D::new(v.x, v.y);
            }
        }
    }
}

/// Outcome of [`ParticleSystem::plan_creation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreationPlan {
    pub create: usize,
    pub evict: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn handle(i: u32) -> RigidBodyHandle {
        RigidBodyHandle::from_raw_parts(i, 0)
    }

    #[test]
    fn test_def_validation() {
        assert!(ParticleSystemDef::new(0.1, 0.2, 1.0, 1.2).validate().is_ok());
        assert!(ParticleSystemDef::new(0.0, 0.2, 1.0, 1.2).validate().is_err());
        assert!(ParticleSystemDef::new(0.1, -0.2, 1.0, 1.2).validate().is_err());
        assert!(ParticleSystemDef::new(0.1, 0.2, 1.0, 0.0).validate().is_err());
        assert!(ParticleSystemDef::new(0.1, 0.2, f32::NAN, 1.0).validate().is_err());
        assert!(ParticleSystemDef::new(0.1, 0.2, 1.0, 1.0)
            .with_max_particle_count(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validation_names_the_parameter() {
        let err = ParticleSystemDef::new(-1.0, 0.0, 1.0, 1.0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, SimulationError::InvalidParameter { name: "radius", .. }));
    }

    fn lattice(position: Vector2D, size: Size2D, radius: f32) -> Vec<Vector2D> {
        BoxLattice::new(position, size, radius * 2.0)
            .unwrap()
            .iter()
            .collect()
    }

    #[test]
    fn test_box_lattice_counts() {
        // 1 x 1 box with 0.25 radius -> 2 x 2 particles
        let centres = lattice(Vector2D::ZERO, Size2D::new(1.0, 1.0), 0.25);
        assert_eq!(centres.len(), 4);

        // Exactly one diameter wide gives a single centred particle
        let single = lattice(Vector2D::new(3.0, 4.0), Size2D::new(0.5, 0.5), 0.25);
        assert_eq!(single.len(), 1);
        assert_relative_eq!(single[0].x, 3.0);
        assert_relative_eq!(single[0].y, 4.0);
    }

    #[test]
    fn test_box_lattice_is_centred() {
        let position = Vector2D::new(5.0, 5.0);
        let centres = lattice(position, Size2D::new(2.0, 1.0), 0.25);
        let sum = centres.iter().fold(Vector2D::ZERO, |acc, c| acc + *c);
        let mean = sum / centres.len() as f32;

        assert_relative_eq!(mean.x, position.x, epsilon = 1e-4);
        assert_relative_eq!(mean.y, position.y, epsilon = 1e-4);
    }

    #[test]
    fn test_box_lattice_is_monotonic() {
        let mut previous = 0;
        for step in 1..40 {
            let extent = step as f32 * 0.13;
            let count = lattice(Vector2D::ZERO, Size2D::new(extent, extent), 0.2).len();
            assert!(count >= previous, "Larger boxes must not emit fewer particles");
            previous = count;
        }
    }

    #[test]
    fn test_box_lattice_stays_inside_box() {
        let position = Vector2D::new(1.0, -1.0);
        let size = Size2D::new(3.3, 1.7);
        let half = size.half_extents();
        let region = Aabb::from_half_extents(
            Point::new(position.x, position.y),
            Vector::new(half.x + 1e-4, half.y + 1e-4),
        );

        for centre in lattice(position, size, 0.3) {
            assert!(region.contains_local_point(&Point::new(centre.x, centre.y)));
        }
    }

    #[test]
    fn test_box_lattice_tail_matches_full_layout() {
        let lattice = BoxLattice::new(Vector2D::ZERO, Size2D::new(2.0, 2.0), 0.5).unwrap();
        let all: Vec<_> = lattice.iter().collect();
        let tail: Vec<_> = lattice.tail(3).collect();

        assert_eq!(all.len(), 16);
        assert_eq!(tail, all[13..].to_vec());
        assert_eq!(lattice.tail(100).count(), 16);
    }

    #[test]
    fn test_huge_box_is_rejected_without_allocating() {
        let result = BoxLattice::new(Vector2D::ZERO, Size2D::new(1e9, 1e9), 0.002);
        assert!(matches!(
            result,
            Err(SimulationError::InvalidParameter { name: "size", .. })
        ));

        let result = BoxLattice::new(Vector2D::ZERO, Size2D::new(1.0, 1.0), f32::MIN_POSITIVE);
        assert!(result.is_err());
    }

    #[test]
    fn test_large_box_is_laid_out_lazily() {
        // About 2.5 billion centres; only the requested tail is ever computed
        let lattice = BoxLattice::new(Vector2D::ZERO, Size2D::new(1000.0, 1000.0), 0.02).unwrap();
        assert!(lattice.len() > 2_000_000_000);
        assert_eq!(lattice.tail(5).count(), 5);
    }

    #[test]
    fn test_plan_creation_unbounded() {
        let system = ParticleSystem::new(ParticleSystemDef::new(0.1, 0.0, 1.0, 1.0));
        assert_eq!(system.plan_creation(50), CreationPlan { create: 50, evict: 0 });
    }

    #[test]
    fn test_plan_creation_destroys_oldest() {
        let def = ParticleSystemDef::new(0.1, 0.0, 1.0, 1.0).with_max_particle_count(10);
        let mut system = ParticleSystem::new(def);
        for i in 0..8 {
            system.push(handle(i), Vector2D::ZERO, Vector2D::ZERO);
        }

        assert_eq!(system.plan_creation(5), CreationPlan { create: 5, evict: 3 });
        // A batch larger than the cap keeps only its last `max` particles
        assert_eq!(system.plan_creation(25), CreationPlan { create: 10, evict: 8 });
    }

    #[test]
    fn test_plan_creation_drops_new_particles() {
        let def = ParticleSystemDef::new(0.1, 0.0, 1.0, 1.0)
            .with_max_particle_count(10)
            .with_destroy_by_age(false);
        let mut system = ParticleSystem::new(def);
        for i in 0..8 {
            system.push(handle(i), Vector2D::ZERO, Vector2D::ZERO);
        }

        assert_eq!(system.plan_creation(5), CreationPlan { create: 2, evict: 0 });
    }

    #[test]
    fn test_drain_oldest_keeps_caches_aligned() {
        let mut system = ParticleSystem::new(ParticleSystemDef::new(0.1, 0.0, 1.0, 1.0));
        for i in 0..5 {
            system.push(handle(i), Vector2D::new(i as f32, 0.0), Vector2D::ZERO);
        }

        let removed = system.drain_oldest(2);
        assert_eq!(removed, vec![handle(0), handle(1)]);
        assert_eq!(system.len(), 3);
        assert_eq!(system.positions()[0], Vector2D::new(2.0, 0.0));
        assert_eq!(system.velocities().len(), 3);
    }

    #[test]
    fn test_excess() {
        let mut system = ParticleSystem::new(ParticleSystemDef::new(0.1, 0.0, 1.0, 1.0));
        for i in 0..6 {
            system.push(handle(i), Vector2D::ZERO, Vector2D::ZERO);
        }
        assert_eq!(system.excess(), 0);

        system.set_max_particle_count(Some(4));
        assert_eq!(system.excess(), 2);
    }
}
