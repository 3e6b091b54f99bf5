use rapier2d::prelude::*;
use std::num::NonZeroUsize;

use super::body::presets;
use super::handle::{Arena, EdgeHandle, Handle, ParticleSystemHandle};
use super::particles::{BoxLattice, ParticleSystem, ParticleSystemDef};
use super::{SimResult, SimulationError};
use crate::core::math::{Size2D, Vector2D};

/// A static rectangular container made of four edge colliders
#[derive(Debug, Clone, Copy)]
pub struct EdgeBox {
    body: RigidBodyHandle,
    origin: Vector2D,
    size: Size2D,
}

impl EdgeBox {
    pub fn origin(&self) -> Vector2D {
        self.origin
    }

    pub fn size(&self) -> Size2D {
        self.size
    }
}

/// Physics world that manages all physics simulation
///
/// Owns the rapier pipeline together with every particle system and edge box
/// created in it. Dropping the world drops all of them.
pub struct PhysicsWorld {
    /// Epoch stamped into every handle this world issues
    epoch: u32,

    /// Gravity vector
    gravity: Vector<Real>,

    /// Integration parameters for the physics simulation
    integration_parameters: IntegrationParameters,

    /// Physics pipeline handles collision detection and solving
    physics_pipeline: PhysicsPipeline,

    /// Island manager for sleeping bodies
    island_manager: IslandManager,

    /// Broad phase collision detection
    broad_phase: DefaultBroadPhase,

    /// Narrow phase collision detection
    narrow_phase: NarrowPhase,

    /// Impulse joint set
    impulse_joint_set: ImpulseJointSet,

    /// Multibody joint set
    multibody_joint_set: MultibodyJointSet,

    /// CCD solver for fast-moving objects
    ccd_solver: CCDSolver,

    /// Rigid body set
    rigid_body_set: RigidBodySet,

    /// Collider set
    collider_set: ColliderSet,

    particle_systems: Arena<ParticleSystem>,
    edge_boxes: Arena<EdgeBox>,

    /// Number of completed steps
    step_count: u64,
}

impl PhysicsWorld {
    /// Create a new physics world with custom gravity
    pub fn with_gravity(epoch: u32, gravity: Vector2D) -> Self {
        Self {
            epoch,
            gravity: vector![gravity.x, gravity.y],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            particle_systems: Arena::new(),
            edge_boxes: Arena::new(),
            step_count: 0,
        }
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Step the physics simulation forward by `time_step` seconds
    ///
    /// A zero time step leaves every body where it is.
    pub fn step(
        &mut self,
        time_step: Real,
        velocity_iterations: NonZeroUsize,
        position_iterations: usize,
    ) {
        self.integration_parameters.dt = time_step;
        self.integration_parameters.num_solver_iterations = velocity_iterations;
        self.integration_parameters.num_internal_pgs_iterations = position_iterations.max(1);

        if time_step > 0.0 {
            self.physics_pipeline.step(
                &self.gravity,
                &self.integration_parameters,
                &mut self.island_manager,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.rigid_body_set,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                &mut self.ccd_solver,
                None,
                &(),
                &(),
            );

            for (_, system) in self.particle_systems.iter_mut() {
                system.refresh(&self.rigid_body_set);
            }
        }

        self.step_count += 1;
    }

    /// Add a particle system with no particles yet
    pub fn add_particle_system(&mut self, def: ParticleSystemDef) -> ParticleSystemHandle {
        Handle::new(self.epoch, self.particle_systems.insert(ParticleSystem::new(def)))
    }

    /// Look up a particle system
    pub fn particle_system(&self, handle: ParticleSystemHandle) -> SimResult<&ParticleSystem> {
        if handle.world() != self.epoch {
            return Err(SimulationError::InvalidHandle);
        }
        self.particle_systems
            .get(handle.index())
            .ok_or(SimulationError::InvalidHandle)
    }

    fn particle_system_mut(
        &mut self,
        handle: ParticleSystemHandle,
    ) -> SimResult<&mut ParticleSystem> {
        if handle.world() != self.epoch {
            return Err(SimulationError::InvalidHandle);
        }
        self.particle_systems
            .get_mut(handle.index())
            .ok_or(SimulationError::InvalidHandle)
    }

    /// Fill an axis-aligned box centred on `position` with particles at rest
    ///
    /// Returns the number of particles created, which the system's cap may reduce.
    pub fn create_particle_box(
        &mut self,
        handle: ParticleSystemHandle,
        position: Vector2D,
        size: Size2D,
    ) -> SimResult<usize> {
        let stride = self.particle_system(handle)?.def().stride();
        let lattice = BoxLattice::new(position, size, stride)?;
        self.spawn(handle, lattice.len(), |count| lattice.tail(count), Vector2D::ZERO)
    }

    /// Create particles at the given centres, honouring the system's cap
    pub fn create_particles(
        &mut self,
        handle: ParticleSystemHandle,
        centres: &[Vector2D],
        velocity: Vector2D,
    ) -> SimResult<usize> {
        self.spawn(
            handle,
            centres.len(),
            |count| centres[centres.len() - count..].iter().copied(),
            velocity,
        )
    }

    /// Create the survivors of a batch of `requested` particles
    ///
    /// `survivors(n)` yields the last `n` centres of the batch; later centres win
    /// when the batch alone exceeds the cap.
    fn spawn<I>(
        &mut self,
        handle: ParticleSystemHandle,
        requested: usize,
        survivors: impl FnOnce(usize) -> I,
        velocity: Vector2D,
    ) -> SimResult<usize>
    where
        I: Iterator<Item = Vector2D>,
    {
        let system = self.particle_system_mut(handle)?;
        let plan = system.plan_creation(requested);
        system.reserve(plan.create)?;
        let mut created = Vec::new();
        created.try_reserve(plan.create)?;

        let evicted = system.drain_oldest(plan.evict);
        let def = system.def().clone();
        self.remove_bodies(evicted);

        for centre in survivors(plan.create) {
            let body = self
                .rigid_body_set
                .insert(presets::particle_body(centre, velocity, &def));
            self.collider_set.insert_with_parent(
                presets::particle_collider(&def),
                body,
                &mut self.rigid_body_set,
            );
            created.push((body, centre));
        }

        let system = self.particle_system_mut(handle)?;
        for (body, centre) in created {
            system.push(body, centre, velocity);
        }

        Ok(plan.create)
    }

    /// Change a system's particle cap, destroying the oldest particles above it
    pub fn set_particle_limit(
        &mut self,
        handle: ParticleSystemHandle,
        max: Option<usize>,
    ) -> SimResult<usize> {
        let system = self.particle_system_mut(handle)?;
        system.set_max_particle_count(max);
        let excess = system.excess();
        let evicted = system.drain_oldest(excess);
        self.remove_bodies(evicted);
        Ok(excess)
    }

    /// Remove a particle system and all of its particles
    pub fn remove_particle_system(&mut self, handle: ParticleSystemHandle) -> SimResult<()> {
        if handle.world() != self.epoch {
            return Err(SimulationError::InvalidHandle);
        }
        let mut system = self
            .particle_systems
            .remove(handle.index())
            .ok_or(SimulationError::InvalidHandle)?;
        self.remove_bodies(system.drain_all());
        Ok(())
    }

    /// Add a static box whose lower-left corner sits at `origin`
    pub fn add_edge_box(&mut self, origin: Vector2D, size: Size2D) -> EdgeHandle {
        let body = self.rigid_body_set.insert(presets::boundary_body(origin));
        for wall in presets::boundary_colliders(size) {
            self.collider_set
                .insert_with_parent(wall, body, &mut self.rigid_body_set);
        }

        Handle::new(self.epoch, self.edge_boxes.insert(EdgeBox { body, origin, size }))
    }

    /// Look up an edge box
    pub fn edge_box(&self, handle: EdgeHandle) -> SimResult<&EdgeBox> {
        if handle.world() != self.epoch {
            return Err(SimulationError::InvalidHandle);
        }
        self.edge_boxes
            .get(handle.index())
            .ok_or(SimulationError::InvalidHandle)
    }

    /// Remove an edge box and its walls
    pub fn remove_edge_box(&mut self, handle: EdgeHandle) -> SimResult<()> {
        if handle.world() != self.epoch {
            return Err(SimulationError::InvalidHandle);
        }
        let edge_box = self
            .edge_boxes
            .remove(handle.index())
            .ok_or(SimulationError::InvalidHandle)?;
        self.remove_bodies(vec![edge_box.body]);
        Ok(())
    }

    /// Remove rigid bodies and all their attached colliders
    fn remove_bodies(&mut self, handles: Vec<RigidBodyHandle>) {
        for handle in handles {
            self.rigid_body_set.remove(
                handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true, // remove attached colliders
            );
        }
    }

    /// Set gravity for the physics world
    pub fn set_gravity(&mut self, gravity: Vector2D) {
        self.gravity = vector![gravity.x, gravity.y];

        // Sleeping particles would otherwise ignore the new direction
        for (_, body) in self.rigid_body_set.iter_mut() {
            if body.is_dynamic() {
                body.wake_up(true);
            }
        }
    }

    /// Get current gravity
    pub fn gravity(&self) -> Vector2D {
        Vector2D::new(self.gravity.x, self.gravity.y)
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn particle_system_count(&self) -> usize {
        self.particle_systems.len()
    }

    pub fn edge_box_count(&self) -> usize {
        self.edge_boxes.len()
    }

    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    pub fn collider_count(&self) -> usize {
        self.collider_set.len()
    }

    /// Get references to internal components for debug rendering
    pub fn debug_data(&self) -> DebugData<'_> {
        DebugData {
            colliders: &self.collider_set,
        }
    }
}

/// Data structure for debug rendering
pub struct DebugData<'a> {
    pub colliders: &'a ColliderSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iterations() -> NonZeroUsize {
        NonZeroUsize::new(8).unwrap()
    }

    fn water() -> ParticleSystemDef {
        ParticleSystemDef::new(0.25, 0.2, 1.0, 1.2)
    }

    #[test]
    fn test_particle_box_creates_bodies() {
        let mut world = PhysicsWorld::with_gravity(1, Vector2D::new(0.0, -9.8));
        let system = world.add_particle_system(water());

        let created = world
            .create_particle_box(system, Vector2D::new(5.0, 5.0), Size2D::new(1.0, 1.0))
            .unwrap();

        assert_eq!(created, 4);
        assert_eq!(world.body_count(), 4);
        assert_eq!(world.collider_count(), 4);
        assert_eq!(world.particle_system(system).unwrap().positions().len(), 4);
    }

    #[test]
    fn test_edge_box_has_four_walls() {
        let mut world = PhysicsWorld::with_gravity(1, Vector2D::ZERO);
        let edge = world.add_edge_box(Vector2D::new(1.0, 2.0), Size2D::new(10.0, 20.0));

        assert_eq!(world.body_count(), 1);
        assert_eq!(world.collider_count(), 4);
        assert_eq!(world.edge_box(edge).unwrap().origin(), Vector2D::new(1.0, 2.0));

        world.remove_edge_box(edge).unwrap();
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.collider_count(), 0);
        assert!(world.edge_box(edge).is_err());
    }

    #[test]
    fn test_handles_from_other_epoch_are_rejected() {
        let mut first = PhysicsWorld::with_gravity(1, Vector2D::ZERO);
        let mut second = PhysicsWorld::with_gravity(2, Vector2D::ZERO);
        let handle = first.add_particle_system(water());
        second.add_particle_system(water());

        assert!(first.particle_system(handle).is_ok());
        assert!(matches!(
            second.particle_system(handle),
            Err(SimulationError::InvalidHandle)
        ));
    }

    #[test]
    fn test_remove_particle_system_removes_bodies() {
        let mut world = PhysicsWorld::with_gravity(1, Vector2D::ZERO);
        let system = world.add_particle_system(water());
        world
            .create_particle_box(system, Vector2D::ZERO, Size2D::new(2.0, 2.0))
            .unwrap();

        world.remove_particle_system(system).unwrap();
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.particle_system_count(), 0);
        assert!(world.remove_particle_system(system).is_err());
    }

    #[test]
    fn test_lowering_limit_evicts_oldest() {
        let mut world = PhysicsWorld::with_gravity(1, Vector2D::ZERO);
        let system = world.add_particle_system(water());
        world
            .create_particles(system, &[Vector2D::new(0.0, 0.0)], Vector2D::ZERO)
            .unwrap();
        world
            .create_particles(system, &[Vector2D::new(5.0, 0.0)], Vector2D::ZERO)
            .unwrap();

        let evicted = world.set_particle_limit(system, Some(1)).unwrap();
        assert_eq!(evicted, 1);
        assert_eq!(world.body_count(), 1);
        assert_eq!(
            world.particle_system(system).unwrap().positions(),
            &[Vector2D::new(5.0, 0.0)]
        );
    }

    #[test]
    fn test_step_moves_particles_under_gravity() {
        let mut world = PhysicsWorld::with_gravity(1, Vector2D::new(0.0, -10.0));
        let system = world.add_particle_system(water());
        world
            .create_particles(system, &[Vector2D::new(0.0, 10.0)], Vector2D::ZERO)
            .unwrap();

        world.step(1.0 / 60.0, iterations(), 3);

        let y = world.particle_system(system).unwrap().positions()[0].y;
        assert!(y < 10.0);
        assert_eq!(world.step_count(), 1);
    }

    #[test]
    fn test_set_gravity() {
        let mut world = PhysicsWorld::with_gravity(1, Vector2D::new(0.0, -9.81));
        world.set_gravity(Vector2D::new(3.0, 0.0));
        assert_eq!(world.gravity(), Vector2D::new(3.0, 0.0));
    }
}
