use log::{debug, info, trace, warn};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU32, Ordering};

use super::handle::{EdgeHandle, ParticleSystemHandle};
use super::particles::ParticleSystemDef;
use super::world::{DebugData, PhysicsWorld};
use super::{SimResult, SimulationError};
use crate::core::math::{Size2D, Vector2D};

/// Epochs are unique per process so handles cannot leak between simulations either
static NEXT_EPOCH: AtomicU32 = AtomicU32::new(1);

/// Simulation context holding at most one live world
///
/// Every operation goes through an explicit `Simulation` value instead of a
/// process-wide singleton, so independent simulations can coexist. The world moves
/// through Uninitialized → Live → Destroyed; creating a new world afterwards starts
/// a fresh epoch, and handles from earlier epochs never resolve again.
///
/// Mutating calls take `&mut self`, so a position slice borrowed from
/// [`Simulation::particle_positions`] cannot be held across [`Simulation::world_step`].
pub struct Simulation {
    world: Option<PhysicsWorld>,
}

impl Simulation {
    /// Create a context with no world
    pub fn new() -> Self {
        Self { world: None }
    }

    /// Create the world with the given gravity
    ///
    /// Fails with `WorldAlreadyExists` while a world is live; the existing world is
    /// left untouched.
    pub fn create_world(&mut self, gravity: Vector2D) -> SimResult<()> {
        if self.world.is_some() {
            return Err(rejected(SimulationError::WorldAlreadyExists));
        }
        check_vector("gravity", gravity)?;

        let epoch = NEXT_EPOCH.fetch_add(1, Ordering::Relaxed);
        self.world = Some(PhysicsWorld::with_gravity(epoch, gravity));
        info!(
            "World {} created with gravity ({}, {})",
            epoch, gravity.x, gravity.y
        );
        Ok(())
    }

    /// Check if a world is live
    pub fn has_world(&self) -> bool {
        self.world.is_some()
    }

    /// Release the world and everything in it
    ///
    /// Calling this without a live world does nothing.
    pub fn destroy_world(&mut self) {
        if let Some(world) = self.world.take() {
            info!(
                "World {} destroyed ({} particle systems, {} edge boxes, {} steps)",
                world.epoch(),
                world.particle_system_count(),
                world.edge_box_count(),
                world.step_count()
            );
        }
    }

    /// Create a particle system in the live world
    pub fn create_particle_system(
        &mut self,
        radius: f32,
        damping_strength: f32,
        gravity_scale: f32,
        density: f32,
    ) -> SimResult<ParticleSystemHandle> {
        self.create_particle_system_with(ParticleSystemDef::new(
            radius,
            damping_strength,
            gravity_scale,
            density,
        ))
    }

    /// Create a particle system from a full definition
    pub fn create_particle_system_with(
        &mut self,
        def: ParticleSystemDef,
    ) -> SimResult<ParticleSystemHandle> {
        def.validate().map_err(rejected)?;
        let world = self.world_mut()?;
        let handle = world.add_particle_system(def);
        debug!("Particle system {:?} created", handle);
        Ok(handle)
    }

    /// Remove a particle system and all of its particles
    pub fn destroy_particle_system(&mut self, system: ParticleSystemHandle) -> SimResult<()> {
        self.world_for_mut(system.world())?
            .remove_particle_system(system)
            .map_err(rejected)?;
        debug!("Particle system {:?} destroyed", system);
        Ok(())
    }

    /// Fill a box centred on `position` with particles
    ///
    /// Each call adds a fresh group; returns how many particles were created.
    pub fn create_particle_box(
        &mut self,
        system: ParticleSystemHandle,
        position: Vector2D,
        size: Size2D,
    ) -> SimResult<usize> {
        let world = self.world_for_mut(system.world())?;
        check_vector("position", position)?;
        if !size.is_positive() {
            return Err(rejected(SimulationError::invalid(
                "size",
                format!("must be > 0, got {}x{}", size.width, size.height),
            )));
        }

        let created = world
            .create_particle_box(system, position, size)
            .map_err(rejected)?;
        debug!(
            "Particle box at ({}, {}) added {} particles to {:?}",
            position.x, position.y, created, system
        );
        Ok(created)
    }

    /// Create a single particle
    ///
    /// Returns false if the system's cap dropped it.
    pub fn create_particle(
        &mut self,
        system: ParticleSystemHandle,
        position: Vector2D,
        velocity: Vector2D,
    ) -> SimResult<bool> {
        let world = self.world_for_mut(system.world())?;
        check_vector("position", position)?;
        check_vector("velocity", velocity)?;

        let created = world
            .create_particles(system, &[position], velocity)
            .map_err(rejected)?;
        Ok(created == 1)
    }

    /// Number of live particles in a system
    ///
    /// Read this right before using the positions; it can change on every step.
    pub fn particle_count(&self, system: ParticleSystemHandle) -> SimResult<usize> {
        Ok(self.particle_positions(system)?.len())
    }

    /// Positions of a system's particles, packed and oldest first
    ///
    /// The order is not stable across steps that create or destroy particles.
    pub fn particle_positions(&self, system: ParticleSystemHandle) -> SimResult<&[Vector2D]> {
        let world = self.world_for(system.world())?;
        let system = world.particle_system(system).map_err(rejected)?;
        Ok(system.positions())
    }

    /// Velocities of a system's particles, aligned with the positions
    pub fn particle_velocities(&self, system: ParticleSystemHandle) -> SimResult<&[Vector2D]> {
        let world = self.world_for(system.world())?;
        let system = world.particle_system(system).map_err(rejected)?;
        Ok(system.velocities())
    }

    /// Cap the number of live particles a system retains
    ///
    /// Particles above the cap are destroyed oldest first, immediately.
    pub fn set_particle_limit(
        &mut self,
        system: ParticleSystemHandle,
        max_particles: usize,
    ) -> SimResult<()> {
        let world = self.world_for_mut(system.world())?;
        if max_particles == 0 {
            return Err(rejected(SimulationError::invalid(
                "max_particles",
                "must be at least 1",
            )));
        }

        let evicted = world
            .set_particle_limit(system, Some(max_particles))
            .map_err(rejected)?;
        debug!(
            "Particle limit of {:?} set to {} ({} destroyed)",
            system, max_particles, evicted
        );
        Ok(())
    }

    /// Remove a system's particle cap
    pub fn clear_particle_limit(&mut self, system: ParticleSystemHandle) -> SimResult<()> {
        self.world_for_mut(system.world())?
            .set_particle_limit(system, None)
            .map_err(rejected)?;
        Ok(())
    }

    /// Advance the world by `time_step` seconds
    ///
    /// `velocity_iterations` and `position_iterations` are solver budgets per step;
    /// they trade accuracy for time and never change what the call means.
    pub fn world_step(
        &mut self,
        time_step: f32,
        velocity_iterations: usize,
        position_iterations: usize,
    ) -> SimResult<()> {
        let world = self.world_mut()?;
        if !(time_step.is_finite() && time_step >= 0.0) {
            return Err(rejected(SimulationError::invalid(
                "time_step",
                format!("must be a finite number >= 0, got {time_step}"),
            )));
        }
        let velocity_iterations = NonZeroUsize::new(velocity_iterations).ok_or_else(|| {
            rejected(SimulationError::invalid(
                "velocity_iterations",
                "must be at least 1",
            ))
        })?;

        world.step(time_step, velocity_iterations, position_iterations);
        trace!(
            "World {} stepped by {}s ({} steps)",
            world.epoch(),
            time_step,
            world.step_count()
        );
        Ok(())
    }

    /// Add a static box of edges whose lower-left corner is `origin`
    pub fn create_edge_box(&mut self, origin: Vector2D, size: Size2D) -> SimResult<EdgeHandle> {
        let world = self.world_mut()?;
        check_vector("origin", origin)?;
        if !size.is_positive() {
            return Err(rejected(SimulationError::invalid(
                "size",
                format!("must be > 0, got {}x{}", size.width, size.height),
            )));
        }

        let handle = world.add_edge_box(origin, size);
        debug!(
            "Edge box {:?} at ({}, {}) size {}x{}",
            handle, origin.x, origin.y, size.width, size.height
        );
        Ok(handle)
    }

    /// Remove an edge box
    pub fn destroy_edge_box(&mut self, edge: EdgeHandle) -> SimResult<()> {
        self.world_for_mut(edge.world())?
            .remove_edge_box(edge)
            .map_err(rejected)?;
        debug!("Edge box {:?} destroyed", edge);
        Ok(())
    }

    /// Replace the world's gravity; takes effect from the next step
    pub fn set_gravity(&mut self, gravity: Vector2D) -> SimResult<()> {
        let world = self.world_mut()?;
        check_vector("gravity", gravity)?;
        world.set_gravity(gravity);
        Ok(())
    }

    /// Current gravity of the live world
    pub fn gravity(&self) -> SimResult<Vector2D> {
        Ok(self.world()?.gravity())
    }

    /// Steps run by the live world
    pub fn step_count(&self) -> SimResult<u64> {
        Ok(self.world()?.step_count())
    }

    /// Colliders of the live world, for debug drawing
    pub fn debug_data(&self) -> SimResult<DebugData<'_>> {
        Ok(self.world()?.debug_data())
    }

    /// Borrow the live world
    pub fn world(&self) -> SimResult<&PhysicsWorld> {
        self.world
            .as_ref()
            .ok_or_else(|| rejected(SimulationError::NoActiveWorld))
    }

    fn world_mut(&mut self) -> SimResult<&mut PhysicsWorld> {
        self.world
            .as_mut()
            .ok_or_else(|| rejected(SimulationError::NoActiveWorld))
    }

    /// The live world, if it is the one that issued a handle
    fn world_for(&self, epoch: u32) -> SimResult<&PhysicsWorld> {
        self.world
            .as_ref()
            .filter(|world| world.epoch() == epoch)
            .ok_or_else(|| rejected(SimulationError::InvalidHandle))
    }

    fn world_for_mut(&mut self, epoch: u32) -> SimResult<&mut PhysicsWorld> {
        self.world
            .as_mut()
            .filter(|world| world.epoch() == epoch)
            .ok_or_else(|| rejected(SimulationError::InvalidHandle))
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

/// Log a rejected call before handing the error back
fn rejected(err: SimulationError) -> SimulationError {
    if err.is_caller_error() {
        warn!("Simulation call rejected: {}", err);
    } else {
        log::error!("Simulation call failed: {}", err);
    }
    err
}

fn check_vector(name: &'static str, value: Vector2D) -> SimResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(rejected(SimulationError::invalid(
            name,
            format!("must be finite, got ({}, {})", value.x, value.y),
        )))
    }
}
