// Liquid scene: a screen-sized container of particles that pours on click and
// sloshes when tilted

mod config;

pub use config::{SceneConfig, SceneError, STANDARD_GRAVITY};

use glam::Vec2;
use log::{debug, info, warn};

use crate::core::math::{Size2D, Vector2D};
use crate::engine::physics::{
    DebugData, EdgeHandle, ParticleSystemDef, ParticleSystemHandle, Simulation,
};

/// The running liquid scene
///
/// Owns its own [`Simulation`]; dropping the scene destroys the world.
pub struct LiquidScene {
    config: SceneConfig,
    simulation: Simulation,
    particles: ParticleSystemHandle,
    boundary: EdgeHandle,
}

impl LiquidScene {
    /// Build the world, pour the initial box and wall off the screen
    pub fn new(config: SceneConfig) -> Result<Self, SceneError> {
        config.validate()?;

        let mut simulation = Simulation::new();
        simulation.create_world(Vector2D::new(0.0, -config.gravity))?;

        let def = ParticleSystemDef::new(
            config.particle_radius(),
            config.damping_strength,
            config.gravity_scale,
            config.density,
        );
        let particles = simulation.create_particle_system_with(def)?;

        let world_size = config.world_size();
        let centre = Vector2D::new(world_size.width * 0.5, world_size.height * 0.5);
        let initial_box = config.pixel_scale.size_to_meters(config.initial_box_px);
        simulation.create_particle_box(particles, centre, initial_box)?;
        simulation.set_particle_limit(particles, config.particle_limit)?;

        let boundary = simulation.create_edge_box(Vector2D::ZERO, world_size)?;

        info!(
            "Scene ready: {}x{} m, {} particles",
            world_size.width,
            world_size.height,
            simulation.particle_count(particles)?
        );

        Ok(Self {
            config,
            simulation,
            particles,
            boundary,
        })
    }

    /// Pour a box of particles under a window position (y down, in pixels)
    ///
    /// Returns how many particles were created.
    pub fn touch(&mut self, screen_pos: Vec2) -> Result<usize, SceneError> {
        let position = self
            .config
            .pixel_scale
            .screen_to_world(screen_pos, self.config.screen_px.height);
        let size = self
            .config
            .pixel_scale
            .size_to_meters(self.config.touch_box_px);

        let created = self
            .simulation
            .create_particle_box(self.particles, position, size)?;
        debug!(
            "Touch at ({}, {}) poured {} particles",
            screen_pos.x, screen_pos.y, created
        );
        Ok(created)
    }

    /// Point gravity along a normalized acceleration, as a device accelerometer would
    pub fn tilt(&mut self, acceleration: Vector2D) -> Result<(), SceneError> {
        self.simulation
            .set_gravity(acceleration * self.config.gravity)?;
        Ok(())
    }

    /// Advance the simulation by `dt` seconds
    pub fn step(&mut self, dt: f32) -> Result<(), SceneError> {
        self.simulation.world_step(
            dt,
            self.config.velocity_iterations,
            self.config.position_iterations,
        )?;
        Ok(())
    }

    /// Rebuild the walls for a new window size
    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), SceneError> {
        let screen = Size2D::new(width, height);
        if !screen.is_positive() || screen == self.config.screen_px {
            return Ok(());
        }

        self.simulation.destroy_edge_box(self.boundary)?;
        self.config.screen_px = screen;
        self.boundary = self
            .simulation
            .create_edge_box(Vector2D::ZERO, self.config.world_size())?;
        info!("Scene walls rebuilt for {}x{} px", width, height);
        Ok(())
    }

    /// Particle positions in simulation units
    ///
    /// Empty if the particle system is gone.
    pub fn positions(&self) -> &[Vector2D] {
        match self.simulation.particle_positions(self.particles) {
            Ok(positions) => positions,
            Err(e) => {
                warn!("Scene particle system unavailable: {}", e);
                &[]
            }
        }
    }

    pub fn particle_count(&self) -> usize {
        self.positions().len()
    }

    pub fn gravity(&self) -> Result<Vector2D, SceneError> {
        Ok(self.simulation.gravity()?)
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Colliders for the physics debug overlay
    pub fn debug_data(&self) -> Option<DebugData<'_>> {
        self.simulation.debug_data().ok()
    }

    /// Log the count and every particle position
    pub fn log_particle_info(&self) {
        let positions = self.positions();
        info!("There are {} particles present", positions.len());
        for (i, position) in positions.iter().enumerate() {
            info!("particle: {} position: ({}, {})", i, position.x, position.y);
        }
    }
}

impl Drop for LiquidScene {
    fn drop(&mut self) {
        self.simulation.destroy_world();
    }
}
