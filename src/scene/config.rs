// Scene configuration

use crate::core::math::{PixelScale, Size2D};
use crate::engine::physics::SimulationError;

/// Standard gravity in m/s²
pub const STANDARD_GRAVITY: f32 = 9.80665;

/// Errors raised while building or driving a scene
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("Invalid scene setting `{field}`: {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),
}

/// Everything the liquid scene needs to know up front
///
/// Sizes marked `_px` are in window pixels and converted with `pixel_scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    /// Magnitude of gravity; tilting scales it by the acceleration direction
    pub gravity: f32,
    pub pixel_scale: PixelScale,
    pub particle_radius_px: f32,
    pub damping_strength: f32,
    pub gravity_scale: f32,
    pub density: f32,
    /// Box poured at the centre of the screen on start
    pub initial_box_px: Size2D,
    /// Box poured on every click
    pub touch_box_px: Size2D,
    pub particle_limit: usize,
    pub updates_per_second: u32,
    pub velocity_iterations: usize,
    pub position_iterations: usize,
    /// Window size; the edge box spans all of it
    pub screen_px: Size2D,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            gravity: STANDARD_GRAVITY,
            pixel_scale: PixelScale::new(32.0),
            particle_radius_px: 9.0,
            damping_strength: 0.2,
            gravity_scale: 1.0,
            density: 1.2,
            initial_box_px: Size2D::new(50.0, 50.0),
            touch_box_px: Size2D::new(100.0, 100.0),
            particle_limit: 1500,
            updates_per_second: 30,
            velocity_iterations: 8,
            position_iterations: 3,
            screen_px: Size2D::new(480.0, 800.0),
        }
    }
}

impl SceneConfig {
    /// Same settings for a different window size
    pub fn with_screen(mut self, width: f32, height: f32) -> Self {
        self.screen_px = Size2D::new(width, height);
        self
    }

    /// Particle radius in simulation units
    pub fn particle_radius(&self) -> f32 {
        self.pixel_scale.to_meters(self.particle_radius_px)
    }

    /// Screen size in simulation units
    pub fn world_size(&self) -> Size2D {
        self.pixel_scale.size_to_meters(self.screen_px)
    }

    /// Length of one simulation step in seconds
    pub fn timestep(&self) -> f32 {
        1.0 / self.updates_per_second as f32
    }

    /// Check the settings before any world is built
    pub fn validate(&self) -> Result<(), SceneError> {
        let positive = [
            ("gravity", self.gravity),
            ("pixel_scale", self.pixel_scale.ratio()),
            ("particle_radius_px", self.particle_radius_px),
            ("density", self.density),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(field, format!("must be > 0, got {value}")));
            }
        }

        for (field, value) in [
            ("damping_strength", self.damping_strength),
            ("gravity_scale", self.gravity_scale),
        ] {
            if !value.is_finite() {
                return Err(invalid(field, format!("must be finite, got {value}")));
            }
        }
        if self.damping_strength < 0.0 {
            return Err(invalid("damping_strength", "must not be negative"));
        }

        for (field, size) in [
            ("initial_box_px", self.initial_box_px),
            ("touch_box_px", self.touch_box_px),
            ("screen_px", self.screen_px),
        ] {
            if !size.is_positive() {
                return Err(invalid(
                    field,
                    format!("must be > 0, got {}x{}", size.width, size.height),
                ));
            }
        }

        if self.particle_limit == 0 {
            return Err(invalid("particle_limit", "must be at least 1"));
        }
        if self.updates_per_second == 0 {
            return Err(invalid("updates_per_second", "must be at least 1"));
        }
        if self.velocity_iterations == 0 {
            return Err(invalid("velocity_iterations", "must be at least 1"));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> SceneError {
    SceneError::InvalidSetting {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_config_is_valid() {
        let config = SceneConfig::default();
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.particle_radius(), 9.0 / 32.0);
        assert_relative_eq!(config.timestep(), 1.0 / 30.0);
    }

    #[test]
    fn test_world_size_follows_screen() {
        let config = SceneConfig::default().with_screen(640.0, 320.0);
        assert_eq!(config.world_size(), Size2D::new(20.0, 10.0));
    }

    #[test]
    fn test_rejects_bad_settings() {
        let config = SceneConfig {
            particle_limit: 0,
            ..SceneConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SceneError::InvalidSetting {
                field: "particle_limit",
                ..
            })
        ));

        let config = SceneConfig {
            particle_radius_px: -1.0,
            ..SceneConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SceneError::InvalidSetting {
                field: "particle_radius_px",
                ..
            })
        ));

        let config = SceneConfig::default().with_screen(0.0, 100.0);
        assert!(matches!(
            config.validate(),
            Err(SceneError::InvalidSetting {
                field: "screen_px",
                ..
            })
        ));
    }

    #[test]
    fn test_error_messages() {
        let err = invalid("density", "must be > 0, got 0");
        assert_eq!(
            err.to_string(),
            "Invalid scene setting `density`: must be > 0, got 0"
        );
    }
}
