// Camera for the fixed screen-sized view of the simulation

use crate::core::math::{orthographic_ndc, PixelScale};
use glam::{Mat4, Vec3};

/// 2D camera looking at the whole window
///
/// The view never pans or zooms: pixel `(0, 0)` is the bottom-left corner of the
/// window and simulation units are scaled up by the pixels-to-meters ratio.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Pixels per simulation meter
    scale: PixelScale,
    /// Pixel space to clip space
    screen_proj: Mat4,
}

impl Camera {
    /// Create a new camera
    pub fn new(viewport_width: f32, viewport_height: f32, scale: PixelScale) -> Self {
        Self {
            scale,
            screen_proj: screen_proj(viewport_width, viewport_height),
        }
    }

    /// Resize the viewport
    pub fn resize(&mut self, width: f32, height: f32) {
        self.screen_proj = screen_proj(width, height);
    }

    /// Projection from pixel space to clip space
    pub fn screen_proj_matrix(&self) -> Mat4 {
        self.screen_proj
    }

    /// Projection from simulation space to clip space
    pub fn world_view_proj_matrix(&self) -> Mat4 {
        let ratio = self.scale.ratio();
        self.screen_proj * Mat4::from_scale(Vec3::new(ratio, ratio, 1.0))
    }

    pub fn scale(&self) -> PixelScale {
        self.scale
    }
}

fn screen_proj(width: f32, height: f32) -> Mat4 {
    orthographic_ndc(0.0, width, 0.0, height, -1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec4;

    #[test]
    fn test_world_projection_maps_corners() {
        let camera = Camera::new(640.0, 480.0, PixelScale::new(32.0));
        let proj = camera.world_view_proj_matrix();

        let lower_left = proj * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(lower_left.x, -1.0, epsilon = 1e-5);
        assert_relative_eq!(lower_left.y, -1.0, epsilon = 1e-5);

        let upper_right = proj * Vec4::new(20.0, 15.0, 0.0, 1.0);
        assert_relative_eq!(upper_right.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(upper_right.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_resize_updates_screen_projection() {
        let mut camera = Camera::new(640.0, 480.0, PixelScale::new(32.0));
        camera.resize(320.0, 320.0);

        let upper_right = camera.screen_proj_matrix() * Vec4::new(320.0, 320.0, 0.0, 1.0);
        assert_relative_eq!(upper_right.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(upper_right.y, 1.0, epsilon = 1e-5);
    }
}
