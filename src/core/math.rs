// Math types shared between the simulation and the viewer

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};

/// 2D vector in simulation units (meters unless stated otherwise)
///
/// Plain `#[repr(C)]` pair of `f32`, so a slice of positions can be handed to the
/// GPU as raw bytes.
pub type Vector2D = Vec2;

/// Width/height pair in simulation units
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Size2D {
    pub width: f32,
    pub height: f32,
}

impl Size2D {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Both extents are finite and strictly positive
    pub fn is_positive(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Half extents as a vector
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }
}

/// Pixels-to-meters ratio used to map screen space onto simulation space
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PixelScale {
    ratio: f32,
}

impl PixelScale {
    /// Create a scale where `ratio` pixels make one meter
    pub fn new(ratio: f32) -> Self {
        Self { ratio }
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn to_meters(&self, pixels: f32) -> f32 {
        pixels / self.ratio
    }

    pub fn size_to_meters(&self, pixels: Size2D) -> Size2D {
        Size2D::new(self.to_meters(pixels.width), self.to_meters(pixels.height))
    }

    /// Convert a window position (origin top-left, y down) to simulation space
    /// (origin bottom-left, y up)
    pub fn screen_to_world(&self, screen_pos: Vec2, screen_height: f32) -> Vector2D {
        Vec2::new(
            self.to_meters(screen_pos.x),
            self.to_meters(screen_height - screen_pos.y),
        )
    }
}

impl Default for PixelScale {
    fn default() -> Self {
        Self::new(32.0)
    }
}

/// Orthographic projection of the given view volume onto normalized device
/// coordinates (x and y in -1..1)
pub fn orthographic_ndc(
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    near: f32,
    far: f32,
) -> Mat4 {
    Mat4::orthographic_rh_gl(left, right, bottom, top, near, far)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec4;

    #[test]
    fn test_size_is_positive() {
        assert!(Size2D::new(1.0, 2.0).is_positive());
        assert!(!Size2D::new(0.0, 2.0).is_positive());
        assert!(!Size2D::new(1.0, -2.0).is_positive());
        assert!(!Size2D::new(f32::NAN, 1.0).is_positive());
    }

    #[test]
    fn test_pixel_scale_roundtrip() {
        let scale = PixelScale::new(32.0);
        assert_relative_eq!(scale.to_meters(64.0), 2.0);

        let size = scale.size_to_meters(Size2D::new(50.0, 100.0));
        assert_relative_eq!(size.width, 1.5625);
        assert_relative_eq!(size.height, 3.125);
    }

    #[test]
    fn test_screen_to_world_flips_y() {
        let scale = PixelScale::new(10.0);
        let world = scale.screen_to_world(Vec2::new(20.0, 0.0), 100.0);
        assert_relative_eq!(world.x, 2.0);
        assert_relative_eq!(world.y, 10.0);

        let bottom = scale.screen_to_world(Vec2::new(0.0, 100.0), 100.0);
        assert_relative_eq!(bottom.y, 0.0);
    }

    #[test]
    fn test_orthographic_ndc_corners() {
        let proj = orthographic_ndc(0.0, 320.0, 0.0, 480.0, -1.0, 1.0);

        let bottom_left = proj * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(bottom_left.x, -1.0);
        assert_relative_eq!(bottom_left.y, -1.0);

        let top_right = proj * Vec4::new(320.0, 480.0, 0.0, 1.0);
        assert_relative_eq!(top_right.x, 1.0);
        assert_relative_eq!(top_right.y, 1.0);
    }

    #[test]
    fn test_vector_is_pod() {
        let points = [Vector2D::new(1.0, 2.0), Vector2D::new(3.0, 4.0)];
        let floats: &[f32] = bytemuck::cast_slice(&points);
        assert_eq!(floats, &[1.0, 2.0, 3.0, 4.0]);
    }
}
