// Core types shared by the engine and the scene

pub mod math;

pub use math::{PixelScale, Size2D, Vector2D};
