//! Liquid particle simulation with a handle-based API and a wgpu viewer.
//!
//! [`engine::physics::Simulation`] owns the world and hands out typed handles for
//! particle systems and edge boxes. [`scene::LiquidScene`] wires it up as a
//! screen-sized container that pours particles on click and follows a tilt vector.

pub mod core;
pub mod engine;
pub mod scene;
