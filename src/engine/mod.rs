// Engine modules: physics, renderer, input, loop timing

pub mod game_loop;
pub mod input;
pub mod physics;
pub mod renderer;
