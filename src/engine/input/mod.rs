// Input handling system
//
// Maps keyboard and mouse events from winit onto viewer actions.
//
// ## Architecture
//
// - `action`: Defines viewer actions and default bindings
// - `manager`: Pressed-state tracking, cursor position and tilt direction
//
// ## Usage Example
//
// ```rust
// use liquid_metal::engine::input::{Action, InputManager};
//
// let mut input = InputManager::new();
//
// // In your event loop, forward window events
// input.process_keyboard_event(&key_event);
//
// // Once per frame, act on the input and then roll it over
// if input.just_pressed(Action::TogglePause) {
//     // ...
// }
// let gravity_direction = input.tilt();
// input.update();
// ```

pub mod action;
pub mod manager;

// Re-export commonly used types
pub use action::{Action, InputSource};
pub use manager::InputManager;
