// Input manager - turns window events into viewer actions

use super::action::{default_bindings, Action, InputSource};
use crate::core::math::Vector2D;
use std::collections::{HashMap, HashSet};
use winit::event::{ElementState, KeyEvent, MouseButton};
use winit::keyboard::PhysicalKey;

/// Tracks bound actions, the cursor and pending spawn points
#[derive(Debug)]
pub struct InputManager {
    /// Mapping from input sources to actions
    bindings: HashMap<InputSource, Action>,

    /// Actions that are currently pressed
    pressed: HashSet<Action>,

    /// Actions that were just pressed this frame
    just_pressed: HashSet<Action>,

    /// Last known cursor position in window pixels (origin top-left)
    cursor: Option<Vector2D>,

    /// Window positions where a spawn was requested this frame
    spawn_points: Vec<Vector2D>,
}

impl InputManager {
    /// Create an input manager with the default bindings
    pub fn new() -> Self {
        Self::with_bindings(default_bindings())
    }

    /// Create an input manager from a list of bindings
    pub fn with_bindings(bindings: Vec<(InputSource, Action)>) -> Self {
        Self {
            bindings: bindings.into_iter().collect(),
            pressed: HashSet::new(),
            just_pressed: HashSet::new(),
            cursor: None,
            spawn_points: Vec::new(),
        }
    }

    /// Bind an input source to an action, replacing any previous binding
    pub fn bind(&mut self, source: InputSource, action: Action) {
        self.bindings.insert(source, action);
    }

    /// Get the action bound to an input source
    pub fn get_action(&self, source: InputSource) -> Option<Action> {
        self.bindings.get(&source).copied()
    }

    /// Process a keyboard event from winit
    pub fn process_keyboard_event(&mut self, event: &KeyEvent) {
        if let PhysicalKey::Code(key_code) = event.physical_key {
            // Key repeats are not new presses
            if event.repeat {
                return;
            }
            self.handle(InputSource::key(key_code), event.state);
        }
    }

    /// Process a mouse button event from winit
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        self.handle(InputSource::mouse(button), state);
    }

    /// Record the cursor position in window pixels
    pub fn process_cursor_moved(&mut self, position: Vector2D) {
        self.cursor = Some(position);
    }

    /// Forget the cursor when it leaves the window
    pub fn process_cursor_left(&mut self) {
        self.cursor = None;
    }

    fn handle(&mut self, source: InputSource, state: ElementState) {
        let Some(action) = self.get_action(source) else {
            return;
        };

        match state {
            ElementState::Pressed => self.press(action),
            ElementState::Released => self.release(action),
        }
    }

    /// Register an action press
    pub(crate) fn press(&mut self, action: Action) {
        if self.pressed.insert(action) {
            self.just_pressed.insert(action);

            if action == Action::SpawnBox {
                if let Some(cursor) = self.cursor {
                    self.spawn_points.push(cursor);
                }
            }
        }
    }

    /// Register an action release
    pub(crate) fn release(&mut self, action: Action) {
        self.pressed.remove(&action);
    }

    /// Check if an action is currently pressed
    pub fn is_pressed(&self, action: Action) -> bool {
        self.pressed.contains(&action)
    }

    /// Check if an action was just pressed this frame
    pub fn just_pressed(&self, action: Action) -> bool {
        self.just_pressed.contains(&action)
    }

    /// Take the spawn points requested since the last call
    pub fn take_spawn_points(&mut self) -> Vec<Vector2D> {
        std::mem::take(&mut self.spawn_points)
    }

    /// Direction the container is tilted towards, as a unit vector
    ///
    /// With no tilt keys held the container is upright and "down" is -y.
    pub fn tilt(&self) -> Vector2D {
        let mut direction = Vector2D::ZERO;

        if self.is_pressed(Action::TiltLeft) {
            direction.x -= 1.0;
        }
        if self.is_pressed(Action::TiltRight) {
            direction.x += 1.0;
        }
        if self.is_pressed(Action::TiltUp) {
            direction.y += 1.0;
        }
        if self.is_pressed(Action::TiltDown) {
            direction.y -= 1.0;
        }

        direction.try_normalize().unwrap_or(Vector2D::NEG_Y)
    }

    /// Update input state for a new frame
    /// Call this once per frame after acting on the input
    pub fn update(&mut self) {
        self.just_pressed.clear();
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use winit::keyboard::KeyCode;

    #[test]
    fn test_press_and_release() {
        let mut input = InputManager::new();
        input.press(Action::TiltLeft);

        assert!(input.is_pressed(Action::TiltLeft));
        assert!(input.just_pressed(Action::TiltLeft));

        input.update();
        assert!(input.is_pressed(Action::TiltLeft));
        assert!(!input.just_pressed(Action::TiltLeft));

        input.release(Action::TiltLeft);
        assert!(!input.is_pressed(Action::TiltLeft));
    }

    #[test]
    fn test_default_tilt_points_down() {
        let input = InputManager::new();
        assert_eq!(input.tilt(), Vector2D::new(0.0, -1.0));
    }

    #[test]
    fn test_tilt_is_normalized() {
        let mut input = InputManager::new();
        input.press(Action::TiltLeft);
        input.press(Action::TiltDown);

        let tilt = input.tilt();
        assert_relative_eq!(tilt.length(), 1.0, epsilon = 1e-6);
        assert!(tilt.x < 0.0 && tilt.y < 0.0);
    }

    #[test]
    fn test_opposite_tilts_cancel() {
        let mut input = InputManager::new();
        input.press(Action::TiltLeft);
        input.press(Action::TiltRight);

        assert_eq!(input.tilt(), Vector2D::NEG_Y);
    }

    #[test]
    fn test_click_records_spawn_point() {
        let mut input = InputManager::new();
        input.process_cursor_moved(Vector2D::new(120.0, 40.0));
        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        input.process_mouse_button(MouseButton::Left, ElementState::Released);

        assert_eq!(input.take_spawn_points(), vec![Vector2D::new(120.0, 40.0)]);
        assert!(input.take_spawn_points().is_empty());
    }

    #[test]
    fn test_click_outside_window_is_ignored() {
        let mut input = InputManager::new();
        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);

        assert!(input.take_spawn_points().is_empty());
    }

    #[test]
    fn test_rebind() {
        let mut input = InputManager::new();
        let source = InputSource::key(KeyCode::KeyJ);
        assert_eq!(input.get_action(source), None);

        input.bind(source, Action::TiltLeft);
        assert_eq!(input.get_action(source), Some(Action::TiltLeft));
    }
}
