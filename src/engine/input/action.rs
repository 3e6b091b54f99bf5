// Viewer action definitions and mappings

use winit::event::MouseButton;
use winit::keyboard::KeyCode;

/// Represents all actions the viewer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // Tilting the container (stands in for a device accelerometer)
    TiltLeft,
    TiltRight,
    TiltUp,
    TiltDown,

    /// Pour a box of particles at the cursor
    SpawnBox,

    // Meta actions
    TogglePause,
    ToggleDebug,
    DumpParticles,
    Quit,
}

/// Represents an input source (keyboard key or mouse button)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    Keyboard(KeyCode),
    Mouse(MouseButton),
}

impl InputSource {
    /// Create a keyboard input source
    pub fn key(code: KeyCode) -> Self {
        Self::Keyboard(code)
    }

    /// Create a mouse button input source
    pub fn mouse(button: MouseButton) -> Self {
        Self::Mouse(button)
    }
}

/// Default keyboard/mouse bindings
pub fn default_bindings() -> Vec<(InputSource, Action)> {
    vec![
        // Tilt (arrows and WASD)
        (InputSource::key(KeyCode::ArrowLeft), Action::TiltLeft),
        (InputSource::key(KeyCode::ArrowRight), Action::TiltRight),
        (InputSource::key(KeyCode::ArrowUp), Action::TiltUp),
        (InputSource::key(KeyCode::ArrowDown), Action::TiltDown),
        (InputSource::key(KeyCode::KeyA), Action::TiltLeft),
        (InputSource::key(KeyCode::KeyD), Action::TiltRight),
        (InputSource::key(KeyCode::KeyW), Action::TiltUp),
        (InputSource::key(KeyCode::KeyS), Action::TiltDown),
        // Pouring
        (InputSource::mouse(MouseButton::Left), Action::SpawnBox),
        // Meta
        (InputSource::key(KeyCode::KeyP), Action::TogglePause),
        (InputSource::key(KeyCode::F1), Action::ToggleDebug),
        (InputSource::key(KeyCode::KeyI), Action::DumpParticles),
        (InputSource::key(KeyCode::Escape), Action::Quit),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_source_creation() {
        assert_eq!(
            InputSource::key(KeyCode::KeyA),
            InputSource::Keyboard(KeyCode::KeyA)
        );
        assert_eq!(
            InputSource::mouse(MouseButton::Left),
            InputSource::Mouse(MouseButton::Left)
        );
    }

    #[test]
    fn test_spawn_uses_left_mouse() {
        let bindings = default_bindings();
        let spawn = bindings
            .iter()
            .find(|(_, action)| *action == Action::SpawnBox);

        assert!(matches!(
            spawn,
            Some((InputSource::Mouse(MouseButton::Left), _))
        ));
    }

    #[test]
    fn test_no_duplicate_inputs() {
        let mut seen_sources = std::collections::HashSet::new();
        for (source, _) in default_bindings() {
            assert!(
                seen_sources.insert(source),
                "Duplicate input source found in bindings"
            );
        }
    }
}
