use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::input::{InputEvent, Key, KeyState};

/// Translates a winit `WindowEvent` into an engine `InputEvent`.
///
/// Returns `None` for events not represented by the input subsystem.
pub fn translate_window_event(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::CloseRequested => Some(InputEvent::Quit),

        WindowEvent::KeyboardInput { event, .. } => {
            let state = match event.state {
                ElementState::Pressed => KeyState::Pressed,
                ElementState::Released => KeyState::Released,
            };

            Some(InputEvent::Key {
                key: map_key(event.physical_key),
                state,
            })
        }

        _ => None,
    }
}

fn map_key(pk: PhysicalKey) -> Key {
    match pk {
        PhysicalKey::Code(KeyCode::Escape) => Key::Escape,
        PhysicalKey::Code(code) => Key::Other(code as u32),
        // NativeKeyCode is not a u32 in winit 0.30; no stable numeric.
        PhysicalKey::Unidentified(_) => Key::Other(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_request_maps_to_quit() {
        assert_eq!(
            translate_window_event(&WindowEvent::CloseRequested),
            Some(InputEvent::Quit)
        );
    }

    #[test]
    fn unrelated_events_are_dropped() {
        assert_eq!(translate_window_event(&WindowEvent::Focused(true)), None);
        assert_eq!(translate_window_event(&WindowEvent::RedrawRequested), None);
    }

    #[test]
    fn escape_code_maps_to_escape() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::Escape)), Key::Escape);
        assert!(matches!(map_key(PhysicalKey::Code(KeyCode::KeyA)), Key::Other(_)));
    }
}
