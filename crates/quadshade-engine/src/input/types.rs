/// Keyboard key identifier.
///
/// Only the escape key carries meaning for the render loop; everything else
/// is kept as its platform code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,

    /// Platform-dependent key code.
    Other(u32),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Platform-agnostic input event.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InputEvent {
    /// The user asked to close the window.
    Quit,

    Key { key: Key, state: KeyState },
}

impl InputEvent {
    /// Returns `true` for a quit request or an escape key-down.
    pub fn is_exit_request(&self) -> bool {
        matches!(
            self,
            InputEvent::Quit
                | InputEvent::Key {
                    key: Key::Escape,
                    state: KeyState::Pressed,
                }
        )
    }
}
