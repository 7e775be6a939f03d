use super::types::InputEvent;

/// Input events queued between two frames.
///
/// The runtime pushes translated events as they arrive; the render loop
/// consumes the whole batch at the start of the next frame.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Raw events in arrival order.
    pub events: Vec<InputEvent>,
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn push_event(&mut self, ev: InputEvent) {
        self.events.push(ev);
    }

    /// Returns `true` if any queued event asks the loop to stop.
    pub fn exit_requested(&self) -> bool {
        self.events.iter().any(InputEvent::is_exit_request)
    }
}
