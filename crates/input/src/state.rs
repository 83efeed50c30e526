use std::collections::{BTreeSet, VecDeque};

use crate::action::{InputEvent, Intent, KeyTransition};

/// Events delivered by the windowing backend, waiting for the next frame.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove and yield all pending events in arrival order.
    pub fn drain(&mut self) -> impl Iterator<Item = InputEvent> + '_ {
        self.events.drain(..)
    }
}

/// Current-state sample of every intent, refreshed once per frame.
///
/// Held intents are level-triggered: they stay active from press to release.
/// `ToggleDebug` and `Quit` latch on press and are cleared when taken.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: BTreeSet<Intent>,
    debug_toggled: bool,
    quit_requested: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: InputEvent) {
        let InputEvent { intent, transition } = event;
        if intent.is_edge_triggered() {
            if transition == KeyTransition::Pressed {
                match intent {
                    Intent::ToggleDebug => self.debug_toggled = !self.debug_toggled,
                    Intent::Quit => self.quit_requested = true,
                    _ => {}
                }
            }
            return;
        }
        if transition.is_down() {
            self.held.insert(intent);
        } else {
            self.held.remove(&intent);
        }
    }

    /// Apply everything the backend queued since the last frame.
    pub fn drain_from(&mut self, queue: &mut InputQueue) -> usize {
        let mut count = 0;
        for event in queue.drain() {
            self.apply(event);
            count += 1;
        }
        if count > 0 {
            tracing::trace!(count, held = self.held.len(), "input drained");
        }
        count
    }

    pub fn is_held(&self, intent: Intent) -> bool {
        self.held.contains(&intent)
    }

    /// Release every held intent, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
    }

    /// (strafe, forward) in {-1, 0, 1}.
    pub fn move_axes(&self) -> (f32, f32) {
        (
            self.axis(Intent::StrafeRight, Intent::StrafeLeft),
            self.axis(Intent::MoveForward, Intent::MoveBackward),
        )
    }

    /// (yaw, pitch) in {-1, 0, 1}.
    pub fn look_axes(&self) -> (f32, f32) {
        (
            self.axis(Intent::LookRight, Intent::LookLeft),
            self.axis(Intent::LookUp, Intent::LookDown),
        )
    }

    /// (horizontal, vertical) rug steering in {-1, 0, 1}; +x is `RugLeft`.
    pub fn rug_axes(&self) -> (f32, f32) {
        (
            self.axis(Intent::RugLeft, Intent::RugRight),
            self.axis(Intent::RugUp, Intent::RugDown),
        )
    }

    /// True once per debug-toggle press since the last call.
    pub fn take_debug_toggle(&mut self) -> bool {
        std::mem::take(&mut self.debug_toggled)
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    fn axis(&self, positive: Intent, negative: Intent) -> f32 {
        let mut v = 0.0;
        if self.is_held(positive) {
            v += 1.0;
        }
        if self.is_held(negative) {
            v -= 1.0;
        }
        v
    }
}
