//! Input: backend key events mapped to intents, queued, and sampled once per frame.
//!
//! # Invariants
//! - The scene never sees raw key codes, only `Intent`s.
//! - Movement and look intents are level-triggered; toggles are edge-triggered.
//! - Events are drained exactly once per frame, in arrival order.

pub mod action;
mod state;

pub use action::{InputEvent, Intent, KeyTransition};
pub use state::{InputQueue, InputState};

pub fn crate_info() -> &'static str {
    "sandscape-input v0.1.0"
}
