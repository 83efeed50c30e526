//! Developer tooling: read-only frame inspection for the debug overlay and
//! the headless CLI.
//!
//! # Invariants
//! - Tools never mutate the scene.

mod inspector;

pub use inspector::{FrameInspector, FrameSummary, LightReport};

pub fn crate_info() -> &'static str {
    "sandscape-tools v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}
