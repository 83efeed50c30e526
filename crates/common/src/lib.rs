//! Shared value types for the sandscape workspace.

mod types;

pub use types::{Placement, TransformStep};
