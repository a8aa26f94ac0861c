pub mod constants;
pub mod runtime;

pub use runtime::{AssignmentStyle, Preferences};
