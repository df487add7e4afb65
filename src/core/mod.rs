//! Core domain types.

pub mod project;
pub mod target;

pub use project::Project;
pub use target::{BindingModule, Mode, Target, BINDING_MODULES};
