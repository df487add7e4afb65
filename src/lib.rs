//! plugsmith - patch, build and deploy a Dalamud plugin
//!
//! The plugin targets either API 12 (.NET 8) or API 13 (.NET 9). plugsmith
//! picks the target from the installed SDKs, rewrites the project's sources
//! and configuration files to match, then restores, builds and copies the
//! artifacts to a deploy folder.

pub mod core;
pub mod ops;
pub mod toolchain;
pub mod util;

/// Test utilities and mocks for plugsmith unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a scripted command runner, an event
/// recorder and plugin project fixtures.
#[cfg(test)]
pub mod test_support;

pub use core::{Mode, Project, Target};
pub use ops::pipeline::{PipelineOptions, Prepared};
