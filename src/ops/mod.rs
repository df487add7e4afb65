//! High-level operations.
//!
//! Each step of the plugin pipeline lives in its own module; [`pipeline`]
//! runs them in order.

pub mod api_patch;
pub mod deploy;
pub mod descriptor;
pub mod doctor;
pub mod events;
pub mod global_json;
pub mod locate;
pub mod manifest;
pub mod nuget_config;
pub mod pipeline;
pub mod sanitize;

pub use api_patch::patch_sources;
pub use deploy::{deploy, locate_output_dir, DeployError};
pub use descriptor::{patch_descriptor, Descriptor, DescriptorSettings, Edit};
pub use doctor::{doctor, format_report, DoctorOptions, DoctorReport};
pub use events::{EventSink, NullSink, PipelineEvent, Step};
pub use global_json::{reconcile_global_json, PinOutcome};
pub use locate::{find_descriptor, LocateError};
pub use manifest::{ensure_manifest, ManifestMeta};
pub use nuget_config::{ensure_nuget_config, NugetOutcome};
pub use pipeline::{build, prepare, BuildReport, PipelineOptions, Prepared};
pub use sanitize::sanitize_sources;
