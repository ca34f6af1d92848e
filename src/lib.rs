//! Rebuilder core library.
//!
//! Compiles the steps of rebuilding an Android application archive into a
//! fail-fast shell script. Nothing here runs the external tools: each stage is
//! rendered as a chain of `&&`-joined commands and appended to
//! `<build-dir>/run`, which the user executes afterwards. The `rebuilder` CLI
//! binary is a thin layer over [`plan::BuildOptions`] and [`rebuild::rebuild`].
//!
//! # Modules
//!
//! - [`app_name`] - App name derivation and artifact file names
//! - [`batch`] - Command batches and shell quoting
//! - [`context`] - Per-run build paths and working-copy preparation
//! - [`error`] - Semantic error types
//! - [`pipeline`] - Stage-by-stage script construction
//! - [`plan`] - Pre-flight option validation
//! - [`rebuild`] - End-to-end script generation
//! - [`script`] - Script serialization
//! - [`signer`] - Align-then-sign batches
//! - [`tools`] - External tool configuration

pub mod app_name;
pub mod batch;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod plan;
pub mod rebuild;
pub mod script;
pub mod signer;
pub mod tools;

pub use error::{RebuildError, Result};
pub use plan::{BuildOptions, BuildPlan, ValidationWarning};
pub use rebuild::{RebuildSummary, rebuild};
