//! End-to-end compilation of a validated plan into a script.
//!
//! [`rebuild`] prepares the build directory, resets the script, copies the
//! original archive to its working path, and then queues each requested stage
//! in the fixed order recompile, inject, sign, install, clean. Every stage is
//! flushed as soon as it is queued so a failure part way through leaves the
//! earlier stages on disk.

use crate::context::{BuildContext, SCRIPT_FILE_NAME};
use crate::error::Result;
use crate::pipeline::PipelineBuilder;
use crate::plan::BuildPlan;
use crate::script::{ScriptSink, ScriptWriter};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Outcome of a successful [`rebuild`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildSummary {
    /// Location of the generated script.
    pub script_path: Utf8PathBuf,
    /// Number of batches (script lines) written.
    pub batches_written: usize,
    /// Path the signed archive will be written to, when signing.
    pub signed_artifact: Option<Utf8PathBuf>,
}

/// Generate the rebuild script for `plan`.
///
/// # Errors
///
/// Returns an error when the script cannot be created or written, when the
/// original archive cannot be copied, or when a bytecode directory is
/// missing.
pub fn rebuild(plan: &BuildPlan) -> Result<RebuildSummary> {
    let options = plan.options();
    ensure_build_dir(&options.build_dir);

    let mut writer = ScriptWriter::create(&options.build_dir.join(SCRIPT_FILE_NAME))?;
    let context = BuildContext::create(
        &options.build_dir,
        &options.original_app,
        options.app_name.as_deref(),
    )?;
    let batches_written = write_stages(plan, &context, &mut writer)?;

    Ok(RebuildSummary {
        script_path: writer.path().to_owned(),
        batches_written,
        signed_artifact: plan
            .credentials()
            .map(|_| context.signed_artifact().to_owned()),
    })
}

/// Queue every stage `plan` asks for against `context` and flush each one to
/// `sink`.
///
/// Returns the total number of batches written.
///
/// # Errors
///
/// Propagates missing bytecode directories and sink failures.
pub fn write_stages(
    plan: &BuildPlan,
    context: &BuildContext,
    sink: &mut dyn ScriptSink,
) -> Result<usize> {
    let options = plan.options();
    let mut pipeline = PipelineBuilder::new(context, &options.tools);
    let mut written = 0;

    if !options.smali_dirs.is_empty() {
        pipeline.recompile(&options.smali_dirs)?;
        written += pipeline.flush(sink)?;
    }
    if !options.extra_files.is_empty() {
        written += pipeline.inject_files(&options.extra_files).flush(sink)?;
    }
    if let Some(credentials) = plan.credentials() {
        if plan.signs_companions() {
            pipeline.sign_all(credentials, &options.companions);
        } else {
            pipeline.sign_original(credentials);
        }
        written += pipeline.flush(sink)?;
    }
    if let Some(target) = plan.install_target() {
        written += pipeline.install(target, &options.companions).flush(sink)?;
    }
    if !options.keep_build_files {
        written += pipeline.clean().flush(sink)?;
    }

    Ok(written)
}

fn ensure_build_dir(build_dir: &Utf8Path) {
    if build_dir.is_dir() {
        return;
    }
    match fs::create_dir_all(build_dir) {
        Ok(()) => log::debug!("created build directory {build_dir}"),
        Err(e) => log::warn!("failed to create build directory {build_dir}: {e}"),
    }
}
