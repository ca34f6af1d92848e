//! Per-run build context.
//!
//! A [`BuildContext`] fixes every path a run works with. Creating one is the
//! only step that touches the archive itself: stale outputs from a previous
//! run are removed and the original archive is copied to the unsigned working
//! path, which every later stage updates in place.

use crate::app_name::{resolve_app_name, signed_file_name, unsigned_file_name};
use crate::error::{RebuildError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// File name of the generated script inside the build directory.
pub const SCRIPT_FILE_NAME: &str = "run";

/// Immutable paths for one rebuild run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    build_dir: Utf8PathBuf,
    original_artifact: Utf8PathBuf,
    unsigned_artifact: Utf8PathBuf,
    signed_artifact: Utf8PathBuf,
    script_path: Utf8PathBuf,
    app_name: String,
}

impl BuildContext {
    /// Derive the context paths without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`RebuildError::ArtifactAliasing`] when the unsigned working
    /// copy or the signed output would land on the original archive.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use rebuilder::context::BuildContext;
    ///
    /// let ctx = BuildContext::resolve(Utf8Path::new("build"), Utf8Path::new("app.apk"), None)?;
    /// assert_eq!(ctx.unsigned_artifact(), "build/app-unsigned.apk");
    /// assert_eq!(ctx.signed_artifact(), "build/app-signed.apk");
    /// assert_eq!(ctx.script_path(), "build/run");
    /// # Ok::<(), rebuilder::error::RebuildError>(())
    /// ```
    pub fn resolve(
        build_dir: &Utf8Path,
        original_artifact: &Utf8Path,
        app_name: Option<&str>,
    ) -> Result<Self> {
        let app_name = resolve_app_name(original_artifact, app_name);
        let unsigned_artifact = build_dir.join(unsigned_file_name(&app_name));
        let signed_artifact = build_dir.join(signed_file_name(&app_name));

        for output in [&unsigned_artifact, &signed_artifact] {
            if same_location(original_artifact, output) {
                return Err(RebuildError::ArtifactAliasing {
                    path: output.clone(),
                });
            }
        }

        Ok(Self {
            build_dir: build_dir.to_owned(),
            original_artifact: original_artifact.to_owned(),
            unsigned_artifact,
            signed_artifact,
            script_path: build_dir.join(SCRIPT_FILE_NAME),
            app_name,
        })
    }

    /// Resolve the context and prepare the unsigned working copy.
    ///
    /// Existing unsigned and signed outputs are deleted first; a failed
    /// deletion is logged and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RebuildError::ArtifactAliasing`] as [`BuildContext::resolve`]
    /// does, or [`RebuildError::CopyFailed`] when the original archive cannot
    /// be copied.
    pub fn create(
        build_dir: &Utf8Path,
        original_artifact: &Utf8Path,
        app_name: Option<&str>,
    ) -> Result<Self> {
        let ctx = Self::resolve(build_dir, original_artifact, app_name)?;
        remove_stale(&ctx.unsigned_artifact);
        remove_stale(&ctx.signed_artifact);

        fs::copy(&ctx.original_artifact, &ctx.unsigned_artifact).map_err(|source| {
            RebuildError::CopyFailed {
                from: ctx.original_artifact.clone(),
                to: ctx.unsigned_artifact.clone(),
                source,
            }
        })?;
        log::debug!(
            "copied {} to {}",
            ctx.original_artifact,
            ctx.unsigned_artifact
        );
        Ok(ctx)
    }

    /// Directory that holds every generated artifact.
    #[must_use]
    pub fn build_dir(&self) -> &Utf8Path {
        &self.build_dir
    }

    /// The archive being rebuilt. Never modified.
    #[must_use]
    pub fn original_artifact(&self) -> &Utf8Path {
        &self.original_artifact
    }

    /// Working copy updated by the recompile and inject stages.
    #[must_use]
    pub fn unsigned_artifact(&self) -> &Utf8Path {
        &self.unsigned_artifact
    }

    /// Output of signing the working copy.
    #[must_use]
    pub fn signed_artifact(&self) -> &Utf8Path {
        &self.signed_artifact
    }

    /// Location of the generated script.
    #[must_use]
    pub fn script_path(&self) -> &Utf8Path {
        &self.script_path
    }

    /// Resolved app name.
    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }
}

/// Compare two paths after making them absolute.
pub(crate) fn same_location(a: &Utf8Path, b: &Utf8Path) -> bool {
    match (std::path::absolute(a), std::path::absolute(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn remove_stale(path: &Utf8Path) {
    if !path.exists() {
        return;
    }
    match fs::remove_file(path) {
        Ok(()) => log::debug!("removed stale {path}"),
        Err(e) => log::warn!("failed to delete {path}: {e}"),
    }
}
