//! Error types for the rebuild script compiler.
//!
//! Every variant here is a compile-time failure: it aborts pipeline
//! construction before the offending batch is appended. Failures of the
//! external tools only surface later, when the generated script runs, and
//! have no representation in this module.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while compiling a rebuild script.
#[derive(Debug, Error)]
pub enum RebuildError {
    /// The requested options contradict each other or collide on disk.
    #[error("invalid configuration: {reason}")]
    Configuration {
        /// Description of the conflict.
        reason: String,
    },

    /// A required input does not exist.
    #[error("could not find {what} at {path}")]
    MissingInput {
        /// Human-readable name of the input (for example "source directory").
        what: &'static str,
        /// Path that was checked.
        path: Utf8PathBuf,
    },

    /// A build output (unsigned working copy or signed archive) would
    /// overwrite the original archive.
    #[error("original archive and build output are the same file ({path}); choose another build directory")]
    ArtifactAliasing {
        /// The shared path.
        path: Utf8PathBuf,
    },

    /// The toolchain configuration file could not be read or parsed.
    #[error("invalid tools file {path}: {reason}")]
    InvalidToolsFile {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// The output script could not be created.
    #[error("cannot create script file {path}")]
    ScriptSetup {
        /// Path of the script.
        path: Utf8PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Appending a batch to the output script failed.
    #[error("failed to append to script file {path}")]
    ScriptWrite {
        /// Path of the script.
        path: Utf8PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Copying the original archive into the build directory failed.
    #[error("failed to copy {from} to {to}")]
    CopyFailed {
        /// Source of the copy.
        from: Utf8PathBuf,
        /// Destination of the copy.
        to: Utf8PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RebuildError {
    /// Build a [`RebuildError::Configuration`] from any displayable reason.
    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }
}

/// Result type alias using [`RebuildError`].
pub type Result<T> = std::result::Result<T, RebuildError>;
