//! External toolchain configuration.
//!
//! The compiler never runs these tools; it only needs the program strings to
//! put at the front of each generated command. Defaults match the Android SDK
//! names, and a `rebuilder.toml` file may override any of them:
//!
//! ```toml
//! assembler = "java -jar /opt/smali.jar"
//! signer = "/opt/build-tools/34.0.0/apksigner"
//! ```

use crate::error::{RebuildError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

/// File name looked up in the source directory when no explicit tools file is
/// given.
pub const TOOLS_FILE_NAME: &str = "rebuilder.toml";

/// Program strings for every external tool the generated script invokes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tools {
    /// Bytecode assembler (`smali`).
    pub assembler: String,
    /// Archive updater (`zip`).
    pub archiver: String,
    /// Archive aligner (`zipalign`).
    pub aligner: String,
    /// Archive signer (`apksigner`).
    pub signer: String,
    /// Device install tool (`adb`).
    pub installer: String,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            assembler: "smali".to_owned(),
            archiver: "zip".to_owned(),
            aligner: "zipalign".to_owned(),
            signer: "apksigner".to_owned(),
            installer: "adb".to_owned(),
        }
    }
}

impl Tools {
    /// Parse a tools table from TOML text.
    ///
    /// Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RebuildError::InvalidToolsFile`] when the text is not valid
    /// TOML or contains unknown keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use rebuilder::tools::Tools;
    ///
    /// let tools = Tools::parse(Utf8Path::new("rebuilder.toml"), "aligner = \"za\"")?;
    /// assert_eq!(tools.aligner, "za");
    /// assert_eq!(tools.signer, "apksigner");
    /// # Ok::<(), rebuilder::error::RebuildError>(())
    /// ```
    pub fn parse(path: &Utf8Path, contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| RebuildError::InvalidToolsFile {
            path: path.to_owned(),
            reason: e.to_string(),
        })
    }

    /// Load a tools file that must exist.
    ///
    /// # Errors
    ///
    /// Returns [`RebuildError::MissingInput`] when the file does not exist, or
    /// [`RebuildError::InvalidToolsFile`] when it cannot be read or parsed.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        if !path.is_file() {
            return Err(RebuildError::MissingInput {
                what: "tools file",
                path: path.to_owned(),
            });
        }
        let contents =
            std::fs::read_to_string(path).map_err(|e| RebuildError::InvalidToolsFile {
                path: path.to_owned(),
                reason: e.to_string(),
            })?;
        Self::parse(path, &contents)
    }

    /// Resolve the tools for a run.
    ///
    /// An explicit file wins; otherwise `rebuilder.toml` in `source_dir` is
    /// used when present; otherwise the defaults apply.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`Tools::load`].
    pub fn discover(explicit: Option<&Utf8Path>, source_dir: &Utf8Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate: Utf8PathBuf = source_dir.join(TOOLS_FILE_NAME);
        if candidate.is_file() {
            log::debug!("using tools from {candidate}");
            return Self::load(&candidate);
        }
        Ok(Self::default())
    }
}
