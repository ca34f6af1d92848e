//! Pre-flight validation of rebuild options.
//!
//! [`BuildOptions::validate`] turns raw options into a [`BuildPlan`]. Hard
//! conflicts become [`RebuildError`]s before anything on disk changes; soft
//! problems are normalized, logged, and kept on the plan as
//! [`ValidationWarning`]s.

use crate::context::{BuildContext, same_location};
use crate::error::{RebuildError, Result};
use crate::pipeline::InstallTarget;
use crate::signer::{BACKUP_SUFFIX, Credentials};
use crate::tools::Tools;
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;

/// Raw options for one rebuild run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Archive being rebuilt.
    pub original_app: Utf8PathBuf,
    /// Directory for generated artifacts.
    pub build_dir: Utf8PathBuf,
    /// Directory holding the user's sources.
    pub source_dir: Utf8PathBuf,
    /// Override for the derived app name.
    pub app_name: Option<String>,
    /// Bytecode directories to assemble.
    pub smali_dirs: Vec<Utf8PathBuf>,
    /// Files to add at the archive root.
    pub extra_files: Vec<Utf8PathBuf>,
    /// Keystore used for signing.
    pub keystore: Option<Utf8PathBuf>,
    /// Keystore password.
    pub keystore_password: Option<String>,
    /// Leave the output unsigned.
    pub no_sign: bool,
    /// Keep the build directory contents after the script runs.
    pub keep_build_files: bool,
    /// Install after building.
    pub install: bool,
    /// Sign companion archives in place as well.
    pub sign_all: bool,
    /// Companion archives installed alongside the rebuilt one.
    pub companions: Vec<Utf8PathBuf>,
    /// Install on the emulator instead of a USB device.
    pub install_on_emulator: bool,
    /// External tools.
    pub tools: Tools,
}

impl BuildOptions {
    /// Options for `original_app` with every other setting at its default.
    #[must_use]
    pub fn new(original_app: impl Into<Utf8PathBuf>) -> Self {
        Self {
            original_app: original_app.into(),
            build_dir: Utf8PathBuf::from("build"),
            source_dir: Utf8PathBuf::from("."),
            app_name: None,
            smali_dirs: Vec::new(),
            extra_files: Vec::new(),
            keystore: None,
            keystore_password: None,
            no_sign: false,
            keep_build_files: false,
            install: false,
            sign_all: false,
            companions: Vec::new(),
            install_on_emulator: false,
            tools: Tools::default(),
        }
    }

    /// Validate and normalize the options.
    ///
    /// # Errors
    ///
    /// Returns [`RebuildError::Configuration`] for colliding directories,
    /// installing without signing, or installing without a usable keystore,
    /// [`RebuildError::MissingInput`] when the source directory, a bytecode
    /// directory or the original archive does not exist, and
    /// [`RebuildError::ArtifactAliasing`] when the working copy would
    /// overwrite the original archive.
    pub fn validate(mut self) -> Result<BuildPlan> {
        if same_location(&self.build_dir, &self.source_dir) {
            return Err(RebuildError::configuration(
                "build directory and source directory must be separate",
            ));
        }
        require_exists(&self.source_dir, "source directory")?;
        require_exists(&self.original_app, "original app")?;
        for dir in &self.smali_dirs {
            require_exists(dir, "source directory")?;
        }
        BuildContext::resolve(
            &self.build_dir,
            &self.original_app,
            self.app_name.as_deref(),
        )?;

        let mut warnings = Vec::new();

        if self.install_on_emulator {
            self.install = true;
        }
        if self.no_sign && self.install {
            return Err(RebuildError::configuration(
                "cannot install an app without signing it first",
            ));
        }
        if self.sign_all && self.no_sign {
            warnings.push(ValidationWarning::SignAllWithNoSign);
            self.sign_all = false;
        }

        let keystore = self.keystore.take().filter(|path| {
            let exists = path.is_file();
            if !exists {
                warnings.push(ValidationWarning::KeystoreNotFound(path.clone()));
            }
            exists
        });

        let password = self.keystore_password.take().filter(|p| !p.is_empty());
        let credentials = match keystore {
            Some(keystore) if !self.no_sign => Some(Credentials::new(keystore, password)),
            Some(_) => {
                warnings.push(ValidationWarning::UnusedCredentials);
                None
            }
            None => {
                if self.install {
                    return Err(RebuildError::configuration(
                        "the app cannot be installed until a keystore is provided",
                    ));
                }
                if !self.no_sign {
                    warnings.push(ValidationWarning::UnsignedOutput);
                }
                if password.is_some() {
                    warnings.push(ValidationWarning::PasswordWithoutKeystore);
                }
                None
            }
        };

        if !self.companions.is_empty() && !self.install && !self.sign_all {
            warnings.push(ValidationWarning::UnusedCompanions);
        }
        if self.sign_all && self.companions.is_empty() {
            warnings.push(ValidationWarning::SignAllWithoutCompanions);
        }
        if self.sign_all && credentials.is_some() && !self.companions.is_empty() {
            warnings.push(ValidationWarning::InPlaceSigning);
        }

        for warning in &warnings {
            log::warn!("{warning}");
        }

        Ok(BuildPlan {
            options: self,
            credentials,
            warnings,
        })
    }
}

/// Soft problems found during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// `--sign-all` and `--no-sign` were both given; `--sign-all` is dropped.
    SignAllWithNoSign,
    /// The keystore path does not exist; it is ignored.
    KeystoreNotFound(Utf8PathBuf),
    /// Signing was wanted but no usable keystore exists.
    UnsignedOutput,
    /// A password was given without a usable keystore; it is ignored.
    PasswordWithoutKeystore,
    /// A keystore was given together with `--no-sign`; it is ignored.
    UnusedCredentials,
    /// Companions were given but nothing uses them.
    UnusedCompanions,
    /// `--sign-all` was given without companions.
    SignAllWithoutCompanions,
    /// Companions are about to be signed in place.
    InPlaceSigning,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignAllWithNoSign => {
                f.write_str("using both --sign-all and --no-sign makes no sense; ignoring --sign-all")
            }
            Self::KeystoreNotFound(path) => {
                write!(f, "keystore {path} does not exist; app(s) will be left unsigned")
            }
            Self::UnsignedOutput => f.write_str("no keystore provided; app will be left unsigned"),
            Self::PasswordWithoutKeystore => {
                f.write_str("keystore password is of no use without the keystore itself")
            }
            Self::UnusedCredentials => {
                f.write_str("keystore and password are of no use with --no-sign; ignoring them")
            }
            Self::UnusedCompanions => {
                f.write_str("companion apps are of no use when not installing or signing them")
            }
            Self::SignAllWithoutCompanions => {
                f.write_str("--sign-all is of no use without companion apps")
            }
            Self::InPlaceSigning => write!(
                f,
                "companion apps are signed in place; unsigned copies are kept as APP{BACKUP_SUFFIX}"
            ),
        }
    }
}

/// Validated, normalized options ready to be compiled into a script.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    options: BuildOptions,
    credentials: Option<Credentials>,
    warnings: Vec<ValidationWarning>,
}

impl BuildPlan {
    /// The normalized options.
    #[must_use]
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Signing credentials; `None` when the output stays unsigned.
    #[must_use]
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Warnings raised during validation, in the order they were found.
    #[must_use]
    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    /// Whether companions are signed in place.
    #[must_use]
    pub fn signs_companions(&self) -> bool {
        self.options.sign_all && self.credentials.is_some() && !self.options.companions.is_empty()
    }

    /// Install target when installing, `None` otherwise.
    #[must_use]
    pub fn install_target(&self) -> Option<InstallTarget> {
        if !self.options.install {
            return None;
        }
        Some(if self.options.install_on_emulator {
            InstallTarget::Emulator
        } else {
            InstallTarget::Device
        })
    }
}

fn require_exists(path: &Utf8Path, what: &'static str) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(RebuildError::MissingInput {
            what,
            path: path.to_owned(),
        })
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
