//! Align-then-sign command construction.
//!
//! The signer accepts only 4-byte aligned archives, so every signing batch
//! aligns its input into a sibling `.aligned` file first and signs that file.

use crate::batch::{CommandBatch, echo, shell_quote};
use crate::tools::Tools;
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;

/// Suffix appended to the unsigned file name for the aligned intermediate.
pub const ALIGNED_SUFFIX: &str = ".aligned";

/// Suffix of the backup kept when a companion is signed in place.
pub const BACKUP_SUFFIX: &str = ".bak";

/// Keystore and optional password used for signing.
///
/// A password can only exist alongside a keystore; option validation flags
/// and drops a password given without one.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    keystore: Utf8PathBuf,
    password: Option<String>,
}

impl Credentials {
    /// Create credentials. An empty password counts as none.
    #[must_use]
    pub fn new(keystore: Utf8PathBuf, password: Option<String>) -> Self {
        Self {
            keystore,
            password: password.filter(|p| !p.is_empty()),
        }
    }

    /// Path to the keystore.
    #[must_use]
    pub fn keystore(&self) -> &Utf8Path {
        &self.keystore
    }

    /// Keystore password, when one was supplied.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("keystore", &self.keystore)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// One artifact to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    credentials: Credentials,
    unsigned: Utf8PathBuf,
    signed: Utf8PathBuf,
    backup_of: Option<Utf8PathBuf>,
}

impl SigningRequest {
    /// Sign `unsigned` into the separate path `signed`, leaving the input
    /// untouched.
    #[must_use]
    pub fn new(credentials: Credentials, unsigned: Utf8PathBuf, signed: Utf8PathBuf) -> Self {
        Self {
            credentials,
            unsigned,
            signed,
            backup_of: None,
        }
    }

    /// Sign `artifact` in place.
    ///
    /// The artifact is first moved to `{artifact}.bak`; the backup is the
    /// unsigned input and the signed result is written back to `artifact`.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8PathBuf;
    /// use rebuilder::signer::{Credentials, SigningRequest};
    ///
    /// let creds = Credentials::new(Utf8PathBuf::from("debug.jks"), None);
    /// let request = SigningRequest::in_place(creds, Utf8PathBuf::from("split.apk"));
    /// assert_eq!(request.unsigned(), "split.apk.bak");
    /// assert_eq!(request.signed(), "split.apk");
    /// ```
    #[must_use]
    pub fn in_place(credentials: Credentials, artifact: Utf8PathBuf) -> Self {
        let backup = backup_path(&artifact);
        Self {
            credentials,
            unsigned: backup,
            signed: artifact.clone(),
            backup_of: Some(artifact),
        }
    }

    /// Credentials used for this artifact.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Input of the alignment step.
    #[must_use]
    pub fn unsigned(&self) -> &Utf8Path {
        &self.unsigned
    }

    /// Final signed output.
    #[must_use]
    pub fn signed(&self) -> &Utf8Path {
        &self.signed
    }

    /// The artifact moved aside before signing, for in-place requests.
    #[must_use]
    pub fn backup_of(&self) -> Option<&Utf8Path> {
        self.backup_of.as_deref()
    }
}

/// Path of the backup kept for an in-place signed artifact.
#[must_use]
pub fn backup_path(artifact: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{artifact}{BACKUP_SUFFIX}"))
}

/// Path of the aligned intermediate for an unsigned artifact.
#[must_use]
pub fn aligned_path(unsigned: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{unsigned}{ALIGNED_SUFFIX}"))
}

/// Build the batch that moves an in-place artifact to its backup.
///
/// `mv -f` replaces any backup left by an earlier run.
#[must_use]
pub fn build_backup_batch(artifact: &Utf8Path) -> CommandBatch {
    let backup = backup_path(artifact);
    CommandBatch::new(vec![
        echo(&format!("backing up {}...", file_label(artifact))),
        format!("mv -f {} {}", shell_quote(artifact.as_str()), shell_quote(backup.as_str())),
    ])
}

/// Build the align-then-sign batch for one artifact.
///
/// A leftover aligned intermediate from a previous run is removed first. The
/// password, when present, is piped to the signer's standard input.
#[must_use]
pub fn build_sign_batch(tools: &Tools, request: &SigningRequest) -> CommandBatch {
    let unsigned = request.unsigned();
    let aligned = aligned_path(unsigned);
    let mut commands = Vec::with_capacity(3);

    if aligned.exists() {
        commands.push(format!(
            "rm -f {} && {}",
            shell_quote(aligned.as_str()),
            echo(&format!("removed {}", file_label(&aligned)))
        ));
    }

    commands.push(format!(
        "{} && {} -p -f 4 {} {}",
        echo(&format!("zipalign {}...", file_label(unsigned))),
        tools.aligner,
        shell_quote(unsigned.as_str()),
        shell_quote(aligned.as_str())
    ));

    let credentials = request.credentials();
    let mut sign = format!(
        "{} sign -ks {} --out {} {}",
        tools.signer,
        shell_quote(credentials.keystore().as_str()),
        shell_quote(request.signed().as_str()),
        shell_quote(aligned.as_str())
    );
    if let Some(password) = credentials.password() {
        sign = format!("echo {} | {sign}", shell_quote(password));
    }
    commands.push(format!(
        "{} && {sign}",
        echo(&format!("signing {}...", file_label(&aligned)))
    ));

    CommandBatch::new(commands)
}

fn file_label(path: &Utf8Path) -> &str {
    path.file_name().unwrap_or(path.as_str())
}
