//! Script serialization.
//!
//! Each [`CommandBatch`] becomes one line of the generated script. The file
//! is reset once per run by [`ScriptWriter::create`]; every later write opens
//! it in append mode and closes it again, so no handle outlives a call.

use crate::batch::CommandBatch;
use crate::error::{RebuildError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::{self, OpenOptions};
use std::io::Write;

/// Destination for serialized batches.
#[cfg_attr(test, mockall::automock)]
pub trait ScriptSink {
    /// Append one batch as a single script line.
    ///
    /// # Errors
    ///
    /// Returns an error when the line cannot be written.
    fn serialize(&mut self, batch: &CommandBatch) -> Result<()>;
}

/// Appends batches to an executable script file.
#[derive(Debug, Clone)]
pub struct ScriptWriter {
    path: Utf8PathBuf,
}

impl ScriptWriter {
    /// Reset the script at `path` and make it executable.
    ///
    /// A previous script is deleted first. Failing to delete it or to set the
    /// executable bit is only logged; failing to create the file is fatal.
    ///
    /// # Errors
    ///
    /// Returns [`RebuildError::ScriptSetup`] when the file cannot be created.
    pub fn create(path: &Utf8Path) -> Result<Self> {
        if path.exists() {
            if let Err(e) = fs::remove_file(path) {
                log::warn!("failed to delete last generated script {path}: {e}");
            }
        }

        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|source| RebuildError::ScriptSetup {
                path: path.to_owned(),
                source,
            })?;

        make_executable(path);
        Ok(Self {
            path: path.to_owned(),
        })
    }

    /// Wrap an existing script without resetting it.
    #[must_use]
    pub fn append_to(path: &Utf8Path) -> Self {
        Self {
            path: path.to_owned(),
        }
    }

    /// Path of the script.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl ScriptSink for ScriptWriter {
    fn serialize(&mut self, batch: &CommandBatch) -> Result<()> {
        let write_err = |source| RebuildError::ScriptWrite {
            path: self.path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(write_err)?;
        writeln!(file, "{}", batch.to_script_line()).map_err(write_err)?;
        Ok(())
    }
}

/// Collects script lines in memory.
///
/// Useful for previews and for asserting on generated commands without
/// touching the filesystem.
#[derive(Debug, Clone, Default)]
pub struct ScriptBuffer {
    lines: Vec<String>,
}

impl ScriptBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The serialized lines in write order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The buffered script as file contents, one terminated line per batch.
    #[must_use]
    pub fn contents(&self) -> String {
        self.lines.iter().map(|line| format!("{line}\n")).collect()
    }
}

impl ScriptSink for ScriptBuffer {
    fn serialize(&mut self, batch: &CommandBatch) -> Result<()> {
        self.lines.push(batch.to_script_line());
        Ok(())
    }
}

#[cfg(unix)]
fn make_executable(path: &Utf8Path) {
    use std::os::unix::fs::PermissionsExt;

    let result = fs::metadata(path).and_then(|meta| {
        let mut perms = meta.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms)
    });
    if let Err(e) = result {
        log::warn!("cannot make script {path} executable: {e}");
    }
}

#[cfg(not(unix))]
fn make_executable(_path: &Utf8Path) {}
