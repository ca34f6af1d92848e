//! Stage-by-stage construction of the rebuild script.
//!
//! [`PipelineBuilder`] owns the batches of one run. Every stage call appends
//! exactly one [`CommandBatch`] (signing appends one per request, plus a
//! backup batch for in-place requests) and returns the builder for chaining.
//! Nothing is executed: [`PipelineBuilder::flush`] hands the accumulated
//! batches to a [`ScriptSink`] in request order and empties the builder.
//!
//! The intended order is recompile, inject, sign, install, clean. Clean
//! deletes everything under the build directory, so it belongs last.

use crate::batch::{CommandBatch, echo, shell_quote};
use crate::context::BuildContext;
use crate::error::{RebuildError, Result};
use crate::script::ScriptSink;
use crate::signer::{Credentials, SigningRequest, build_backup_batch, build_sign_batch};
use crate::tools::Tools;
use camino::{Utf8Path, Utf8PathBuf};

/// Extension of assembled bytecode files.
pub const BYTECODE_EXTENSION: &str = "dex";

/// Bytecode name used when a source directory has no usable base name.
const DEFAULT_BYTECODE_STEM: &str = "classes";

/// Where the install stage sends the artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallTarget {
    /// The only running emulator (`-e`).
    Emulator,
    /// The only attached USB device (`-d`).
    #[default]
    Device,
}

impl InstallTarget {
    /// Flag passed to the install tool.
    #[must_use]
    pub const fn flag(self) -> &'static str {
        match self {
            Self::Emulator => "-e",
            Self::Device => "-d",
        }
    }
}

/// Accumulates the command batches of one rebuild run.
#[derive(Debug)]
pub struct PipelineBuilder<'a> {
    context: &'a BuildContext,
    tools: &'a Tools,
    batches: Vec<CommandBatch>,
    secrets: Vec<String>,
}

impl<'a> PipelineBuilder<'a> {
    /// Create an empty pipeline for `context`.
    #[must_use]
    pub fn new(context: &'a BuildContext, tools: &'a Tools) -> Self {
        Self {
            context,
            tools,
            batches: Vec::new(),
            secrets: Vec::new(),
        }
    }

    /// Assemble each source directory and merge the result into the unsigned
    /// archive.
    ///
    /// Every directory contributes two commands: the assembler run, which
    /// writes `{build_dir}/{dir_name}.dex`, and an uncompressed, path-flattening
    /// archive update.
    ///
    /// # Errors
    ///
    /// Returns [`RebuildError::MissingInput`] when any directory does not
    /// exist. Nothing is appended in that case.
    pub fn recompile(&mut self, source_dirs: &[Utf8PathBuf]) -> Result<&mut Self> {
        if let Some(missing) = source_dirs.iter().find(|dir| !dir.exists()) {
            return Err(RebuildError::MissingInput {
                what: "source directory",
                path: missing.clone(),
            });
        }

        let unsigned = shell_quote(self.context.unsigned_artifact().as_str());
        let mut commands = Vec::with_capacity(source_dirs.len() * 2);
        for dir in source_dirs {
            let output = self.bytecode_output(dir);
            let output_name = output.file_name().unwrap_or(output.as_str());
            let dir_name = dir.file_name().unwrap_or(dir.as_str());
            commands.push(format!(
                "{} && {} a {} -o {}",
                echo(&format!("smali {dir_name} -> {output_name}...")),
                self.tools.assembler,
                shell_quote(dir.as_str()),
                shell_quote(output.as_str())
            ));
            commands.push(format!(
                "{} -0 -u -j {unsigned} {}",
                self.tools.archiver,
                shell_quote(output.as_str())
            ));
        }

        log::info!("queued recompile of {} director(ies)", source_dirs.len());
        Ok(self.push(commands))
    }

    /// Add or overwrite files at the archive root.
    ///
    /// All files of one call form a single batch.
    pub fn inject_files(&mut self, files: &[Utf8PathBuf]) -> &mut Self {
        let unsigned = shell_quote(self.context.unsigned_artifact().as_str());
        let mut commands = Vec::with_capacity(files.len() * 2);
        for file in files {
            commands.push(echo(&format!("adding {file}...")));
            commands.push(format!(
                "{} -0 -u -j -q {unsigned} {}",
                self.tools.archiver,
                shell_quote(file.as_str())
            ));
        }

        log::info!("queued injection of {} file(s)", files.len());
        self.push(commands)
    }

    /// Append the signing batches for each request, in order.
    ///
    /// In-place requests are preceded by their own backup batch that moves
    /// the artifact to its `.bak` sibling.
    pub fn sign(&mut self, requests: &[SigningRequest]) -> &mut Self {
        for request in requests {
            let new_secret = request
                .credentials()
                .password()
                .filter(|password| !self.secrets.iter().any(|known| known == password));
            if let Some(password) = new_secret {
                self.secrets.push(password.to_owned());
            }
            if let Some(artifact) = request.backup_of() {
                self.batches.push(build_backup_batch(artifact));
            }
            self.batches.push(build_sign_batch(self.tools, request));
            log::info!("queued signing of {}", request.signed());
        }
        self
    }

    /// Sign the unsigned working copy into the signed output path.
    pub fn sign_original(&mut self, credentials: &Credentials) -> &mut Self {
        let request = self.original_request(credentials);
        self.sign(&[request])
    }

    /// Sign the working copy and then every companion in place.
    pub fn sign_all(&mut self, credentials: &Credentials, companions: &[Utf8PathBuf]) -> &mut Self {
        let mut requests = Vec::with_capacity(companions.len() + 1);
        requests.push(self.original_request(credentials));
        requests.extend(
            companions
                .iter()
                .map(|companion| SigningRequest::in_place(credentials.clone(), companion.clone())),
        );
        self.sign(&requests)
    }

    /// Install the signed artifact together with its companions.
    pub fn install(&mut self, target: InstallTarget, companions: &[Utf8PathBuf]) -> &mut Self {
        let mut command = format!(
            "{} {} install-multiple -r {}",
            self.tools.installer,
            target.flag(),
            shell_quote(self.context.signed_artifact().as_str())
        );
        for companion in companions {
            command.push(' ');
            command.push_str(&shell_quote(companion.as_str()));
        }

        log::info!("queued install with {} companion(s)", companions.len());
        self.push(vec![command])
    }

    /// Remove everything under the build directory.
    pub fn clean(&mut self) -> &mut Self {
        let commands = vec![
            echo("cleaning build dir..."),
            format!("rm -rf {}/*", shell_quote(self.context.build_dir().as_str())),
        ];
        log::info!("queued clean of {}", self.context.build_dir());
        self.push(commands)
    }

    /// Batches accumulated since the last flush.
    #[must_use]
    pub fn batches(&self) -> &[CommandBatch] {
        &self.batches
    }

    /// Number of batches accumulated since the last flush.
    #[must_use]
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Whether no batch is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Serialize every pending batch in order, then clear them.
    ///
    /// Returns the number of batches written. Each batch is also logged at
    /// debug level with keystore passwords masked.
    ///
    /// # Errors
    ///
    /// Propagates the first sink failure; pending batches are kept in that
    /// case.
    pub fn flush(&mut self, sink: &mut dyn ScriptSink) -> Result<usize> {
        for batch in &self.batches {
            log::debug!("{}", redact(&batch.to_script_line(), &self.secrets));
            sink.serialize(batch)?;
        }
        let written = self.batches.len();
        self.batches.clear();
        Ok(written)
    }

    fn push(&mut self, commands: Vec<String>) -> &mut Self {
        self.batches.push(CommandBatch::new(commands));
        self
    }

    fn original_request(&self, credentials: &Credentials) -> SigningRequest {
        SigningRequest::new(
            credentials.clone(),
            self.context.unsigned_artifact().to_owned(),
            self.context.signed_artifact().to_owned(),
        )
    }

    fn bytecode_output(&self, dir: &Utf8Path) -> Utf8PathBuf {
        let stem = dir
            .file_name()
            .map(str::to_owned)
            .or_else(|| absolute_file_name(dir))
            .unwrap_or_else(|| DEFAULT_BYTECODE_STEM.to_owned());
        self.context
            .build_dir()
            .join(format!("{stem}.{BYTECODE_EXTENSION}"))
    }
}

/// Mask every piped password in a script line.
fn redact(line: &str, secrets: &[String]) -> String {
    secrets.iter().fold(line.to_owned(), |masked, secret| {
        masked.replace(
            &format!("echo {} |", shell_quote(secret)),
            "echo <redacted> |",
        )
    })
}

fn absolute_file_name(dir: &Utf8Path) -> Option<String> {
    let absolute = std::path::absolute(dir).ok()?;
    absolute
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
