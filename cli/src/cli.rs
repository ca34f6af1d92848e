//! CLI argument definitions for `rebuilder`.
//!
//! Arguments map one-to-one onto [`BuildOptions`]; all validation beyond what
//! clap can express happens in the core library.

use camino::Utf8PathBuf;
use clap::Parser;
use rebuilder::error::Result;
use rebuilder::plan::BuildOptions;
use rebuilder::tools::Tools;

/// Compile the steps of rebuilding an app archive into a shell script.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "rebuilder")]
#[command(version, about)]
#[command(long_about = concat!(
    "Compile the steps of rebuilding an app archive into a shell script.\n\n",
    "Nothing is assembled, aligned, signed or installed by this command. It ",
    "copies the original archive into the build directory and writes ",
    "<BUILD_DIR>/run, a script whose lines chain the external tools with && so ",
    "that each stage stops at its first failure.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Reassemble one directory and sign the result:\n",
    "    $ rebuilder -o app.apk -s smali -k debug.jks\n\n",
    "  Add a file, sign, and install on the emulator with a split:\n",
    "    $ rebuilder -o app.apk -f extra.json -k debug.jks -w split.apk --install-on-emulator\n\n",
    "Run the generated script with `sh build/run`.",
))]
pub struct Cli {
    /// Archive to rebuild.
    #[arg(short, long, value_name = "APP")]
    pub original_app: Utf8PathBuf,

    /// Bytecode directory to assemble and merge (can be repeated).
    #[arg(short, long = "smali-dir", value_name = "DIR")]
    pub smali_dirs: Vec<Utf8PathBuf>,

    /// File to add at the archive root (can be repeated).
    #[arg(short = 'f', long = "addition-file", value_name = "FILE")]
    pub addition_files: Vec<Utf8PathBuf>,

    /// Directory for generated artifacts and the script.
    #[arg(short, long, value_name = "DIR", default_value = "build")]
    pub build_dir: Utf8PathBuf,

    /// Directory holding the sources; must differ from the build directory.
    #[arg(short = 'c', long, value_name = "DIR", default_value = ".")]
    pub source_dir: Utf8PathBuf,

    /// Override the app name derived from the original archive.
    #[arg(short = 'n', long, value_name = "NAME")]
    pub app_name: Option<String>,

    /// Keystore used for signing.
    #[arg(short = 'k', long = "keystore-path", value_name = "PATH")]
    pub keystore: Option<Utf8PathBuf>,

    /// Keystore password, piped to the signer.
    #[arg(short = 'p', long, value_name = "PASSWORD")]
    pub keystore_password: Option<String>,

    /// Leave the rebuilt archive unsigned.
    #[arg(long)]
    pub no_sign: bool,

    /// Keep the build directory contents after the script runs.
    #[arg(long = "no-clean")]
    pub keep_build_files: bool,

    /// Install the signed archive on the attached USB device.
    #[arg(short, long)]
    pub install: bool,

    /// Also sign every companion archive in place, keeping APP.bak.
    #[arg(long)]
    pub sign_all: bool,

    /// Companion archive installed alongside the rebuilt one (can be repeated).
    #[arg(short = 'w', long = "install-with", value_name = "APP")]
    pub companions: Vec<Utf8PathBuf>,

    /// Install on the running emulator instead; implies --install.
    #[arg(long)]
    pub install_on_emulator: bool,

    /// Toolchain configuration file [default: <SOURCE_DIR>/rebuilder.toml].
    #[arg(short, long, value_name = "FILE")]
    pub tools: Option<Utf8PathBuf>,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only report errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            original_app: Utf8PathBuf::new(),
            smali_dirs: Vec::new(),
            addition_files: Vec::new(),
            build_dir: Utf8PathBuf::from("build"),
            source_dir: Utf8PathBuf::from("."),
            app_name: None,
            keystore: None,
            keystore_password: None,
            no_sign: false,
            keep_build_files: false,
            install: false,
            sign_all: false,
            companions: Vec::new(),
            install_on_emulator: false,
            tools: None,
            verbosity: 0,
            quiet: false,
        }
    }
}

impl Cli {
    /// Translate the arguments into core build options.
    ///
    /// # Errors
    ///
    /// Returns an error when the tools file cannot be found or parsed.
    pub fn into_options(self) -> Result<BuildOptions> {
        let tools = Tools::discover(self.tools.as_deref(), &self.source_dir)?;
        Ok(BuildOptions {
            original_app: self.original_app,
            build_dir: self.build_dir,
            source_dir: self.source_dir,
            app_name: self.app_name,
            smali_dirs: self.smali_dirs,
            extra_files: self.addition_files,
            keystore: self.keystore,
            keystore_password: self.keystore_password,
            no_sign: self.no_sign,
            keep_build_files: self.keep_build_files,
            install: self.install,
            sign_all: self.sign_all,
            companions: self.companions,
            install_on_emulator: self.install_on_emulator,
            tools,
        })
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
