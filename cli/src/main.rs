//! `rebuilder` CLI entrypoint.
//!
//! Validates the arguments, writes the rebuild script, and tells the user how
//! to run it. Exit status is 0 on success and 1 on any error; warnings never
//! change it.

use clap::Parser;
use rebuilder::error::Result;
use rebuilder::rebuild::{RebuildSummary, rebuild};
use rebuilder_cli::cli::Cli;
use rebuilder_cli::logging;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    if let Err(err) = logging::init(logging::level_filter(cli.verbosity, cli.quiet)) {
        write_stderr_line(&mut stderr, format!("rebuilder: cannot install logger: {err}"));
    }
    let quiet = cli.quiet;
    let run_result = run(cli);
    let exit_code = exit_code_for_run_result(run_result, quiet, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: Cli) -> Result<RebuildSummary> {
    let plan = cli.into_options()?.validate()?;
    rebuild(&plan)
}

fn exit_code_for_run_result(
    result: Result<RebuildSummary>,
    quiet: bool,
    stderr: &mut dyn Write,
) -> i32 {
    match result {
        Ok(summary) => {
            if !quiet {
                write_stderr_line(stderr, success_message(&summary));
            }
            0
        }
        Err(err) => {
            write_stderr_line(stderr, format!("rebuilder: error: {err}"));
            1
        }
    }
}

fn success_message(summary: &RebuildSummary) -> String {
    let script = &summary.script_path;
    let mut message = format!(
        "Wrote {} step(s) to {script}\nRun `sh {script}` to rebuild",
        summary.batches_written
    );
    match &summary.signed_artifact {
        Some(signed) => message.push_str(&format!("; the signed app will be {signed}")),
        None => message.push_str("; the app will be left unsigned"),
    }
    message.push('.');
    message
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}
