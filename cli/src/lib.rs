//! Command-line front end for the rebuilder script compiler.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`logging`] - Standard-error logging backend

pub mod cli;
pub mod logging;
