//! External scientific tool invocation
//!
//! This module provides a trait-based architecture for running the external
//! binaries the annotation pipeline shells out to (map generation,
//! validation, PISA, BLAST, chemical-component assignment). It supports both
//! a CLI-based implementation and a stub implementation for graceful
//! degradation when a site has no tool installation.
//!
//! ## Architecture
//!
//! The core abstraction is the [`ToolRunner`] trait, which defines the
//! interface for one tool invocation. Two implementations are provided:
//!
//! - [`CliToolRunner`]: stages the input, runs the external binary with a
//!   timeout, captures its log, and exports the declared outputs
//! - [`NoOpToolRunner`]: stub implementation when tools are unavailable
//!
//! ## Usage
//!
//! ```no_run
//! use depvault::{CliToolRunner, SiteConfig, ToolRequest, ToolRunner};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SiteConfig::default();
//!     let runner = CliToolRunner::new(&config);
//!
//!     let request = ToolRequest::new("annot-validate", PathBuf::from("D_000123_model_P1.cif"))
//!         .with_arg("--strict")
//!         .with_output("validation.xml", PathBuf::from("/out/validation.xml"));
//!
//!     let outcome = runner.run(&request).await?;
//!     if !outcome.success {
//!         eprintln!("tool failed:\n{}", outcome.log);
//!     }
//!     Ok(())
//! }
//! ```

mod cli;
mod noop;
mod traits;

pub use cli::CliToolRunner;
pub use noop::NoOpToolRunner;
pub use traits::{ToolCapabilities, ToolOutcome, ToolRequest, ToolRunner};
