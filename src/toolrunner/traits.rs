//! Traits and types for external tool invocation

use async_trait::async_trait;
use std::path::PathBuf;

/// One requested tool invocation
///
/// Names the operation (which doubles as the binary name unless the site
/// configuration overrides it), the input file to stage, extra arguments,
/// and the output files the tool is expected to produce in its scratch
/// directory along with where to export them.
#[derive(Debug, Clone)]
pub struct ToolRequest {
    /// Operation name, e.g. "annot-validate" or "cc-assign"
    pub operation: String,
    /// Input file staged into the scratch directory before the run
    pub input: PathBuf,
    /// Extra command-line arguments, appended after the staged input
    pub args: Vec<String>,
    /// Expected outputs: scratch-relative file name and export destination
    pub outputs: Vec<(String, PathBuf)>,
}

impl ToolRequest {
    /// Create a request for an operation on one input file
    pub fn new(operation: impl Into<String>, input: PathBuf) -> Self {
        Self {
            operation: operation.into(),
            input,
            args: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Append a command-line argument
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Declare an expected output file and where to export it
    pub fn with_output(mut self, name: impl Into<String>, destination: PathBuf) -> Self {
        self.outputs.push((name.into(), destination));
        self
    }
}

/// Result of one tool invocation
///
/// A tool that ran but exited non-zero, timed out, or failed to produce a
/// declared output is reported here with `success == false` and the captured
/// log — never as an error. Pipeline drivers decide per step whether a tool
/// failure is fatal.
#[must_use]
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    /// Whether the tool exited zero and every declared output was exported
    pub success: bool,
    /// Exit code, when the process ran to completion
    pub exit_code: Option<i32>,
    /// Combined stdout and stderr, plus runner diagnostics
    pub log: String,
    /// Destinations of the outputs that were actually exported
    pub exported: Vec<PathBuf>,
}

/// Capabilities of a tool runner implementation
#[derive(Debug, Clone, Copy)]
pub struct ToolCapabilities {
    /// Can execute external binaries
    pub can_run: bool,
    /// Enforces the configured invocation timeout
    pub honors_timeout: bool,
}

/// Trait for running external scientific tools
///
/// Implementations can shell out to site-installed binaries or provide stub
/// functionality for graceful degradation.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run one tool invocation
    ///
    /// # Returns
    ///
    /// `Ok(ToolOutcome)` whenever the invocation could be attempted, with
    /// `success` reflecting the tool's own result. `Err` is reserved for the
    /// runner itself failing: no binary for the operation, an unstageable
    /// input, or a spawn error.
    async fn run(&self, request: &ToolRequest) -> crate::Result<ToolOutcome>;

    /// Get the capabilities of this implementation
    fn capabilities(&self) -> ToolCapabilities;

    /// Get a human-readable name for this implementation
    fn name(&self) -> &'static str;
}
