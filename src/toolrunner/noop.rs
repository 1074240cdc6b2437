//! No-op tool runner for graceful degradation

use super::traits::{ToolCapabilities, ToolOutcome, ToolRequest, ToolRunner};
use async_trait::async_trait;

/// No-op tool runner used when external tools are unavailable
///
/// Used when a site has no tool installation (or a test environment does not
/// want one). Every run returns `Error::NotSupported`, which lets a pipeline
/// driver fall through cleanly instead of hunting for binaries that will
/// never exist.
///
/// # Examples
///
/// ```
/// use depvault::{NoOpToolRunner, ToolRequest, ToolRunner};
/// use std::path::PathBuf;
///
/// # #[tokio::main]
/// # async fn main() {
/// let runner = NoOpToolRunner;
/// let request = ToolRequest::new("annot-validate", PathBuf::from("model.cif"));
/// assert!(runner.run(&request).await.is_err());
/// # }
/// ```
pub struct NoOpToolRunner;

#[async_trait]
impl ToolRunner for NoOpToolRunner {
    async fn run(&self, request: &ToolRequest) -> crate::Result<ToolOutcome> {
        Err(crate::Error::NotSupported(format!(
            "operation '{}' requires an external tool installation. \
             Configure tools.tool_paths or ensure the binary is in PATH.",
            request.operation
        )))
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities {
            can_run: false,
            honors_timeout: false,
        }
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
