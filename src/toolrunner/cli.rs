//! CLI-based tool runner using site-installed external binaries

use super::traits::{ToolCapabilities, ToolOutcome, ToolRequest, ToolRunner};
use crate::config::SiteConfig;
use crate::error::Error;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs external tools by staging the input, invoking the binary with a
/// timeout, capturing its log, and exporting the declared outputs
///
/// Each invocation gets a private scratch directory under the session root;
/// the input is copied in, the tool runs with the scratch directory as its
/// working directory, and declared outputs are copied out afterwards. The
/// scratch directory is removed on the way out, success or not.
pub struct CliToolRunner {
    scratch_root: PathBuf,
    config: SiteConfig,
}

impl CliToolRunner {
    /// Create a runner over a site configuration
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            scratch_root: config.storage.session_root.join(".tool-scratch"),
            config: config.clone(),
        }
    }

    /// Wall-clock timeout applied to each invocation
    pub fn timeout(&self) -> Duration {
        self.config.tools.timeout
    }

    async fn make_scratch_dir(&self, operation: &str) -> std::io::Result<PathBuf> {
        // Timestamp plus pid keeps concurrent invocations apart
        let tag = format!(
            "{}-{}-{}",
            operation,
            std::process::id(),
            chrono::Utc::now().format("%Y%m%d%H%M%S%f")
        );
        let dir = self.scratch_root.join(tag);
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }
}

#[async_trait]
impl ToolRunner for CliToolRunner {
    async fn run(&self, request: &ToolRequest) -> crate::Result<ToolOutcome> {
        let binary = self.config.tool_path(&request.operation).ok_or_else(|| {
            Error::ExternalTool(format!(
                "no binary for operation '{}': not in tool_paths and not in PATH",
                request.operation
            ))
        })?;

        let scratch = self.make_scratch_dir(&request.operation).await.map_err(|e| {
            Error::ExternalTool(format!("failed to create scratch directory: {}", e))
        })?;

        let outcome = self.run_in_scratch(request, &binary, &scratch).await;

        // Best-effort scratch cleanup; the outcome stands either way
        if let Err(e) = tokio::fs::remove_dir_all(&scratch).await {
            warn!(scratch = %scratch.display(), error = %e, "failed to remove scratch directory");
        }
        outcome
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities {
            can_run: true,
            honors_timeout: true,
        }
    }

    fn name(&self) -> &'static str {
        "cli"
    }
}

impl CliToolRunner {
    async fn run_in_scratch(
        &self,
        request: &ToolRequest,
        binary: &std::path::Path,
        scratch: &std::path::Path,
    ) -> crate::Result<ToolOutcome> {
        // Stage the input under its own file name
        let staged_name = request
            .input
            .file_name()
            .ok_or_else(|| {
                Error::ExternalTool(format!(
                    "input path {} has no file name",
                    request.input.display()
                ))
            })?
            .to_os_string();
        tokio::fs::copy(&request.input, scratch.join(&staged_name))
            .await
            .map_err(|e| {
                Error::ExternalTool(format!(
                    "failed to stage input {}: {}",
                    request.input.display(),
                    e
                ))
            })?;

        debug!(
            operation = %request.operation,
            binary = %binary.display(),
            scratch = %scratch.display(),
            "invoking external tool"
        );

        let child = Command::new(binary)
            .arg(&staged_name)
            .args(&request.args)
            .current_dir(scratch)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::ExternalTool(format!("failed to execute {}: {}", binary.display(), e))
            })?;

        let limit = self.config.tools.timeout;
        let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(output) => output.map_err(|e| {
                Error::ExternalTool(format!("failed to collect tool output: {}", e))
            })?,
            Err(_) => {
                warn!(operation = %request.operation, ?limit, "external tool timed out");
                return Ok(ToolOutcome {
                    success: false,
                    exit_code: None,
                    log: format!("operation '{}' timed out after {:?}", request.operation, limit),
                    exported: Vec::new(),
                });
            }
        };

        let mut log = String::new();
        log.push_str(&String::from_utf8_lossy(&output.stdout));
        log.push_str(&String::from_utf8_lossy(&output.stderr));

        let mut success = output.status.success();
        let mut exported = Vec::new();
        if success {
            for (name, destination) in &request.outputs {
                let produced = scratch.join(name);
                if tokio::fs::metadata(&produced).await.is_err() {
                    log.push_str(&format!("\ndeclared output '{}' was not produced", name));
                    success = false;
                    continue;
                }
                if let Some(parent) = destination.parent() {
                    if let Err(e) = tokio::fs::create_dir_all(parent).await {
                        log.push_str(&format!(
                            "\nfailed to create export directory {}: {}",
                            parent.display(),
                            e
                        ));
                        success = false;
                        continue;
                    }
                }
                match tokio::fs::copy(&produced, destination).await {
                    Ok(_) => exported.push(destination.clone()),
                    Err(e) => {
                        log.push_str(&format!(
                            "\nfailed to export '{}' to {}: {}",
                            name,
                            destination.display(),
                            e
                        ));
                        success = false;
                    }
                }
            }
        }

        debug!(
            operation = %request.operation,
            success,
            exit_code = ?output.status.code(),
            exported = exported.len(),
            "external tool finished"
        );

        Ok(ToolOutcome {
            success,
            exit_code: output.status.code(),
            log,
            exported,
        })
    }
}
