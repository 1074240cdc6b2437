//! Site configuration types for depvault
//!
//! The configuration is an immutable value constructed once by the embedding
//! application and passed by reference into each component. There is no
//! process-wide configuration singleton: two components built against two
//! different [`SiteConfig`] values never interfere.

use crate::error::{Error, Result};
use crate::types::FileSource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Deployment level of a site installation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Deployment {
    /// Development
    #[default]
    Dev,
    /// Beta / staging
    Beta,
    /// Production
    Prod,
}

/// Storage root directories, one per [`FileSource`]
///
/// Used as a nested sub-config within [`SiteConfig`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the long-term versioned archive (default: "./data/archive")
    #[serde(default = "default_archive_root")]
    pub archive_root: PathBuf,

    /// Root of the depositor staging area (default: "./data/deposit")
    #[serde(default = "default_deposit_root")]
    pub deposit_root: PathBuf,

    /// Root of the per-session scratch area (default: "./data/sessions")
    #[serde(default = "default_session_root")]
    pub session_root: PathBuf,

    /// Root of workflow-instance working storage (default: "./data/workflow")
    #[serde(default = "default_workflow_root")]
    pub workflow_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            archive_root: default_archive_root(),
            deposit_root: default_deposit_root(),
            session_root: default_session_root(),
            workflow_root: default_workflow_root(),
        }
    }
}

/// External tool configuration (binary overrides, timeout)
///
/// Used as a nested sub-config within [`SiteConfig`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Explicit binary paths keyed by operation name (e.g. "annot-validate")
    ///
    /// Operations without an entry fall back to PATH discovery.
    #[serde(default)]
    pub tool_paths: HashMap<String, PathBuf>,

    /// Wall-clock timeout for one external tool invocation (default: 600 s)
    #[serde(default = "default_tool_timeout", with = "duration_secs")]
    pub timeout: Duration,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            tool_paths: HashMap::new(),
            timeout: default_tool_timeout(),
        }
    }
}

/// Site configuration: deployment identity, storage roots, tool paths
///
/// The library consumes exactly two capabilities from the site setup:
/// resolving a storage root for a [`FileSource`] and resolving an external
/// binary for an operation name. Database credentials and the wider site
/// dictionary stay with the embedding application.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site identifier (e.g. "RCSB-WEST")
    #[serde(default)]
    pub site_id: String,

    /// Deployment level
    #[serde(default)]
    pub deployment: Deployment,

    /// Storage roots
    #[serde(default)]
    pub storage: StorageConfig,

    /// External tool settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl SiteConfig {
    /// Storage root directory for a file source
    pub fn storage_root(&self, source: FileSource) -> &Path {
        match source {
            FileSource::Archive => &self.storage.archive_root,
            FileSource::Deposit => &self.storage.deposit_root,
            FileSource::Session => &self.storage.session_root,
            FileSource::WorkflowInstance => &self.storage.workflow_root,
        }
    }

    /// Resolve the binary for an external operation
    ///
    /// Checks the explicit `tool_paths` override first, then falls back to
    /// searching PATH for a binary named after the operation.
    pub fn tool_path(&self, operation: &str) -> Option<PathBuf> {
        if let Some(path) = self.tools.tool_paths.get(operation) {
            return Some(path.clone());
        }
        which::which(operation).ok()
    }

    /// Validate the configuration
    ///
    /// Checks that the storage roots are non-empty and distinct, and that
    /// explicit tool overrides point at absolute paths.
    pub fn validate(&self) -> Result<()> {
        let roots = [
            ("storage.archive_root", &self.storage.archive_root),
            ("storage.deposit_root", &self.storage.deposit_root),
            ("storage.session_root", &self.storage.session_root),
            ("storage.workflow_root", &self.storage.workflow_root),
        ];

        for (key, root) in &roots {
            if root.as_os_str().is_empty() {
                return Err(Error::Config {
                    message: "storage root must not be empty".to_string(),
                    key: Some((*key).to_string()),
                });
            }
        }

        for (i, (key_a, root_a)) in roots.iter().enumerate() {
            for (key_b, root_b) in roots.iter().skip(i + 1) {
                if root_a == root_b {
                    return Err(Error::Config {
                        message: format!("{} and {} point at the same directory", key_a, key_b),
                        key: Some((*key_a).to_string()),
                    });
                }
            }
        }

        for (operation, path) in &self.tools.tool_paths {
            if !path.is_absolute() {
                return Err(Error::Config {
                    message: format!("tool override for '{}' must be an absolute path", operation),
                    key: Some("tools.tool_paths".to_string()),
                });
            }
        }

        if self.tools.timeout.is_zero() {
            return Err(Error::Config {
                message: "tool timeout must be greater than zero".to_string(),
                key: Some("tools.timeout".to_string()),
            });
        }

        Ok(())
    }
}

fn default_archive_root() -> PathBuf {
    PathBuf::from("./data/archive")
}

fn default_deposit_root() -> PathBuf {
    PathBuf::from("./data/deposit")
}

fn default_session_root() -> PathBuf {
    PathBuf::from("./data/sessions")
}

fn default_workflow_root() -> PathBuf {
    PathBuf::from("./data/workflow")
}

fn default_tool_timeout() -> Duration {
    Duration::from_secs(600)
}

/// Serialize/deserialize a Duration as whole seconds
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
