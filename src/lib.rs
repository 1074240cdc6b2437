//! # depvault
//!
//! Utility library for versioned deposition archives: path resolution,
//! version retention, data exchange between storage areas, batch task
//! dispatch, and external tool invocation.
//!
//! ## Design Philosophy
//!
//! depvault is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding in
//!   pipeline drivers
//! - **Explicitly configured** - An immutable [`SiteConfig`] is constructed
//!   once and injected by reference; there is no global site dictionary
//! - **Failure-tolerant** - Batch-oriented operations report per-item
//!   failures and keep going; nothing here aborts a worklist over one
//!   missing file
//!
//! ## Quick Start
//!
//! ```no_run
//! use depvault::{
//!     ContentType, DataExchange, FileKey, FileSource, FormatType, PurgeType,
//!     RetentionPolicy, SiteConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> depvault::Result<()> {
//!     let config = SiteConfig::default();
//!     config.validate()?;
//!
//!     let key = FileKey::new(
//!         "D_000123",
//!         ContentType::Model,
//!         FormatType::Pdbx,
//!         FileSource::Archive,
//!     );
//!
//!     // Pull the latest archive version into the session area
//!     let exchange = DataExchange::new(&config);
//!     let session_copy = exchange.copy_to_session(&key).await?;
//!     println!("working copy: {}", session_copy.display());
//!
//!     // Report what retention would purge
//!     let policy = RetentionPolicy::new(&config);
//!     let decision = policy.purge_candidates(&key, PurgeType::Experimental);
//!     println!("{} versions to remove", decision.remove.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Site configuration types
pub mod config;
/// Batch task dispatch
pub mod dispatcher;
/// Error types
pub mod error;
/// Data exchange between storage areas
pub mod exchange;
/// Versioned file-path resolution
pub mod resolver;
/// Version retention policy
pub mod retention;
/// External tool invocation
pub mod toolrunner;
/// Core domain types
pub mod types;

// Re-export commonly used types
pub use config::{Deployment, SiteConfig, StorageConfig, ToolsConfig};
pub use dispatcher::{ChunkResult, TaskDispatcher};
pub use error::{DispatchError, Error, ExchangeError, Result};
pub use exchange::DataExchange;
pub use resolver::PathResolver;
pub use retention::RetentionPolicy;
pub use toolrunner::{
    CliToolRunner, NoOpToolRunner, ToolCapabilities, ToolOutcome, ToolRequest, ToolRunner,
};
pub use types::{
    ContentType, DepositionId, FileKey, FileSource, FormatType, Milestone, PartitionNumber,
    PurgeReport, PurgeType, RetentionDecision, VersionToken, VersionedFile,
};
