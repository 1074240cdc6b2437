//! Version retention policy for archived files
//!
//! Given the versions of one logical file actually present on storage, the
//! policy decides which intermediate versions to delete outright and which to
//! compress in place. Two invariants hold for every decision:
//!
//! - version 1 is never purged (it is the historical baseline), and
//! - the latest version is never purged.
//!
//! Everything strictly between those two is a candidate. The
//! [`PurgeType`] knob selects what happens to candidates: experimental
//! content (models, structure factors) is large and is removed, keeping only
//! the first and last version; reports and derived annotations are cheap and
//! are merely compressed.
//!
//! Computing a decision is a read-only reporting operation; applying one is a
//! separate, explicit step.

use crate::error::Result;
use crate::resolver::{GZ_SUFFIX, PathResolver};
use crate::types::{FileKey, PurgeReport, PurgeType, RetentionDecision, VersionedFile};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Retention policy over a [`PathResolver`]
pub struct RetentionPolicy<'a> {
    resolver: PathResolver<'a>,
}

impl<'a> RetentionPolicy<'a> {
    /// Create a policy over a site configuration
    pub fn new(config: &'a crate::config::SiteConfig) -> Self {
        Self {
            resolver: PathResolver::new(config),
        }
    }

    /// Compute the purge decision for one key
    ///
    /// Enumerates the versions on disk and partitions the intermediates
    /// according to `purge_type`. Zero or one version present yields an empty
    /// decision; gaps in the version sequence are tolerated (the policy
    /// operates on whatever versions exist, not on an assumed contiguous
    /// range).
    ///
    /// An unlistable directory yields an empty decision with
    /// `latest_version == None` and a warn-level log — this is a reporting
    /// utility, so the caller decides whether to escalate.
    pub fn purge_candidates(&self, key: &FileKey, purge_type: PurgeType) -> RetentionDecision {
        let versions = match self.resolver.list_versions(key) {
            Ok(versions) => versions,
            Err(e) => {
                warn!(
                    deposition_id = %key.deposition_id,
                    error = %e,
                    "could not list versions, returning empty decision"
                );
                return RetentionDecision::default();
            }
        };

        let Some(latest) = versions.last().map(|v| v.version) else {
            return RetentionDecision::default();
        };

        let mut decision = RetentionDecision {
            latest_version: Some(latest),
            ..RetentionDecision::default()
        };

        for file in versions {
            // First and latest versions are always kept as-is
            if file.version == 1 || file.version == latest {
                continue;
            }
            match purge_type {
                // Intermediates of primary content are removed outright,
                // compressed or not
                PurgeType::Experimental => decision.remove.push(file),
                // Intermediates of derived content are kept but compressed
                PurgeType::Other => {
                    if !file.compressed {
                        decision.compress.push(file);
                    }
                }
            }
        }

        debug!(
            deposition_id = %key.deposition_id,
            latest,
            remove = decision.remove.len(),
            compress = decision.compress.len(),
            "computed purge decision"
        );
        decision
    }

    /// Apply a purge decision: delete the remove list, gzip the compress list
    ///
    /// Per-file failures are logged at warn level and counted in the report;
    /// they never abort the rest of the batch. Compression writes the `.gz`
    /// sibling first and removes the original only after the write succeeds.
    pub async fn apply(&self, key: &FileKey, decision: &RetentionDecision) -> PurgeReport {
        let mut report = PurgeReport::default();

        for file in &decision.remove {
            match tokio::fs::remove_file(&file.path).await {
                Ok(()) => {
                    debug!(
                        deposition_id = %key.deposition_id,
                        version = file.version,
                        path = %file.path.display(),
                        "removed intermediate version"
                    );
                    report.removed += 1;
                }
                Err(e) => {
                    warn!(
                        deposition_id = %key.deposition_id,
                        version = file.version,
                        path = %file.path.display(),
                        error = %e,
                        "failed to remove intermediate version"
                    );
                    report.failed += 1;
                }
            }
        }

        for file in &decision.compress {
            match compress_in_place(&file.path).await {
                Ok(gz_path) => {
                    debug!(
                        deposition_id = %key.deposition_id,
                        version = file.version,
                        path = %gz_path.display(),
                        "compressed intermediate version"
                    );
                    report.compressed += 1;
                }
                Err(e) => {
                    warn!(
                        deposition_id = %key.deposition_id,
                        version = file.version,
                        path = %file.path.display(),
                        error = %e,
                        "failed to compress intermediate version"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            deposition_id = %key.deposition_id,
            removed = report.removed,
            compressed = report.compressed,
            failed = report.failed,
            "purge complete"
        );
        report
    }

    /// Enumerate every on-disk version of this key, ascending
    pub fn list_versions(&self, key: &FileKey) -> Result<Vec<VersionedFile>> {
        self.resolver.list_versions(key)
    }
}

/// Gzip a file to `<path>.gz` and remove the original on success
async fn compress_in_place(path: &Path) -> std::io::Result<PathBuf> {
    let src = path.to_path_buf();
    let gz_path = tokio::task::spawn_blocking(move || -> std::io::Result<PathBuf> {
        let mut os = src.as_os_str().to_os_string();
        os.push(GZ_SUFFIX);
        let gz_path = PathBuf::from(os);

        let mut input = std::fs::File::open(&src)?;
        let output = std::fs::File::create(&gz_path)?;
        let mut encoder = GzEncoder::new(output, Compression::default());
        std::io::copy(&mut input, &mut encoder)?;
        encoder.finish()?;
        std::fs::remove_file(&src)?;
        Ok(gz_path)
    })
    .await
    .map_err(|e| std::io::Error::other(e.to_string()))??;
    Ok(gz_path)
}
