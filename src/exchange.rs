//! Data exchange between archive, deposit, session, and workflow storage
//!
//! Every operation is the same shape: resolve the source path, verify it is
//! readable, copy the bytes (decompressing on the fly when the source is a
//! `.gz` variant and the destination convention expects uncompressed
//! content), and report the destination path.
//!
//! Re-running an operation with the same arguments overwrites the
//! destination deterministically. No partial-write protection is added here:
//! atomicity is whatever the underlying copy primitive provides, and callers
//! that need it must copy to a staging name and rename themselves.

use crate::config::SiteConfig;
use crate::error::{Error, ExchangeError, Result};
use crate::resolver::{GZ_SUFFIX, PathResolver, gz_variant};
use crate::types::{FileKey, FileSource, VersionToken};
use flate2::read::GzDecoder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Copies files between storage areas using the path resolver
///
/// # Examples
///
/// ```no_run
/// use depvault::{ContentType, DataExchange, FileKey, FileSource, FormatType, SiteConfig};
///
/// # async fn example() -> depvault::Result<()> {
/// let config = SiteConfig::default();
/// let exchange = DataExchange::new(&config);
/// let key = FileKey::new("D_000123", ContentType::Model, FormatType::Pdbx, FileSource::Archive);
///
/// // Latest archive version -> unversioned session copy
/// let session_path = exchange.copy_to_session(&key).await?;
/// # Ok(())
/// # }
/// ```
pub struct DataExchange<'a> {
    config: &'a SiteConfig,
}

impl<'a> DataExchange<'a> {
    /// Create an exchange over a site configuration
    pub fn new(config: &'a SiteConfig) -> Self {
        Self { config }
    }

    fn resolver(&self) -> PathResolver<'a> {
        PathResolver::new(self.config)
    }

    /// Locate the readable on-disk file for a key and version token
    ///
    /// Returns the resolved path, falling back to its `.gz` variant when the
    /// uncompressed file is absent. A missing source is [`Error::NotFound`];
    /// nothing is created or modified.
    pub async fn fetch(&self, key: &FileKey, token: VersionToken) -> Result<PathBuf> {
        let path = self.resolver().resolve(key, token)?;
        if tokio::fs::metadata(&path).await.is_ok() {
            return Ok(path);
        }
        let gz = gz_variant(&path);
        if tokio::fs::metadata(&gz).await.is_ok() {
            return Ok(gz);
        }
        Err(Error::NotFound(format!(
            "no readable file at {} (or .gz variant)",
            path.display()
        )))
    }

    /// Copy a local file into storage under a key and version token
    ///
    /// The destination directory is created if needed. A `.gz` source is
    /// decompressed on the fly when the destination name is uncompressed.
    /// Returns the destination path.
    ///
    /// With [`VersionToken::Next`] the version number is resolved and then
    /// written without any reservation step — concurrent exports of the same
    /// key race on the number, so the caller must hold a per-deposition lock.
    pub async fn export(
        &self,
        local: &Path,
        key: &FileKey,
        token: VersionToken,
    ) -> Result<PathBuf> {
        if tokio::fs::metadata(local).await.is_err() {
            warn!(path = %local.display(), "export source missing");
            return Err(ExchangeError::MissingSource {
                path: local.to_path_buf(),
            }
            .into());
        }

        let dest = self.resolver().resolve(key, token)?;
        self.copy_into(local, &dest).await?;
        debug!(
            deposition_id = %key.deposition_id,
            from = %local.display(),
            to = %dest.display(),
            "exported file"
        );
        Ok(dest)
    }

    /// Copy the latest archive-side version to an unversioned session copy
    ///
    /// The session copy never carries a version suffix; a gzipped archive
    /// version is decompressed on the way over.
    pub async fn copy_to_session(&self, key: &FileKey) -> Result<PathBuf> {
        let src = self.fetch(key, VersionToken::Latest).await?;
        let session_key = key.in_source(FileSource::Session);
        let dest = self.resolver().resolve(&session_key, VersionToken::None)?;
        self.copy_into(&src, &dest).await?;
        debug!(
            deposition_id = %key.deposition_id,
            from = %src.display(),
            to = %dest.display(),
            "copied to session"
        );
        Ok(dest)
    }

    /// Copy the unversioned session file back to the archive as the next version
    ///
    /// Subject to the same `Next` race as [`DataExchange::export`].
    pub async fn update_archive_from_session(&self, key: &FileKey) -> Result<PathBuf> {
        let session_key = key.in_source(FileSource::Session);
        let src = self.fetch(&session_key, VersionToken::None).await?;
        let archive_key = key.in_source(FileSource::Archive);
        let dest = self.resolver().resolve(&archive_key, VersionToken::Next)?;
        self.copy_into(&src, &dest).await?;
        debug!(
            deposition_id = %key.deposition_id,
            from = %src.display(),
            to = %dest.display(),
            "updated archive from session"
        );
        Ok(dest)
    }

    /// Copy bytes from `src` to `dest`, creating the destination directory
    ///
    /// Decompresses when the source name ends in `.gz` and the destination
    /// name does not.
    async fn copy_into(&self, src: &Path, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                warn!(path = %parent.display(), error = %e, "cannot create destination directory");
                ExchangeError::UnwritableDestination {
                    path: parent.to_path_buf(),
                    reason: e.to_string(),
                }
            })?;
        }

        let src_is_gz = src.to_string_lossy().ends_with(GZ_SUFFIX);
        let dest_is_gz = dest.to_string_lossy().ends_with(GZ_SUFFIX);

        if src_is_gz && !dest_is_gz {
            decompress_copy(src, dest).await.map_err(|e| {
                warn!(from = %src.display(), to = %dest.display(), error = %e, "decompressing copy failed");
                Error::Exchange(ExchangeError::DecompressFailed {
                    path: src.to_path_buf(),
                    reason: e.to_string(),
                })
            })?;
        } else {
            tokio::fs::copy(src, dest).await.map_err(|e| {
                warn!(from = %src.display(), to = %dest.display(), error = %e, "copy failed");
                Error::Exchange(ExchangeError::CopyFailed {
                    from: src.to_path_buf(),
                    to: dest.to_path_buf(),
                    reason: e.to_string(),
                })
            })?;
        }
        Ok(())
    }
}

/// Decompress a gzip file to `dest`
async fn decompress_copy(src: &Path, dest: &Path) -> std::io::Result<()> {
    let src = src.to_path_buf();
    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let input = std::fs::File::open(&src)?;
        let mut decoder = GzDecoder::new(input);
        let mut output = std::fs::File::create(&dest)?;
        std::io::copy(&mut decoder, &mut output)?;
        Ok(())
    })
    .await
    .map_err(|e| std::io::Error::other(e.to_string()))?
}
