//! Versioned file-path resolution
//!
//! Computes concrete file names and paths for a [`FileKey`] following the
//! archive naming convention:
//!
//! ```text
//! <depositionId>_<contentTypeAbbrev>[_<milestone>]_P<partitionNumber>.<formatExtension>[.V<versionNumber>]
//! ```
//!
//! Absence of the `.V<N>` suffix is the convention for session-local copies
//! ([`VersionToken::None`]). Compressed variants carry an additional `.gz`
//! suffix appended after the version suffix.
//!
//! Resolution is strictly read-only: no directory is ever created here, and
//! `next` resolution does not reserve the version number it hands out.

use crate::config::SiteConfig;
use crate::error::{Error, Result};
use crate::types::{FileKey, VersionToken, VersionedFile};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Suffix marking a gzip-compressed variant
pub(crate) const GZ_SUFFIX: &str = ".gz";

/// Read-only path computation for versioned archive files
///
/// # Examples
///
/// ```no_run
/// use depvault::{ContentType, FileKey, FileSource, FormatType, PathResolver, SiteConfig, VersionToken};
///
/// let config = SiteConfig::default();
/// let resolver = PathResolver::new(&config);
/// let key = FileKey::new("D_000123", ContentType::Model, FormatType::Pdbx, FileSource::Archive);
///
/// // "<archive_root>/D_000123/D_000123_model_P1.cif.V1" if version 1 exists
/// let path = resolver.resolve(&key, VersionToken::Latest)?;
/// # Ok::<(), depvault::Error>(())
/// ```
pub struct PathResolver<'a> {
    config: &'a SiteConfig,
}

impl<'a> PathResolver<'a> {
    /// Create a resolver over a site configuration
    pub fn new(config: &'a SiteConfig) -> Self {
        Self { config }
    }

    /// Directory holding all files of this key: `<storage root>/<deposition id>`
    pub fn directory_for(&self, key: &FileKey) -> PathBuf {
        self.config
            .storage_root(key.source)
            .join(key.deposition_id.as_str())
    }

    /// Version-independent base name, e.g. `D_000123_model_P1.cif`
    pub fn base_name(&self, key: &FileKey) -> String {
        match key.milestone {
            Some(milestone) => format!(
                "{}_{}_{}_P{}.{}",
                key.deposition_id,
                key.content_type.abbrev(),
                milestone.tag(),
                key.partition.get(),
                key.format.extension()
            ),
            None => format!(
                "{}_{}_P{}.{}",
                key.deposition_id,
                key.content_type.abbrev(),
                key.partition.get(),
                key.format.extension()
            ),
        }
    }

    /// File name for an explicit version, or the unversioned name for `None`
    pub fn file_name(&self, key: &FileKey, version: Option<u32>) -> String {
        match version {
            Some(n) => format!("{}.V{}", self.base_name(key), n),
            None => self.base_name(key),
        }
    }

    /// Resolve the concrete path for a key and version token
    ///
    /// - `Number(n)` — the `.V<n>` path; [`Error::NotFound`] unless the file
    ///   (or its `.gz` variant) exists.
    /// - `Latest` — the highest version on disk; [`Error::NotFound`] when the
    ///   directory has no matches or cannot be read.
    /// - `Next` — latest + 1, or 1 when no versions exist; no existence
    ///   requirement. The returned path is not reserved: two processes
    ///   resolving `Next` for the same key concurrently will collide, so the
    ///   caller must hold a per-deposition lock around resolve-then-write.
    /// - `None` — the unversioned path (session-local copies); no existence
    ///   requirement.
    pub fn resolve(&self, key: &FileKey, token: VersionToken) -> Result<PathBuf> {
        let dir = self.directory_for(key);
        match token {
            VersionToken::None => Ok(dir.join(self.base_name(key))),
            VersionToken::Number(n) => {
                let path = dir.join(self.file_name(key, Some(n)));
                let gz = gz_variant(&path);
                if path.exists() || gz.exists() {
                    Ok(path)
                } else {
                    Err(Error::NotFound(format!(
                        "no version {} for {} in {}",
                        n,
                        self.base_name(key),
                        dir.display()
                    )))
                }
            }
            VersionToken::Latest => {
                let versions = self.list_versions(key)?;
                match versions.last() {
                    Some(latest) => Ok(dir.join(self.file_name(key, Some(latest.version)))),
                    None => Err(Error::NotFound(format!(
                        "no versions of {} in {}",
                        self.base_name(key),
                        dir.display()
                    ))),
                }
            }
            VersionToken::Next => {
                let next = match self.list_versions(key) {
                    Ok(versions) => versions.last().map(|v| v.version + 1).unwrap_or(1),
                    // Unreadable directory: treat as empty, the caller creates it
                    Err(Error::NotFound(_)) => 1,
                    Err(e) => return Err(e),
                };
                Ok(dir.join(self.file_name(key, Some(next))))
            }
        }
    }

    /// Latest version number on disk for this key, if any
    pub fn latest_version(&self, key: &FileKey) -> Result<Option<u32>> {
        Ok(self.list_versions(key)?.last().map(|v| v.version))
    }

    /// Enumerate every on-disk version of this key, ascending by version
    ///
    /// Both uncompressed and `.gz`-compressed variants are reported; gaps in
    /// the version sequence are tolerated. A missing deposition directory
    /// yields an empty list; any other listing failure is an I/O error.
    pub fn list_versions(&self, key: &FileKey) -> Result<Vec<VersionedFile>> {
        let dir = self.directory_for(key);
        let base = self.base_name(key);

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(directory = %dir.display(), "deposition directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let mut versions: Vec<VersionedFile> = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some((version, compressed)) = parse_version_suffix(name, &base) else {
                continue;
            };
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .map(DateTime::<Utc>::from);
            versions.push(VersionedFile {
                version,
                compressed,
                path: entry.path(),
                modified,
            });
        }

        versions.sort_by_key(|v| v.version);
        // An uncompressed file shadows a stale .gz twin of the same version
        versions.dedup_by(|b, a| a.version == b.version && {
            if a.compressed && !b.compressed {
                std::mem::swap(a, b);
            }
            true
        });
        Ok(versions)
    }
}

/// Parse `<base>.V<n>[.gz]` into (version, compressed)
fn parse_version_suffix(name: &str, base: &str) -> Option<(u32, bool)> {
    let rest = name.strip_prefix(base)?;
    let rest = rest.strip_prefix(".V")?;
    let (digits, compressed) = match rest.strip_suffix(GZ_SUFFIX) {
        Some(digits) => (digits, true),
        None => (rest, false),
    };
    let version: u32 = digits.parse().ok().filter(|n| *n > 0)?;
    Some((version, compressed))
}

/// The `.gz` sibling of a path
pub(crate) fn gz_variant(path: &std::path::Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(GZ_SUFFIX);
    PathBuf::from(os)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentType, FileSource, FormatType, Milestone};
    use tempfile::TempDir;

    fn test_config(root: &std::path::Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.storage.archive_root = root.join("archive");
        config.storage.deposit_root = root.join("deposit");
        config.storage.session_root = root.join("sessions");
        config.storage.workflow_root = root.join("workflow");
        config
    }

    fn model_key() -> FileKey {
        FileKey::new(
            "D_1001",
            ContentType::Model,
            FormatType::Pdbx,
            FileSource::Archive,
        )
    }

    fn touch_version(config: &SiteConfig, key: &FileKey, version: u32, compressed: bool) {
        let resolver = PathResolver::new(config);
        let dir = resolver.directory_for(key);
        std::fs::create_dir_all(&dir).unwrap();
        let mut name = resolver.file_name(key, Some(version));
        if compressed {
            name.push_str(GZ_SUFFIX);
        }
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn base_name_follows_convention() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let resolver = PathResolver::new(&config);

        assert_eq!(resolver.base_name(&model_key()), "D_1001_model_P1.cif");

        let with_milestone = model_key()
            .with_partition(2)
            .with_milestone(Milestone::Release);
        assert_eq!(
            resolver.base_name(&with_milestone),
            "D_1001_model_release_P2.cif"
        );
    }

    #[test]
    fn file_name_appends_version_suffix() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let resolver = PathResolver::new(&config);

        assert_eq!(
            resolver.file_name(&model_key(), Some(3)),
            "D_1001_model_P1.cif.V3"
        );
        assert_eq!(resolver.file_name(&model_key(), None), "D_1001_model_P1.cif");
    }

    #[test]
    fn resolve_none_needs_no_file() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let resolver = PathResolver::new(&config);
        let key = model_key().in_source(FileSource::Session);

        let path = resolver.resolve(&key, VersionToken::None).unwrap();
        assert!(path.ends_with("D_1001/D_1001_model_P1.cif"));
    }

    #[test]
    fn resolve_explicit_version_requires_existence() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let key = model_key();
        touch_version(&config, &key, 2, false);

        let resolver = PathResolver::new(&config);
        assert!(resolver.resolve(&key, VersionToken::Number(2)).is_ok());
        let err = resolver.resolve(&key, VersionToken::Number(5)).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn resolve_explicit_version_accepts_gz_variant() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let key = model_key();
        touch_version(&config, &key, 4, true);

        let resolver = PathResolver::new(&config);
        // Resolves to the canonical uncompressed name; callers fall back to .gz
        let path = resolver.resolve(&key, VersionToken::Number(4)).unwrap();
        assert!(path.to_string_lossy().ends_with("D_1001_model_P1.cif.V4"));
    }

    #[test]
    fn resolve_latest_takes_maximum_version() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let key = model_key();
        for v in [1, 3, 7] {
            touch_version(&config, &key, v, false);
        }

        let resolver = PathResolver::new(&config);
        let path = resolver.resolve(&key, VersionToken::Latest).unwrap();
        assert!(path.to_string_lossy().ends_with(".V7"));
        assert_eq!(resolver.latest_version(&key).unwrap(), Some(7));
    }

    #[test]
    fn resolve_latest_with_no_versions_is_not_found() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let resolver = PathResolver::new(&config);

        let err = resolver
            .resolve(&model_key(), VersionToken::Latest)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn resolve_next_starts_at_one() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let resolver = PathResolver::new(&config);

        let path = resolver.resolve(&model_key(), VersionToken::Next).unwrap();
        assert!(path.to_string_lossy().ends_with(".V1"));
    }

    #[test]
    fn next_then_create_then_latest_round_trips() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let key = model_key();
        touch_version(&config, &key, 1, false);
        touch_version(&config, &key, 2, false);

        let resolver = PathResolver::new(&config);
        let next = resolver.resolve(&key, VersionToken::Next).unwrap();
        assert!(next.to_string_lossy().ends_with(".V3"));

        std::fs::write(&next, b"v3").unwrap();
        let latest = resolver.resolve(&key, VersionToken::Latest).unwrap();
        assert_eq!(latest, next, "latest after creating next must be the same path");
    }

    #[test]
    fn list_versions_reports_compression_and_tolerates_gaps() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let key = model_key();
        touch_version(&config, &key, 1, false);
        touch_version(&config, &key, 2, true);
        touch_version(&config, &key, 5, false);

        let resolver = PathResolver::new(&config);
        let versions = resolver.list_versions(&key).unwrap();
        assert_eq!(
            versions.iter().map(|v| v.version).collect::<Vec<_>>(),
            vec![1, 2, 5]
        );
        assert!(!versions[0].compressed);
        assert!(versions[1].compressed);
        assert!(versions[1].path.to_string_lossy().ends_with(".V2.gz"));
        assert!(versions.iter().all(|v| v.modified.is_some()));
    }

    #[test]
    fn list_versions_ignores_other_keys_and_junk() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let key = model_key();
        touch_version(&config, &key, 1, false);

        let resolver = PathResolver::new(&config);
        let dir = resolver.directory_for(&key);
        // Same deposition, different content type / partition / format
        std::fs::write(dir.join("D_1001_sf_P1.cif.V1"), b"x").unwrap();
        std::fs::write(dir.join("D_1001_model_P2.cif.V1"), b"x").unwrap();
        std::fs::write(dir.join("D_1001_model_P1.cif"), b"x").unwrap();
        std::fs::write(dir.join("D_1001_model_P1.cif.V0"), b"x").unwrap();
        std::fs::write(dir.join("D_1001_model_P1.cif.Vabc"), b"x").unwrap();

        let versions = resolver.list_versions(&key).unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].version, 1);
    }

    #[test]
    fn list_versions_prefers_uncompressed_over_stale_gz_twin() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let key = model_key();
        touch_version(&config, &key, 2, true);
        touch_version(&config, &key, 2, false);

        let resolver = PathResolver::new(&config);
        let versions = resolver.list_versions(&key).unwrap();
        assert_eq!(versions.len(), 1, "one entry per version number");
        assert!(
            !versions[0].compressed,
            "the uncompressed file wins over its .gz twin"
        );
    }

    #[test]
    fn list_versions_on_missing_directory_is_empty() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let resolver = PathResolver::new(&config);
        assert!(resolver.list_versions(&model_key()).unwrap().is_empty());
    }

    #[test]
    fn parse_version_suffix_cases() {
        let base = "D_1001_model_P1.cif";
        assert_eq!(
            parse_version_suffix("D_1001_model_P1.cif.V3", base),
            Some((3, false))
        );
        assert_eq!(
            parse_version_suffix("D_1001_model_P1.cif.V12.gz", base),
            Some((12, true))
        );
        assert_eq!(parse_version_suffix("D_1001_model_P1.cif", base), None);
        assert_eq!(parse_version_suffix("D_1001_model_P1.cif.gz", base), None);
        assert_eq!(parse_version_suffix("D_1001_model_P1.cif.V", base), None);
        assert_eq!(parse_version_suffix("D_1001_model_P10.cif.V3", base), None);
    }
}
