//! Core domain types for depvault

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Unique identifier for one deposition (e.g. "D_000123")
///
/// The deposition id is the root key for almost all archive paths: every
/// versioned file lives under a directory named after it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepositionId(pub String);

impl DepositionId {
    /// Create a new DepositionId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DepositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DepositionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DepositionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Semantic category of a content item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    /// Model coordinates
    Model,
    /// Crystallographic structure factors
    StructureFactors,
    /// NMR restraint data
    NmrRestraints,
    /// NMR chemical shift data
    NmrChemicalShifts,
    /// Validation report
    ValidationReport,
    /// Assembly model coordinates
    AssemblyModel,
    /// Chemical component assignment details
    ChemCompAssign,
    /// Processing log
    Log,
}

impl ContentType {
    /// Filename abbreviation used in the naming convention
    pub fn abbrev(&self) -> &'static str {
        match self {
            ContentType::Model => "model",
            ContentType::StructureFactors => "sf",
            ContentType::NmrRestraints => "mr",
            ContentType::NmrChemicalShifts => "cs",
            ContentType::ValidationReport => "val-report",
            ContentType::AssemblyModel => "assembly-model",
            ContentType::ChemCompAssign => "cc-assign",
            ContentType::Log => "log",
        }
    }

    /// Conventional purge class for this content type
    ///
    /// Primary experimental content (models, structure factors, NMR data) is
    /// purged aggressively; reports and derived annotations are only
    /// compressed. This is a convenience default — [`PurgeType`] is always an
    /// explicit parameter to the retention policy.
    pub fn default_purge_type(&self) -> PurgeType {
        match self {
            ContentType::Model
            | ContentType::StructureFactors
            | ContentType::NmrRestraints
            | ContentType::NmrChemicalShifts => PurgeType::Experimental,
            _ => PurgeType::Other,
        }
    }
}

/// File format of a content item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatType {
    /// PDBx/mmCIF
    Pdbx,
    /// Legacy PDB format
    Pdb,
    /// MTZ reflection data
    Mtz,
    /// XML
    Xml,
    /// JSON
    Json,
    /// Plain text
    Txt,
}

impl FormatType {
    /// Filename extension used in the naming convention
    pub fn extension(&self) -> &'static str {
        match self {
            FormatType::Pdbx => "cif",
            FormatType::Pdb => "pdb",
            FormatType::Mtz => "mtz",
            FormatType::Xml => "xml",
            FormatType::Json => "json",
            FormatType::Txt => "txt",
        }
    }
}

/// Storage area a file lives in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileSource {
    /// Long-term versioned archive
    Archive,
    /// Depositor-facing staging area
    Deposit,
    /// Per-session scratch area (unversioned copies)
    Session,
    /// Workflow-instance working storage
    WorkflowInstance,
}

impl fmt::Display for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileSource::Archive => "archive",
            FileSource::Deposit => "deposit",
            FileSource::Session => "session",
            FileSource::WorkflowInstance => "wf-instance",
        };
        write!(f, "{}", s)
    }
}

/// Pipeline-stage tag appended to some file names
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Milestone {
    /// Initial upload checkpoint
    Upload,
    /// Deposition checkpoint
    Deposit,
    /// Annotation checkpoint
    Annotate,
    /// Review checkpoint
    Review,
    /// Release checkpoint
    Release,
}

impl Milestone {
    /// Tag string used in the naming convention
    pub fn tag(&self) -> &'static str {
        match self {
            Milestone::Upload => "upload",
            Milestone::Deposit => "deposit",
            Milestone::Annotate => "annotate",
            Milestone::Review => "review",
            Milestone::Release => "release",
        }
    }
}

/// Partition number disambiguating multiple instances of one content type
///
/// Always positive; defaults to 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionNumber(pub u32);

impl PartitionNumber {
    /// Create a new PartitionNumber
    pub fn new(n: u32) -> Self {
        Self(n)
    }

    /// Get the inner u32 value
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for PartitionNumber {
    fn default() -> Self {
        Self(1)
    }
}

/// Identifies one logical content item in storage
///
/// A FileKey names the item independently of any version: the concrete
/// on-disk file name is produced by the path resolver from the key plus a
/// [`VersionToken`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileKey {
    /// Deposition this item belongs to
    pub deposition_id: DepositionId,
    /// Semantic content category
    pub content_type: ContentType,
    /// File format
    pub format: FormatType,
    /// Storage area
    pub source: FileSource,
    /// Partition number (default 1)
    #[serde(default)]
    pub partition: PartitionNumber,
    /// Optional milestone tag
    #[serde(default)]
    pub milestone: Option<Milestone>,
}

impl FileKey {
    /// Create a key with default partition and no milestone
    pub fn new(
        deposition_id: impl Into<DepositionId>,
        content_type: ContentType,
        format: FormatType,
        source: FileSource,
    ) -> Self {
        Self {
            deposition_id: deposition_id.into(),
            content_type,
            format,
            source,
            partition: PartitionNumber::default(),
            milestone: None,
        }
    }

    /// Set the partition number
    pub fn with_partition(mut self, partition: u32) -> Self {
        self.partition = PartitionNumber::new(partition);
        self
    }

    /// Set the milestone tag
    pub fn with_milestone(mut self, milestone: Milestone) -> Self {
        self.milestone = Some(milestone);
        self
    }

    /// Same key relocated to a different storage area
    pub fn in_source(&self, source: FileSource) -> Self {
        let mut key = self.clone();
        key.source = source;
        key
    }
}

/// Version selector accepted by the path resolver
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VersionToken {
    /// An explicit version number, used as-is
    Number(u32),
    /// The maximum version currently on disk
    Latest,
    /// Latest + 1, or 1 when no versions exist
    Next,
    /// Omit the version suffix entirely (session-local copies)
    None,
}

impl FromStr for VersionToken {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(VersionToken::Latest),
            "next" => Ok(VersionToken::Next),
            "none" => Ok(VersionToken::None),
            other => other
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .map(VersionToken::Number)
                .ok_or_else(|| format!("invalid version token: {}", other)),
        }
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionToken::Number(n) => write!(f, "{}", n),
            VersionToken::Latest => write!(f, "latest"),
            VersionToken::Next => write!(f, "next"),
            VersionToken::None => write!(f, "none"),
        }
    }
}

/// A concrete versioned file found on storage
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedFile {
    /// Version number parsed from the `.V<n>` suffix
    pub version: u32,
    /// Whether the file carries a trailing `.gz` suffix
    pub compressed: bool,
    /// Full path on storage
    pub path: PathBuf,
    /// Last-modified timestamp, when the filesystem reports one
    pub modified: Option<DateTime<Utc>>,
}

/// Policy class governing what happens to intermediate versions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurgeType {
    /// Experimental/primary content: intermediate versions are removed
    /// outright, keeping only the first and latest version
    #[serde(rename = "exp")]
    Experimental,
    /// Reports, logs, derived annotations: intermediate versions are
    /// compressed but kept
    Other,
}

/// Result of the retention policy for one FileKey
///
/// Computed on demand from the live directory listing; never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RetentionDecision {
    /// Maximum version present, or None when the directory has no matches
    pub latest_version: Option<u32>,
    /// Versions to delete outright, ascending
    pub remove: Vec<VersionedFile>,
    /// Versions to compress in place, ascending
    pub compress: Vec<VersionedFile>,
}

impl RetentionDecision {
    /// True when the decision calls for no action
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.compress.is_empty()
    }
}

/// Counters reported after applying a [`RetentionDecision`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Files deleted
    pub removed: usize,
    /// Files compressed in place
    pub compressed: usize,
    /// Files that could not be processed (logged, not fatal)
    pub failed: usize,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_token_parses_keywords_and_numbers() {
        assert_eq!(
            "latest".parse::<VersionToken>().unwrap(),
            VersionToken::Latest
        );
        assert_eq!("next".parse::<VersionToken>().unwrap(), VersionToken::Next);
        assert_eq!("none".parse::<VersionToken>().unwrap(), VersionToken::None);
        assert_eq!("3".parse::<VersionToken>().unwrap(), VersionToken::Number(3));
    }

    #[test]
    fn version_token_rejects_zero_and_garbage() {
        assert!("0".parse::<VersionToken>().is_err());
        assert!("-1".parse::<VersionToken>().is_err());
        assert!("v2".parse::<VersionToken>().is_err());
        assert!("".parse::<VersionToken>().is_err());
    }

    #[test]
    fn version_token_display_round_trips() {
        for token in [
            VersionToken::Latest,
            VersionToken::Next,
            VersionToken::None,
            VersionToken::Number(7),
        ] {
            let parsed: VersionToken = token.to_string().parse().unwrap();
            assert_eq!(parsed, token);
        }
    }

    #[test]
    fn partition_defaults_to_one() {
        assert_eq!(PartitionNumber::default().get(), 1);
        let key = FileKey::new(
            "D_1001",
            ContentType::Model,
            FormatType::Pdbx,
            FileSource::Archive,
        );
        assert_eq!(key.partition.get(), 1);
        assert!(key.milestone.is_none());
    }

    #[test]
    fn file_key_builders() {
        let key = FileKey::new(
            "D_1001",
            ContentType::StructureFactors,
            FormatType::Pdbx,
            FileSource::Archive,
        )
        .with_partition(2)
        .with_milestone(Milestone::Release);

        assert_eq!(key.partition.get(), 2);
        assert_eq!(key.milestone, Some(Milestone::Release));

        let session = key.in_source(FileSource::Session);
        assert_eq!(session.source, FileSource::Session);
        assert_eq!(session.deposition_id, key.deposition_id);
    }

    #[test]
    fn default_purge_type_separates_experimental_content() {
        assert_eq!(
            ContentType::Model.default_purge_type(),
            PurgeType::Experimental
        );
        assert_eq!(
            ContentType::StructureFactors.default_purge_type(),
            PurgeType::Experimental
        );
        assert_eq!(
            ContentType::ValidationReport.default_purge_type(),
            PurgeType::Other
        );
        assert_eq!(ContentType::Log.default_purge_type(), PurgeType::Other);
    }

    #[test]
    fn deposition_id_serde_is_transparent() {
        let id = DepositionId::new("D_000123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"D_000123\"");
        let back: DepositionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn purge_type_serde_uses_exp_tag() {
        assert_eq!(
            serde_json::to_string(&PurgeType::Experimental).unwrap(),
            "\"exp\""
        );
        assert_eq!(
            serde_json::to_string(&PurgeType::Other).unwrap(),
            "\"other\""
        );
    }
}
