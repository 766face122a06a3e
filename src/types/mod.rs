use std::fmt;
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use ulid::Ulid;
use zeroize_derive::{Zeroize, ZeroizeOnDrop};

pub mod error;
pub mod marker;
pub mod metrics;
pub mod token;

/// Separates tenant, block and object segments of a path, and denotes "directories" in
/// non-recursive listings.
pub const DELIMITER: char = '/';
pub const DELIMITER_STR: &str = "/";

pub const META_FILENAME: &str = "meta.json";
pub const MARKERS_PATHNAME: &str = "markers";

pub type BlockId = Ulid;

/// The subset of a block's `meta.json` descriptor that the copier cares about.
/// Every other field of the descriptor is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BlockMeta {
    #[serde(rename = "minTime")]
    pub min_time: i64,
    #[serde(rename = "maxTime")]
    pub max_time: i64,
}

impl BlockMeta {
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Covered time range. A descriptor with `maxTime < minTime` is treated as zero-length.
    pub fn duration(&self) -> Duration {
        let millis = self.max_time.saturating_sub(self.min_time).max(0);
        Duration::from_millis(millis as u64)
    }
}

/// Every marker that exists for a single block, folded together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockMarkers {
    pub deletion: bool,
    /// true only if a copy marker names the configured destination bucket.
    pub copied: bool,
}

/// A block as enumerated in the source bucket. Object paths are built from `name`, the
/// listed entry verbatim, while markers are keyed by the parsed `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBlock {
    pub id: BlockId,
    pub name: String,
}

impl SourceBlock {
    /// `<tenant>/<name>`, without a trailing delimiter.
    pub fn prefix(&self, tenant: &str) -> String {
        format!("{tenant}{DELIMITER}{}", self.name)
    }

    pub fn meta_path(&self, tenant: &str) -> String {
        format!("{}{DELIMITER}{META_FILENAME}", self.prefix(tenant))
    }
}

impl From<BlockId> for SourceBlock {
    fn from(id: BlockId) -> Self {
        Self {
            id,
            name: id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoragePath {
    S3 { bucket: String },
    Local(PathBuf),
}

impl StoragePath {
    /// Name under which the bucket is recorded in copy markers.
    /// A local directory is named after its last path component.
    pub fn bucket_name(&self) -> String {
        match self {
            StoragePath::S3 { bucket } => bucket.to_string(),
            StoragePath::Local(path) => path
                .components()
                .next_back()
                .map(|component| component.as_os_str().to_string_lossy().to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfigLocation {
    pub aws_config_file: Option<PathBuf>,
    pub aws_shared_credentials_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum S3Credentials {
    Profile(String),
    Credentials { access_keys: AccessKeys },
    FromEnvironment,
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AccessKeys {
    pub access_key: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Debug for AccessKeys {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut keys = f.debug_struct("AccessKeys");
        let session_token = self
            .session_token
            .as_ref()
            .map_or("None", |_| "** redacted **");
        keys.field("access_key", &self.access_key)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &session_token);
        keys.finish()
    }
}
