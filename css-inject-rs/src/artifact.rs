//! In-memory model of a bundler's output.
//!
//! An [`ArtifactSet`] maps artifact names to [`Artifact`]s and preserves
//! insertion order, which is the enumeration order every later stage relies
//! on. The serialized form mirrors the shape bundlers hand to output plugins:
//!
//! ```json
//! {
//!   "index.html": {"type": "asset", "fileName": "index.html", "source": "<html>..."},
//!   "assets/index.js": {"type": "chunk", "fileName": "assets/index.js", "code": "..."}
//! }
//! ```

use std::borrow::Cow;
use std::str::Utf8Error;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CssInjectError, Result};

/// Contents of an asset: text for stylesheets and documents, raw bytes for
/// everything else (images, fonts, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetSource {
    Text(String),
    Bytes(Vec<u8>),
}

impl AssetSource {
    /// Borrow the source as text, decoding bytes as UTF-8.
    pub fn text(&self) -> Result<Cow<'_, str>, Utf8Error> {
        match self {
            AssetSource::Text(s) => Ok(Cow::Borrowed(s.as_str())),
            AssetSource::Bytes(b) => std::str::from_utf8(b).map(Cow::Borrowed),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            AssetSource::Text(s) => s.as_bytes(),
            AssetSource::Bytes(b) => b,
        }
    }
}

impl From<String> for AssetSource {
    fn from(s: String) -> Self {
        AssetSource::Text(s)
    }
}

impl From<&str> for AssetSource {
    fn from(s: &str) -> Self {
        AssetSource::Text(s.to_string())
    }
}

impl From<Vec<u8>> for AssetSource {
    fn from(b: Vec<u8>) -> Self {
        AssetSource::Bytes(b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Asset,
    Chunk,
}

/// One named output of a build.
///
/// Fields this crate does not interpret (`isEntry`, `imports`, ...) are kept
/// in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Artifact {
    Asset {
        #[serde(rename = "fileName")]
        file_name: String,
        source: AssetSource,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    Chunk {
        #[serde(rename = "fileName")]
        file_name: String,
        code: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl Artifact {
    pub fn asset(file_name: impl Into<String>, source: impl Into<AssetSource>) -> Self {
        Artifact::Asset {
            file_name: file_name.into(),
            source: source.into(),
            extra: Map::new(),
        }
    }

    pub fn chunk(file_name: impl Into<String>, code: impl Into<String>) -> Self {
        Artifact::Chunk {
            file_name: file_name.into(),
            code: code.into(),
            extra: Map::new(),
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            Artifact::Asset { file_name, .. } | Artifact::Chunk { file_name, .. } => file_name,
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::Asset { .. } => ArtifactKind::Asset,
            Artifact::Chunk { .. } => ArtifactKind::Chunk,
        }
    }

    /// File contents as bytes, whichever variant this is.
    pub fn contents(&self) -> &[u8] {
        match self {
            Artifact::Asset { source, .. } => source.as_bytes(),
            Artifact::Chunk { code, .. } => code.as_bytes(),
        }
    }
}

/// Ordered mapping from artifact name to artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactSet {
    artifacts: IndexMap<String, Artifact>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON manifest in the bundler output shape.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(CssInjectError::Manifest)
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.map_err(CssInjectError::Manifest)
    }

    /// Insert an artifact, returning the one it replaced. A replaced entry
    /// keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, artifact: Artifact) -> Option<Artifact> {
        self.artifacts.insert(name.into(), artifact)
    }

    pub fn get(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Artifact> {
        self.artifacts.get_mut(name)
    }

    /// Remove an artifact without disturbing the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<Artifact> {
        self.artifacts.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.artifacts.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Artifact)> {
        self.artifacts.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl FromIterator<(String, Artifact)> for ArtifactSet {
    fn from_iter<I: IntoIterator<Item = (String, Artifact)>>(iter: I) -> Self {
        Self {
            artifacts: iter.into_iter().collect(),
        }
    }
}
