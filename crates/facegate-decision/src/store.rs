use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::embedding::FaceEmbedding;
use crate::error::StoreError;

/// An ordered, read-only list of known faces (an allow or deny list).
///
/// Persisted as a JSON array of number arrays. Empty is valid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnownEmbeddingSet {
    embeddings: Vec<FaceEmbedding>,
}

impl KnownEmbeddingSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set, checking that all members share one dimension.
    pub fn from_embeddings(embeddings: Vec<FaceEmbedding>) -> Result<Self, StoreError> {
        if let Some(first) = embeddings.first() {
            let expected = first.dimension();
            if let Some((index, e)) = embeddings
                .iter()
                .enumerate()
                .find(|(_, e)| e.dimension() != expected)
            {
                return Err(StoreError::DimensionMismatch {
                    index,
                    expected,
                    actual: e.dimension(),
                });
            }
        }
        Ok(Self { embeddings })
    }

    /// Read a list from `path`.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = fs::read(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let values: Vec<Vec<f64>> =
            serde_json::from_slice(&raw).map_err(|source| StoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut embeddings = Vec::with_capacity(values.len());
        for (index, v) in values.into_iter().enumerate() {
            let e = FaceEmbedding::new(v).map_err(|err| StoreError::Parse {
                path: path.to_path_buf(),
                source: serde::de::Error::custom(format!("embedding {index}: {err}")),
            })?;
            embeddings.push(e);
        }
        Self::from_embeddings(embeddings)
    }

    /// Read a list, degrading to an empty one when it cannot be read.
    ///
    /// An empty allow list grants nobody automatically, but an empty deny
    /// list stops blocking anyone: the gate fails open for that list.
    pub fn load_or_empty(path: &Path, label: &str) -> Self {
        match Self::load(path) {
            Ok(set) => {
                info!(list = label, path = %path.display(), count = set.len(), "loaded known faces");
                set
            }
            Err(err) => {
                warn!(
                    list = label,
                    path = %path.display(),
                    error = %err,
                    "known faces unavailable, continuing with an empty list; SECURITY: matching against this list is disabled"
                );
                Self::empty()
            }
        }
    }

    /// Write the list to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec(&self.embeddings).map_err(StoreError::Encode)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, encoded).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Shared dimension of the members, if any.
    pub fn dimension(&self) -> Option<usize> {
        self.embeddings.first().map(FaceEmbedding::dimension)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FaceEmbedding> {
        self.embeddings.iter()
    }
}

impl<'a> IntoIterator for &'a KnownEmbeddingSet {
    type Item = &'a FaceEmbedding;
    type IntoIter = std::slice::Iter<'a, FaceEmbedding>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
