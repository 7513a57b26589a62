//! Documents and the sources they are loaded from.
//!
//! A corpus is a fixed list of [`CorpusEntry`] values. The identifier is what
//! retrieval reports; the path is where the text lives, and the two need not
//! match.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// One document of a corpus: identifier plus relative path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusEntry {
    /// Unique identifier reported by retrieval.
    pub id: String,
    /// Path of the text file, relative to the documents directory.
    pub path: String,
}

impl CorpusEntry {
    /// Create an entry.
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }
}

/// A loaded document. Immutable for the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    /// Unique identifier.
    pub id: String,
    /// Raw text.
    pub text: String,
}

/// Errors from loading documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Reading the backing file failed.
    #[error("failed to read document '{id}' from {}: {source}", .path.display())]
    Io {
        /// Document identifier.
        id: String,
        /// Resolved path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The source has no text for this identifier.
    #[error("document '{id}' not found")]
    NotFound {
        /// Document identifier.
        id: String,
    },
}

/// Result alias for document operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Where document text comes from.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Load the raw text of one corpus entry.
    async fn load_text(&self, entry: &CorpusEntry) -> Result<String>;

    /// Load a full [`Document`] (default: wraps `load_text`).
    async fn load(&self, entry: &CorpusEntry) -> Result<Document> {
        let text = self.load_text(entry).await?;
        Ok(Document {
            id: entry.id.clone(),
            text,
        })
    }
}

/// Reads plain-text files below a root directory.
#[derive(Clone, Debug)]
pub struct FsDocumentSource {
    root: PathBuf,
}

impl FsDocumentSource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the on-disk path of an entry.
    pub fn resolve(&self, entry: &CorpusEntry) -> PathBuf {
        self.root.join(&entry.path)
    }
}

#[async_trait]
impl DocumentSource for FsDocumentSource {
    async fn load_text(&self, entry: &CorpusEntry) -> Result<String> {
        let path = self.resolve(entry);
        debug!(id = %entry.id, path = %path.display(), "loading document");
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DocumentError::NotFound {
                id: entry.id.clone(),
            }),
            Err(source) => Err(DocumentError::Io {
                id: entry.id.clone(),
                path,
                source,
            }),
        }
    }
}

/// In-memory document texts keyed by identifier.
#[derive(Clone, Debug, Default)]
pub struct StaticDocumentSource {
    texts: HashMap<String, String>,
}

impl StaticDocumentSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the text for `id`.
    #[must_use]
    pub fn with(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        let _ = self.texts.insert(id.into(), text.into());
        self
    }
}

#[async_trait]
impl DocumentSource for StaticDocumentSource {
    async fn load_text(&self, entry: &CorpusEntry) -> Result<String> {
        self.texts
            .get(&entry.id)
            .cloned()
            .ok_or_else(|| DocumentError::NotFound {
                id: entry.id.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fs_source_reads_by_path_not_id() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("loan_policy.txt"), "Max loan NGN2,000,000").unwrap();

        let source = FsDocumentSource::new(dir.path());
        let entry = CorpusEntry::new("loan_terms.txt", "loan_policy.txt");
        let doc = source.load(&entry).await.unwrap();
        assert_eq!(doc.id, "loan_terms.txt");
        assert_eq!(doc.text, "Max loan NGN2,000,000");
    }

    #[tokio::test]
    async fn fs_source_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsDocumentSource::new(dir.path());
        let err = source
            .load_text(&CorpusEntry::new("faq.txt", "faq.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::NotFound { ref id } if id == "faq.txt"));
        assert_eq!(err.to_string(), "document 'faq.txt' not found");
    }

    #[tokio::test]
    async fn fs_source_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        let source = FsDocumentSource::new(dir.path());
        let err = source
            .load_text(&CorpusEntry::new("nested", "nested"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Io { .. }));
        assert!(err.to_string().contains("document 'nested'"));
    }

    #[test]
    fn resolve_joins_root() {
        let source = FsDocumentSource::new("/srv/docs");
        let path = source.resolve(&CorpusEntry::new("a", "b.txt"));
        assert_eq!(path, PathBuf::from("/srv/docs/b.txt"));
        assert_eq!(source.root(), Path::new("/srv/docs"));
    }

    #[tokio::test]
    async fn static_source_serves_by_id() {
        let source = StaticDocumentSource::new().with("faq.txt", "Reset in app settings");
        let entry = CorpusEntry::new("faq.txt", "ignored.txt");
        assert_eq!(source.load_text(&entry).await.unwrap(), "Reset in app settings");

        let missing = CorpusEntry::new("other.txt", "other.txt");
        assert!(matches!(
            source.load_text(&missing).await,
            Err(DocumentError::NotFound { .. })
        ));
    }

    #[test]
    fn corpus_entry_serde_camel_case() {
        let entry: CorpusEntry =
            serde_json::from_str(r#"{"id":"faq.txt","path":"docs/faq.txt"}"#).unwrap();
        assert_eq!(entry, CorpusEntry::new("faq.txt", "docs/faq.txt"));
    }
}
