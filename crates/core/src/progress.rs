//! Persisted progress ledger.
//!
//! Three JSON maps in the destination stage directory record what has already
//! been done. Presence of a key is the only signal the pipelines use to skip
//! work, so every `record_*` call is read-modify-write against the file on
//! disk and is durable before it returns.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::durable::write_durably;

/// `old asset id -> new asset id`
pub const IMAGE_UPLOAD_MAP: &str = "upload-map-images.json";
/// `lang -> (old document id -> new document id)`
pub const DOCUMENT_UPLOAD_MAP: &str = "upload-map-documents.json";
/// `new document id -> time of the cross-reference update`
pub const DOCUMENT_MIGRATION_MAP: &str = "migration-map-documents.json";

pub type IdMap = BTreeMap<String, String>;
pub type DocumentUploadMap = BTreeMap<String, IdMap>;
pub type MigrationMap = BTreeMap<String, DateTime<Utc>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is not a valid progress map: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize progress map: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The three independent namespaces of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ledger {
    ImageUploads,
    DocumentUploads,
    DocumentMigrations,
}

impl Ledger {
    pub fn file_name(self) -> &'static str {
        match self {
            Ledger::ImageUploads => IMAGE_UPLOAD_MAP,
            Ledger::DocumentUploads => DOCUMENT_UPLOAD_MAP,
            Ledger::DocumentMigrations => DOCUMENT_MIGRATION_MAP,
        }
    }
}

/// File-backed progress ledger rooted at one directory.
///
/// Not safe for use by concurrent processes: two runs against the same
/// directory race and the last writer wins.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    dir: PathBuf,
}

impl ProgressStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, ledger: Ledger) -> PathBuf {
        self.dir.join(ledger.file_name())
    }

    // -- images -----------------------------------------------------------

    pub async fn image_uploads(&self) -> Result<IdMap, StoreError> {
        self.load(Ledger::ImageUploads).await
    }

    pub async fn has_image(&self, source_id: &str) -> Result<bool, StoreError> {
        Ok(self.image_uploads().await?.contains_key(source_id))
    }

    pub async fn record_image(&self, source_id: &str, destination_id: &str) -> Result<(), StoreError> {
        let mut map = self.image_uploads().await?;
        if insert_changed(&mut map, source_id, destination_id.to_string()) {
            self.persist(Ledger::ImageUploads, &map).await?;
        }
        Ok(())
    }

    // -- documents --------------------------------------------------------

    pub async fn document_uploads(&self) -> Result<DocumentUploadMap, StoreError> {
        self.load(Ledger::DocumentUploads).await
    }

    /// All locales flattened into one `old -> new` map.
    pub async fn document_ids(&self) -> Result<IdMap, StoreError> {
        let uploads = self.document_uploads().await?;
        let mut flat = IdMap::new();
        for (lang, ids) in uploads {
            for (source_id, destination_id) in ids {
                if let Some(previous) = flat.get(&source_id) {
                    if *previous != destination_id {
                        tracing::warn!(%lang, %source_id, "document id recorded under several locales with different destination ids");
                    }
                }
                flat.insert(source_id, destination_id);
            }
        }
        Ok(flat)
    }

    pub async fn destination_document_id(&self, lang: &str, source_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .document_uploads()
            .await?
            .get(lang)
            .and_then(|ids| ids.get(source_id))
            .cloned())
    }

    pub async fn has_document(&self, lang: &str, source_id: &str) -> Result<bool, StoreError> {
        Ok(self.destination_document_id(lang, source_id).await?.is_some())
    }

    pub async fn record_document(&self, lang: &str, source_id: &str, destination_id: &str) -> Result<(), StoreError> {
        let mut map = self.document_uploads().await?;
        let ids = map.entry(lang.to_string()).or_default();
        if insert_changed(ids, source_id, destination_id.to_string()) {
            self.persist(Ledger::DocumentUploads, &map).await?;
        }
        Ok(())
    }

    // -- migrations -------------------------------------------------------

    pub async fn migrations(&self) -> Result<MigrationMap, StoreError> {
        self.load(Ledger::DocumentMigrations).await
    }

    pub async fn has_migration(&self, destination_id: &str) -> Result<bool, StoreError> {
        Ok(self.migrations().await?.contains_key(destination_id))
    }

    pub async fn record_migration(&self, destination_id: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut map = self.migrations().await?;
        map.insert(destination_id.to_string(), at);
        self.persist(Ledger::DocumentMigrations, &map).await
    }

    // -- storage ----------------------------------------------------------

    async fn load<T: DeserializeOwned + Default>(&self, ledger: Ledger) -> Result<T, StoreError> {
        let path = self.path(ledger);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        // Hand-created empty files count as empty maps.
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt { path, source })
    }

    async fn persist<T: Serialize>(&self, ledger: Ledger, map: &T) -> Result<(), StoreError> {
        let path = self.path(ledger);
        let mut body = serde_json::to_vec_pretty(map)?;
        body.push(b'\n');
        write_durably(&path, &body)
            .await
            .map_err(|source| StoreError::Write { path, source })
    }
}

fn insert_changed(map: &mut IdMap, key: &str, value: String) -> bool {
    if map.get(key) == Some(&value) {
        return false;
    }
    map.insert(key.to_string(), value);
    true
}
