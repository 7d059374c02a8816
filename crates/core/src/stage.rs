//! Local stage layout.
//!
//! ```text
//! {root}/{source}/clone-manifest.json
//! {root}/{source}/assets/{id}/{id}.json
//! {root}/{source}/assets/{id}/{filename}
//! {root}/{source}/custom-types/{id}.json
//! {root}/{source}/documents/{lang}/{id}.json
//! {root}/{destination}/documents/{lang}/{id}.json
//! {root}/{destination}/upload-map-*.json, migration-map-documents.json
//! ```

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::asset::Asset;
use crate::custom_type::CustomType;
use crate::document::validate::{validate_document, ValidationError};
use crate::document::Document;
use crate::durable::write_durably;
use crate::progress::ProgressStore;

pub const CLONE_MANIFEST: &str = "clone-manifest.json";
const ASSETS_DIR: &str = "assets";
const CUSTOM_TYPES_DIR: &str = "custom-types";
const DOCUMENTS_DIR: &str = "documents";

#[derive(Debug, Error)]
pub enum StageError {
    #[error("source repository `{repository}` has not been cloned ({path} is missing)")]
    NotCloned { repository: String, path: PathBuf },

    #[error("`{0}` cannot be used as a stage path segment")]
    UnsafeName(String),

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

    #[error("{path} is not valid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
}

/// What the clone phase staged, in source listing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloneManifest {
    pub master_ref: String,
    pub languages: Vec<String>,
    pub assets: Vec<String>,
    pub custom_types: Vec<String>,
    pub documents: BTreeMap<String, Vec<String>>,
}

impl CloneManifest {
    pub fn document_count(&self) -> usize {
        self.documents.values().map(Vec::len).sum()
    }
}

/// Stage directories of one source/destination pair.
#[derive(Debug, Clone)]
pub struct Stage {
    source_repository: String,
    source: PathBuf,
    destination: PathBuf,
}

impl Stage {
    pub fn new(root: impl AsRef<Path>, source_repository: &str, destination_repository: &str) -> Result<Self, StageError> {
        let root = root.as_ref();
        Ok(Self {
            source_repository: source_repository.to_string(),
            source: root.join(segment(source_repository)?),
            destination: root.join(segment(destination_repository)?),
        })
    }

    pub fn source_dir(&self) -> &Path {
        &self.source
    }

    pub fn destination_dir(&self) -> &Path {
        &self.destination
    }

    /// Progress ledger kept next to the destination stage.
    pub fn progress_store(&self) -> ProgressStore {
        ProgressStore::new(&self.destination)
    }

    // -- manifest ---------------------------------------------------------

    pub async fn save_manifest(&self, manifest: &CloneManifest) -> Result<(), StageError> {
        write_json(&self.source.join(CLONE_MANIFEST), manifest).await
    }

    pub async fn load_manifest(&self) -> Result<CloneManifest, StageError> {
        let path = self.source.join(CLONE_MANIFEST);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StageError::NotCloned {
                repository: self.source_repository.clone(),
                path,
            });
        }
        read_json(&path).await
    }

    // -- assets -----------------------------------------------------------

    fn asset_dir(&self, id: &str) -> Result<PathBuf, StageError> {
        Ok(self.source.join(ASSETS_DIR).join(segment(id)?))
    }

    pub async fn save_asset(&self, asset: &Asset) -> Result<(), StageError> {
        let path = self.asset_dir(&asset.id)?.join(asset.metadata_file_name());
        write_json(&path, asset).await
    }

    pub async fn load_asset(&self, id: &str) -> Result<Asset, StageError> {
        read_json(&self.asset_dir(id)?.join(format!("{id}.json"))).await
    }

    pub fn asset_binary_path(&self, asset: &Asset) -> Result<PathBuf, StageError> {
        Ok(self.asset_dir(&asset.id)?.join(asset.staged_file_name()))
    }

    pub async fn save_asset_binary(&self, asset: &Asset, bytes: &[u8]) -> Result<(), StageError> {
        write_bytes(&self.asset_binary_path(asset)?, bytes).await
    }

    pub async fn load_asset_binary(&self, asset: &Asset) -> Result<Vec<u8>, StageError> {
        let path = self.asset_binary_path(asset)?;
        tokio::fs::read(&path)
            .await
            .map_err(|source| StageError::Read { path, source })
    }

    /// Whether both metadata and binary are already on disk.
    pub async fn has_asset(&self, asset: &Asset) -> Result<bool, StageError> {
        let metadata = self.asset_dir(&asset.id)?.join(asset.metadata_file_name());
        let binary = self.asset_binary_path(asset)?;
        Ok(exists(&metadata).await && exists(&binary).await)
    }

    // -- custom types -----------------------------------------------------

    pub async fn save_custom_type(&self, custom_type: &CustomType) -> Result<(), StageError> {
        let path = self.custom_type_path(&custom_type.id)?;
        write_json(&path, custom_type).await
    }

    pub async fn load_custom_type(&self, id: &str) -> Result<CustomType, StageError> {
        read_json(&self.custom_type_path(id)?).await
    }

    fn custom_type_path(&self, id: &str) -> Result<PathBuf, StageError> {
        Ok(self.source.join(CUSTOM_TYPES_DIR).join(format!("{}.json", segment(id)?)))
    }

    // -- documents --------------------------------------------------------

    pub async fn save_source_document(&self, document: &Document) -> Result<(), StageError> {
        let path = document_path(&self.source, &document.lang, &document.id)?;
        write_json(&path, document).await
    }

    pub async fn load_source_document(&self, lang: &str, id: &str) -> Result<Document, StageError> {
        read_document(&document_path(&self.source, lang, id)?).await
    }

    /// Stage the body sent to the destination, keyed by the source id.
    pub async fn save_destination_document(&self, lang: &str, source_id: &str, document: &Document) -> Result<(), StageError> {
        write_json(&document_path(&self.destination, lang, source_id)?, document).await
    }

    pub async fn load_destination_document(&self, lang: &str, source_id: &str) -> Result<Document, StageError> {
        read_document(&document_path(&self.destination, lang, source_id)?).await
    }
}

/// Reject ids that would escape their directory.
fn segment(name: &str) -> Result<&str, StageError> {
    let unsafe_name = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if unsafe_name {
        return Err(StageError::UnsafeName(name.to_string()));
    }
    Ok(name)
}

fn document_path(base: &Path, lang: &str, id: &str) -> Result<PathBuf, StageError> {
    Ok(base
        .join(DOCUMENTS_DIR)
        .join(segment(lang)?)
        .join(format!("{}.json", segment(id)?)))
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

async fn read_document(path: &Path) -> Result<Document, StageError> {
    let raw: Value = read_json(path).await?;
    validate_document(&raw).map_err(|source| StageError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    Document::from_value(raw).map_err(|source| StageError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StageError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| StageError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| StageError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StageError> {
    let mut body = serde_json::to_vec_pretty(value).map_err(|source| StageError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    body.push(b'\n');
    write_bytes(path, &body).await
}

async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), StageError> {
    write_durably(path, bytes).await.map_err(|source| StageError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn stage(root: &Path) -> Stage {
        Stage::new(root, "src-repo", "dst-repo").unwrap()
    }

    fn asset() -> Asset {
        serde_json::from_value(json!({
            "id": "a1",
            "filename": "photo.jpg",
            "url": "https://images.prismic.io/src-repo/a1_photo.jpg"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn asset_metadata_and_binary_share_a_directory() {
        let dir = tempdir().unwrap();
        let stage = stage(dir.path());
        let asset = asset();

        assert!(!stage.has_asset(&asset).await.unwrap());
        stage.save_asset(&asset).await.unwrap();
        assert!(!stage.has_asset(&asset).await.unwrap());
        stage.save_asset_binary(&asset, b"jpeg").await.unwrap();
        assert!(stage.has_asset(&asset).await.unwrap());

        let asset_dir = dir.path().join("src-repo/assets/a1");
        assert!(asset_dir.join("a1.json").exists());
        assert!(asset_dir.join("photo.jpg").exists());
        assert_eq!(stage.load_asset("a1").await.unwrap(), asset);
        assert_eq!(stage.load_asset_binary(&asset).await.unwrap(), b"jpeg");
    }

    #[tokio::test]
    async fn documents_are_staged_per_locale() {
        let dir = tempdir().unwrap();
        let stage = stage(dir.path());
        let doc = Document::from_value(json!({"id": "d2", "lang": "fr-fr", "data": {"title": "Bonjour"}})).unwrap();

        stage.save_source_document(&doc).await.unwrap();
        assert!(dir.path().join("src-repo/documents/fr-fr/d2.json").exists());
        assert_eq!(stage.load_source_document("fr-fr", "d2").await.unwrap(), doc);

        stage.save_destination_document("fr-fr", "d2", &doc).await.unwrap();
        assert!(dir.path().join("dst-repo/documents/fr-fr/d2.json").exists());
        assert_eq!(stage.load_destination_document("fr-fr", "d2").await.unwrap(), doc);
    }

    #[tokio::test]
    async fn interrupted_overwrite_keeps_the_previous_destination_body() {
        let dir = tempdir().unwrap();
        let stage = stage(dir.path());
        let first = Document::from_value(json!({"id": "d1", "lang": "en-us", "data": {"hero": {"id": "N-a1"}}})).unwrap();
        stage.save_destination_document("en-us", "d1", &first).await.unwrap();

        // A write killed halfway only ever touches the temp file.
        let path = dir.path().join("dst-repo/documents/en-us/d1.json");
        std::fs::write(crate::durable::temp_path(&path), br#"{"id": "d1", "la"#).unwrap();
        assert_eq!(stage.load_destination_document("en-us", "d1").await.unwrap(), first);

        let mut second = first.clone();
        second.alternate_language_id = Some("N-d0".into());
        stage.save_destination_document("en-us", "d1", &second).await.unwrap();
        assert_eq!(stage.load_destination_document("en-us", "d1").await.unwrap(), second);
        assert!(!crate::durable::temp_path(&path).exists());
    }

    #[tokio::test]
    async fn invalid_staged_document_is_rejected() {
        let dir = tempdir().unwrap();
        let stage = stage(dir.path());
        let path = dir.path().join("src-repo/documents/en-us/d1.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"id": "d1", "lang": ""}"#).unwrap();

        let err = stage.load_source_document("en-us", "d1").await.unwrap_err();
        assert!(matches!(err, StageError::Invalid { source: ValidationError::EmptyLang, .. }));
    }

    #[tokio::test]
    async fn missing_manifest_means_not_cloned() {
        let dir = tempdir().unwrap();
        let stage = stage(dir.path());
        let err = stage.load_manifest().await.unwrap_err();
        assert!(matches!(err, StageError::NotCloned { ref repository, .. } if repository == "src-repo"));

        let manifest = CloneManifest {
            master_ref: "Ym9".into(),
            languages: vec!["en-us".into()],
            assets: vec!["a1".into()],
            custom_types: vec![],
            documents: BTreeMap::from([("en-us".to_string(), vec!["d1".to_string(), "d0".to_string()])]),
        };
        stage.save_manifest(&manifest).await.unwrap();
        let loaded = stage.load_manifest().await.unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.document_count(), 2);
    }

    #[test]
    fn rejects_path_escaping_names() {
        assert!(Stage::new("/tmp", "..", "dst").is_err());
        let stage = Stage::new("/tmp", "src", "dst").unwrap();
        assert!(matches!(stage.asset_dir("../x"), Err(StageError::UnsafeName(_))));
        assert!(stage.asset_dir("a1").is_ok());
    }
}
