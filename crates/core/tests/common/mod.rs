#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use prismic_migrate_core::asset::{Asset, AssetUpload};
use prismic_migrate_core::custom_type::CustomType;
use prismic_migrate_core::document::Document;
use prismic_migrate_core::events::EventBus;
use prismic_migrate_core::remote::{DestinationRepository, SearchPage, SearchQuery, SourceRepository, UpstreamError};
use prismic_migrate_core::repository::RepositoryMeta;
use prismic_migrate_core::stage::Stage;
use prismic_migrate_core::{MigrationContext, PipelineSettings};
use serde_json::{json, Value};

pub fn asset(id: &str, filename: &str) -> Asset {
    serde_json::from_value(json!({
        "id": id,
        "filename": filename,
        "url": format!("https://images.prismic.io/source/{id}_{filename}"),
        "alt": format!("alt {id}")
    }))
    .unwrap()
}

pub fn document(raw: Value) -> Document {
    Document::from_value(raw).unwrap()
}

pub fn custom_type(id: &str, label: &str) -> CustomType {
    serde_json::from_value(json!({"id": id, "label": label, "json": {"Main": {}}})).unwrap()
}

// -- source ---------------------------------------------------------------

pub struct FakeSource {
    pub languages: Vec<&'static str>,
    pub assets: Vec<Asset>,
    pub custom_types: Vec<CustomType>,
    pub documents: Vec<Document>,
    pub downloads: Mutex<Vec<String>>,
    pub searches: Mutex<Vec<SearchQuery>>,
}

impl FakeSource {
    pub fn new(languages: Vec<&'static str>) -> Self {
        Self {
            languages,
            assets: vec![],
            custom_types: vec![],
            documents: vec![],
            downloads: Mutex::new(vec![]),
            searches: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl SourceRepository for FakeSource {
    async fn repository_meta(&self) -> Result<RepositoryMeta, UpstreamError> {
        let languages: Vec<Value> = self.languages.iter().map(|id| json!({"id": id})).collect();
        Ok(serde_json::from_value(json!({
            "refs": [{"id": "master", "ref": "MASTER-REF", "isMasterRef": true}],
            "languages": languages
        }))
        .unwrap())
    }

    async fn search_documents(&self, query: &SearchQuery) -> Result<SearchPage, UpstreamError> {
        self.searches.lock().unwrap().push(query.clone());
        let matching: Vec<Document> = self.documents.iter().filter(|d| d.lang == query.lang).cloned().collect();
        let size = query.page_size as usize;
        let total_pages = matching.len().div_ceil(size).max(1) as u32;
        let start = (query.page as usize - 1) * size;
        let results = matching.into_iter().skip(start).take(size).collect();
        Ok(SearchPage {
            results,
            page: query.page,
            total_pages,
        })
    }

    async fn list_assets(&self, reference: &str, limit: u32) -> Result<Vec<Asset>, UpstreamError> {
        assert_eq!(reference, "MASTER-REF");
        Ok(self.assets.iter().take(limit as usize).cloned().collect())
    }

    async fn download_asset(&self, asset: &Asset) -> Result<Vec<u8>, UpstreamError> {
        self.downloads.lock().unwrap().push(asset.id.clone());
        Ok(format!("bytes of {}", asset.id).into_bytes())
    }

    async fn list_custom_types(&self, _reference: &str) -> Result<Vec<CustomType>, UpstreamError> {
        Ok(self.custom_types.clone())
    }
}

// -- destination ----------------------------------------------------------

#[derive(Default)]
pub struct DestinationState {
    pub assets: Vec<AssetUpload>,
    pub custom_types: BTreeMap<String, CustomType>,
    pub inserted_custom_types: Vec<String>,
    pub created: Vec<Document>,
    pub updated: Vec<(String, Document)>,
    /// Asset file names whose upload fails.
    pub failing_assets: HashSet<String>,
    /// Source document ids whose create call fails.
    pub failing_documents: HashSet<String>,
    /// Asset file name whose upload aborts the process.
    pub crash_on_asset: Option<String>,
}

#[derive(Default)]
pub struct FakeDestination {
    pub state: Mutex<DestinationState>,
}

impl FakeDestination {
    pub fn with(configure: impl FnOnce(&mut DestinationState)) -> Self {
        let dest = Self::default();
        configure(&mut dest.state.lock().unwrap());
        dest
    }

    pub fn uploaded_asset_names(&self) -> Vec<String> {
        self.state.lock().unwrap().assets.iter().map(|a| a.file_name.clone()).collect()
    }

    pub fn created_ids(&self) -> Vec<String> {
        self.state.lock().unwrap().created.iter().map(|d| d.id.clone()).collect()
    }

    pub fn created(&self, source_id: &str) -> Document {
        let state = self.state.lock().unwrap();
        state.created.iter().find(|d| d.id == source_id).cloned().unwrap()
    }

    pub fn updated(&self, destination_id: &str) -> Document {
        let state = self.state.lock().unwrap();
        state
            .updated
            .iter()
            .find(|(id, _)| id == destination_id)
            .map(|(_, d)| d.clone())
            .unwrap()
    }
}

fn rejected(operation: &'static str) -> UpstreamError {
    UpstreamError::Status {
        operation,
        status: 500,
        body: "rejected".into(),
    }
}

#[async_trait]
impl DestinationRepository for FakeDestination {
    async fn upload_asset(&self, upload: AssetUpload) -> Result<String, UpstreamError> {
        let mut state = self.state.lock().unwrap();
        if state.crash_on_asset.as_deref() == Some(upload.file_name.as_str()) {
            drop(state);
            panic!("process killed while uploading {}", upload.file_name);
        }
        if state.failing_assets.contains(&upload.file_name) {
            return Err(rejected("uploadAsset"));
        }
        let id = format!("new-{}", upload.file_name);
        state.assets.push(upload);
        Ok(id)
    }

    async fn custom_type_exists(&self, id: &str) -> Result<bool, UpstreamError> {
        Ok(self.state.lock().unwrap().custom_types.contains_key(id))
    }

    async fn insert_custom_type(&self, custom_type: &CustomType) -> Result<(), UpstreamError> {
        let mut state = self.state.lock().unwrap();
        state.inserted_custom_types.push(custom_type.id.clone());
        state.custom_types.insert(custom_type.id.clone(), custom_type.clone());
        Ok(())
    }

    async fn create_document(&self, document: &Document) -> Result<String, UpstreamError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_documents.contains(&document.id) {
            return Err(rejected("createDocument"));
        }
        state.created.push(document.clone());
        Ok(format!("new-{}", document.id))
    }

    async fn update_document(&self, id: &str, document: &Document) -> Result<(), UpstreamError> {
        self.state.lock().unwrap().updated.push((id.to_string(), document.clone()));
        Ok(())
    }
}

// -- wiring ---------------------------------------------------------------

pub fn settings() -> PipelineSettings {
    PipelineSettings {
        default_locale: Some("en-us".into()),
        upload_delay: Duration::ZERO,
        migration_delay: Duration::ZERO,
        ..PipelineSettings::default()
    }
}

pub fn context(root: &Path, source: Arc<FakeSource>, destination: Arc<FakeDestination>, settings: PipelineSettings) -> MigrationContext {
    let stage = Stage::new(root, "source", "destination").unwrap();
    MigrationContext::new(source, destination, stage, EventBus::new(256), settings)
}
