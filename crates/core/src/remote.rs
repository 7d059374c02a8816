//! Contracts of the two remote repositories the pipelines talk to.
//!
//! The HTTP implementations live in the client crate; tests use in-memory
//! fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::asset::{Asset, AssetUpload};
use crate::custom_type::CustomType;
use crate::document::Document;
use crate::repository::RepositoryMeta;

/// Failure reported by a remote repository call.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{operation}: unexpected status {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("{operation}: request failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("{operation}: could not decode response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
}

impl UpstreamError {
    pub fn operation(&self) -> &'static str {
        match self {
            UpstreamError::Status { operation, .. }
            | UpstreamError::Transport { operation, .. }
            | UpstreamError::Decode { operation, .. } => *operation,
        }
    }
}

/// One page of a document search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub reference: String,
    pub lang: String,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub results: Vec<Document>,
    pub page: u32,
    pub total_pages: u32,
}

/// Read side: the repository content is cloned from.
#[async_trait]
pub trait SourceRepository: Send + Sync {
    async fn repository_meta(&self) -> Result<RepositoryMeta, UpstreamError>;

    async fn search_documents(&self, query: &SearchQuery) -> Result<SearchPage, UpstreamError>;

    /// Single listing call, at most `limit` assets. No pagination.
    async fn list_assets(&self, reference: &str, limit: u32) -> Result<Vec<Asset>, UpstreamError>;

    async fn download_asset(&self, asset: &Asset) -> Result<Vec<u8>, UpstreamError>;

    async fn list_custom_types(&self, reference: &str) -> Result<Vec<CustomType>, UpstreamError>;
}

/// Write side: the repository content is migrated into.
#[async_trait]
pub trait DestinationRepository: Send + Sync {
    /// Returns the destination id of the new asset.
    async fn upload_asset(&self, upload: AssetUpload) -> Result<String, UpstreamError>;

    async fn custom_type_exists(&self, id: &str) -> Result<bool, UpstreamError>;

    async fn insert_custom_type(&self, custom_type: &CustomType) -> Result<(), UpstreamError>;

    /// Returns the destination id of the new document.
    async fn create_document(&self, document: &Document) -> Result<String, UpstreamError>;

    async fn update_document(&self, id: &str, document: &Document) -> Result<(), UpstreamError>;
}
