use async_trait::async_trait;
use prismic_migrate_core::asset::Asset;
use prismic_migrate_core::custom_type::CustomType;
use prismic_migrate_core::remote::{SearchPage, SearchQuery, SourceRepository, UpstreamError};
use prismic_migrate_core::repository::RepositoryMeta;
use reqwest::Client;

use crate::endpoints::Endpoints;
use crate::http::{build_client, json, send, transport};
use crate::wire::{AssetListResponse, SearchResponse};
use crate::ClientBuildError;

/// Credentials for reading the source repository.
#[derive(Debug, Clone)]
pub struct SourceCredentials {
    pub repository: String,
    /// Bearer token for the asset and custom-types APIs.
    pub write_token: String,
    /// Content API token, needed for private repositories.
    pub access_token: Option<String>,
}

/// Reads a Prismic repository over HTTP.
#[derive(Debug, Clone)]
pub struct PrismicSource {
    client: Client,
    endpoints: Endpoints,
    credentials: SourceCredentials,
}

impl PrismicSource {
    pub fn new(endpoints: Endpoints, credentials: SourceCredentials) -> Result<Self, ClientBuildError> {
        Ok(Self {
            client: build_client()?,
            endpoints,
            credentials,
        })
    }

    /// Request against the content API, with the access token when set.
    fn content_get(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(format!("{}{path}", self.endpoints.content_api));
        match &self.credentials.access_token {
            Some(token) => request.query(&[("access_token", token)]),
            None => request,
        }
    }

    /// Request against the asset or custom-types API.
    fn management_get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .bearer_auth(&self.credentials.write_token)
            .header("repository", &self.credentials.repository)
    }
}

#[async_trait]
impl SourceRepository for PrismicSource {
    async fn repository_meta(&self) -> Result<RepositoryMeta, UpstreamError> {
        const OP: &str = "fetchRepository";
        let response = send(OP, self.content_get("")).await?;
        json(OP, response).await
    }

    async fn search_documents(&self, query: &SearchQuery) -> Result<SearchPage, UpstreamError> {
        const OP: &str = "searchDocuments";
        let request = self.content_get("/documents/search").query(&[
            ("ref", query.reference.clone()),
            ("lang", query.lang.clone()),
            ("page", query.page.to_string()),
            ("pageSize", query.page_size.to_string()),
        ]);
        let response = send(OP, request).await?;
        let body: SearchResponse = json(OP, response).await?;
        Ok(SearchPage {
            results: body.results,
            page: body.page,
            total_pages: body.total_pages,
        })
    }

    async fn list_assets(&self, reference: &str, limit: u32) -> Result<Vec<Asset>, UpstreamError> {
        const OP: &str = "fetchAssets";
        let request = self
            .management_get(&self.endpoints.asset_api)
            .query(&[("ref", reference.to_string()), ("limit", limit.to_string())]);
        let response = send(OP, request).await?;
        let body: AssetListResponse = json(OP, response).await?;
        if let Some(total) = body.total {
            if total > body.items.len() as u64 {
                tracing::warn!(total, listed = body.items.len(), "asset API reports more assets than listed");
            }
        }
        Ok(body.items)
    }

    async fn download_asset(&self, asset: &Asset) -> Result<Vec<u8>, UpstreamError> {
        const OP: &str = "downloadAsset";
        let response = send(OP, self.client.get(&asset.url)).await?;
        let bytes = response.bytes().await.map_err(|err| transport(OP, err))?;
        Ok(bytes.to_vec())
    }

    async fn list_custom_types(&self, reference: &str) -> Result<Vec<CustomType>, UpstreamError> {
        const OP: &str = "fetchCustomTypes";
        tracing::debug!(%reference, "custom types API is not ref-aware; listing current schemas");
        let response = send(OP, self.management_get(&self.endpoints.custom_types_api)).await?;
        json(OP, response).await
    }
}
