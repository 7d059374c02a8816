use async_trait::async_trait;
use prismic_migrate_core::asset::AssetUpload;
use prismic_migrate_core::custom_type::CustomType;
use prismic_migrate_core::document::Document;
use prismic_migrate_core::remote::{DestinationRepository, UpstreamError};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, StatusCode};

use crate::endpoints::Endpoints;
use crate::http::{build_client, json, send, transport};
use crate::wire::{CreatedResponse, CustomTypeLookup};
use crate::ClientBuildError;

/// Credentials for writing to the destination repository.
#[derive(Debug, Clone)]
pub struct DestinationCredentials {
    pub repository: String,
    pub write_token: String,
    /// `x-api-key` expected by the migration API.
    pub migration_api_key: String,
}

/// Writes to a Prismic repository over HTTP.
#[derive(Debug, Clone)]
pub struct PrismicDestination {
    client: Client,
    endpoints: Endpoints,
    credentials: DestinationCredentials,
}

impl PrismicDestination {
    pub fn new(endpoints: Endpoints, credentials: DestinationCredentials) -> Result<Self, ClientBuildError> {
        Ok(Self {
            client: build_client()?,
            endpoints,
            credentials,
        })
    }

    fn authorized(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.credentials.write_token)
            .header("repository", &self.credentials.repository)
            .header("x-api-key", &self.credentials.migration_api_key)
    }
}

#[async_trait]
impl DestinationRepository for PrismicDestination {
    async fn upload_asset(&self, upload: AssetUpload) -> Result<String, UpstreamError> {
        const OP: &str = "uploadAsset";
        let file = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str("application/octet-stream")
            .map_err(|err| transport(OP, err))?;
        let mut form = Form::new().part("file", file);
        for (name, value) in [("credits", upload.credits), ("notes", upload.notes), ("alt", upload.alt)] {
            if let Some(value) = value {
                form = form.text(name, value);
            }
        }
        let request = self
            .authorized(Method::POST, &self.endpoints.asset_api)
            .multipart(form);
        let response = send(OP, request).await?;
        let created: CreatedResponse = json(OP, response).await?;
        Ok(created.id)
    }

    async fn custom_type_exists(&self, id: &str) -> Result<bool, UpstreamError> {
        const OP: &str = "customTypeExists";
        let url = format!("{}/{id}", self.endpoints.custom_types_api);
        let response = self
            .authorized(Method::GET, &url)
            .send()
            .await
            .map_err(|err| transport(OP, err))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                operation: OP,
                status: status.as_u16(),
                body,
            });
        }
        let lookup: CustomTypeLookup = json(OP, response).await?;
        Ok(lookup.id.is_some())
    }

    async fn insert_custom_type(&self, custom_type: &CustomType) -> Result<(), UpstreamError> {
        const OP: &str = "insertCustomType";
        let url = format!("{}/insert", self.endpoints.custom_types_api);
        send(OP, self.authorized(Method::POST, &url).json(custom_type)).await?;
        Ok(())
    }

    async fn create_document(&self, document: &Document) -> Result<String, UpstreamError> {
        const OP: &str = "createDocument";
        let request = self
            .authorized(Method::POST, &self.endpoints.migration_api)
            .json(document);
        let response = send(OP, request).await?;
        let created: CreatedResponse = json(OP, response).await?;
        Ok(created.id)
    }

    async fn update_document(&self, id: &str, document: &Document) -> Result<(), UpstreamError> {
        const OP: &str = "updateDocument";
        let url = format!("{}/{id}", self.endpoints.migration_api);
        send(OP, self.authorized(Method::PUT, &url).json(document)).await?;
        Ok(())
    }
}
