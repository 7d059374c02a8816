use std::time::Duration;

use prismic_migrate_core::remote::UpstreamError;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::ClientBuildError;

const USER_AGENT: &str = concat!("prismic-migrate/", env!("CARGO_PKG_VERSION"));
const TIMEOUT: Duration = Duration::from_secs(120);

pub(crate) fn build_client() -> Result<reqwest::Client, ClientBuildError> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(TIMEOUT)
        .build()?)
}

/// Send and turn any non-success status into `UpstreamError::Status`.
pub(crate) async fn send(operation: &'static str, request: RequestBuilder) -> Result<Response, UpstreamError> {
    let response = request
        .send()
        .await
        .map_err(|err| transport(operation, err))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(operation, status = status.as_u16(), %body, "upstream rejected request");
    Err(UpstreamError::Status {
        operation,
        status: status.as_u16(),
        body,
    })
}

pub(crate) async fn json<T: DeserializeOwned>(operation: &'static str, response: Response) -> Result<T, UpstreamError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|err| transport(operation, err))?;
    serde_json::from_slice(&bytes).map_err(|err| UpstreamError::Decode {
        operation,
        message: err.to_string(),
    })
}

pub(crate) fn transport(operation: &'static str, err: reqwest::Error) -> UpstreamError {
    UpstreamError::Transport {
        operation,
        message: err.to_string(),
    }
}
