//! HTTP adapters for the Prismic content, asset, custom-types and migration
//! APIs.

pub mod destination;
pub mod endpoints;
mod http;
pub mod source;
pub mod wire;

pub use destination::{DestinationCredentials, PrismicDestination};
pub use endpoints::Endpoints;
pub use source::{PrismicSource, SourceCredentials};

/// Failure to construct an HTTP client.
#[derive(Debug, thiserror::Error)]
#[error("failed to build HTTP client: {0}")]
pub struct ClientBuildError(#[from] reqwest::Error);
