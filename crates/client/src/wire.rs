//! Response bodies of the Prismic APIs, reduced to what the adapters read.
use prismic_migrate_core::asset::Asset;
use prismic_migrate_core::document::Document;
use serde::Deserialize;

/// `GET {asset_api}?limit=..`
#[derive(Debug, Clone, Deserialize)]
pub struct AssetListResponse {
    pub items: Vec<Asset>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// `GET {content_api}/documents/search`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default = "first_page")]
    pub page: u32,
    pub total_pages: u32,
    pub results: Vec<Document>,
}

fn first_page() -> u32 {
    1
}

/// Asset upload and document create both answer with the new id.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedResponse {
    pub id: String,
}

/// `GET {custom_types_api}/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct CustomTypeLookup {
    #[serde(default)]
    pub id: Option<String>,
}
