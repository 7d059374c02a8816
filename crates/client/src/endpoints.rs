/// Base URLs of the Prismic APIs. Overridable so tests can point the adapters
/// at a local server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Content API root of the source repository, e.g. `https://repo.prismic.io/api/v2`.
    pub content_api: String,
    pub asset_api: String,
    pub custom_types_api: String,
    pub migration_api: String,
}

impl Endpoints {
    /// Production endpoints for `repository`.
    pub fn prismic(repository: &str) -> Self {
        Self {
            content_api: format!("https://{repository}.prismic.io/api/v2"),
            asset_api: "https://asset-api.prismic.io/assets".to_string(),
            custom_types_api: "https://customtypes.prismic.io/customtypes".to_string(),
            migration_api: "https://migration.prismic.io/documents".to_string(),
        }
    }

    /// Every API served under one base URL.
    pub fn local(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            content_api: format!("{base}/api/v2"),
            asset_api: format!("{base}/assets"),
            custom_types_api: format!("{base}/customtypes"),
            migration_api: format!("{base}/documents"),
        }
    }
}
