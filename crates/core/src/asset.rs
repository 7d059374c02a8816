use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Media asset as listed by the asset API.
///
/// Unknown fields are kept so the staged metadata file mirrors the listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub filename: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Asset {
    /// Name under which the binary is staged: the last path component of
    /// `filename`, or the asset id when that component is unusable.
    pub fn staged_file_name(&self) -> String {
        Path::new(&self.filename)
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty() && *name != self.metadata_file_name())
            .map(str::to_string)
            .unwrap_or_else(|| self.id.clone())
    }

    pub(crate) fn metadata_file_name(&self) -> String {
        format!("{}.json", self.id)
    }
}

/// Binary plus optional metadata posted to the destination asset API.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub credits: Option<String>,
    pub notes: Option<String>,
    pub alt: Option<String>,
}

impl AssetUpload {
    pub fn new(asset: &Asset, bytes: Vec<u8>) -> Self {
        // Empty strings are dropped, the asset API treats them as missing anyway.
        let non_empty = |field: &Option<String>| field.clone().filter(|value| !value.is_empty());
        Self {
            file_name: asset.staged_file_name(),
            bytes,
            credits: non_empty(&asset.credits),
            notes: non_empty(&asset.notes),
            alt: non_empty(&asset.alt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn asset(filename: &str) -> Asset {
        serde_json::from_value(json!({
            "id": "ZabC1",
            "filename": filename,
            "url": "https://images.prismic.io/src/ZabC1_hero.png",
            "credits": "",
            "alt": "A hero",
            "kind": "image",
            "size": 1024
        }))
        .unwrap()
    }

    #[test]
    fn keeps_unknown_fields() {
        let a = asset("hero.png");
        assert_eq!(a.extra["kind"], json!("image"));
        let back = serde_json::to_value(&a).unwrap();
        assert_eq!(back["size"], json!(1024));
    }

    #[test]
    fn staged_file_name_strips_directories() {
        assert_eq!(asset("hero.png").staged_file_name(), "hero.png");
        assert_eq!(asset("../../etc/passwd").staged_file_name(), "passwd");
        assert_eq!(asset("..").staged_file_name(), "ZabC1");
        assert_eq!(asset("ZabC1.json").staged_file_name(), "ZabC1");
    }

    #[test]
    fn upload_drops_empty_metadata() {
        let upload = AssetUpload::new(&asset("hero.png"), vec![1, 2, 3]);
        assert_eq!(upload.credits, None);
        assert_eq!(upload.notes, None);
        assert_eq!(upload.alt.as_deref(), Some("A hero"));
        assert_eq!(upload.file_name, "hero.png");
    }
}
