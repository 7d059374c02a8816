use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Prismic document as returned by the content API search endpoint and as
/// posted to the migration API.
///
/// Fields the migrator does not interpret are kept in `content` so that a
/// staged document round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub lang: String,
    /// Arbitrary, schema-dependent field tree.
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub alternate_languages: Vec<AlternateLanguage>,
    /// Display title required by the migration API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Destination id of the master-locale sibling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_language_id: Option<String>,
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternateLanguage {
    pub id: String,
    pub lang: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Source id of this document's sibling in `lang`, if any.
    pub fn alternate_in(&self, lang: &str) -> Option<&str> {
        self.alternate_languages
            .iter()
            .find(|alt| alt.lang == lang)
            .map(|alt| alt.id.as_str())
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}
