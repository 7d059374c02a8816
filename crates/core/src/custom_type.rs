use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Custom type schema. Copied verbatim, only the id is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomType {
    pub id: String,
    #[serde(flatten)]
    pub schema: Map<String, Value>,
}
