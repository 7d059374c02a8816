use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pipeline::report::{ItemFailure, ItemKind};

/// Progress notifications published by the pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MigrationEvent {
    ItemStaged {
        kind: ItemKind,
        id: String,
    },
    AssetUploaded {
        source_id: String,
        destination_id: String,
    },
    CustomTypeInserted {
        id: String,
    },
    DocumentUploaded {
        lang: String,
        source_id: String,
        destination_id: String,
    },
    DocumentMigrated {
        destination_id: String,
        at: DateTime<Utc>,
    },
    ItemSkipped {
        kind: ItemKind,
        id: String,
    },
    ItemFailed(ItemFailure),
}
