use tracing::{debug, info, warn};

use super::report::{ItemFailure, ItemKind, RunReport};
use crate::context::MigrationContext;
use crate::custom_type::CustomType;
use crate::error::MigrateResult;
use crate::events::MigrationEvent;
use crate::remote::UpstreamError;

/// Copies staged custom types to the destination.
///
/// Existence is checked remotely by id only: a destination type with the same
/// id is left alone even when its schema differs from the source.
pub struct CustomTypePipeline {
    ctx: MigrationContext,
}

impl CustomTypePipeline {
    pub fn new(ctx: MigrationContext) -> Self {
        Self { ctx }
    }

    pub async fn upload_all(&self, ids: &[String], report: &mut RunReport) -> MigrateResult<()> {
        for id in ids {
            let custom_type = self.ctx.stage().load_custom_type(id).await?;
            match self.insert_if_missing(&custom_type).await {
                Ok(true) => {
                    info!(%id, "custom type inserted");
                    report.custom_types.done += 1;
                    self.ctx.publish(MigrationEvent::CustomTypeInserted { id: id.clone() });
                }
                Ok(false) => {
                    debug!(%id, "custom type already exists");
                    report.custom_types.skipped += 1;
                    self.ctx.publish(MigrationEvent::ItemSkipped {
                        kind: ItemKind::CustomType,
                        id: id.clone(),
                    });
                }
                Err(err) => {
                    warn!(%id, error = %err, "custom type upload failed");
                    let failure = ItemFailure::new(ItemKind::CustomType, id, None, &err);
                    self.ctx.publish(MigrationEvent::ItemFailed(failure.clone()));
                    report.record_failure(failure);
                }
            }
        }
        Ok(())
    }

    async fn insert_if_missing(&self, custom_type: &CustomType) -> Result<bool, UpstreamError> {
        let destination = self.ctx.destination();
        if destination.custom_type_exists(&custom_type.id).await? {
            return Ok(false);
        }
        destination.insert_custom_type(custom_type).await?;
        Ok(true)
    }
}
