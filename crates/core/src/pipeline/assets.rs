use tracing::{debug, info, warn};

use super::report::{ItemFailure, ItemKind, RunReport};
use crate::asset::AssetUpload;
use crate::context::MigrationContext;
use crate::error::MigrateResult;
use crate::events::MigrationEvent;

/// Uploads staged assets and records their new ids.
pub struct AssetPipeline {
    ctx: MigrationContext,
}

impl AssetPipeline {
    pub fn new(ctx: MigrationContext) -> Self {
        Self { ctx }
    }

    /// Upload every asset in `ids` that the image ledger does not know yet.
    ///
    /// A failed upload is reported and skipped; the asset stays out of the
    /// ledger and is retried by the next run.
    pub async fn upload_all(&self, ids: &[String], report: &mut RunReport) -> MigrateResult<()> {
        for id in ids {
            self.upload_one(id, report).await?;
        }
        Ok(())
    }

    async fn upload_one(&self, id: &str, report: &mut RunReport) -> MigrateResult<()> {
        let store = self.ctx.store();
        if store.has_image(id).await? {
            debug!(%id, "asset already uploaded");
            report.assets.skipped += 1;
            self.ctx.publish(MigrationEvent::ItemSkipped {
                kind: ItemKind::Asset,
                id: id.to_string(),
            });
            return Ok(());
        }

        let asset = self.ctx.stage().load_asset(id).await?;
        let bytes = self.ctx.stage().load_asset_binary(&asset).await?;
        let upload = AssetUpload::new(&asset, bytes);

        match self.ctx.destination().upload_asset(upload).await {
            Ok(destination_id) => {
                store.record_image(id, &destination_id).await?;
                info!(%id, %destination_id, filename = %asset.filename, "asset uploaded");
                report.assets.done += 1;
                self.ctx.publish(MigrationEvent::AssetUploaded {
                    source_id: id.to_string(),
                    destination_id,
                });
            }
            Err(err) => {
                warn!(%id, error = %err, "asset upload failed");
                let failure = ItemFailure::new(ItemKind::Asset, id, None, &err);
                self.ctx.publish(MigrationEvent::ItemFailed(failure.clone()));
                report.record_failure(failure);
            }
        }
        Ok(())
    }
}
