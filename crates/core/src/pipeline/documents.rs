use std::collections::BTreeSet;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::report::{ItemFailure, ItemKind, RunReport};
use super::{default_locale, ordered_locales, pause, warn_on_collisions};
use crate::context::MigrationContext;
use crate::document::title::synthesize_title;
use crate::document::Document;
use crate::error::{MigrateError, MigrateResult};
use crate::events::MigrationEvent;
use crate::rewrite::{find_reference, rewrite, Substitutions};
use crate::stage::CloneManifest;

/// Uploads staged documents (pass 1) and rewrites their cross-references
/// once every document has a destination id (pass 2).
pub struct DocumentPipeline {
    ctx: MigrationContext,
}

impl DocumentPipeline {
    pub fn new(ctx: MigrationContext) -> Self {
        Self { ctx }
    }

    /// Pass 1: title, asset ids, alternate-language link, create.
    ///
    /// A document that refers to an asset without a destination id is held
    /// back and reported as failed: once created, pass 1 never revisits it,
    /// so the asset id would stay stale.
    pub async fn upload_all(&self, manifest: &CloneManifest, report: &mut RunReport) -> MigrateResult<()> {
        let default_locale = default_locale(&self.ctx, manifest)?;
        let uploaded = self.ctx.store().image_uploads().await?;
        let pending: BTreeSet<String> = manifest
            .assets
            .iter()
            .filter(|id| !uploaded.contains_key(id.as_str()))
            .cloned()
            .collect();
        if !pending.is_empty() {
            warn!(count = pending.len(), "documents referring to assets not uploaded yet are held back");
        }
        let images = Substitutions::from(uploaded);
        warn_on_collisions("images", &images);
        let assets = AssetIds { images, pending };

        for lang in ordered_locales(manifest, &default_locale) {
            let Some(ids) = manifest.documents.get(&lang) else {
                continue;
            };
            info!(%lang, count = ids.len(), "uploading locale");
            for id in ids {
                self.upload_one(&lang, id, &default_locale, &assets, report).await?;
            }
        }
        Ok(())
    }

    async fn upload_one(
        &self,
        lang: &str,
        id: &str,
        default_locale: &str,
        assets: &AssetIds,
        report: &mut RunReport,
    ) -> MigrateResult<()> {
        let store = self.ctx.store();
        if store.has_document(lang, id).await? {
            debug!(%lang, %id, "document already uploaded");
            report.documents.skipped += 1;
            self.ctx.publish(MigrationEvent::ItemSkipped {
                kind: ItemKind::Document,
                id: id.to_string(),
            });
            return Ok(());
        }

        let source = self.ctx.stage().load_source_document(lang, id).await?;
        let mode = self.ctx.settings().rewrite_mode;
        if let Some(asset_id) = find_reference(&source.to_value().map_err(rewrite_serde)?, &assets.pending, mode)? {
            warn!(%lang, %id, %asset_id, "document held back until its asset is uploaded");
            let failure = ItemFailure::new(
                ItemKind::Document,
                id,
                Some(lang),
                format!("refers to asset {asset_id}, which is not uploaded yet"),
            );
            self.ctx.publish(MigrationEvent::ItemFailed(failure.clone()));
            report.record_failure(failure);
            return Ok(());
        }
        let mut document = self.prepare(source, &assets.images)?;

        if lang != default_locale {
            self.link_default_locale(&mut document, lang, default_locale).await?;
        }

        let created = self.ctx.destination().create_document(&document).await;
        match created {
            Ok(destination_id) => {
                // Stage first: pass 2 must find the body of every recorded id.
                self.ctx
                    .stage()
                    .save_destination_document(lang, id, &document)
                    .await?;
                store.record_document(lang, id, &destination_id).await?;
                info!(%lang, %id, %destination_id, "document uploaded");
                report.documents.done += 1;
                self.ctx.publish(MigrationEvent::DocumentUploaded {
                    lang: lang.to_string(),
                    source_id: id.to_string(),
                    destination_id,
                });
            }
            Err(err) => {
                warn!(%lang, %id, error = %err, "document upload failed");
                let failure = ItemFailure::new(ItemKind::Document, id, Some(lang), &err);
                self.ctx.publish(MigrationEvent::ItemFailed(failure.clone()));
                report.record_failure(failure);
            }
        }
        pause(self.ctx.settings().upload_delay).await;
        Ok(())
    }

    /// Synthesize the title, then rewrite asset ids throughout the document.
    fn prepare(&self, mut document: Document, images: &Substitutions) -> MigrateResult<Document> {
        document.title = Some(synthesize_title(&document.data));
        let value = document.to_value().map_err(rewrite_serde)?;
        let rewritten = rewrite(&value, images, self.ctx.settings().rewrite_mode)?;
        if rewritten.replacements > 0 {
            debug!(id = %document.id, replacements = rewritten.replacements, "asset ids rewritten");
        }
        Document::from_value(rewritten.value).map_err(rewrite_serde)
    }

    /// Point a non-default-locale document at its master-locale sibling.
    /// Left unset when the sibling has no destination id yet.
    async fn link_default_locale(&self, document: &mut Document, lang: &str, default_locale: &str) -> MigrateResult<()> {
        let Some(sibling) = document.alternate_in(default_locale).map(str::to_string) else {
            return Ok(());
        };
        match self
            .ctx
            .store()
            .destination_document_id(default_locale, &sibling)
            .await?
        {
            Some(destination_id) => {
                debug!(%lang, id = %document.id, %destination_id, "linked to default locale sibling");
                document.alternate_language_id = Some(destination_id);
            }
            None => {
                warn!(%lang, id = %document.id, %sibling, "default locale sibling not uploaded; alternate language link left unset");
            }
        }
        Ok(())
    }

    /// Pass 2: rewrite document ids with the complete map and push updates.
    pub async fn migrate_all(&self, manifest: &CloneManifest, report: &mut RunReport) -> MigrateResult<()> {
        let default_locale = default_locale(&self.ctx, manifest)?;
        let documents = Substitutions::from(self.ctx.store().document_ids().await?);
        warn_on_collisions("documents", &documents);

        for lang in ordered_locales(manifest, &default_locale) {
            let Some(ids) = manifest.documents.get(&lang) else {
                continue;
            };
            for id in ids {
                self.migrate_one(&lang, id, &default_locale, &documents, report).await?;
            }
        }
        Ok(())
    }

    async fn migrate_one(
        &self,
        lang: &str,
        id: &str,
        default_locale: &str,
        documents: &Substitutions,
        report: &mut RunReport,
    ) -> MigrateResult<()> {
        let store = self.ctx.store();
        let Some(destination_id) = store.destination_document_id(lang, id).await? else {
            // Not uploaded; only reachable when pass 1 was not clean.
            return Ok(());
        };
        if store.has_migration(&destination_id).await? {
            debug!(%lang, %id, %destination_id, "document already migrated");
            report.migrations.skipped += 1;
            self.ctx.publish(MigrationEvent::ItemSkipped {
                kind: ItemKind::DocumentMigration,
                id: destination_id,
            });
            return Ok(());
        }

        let mut staged = self.ctx.stage().load_destination_document(lang, id).await?;
        // The sibling may have failed in an earlier pass 1.
        if lang != default_locale && staged.alternate_language_id.is_none() {
            self.link_default_locale(&mut staged, lang, default_locale).await?;
        }
        let value = staged.to_value().map_err(rewrite_serde)?;
        let rewritten = rewrite(&value, documents, self.ctx.settings().rewrite_mode)?;
        let document = Document::from_value(rewritten.value).map_err(rewrite_serde)?;

        match self.ctx.destination().update_document(&destination_id, &document).await {
            Ok(()) => {
                self.ctx
                    .stage()
                    .save_destination_document(lang, id, &document)
                    .await?;
                let at = Utc::now();
                store.record_migration(&destination_id, at).await?;
                info!(%lang, %id, %destination_id, references = rewritten.replacements, "document cross-references updated");
                report.migrations.done += 1;
                self.ctx
                    .publish(MigrationEvent::DocumentMigrated { destination_id, at });
            }
            Err(err) => {
                warn!(%lang, %id, %destination_id, error = %err, "document update failed");
                let failure = ItemFailure::new(ItemKind::DocumentMigration, id, Some(lang), &err);
                self.ctx.publish(MigrationEvent::ItemFailed(failure.clone()));
                report.record_failure(failure);
            }
        }
        pause(self.ctx.settings().migration_delay).await;
        Ok(())
    }
}

/// Asset ids as seen by pass 1.
struct AssetIds {
    /// Uploaded assets, `old -> new`.
    images: Substitutions,
    /// Cloned assets without a destination id.
    pending: BTreeSet<String>,
}

fn rewrite_serde(err: serde_json::Error) -> MigrateError {
    MigrateError::Rewrite(crate::rewrite::RewriteError::Serialize(err))
}
