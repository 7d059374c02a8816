use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::report::{CloneReport, ItemKind};
use crate::context::MigrationContext;
use crate::error::{MigrateError, MigrateResult};
use crate::events::MigrationEvent;
use crate::remote::SearchQuery;
use crate::stage::CloneManifest;

/// Fetches everything from the source repository into the local stage.
pub struct CloneRunner {
    ctx: MigrationContext,
}

impl CloneRunner {
    pub fn new(ctx: MigrationContext) -> Self {
        Self { ctx }
    }

    pub async fn run(&self) -> MigrateResult<CloneReport> {
        let meta = self.ctx.source().repository_meta().await?;
        let master_ref = meta
            .master_ref()
            .ok_or(MigrateError::MissingMasterRef)?
            .reference
            .clone();
        let languages = meta.language_ids();
        info!(%master_ref, languages = ?languages, "cloning source repository");

        let mut report = CloneReport::default();
        let mut manifest = CloneManifest {
            master_ref,
            languages,
            ..CloneManifest::default()
        };

        manifest.assets = self.clone_assets(&manifest.master_ref, &mut report).await?;
        manifest.custom_types = self.clone_custom_types(&manifest.master_ref, &mut report).await?;
        manifest.documents = self
            .clone_documents(&manifest.master_ref, &manifest.languages, &mut report)
            .await?;

        self.ctx.stage().save_manifest(&manifest).await?;
        info!(
            assets = manifest.assets.len(),
            custom_types = manifest.custom_types.len(),
            documents = manifest.document_count(),
            "source repository cloned"
        );
        Ok(report)
    }

    async fn clone_assets(&self, reference: &str, report: &mut CloneReport) -> MigrateResult<Vec<String>> {
        let stage = self.ctx.stage();
        let limit = self.ctx.settings().asset_page_size;
        let assets = self.ctx.source().list_assets(reference, limit).await?;
        if assets.len() >= limit as usize {
            warn!(limit, "asset listing returned a full page; assets beyond it are not cloned");
        }

        let mut ids = Vec::with_capacity(assets.len());
        for asset in &assets {
            if stage.has_asset(asset).await? {
                debug!(id = %asset.id, "asset already staged");
                report.assets_reused += 1;
            } else {
                stage.save_asset(asset).await?;
                let bytes = self.ctx.source().download_asset(asset).await?;
                stage.save_asset_binary(asset, &bytes).await?;
                debug!(id = %asset.id, filename = %asset.filename, bytes = bytes.len(), "asset downloaded");
                report.assets_downloaded += 1;
            }
            self.ctx.publish(MigrationEvent::ItemStaged {
                kind: ItemKind::Asset,
                id: asset.id.clone(),
            });
            ids.push(asset.id.clone());
        }
        Ok(ids)
    }

    async fn clone_custom_types(&self, reference: &str, report: &mut CloneReport) -> MigrateResult<Vec<String>> {
        let custom_types = self.ctx.source().list_custom_types(reference).await?;
        let mut ids = Vec::with_capacity(custom_types.len());
        for custom_type in &custom_types {
            self.ctx.stage().save_custom_type(custom_type).await?;
            self.ctx.publish(MigrationEvent::ItemStaged {
                kind: ItemKind::CustomType,
                id: custom_type.id.clone(),
            });
            ids.push(custom_type.id.clone());
        }
        report.custom_types = ids.len();
        Ok(ids)
    }

    async fn clone_documents(
        &self,
        reference: &str,
        languages: &[String],
        report: &mut CloneReport,
    ) -> MigrateResult<BTreeMap<String, Vec<String>>> {
        let mut documents = BTreeMap::new();
        for lang in languages {
            let mut ids = Vec::new();
            let mut query = SearchQuery {
                reference: reference.to_string(),
                lang: lang.clone(),
                page: 1,
                page_size: self.ctx.settings().document_page_size,
            };
            loop {
                let page = self.ctx.source().search_documents(&query).await?;
                debug!(%lang, page = query.page, total_pages = page.total_pages, "fetched document page");
                for document in &page.results {
                    self.ctx.stage().save_source_document(document).await?;
                    self.ctx.publish(MigrationEvent::ItemStaged {
                        kind: ItemKind::Document,
                        id: document.id.clone(),
                    });
                    ids.push(document.id.clone());
                }
                if query.page >= page.total_pages {
                    break;
                }
                query.page += 1;
            }
            info!(%lang, count = ids.len(), "documents staged");
            report.documents.insert(lang.clone(), ids.len());
            documents.insert(lang.clone(), ids);
        }
        Ok(documents)
    }
}
