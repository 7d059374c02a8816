//! Clone and create phases.
//!
//! The create phase runs, strictly one item at a time: assets, custom types,
//! document upload (pass 1, asset ids rewritten), document cross-referencing
//! (pass 2, document ids rewritten). Pass 2 only runs once pass 1 has left no
//! document behind, because it needs the complete document id map.

pub mod assets;
pub mod clone;
pub mod custom_types;
pub mod documents;
pub mod report;

use std::time::Duration;

use tracing::{info, warn};

use crate::context::MigrationContext;
use crate::error::{MigrateError, MigrateResult};
use crate::repository::locale_order;
use crate::rewrite::Substitutions;
use crate::stage::CloneManifest;

pub use assets::AssetPipeline;
pub use clone::CloneRunner;
pub use custom_types::CustomTypePipeline;
pub use documents::DocumentPipeline;
pub use report::{CloneReport, Counts, ItemFailure, ItemKind, RunReport};

/// Drives the create phase against a cloned stage.
pub struct Migrator {
    ctx: MigrationContext,
}

impl Migrator {
    pub fn new(ctx: MigrationContext) -> Self {
        Self { ctx }
    }

    pub async fn run(&self) -> MigrateResult<RunReport> {
        let manifest = self.ctx.stage().load_manifest().await?;
        let mut report = RunReport::default();

        info!(count = manifest.assets.len(), "uploading assets");
        AssetPipeline::new(self.ctx.clone())
            .upload_all(&manifest.assets, &mut report)
            .await?;

        info!(count = manifest.custom_types.len(), "uploading custom types");
        CustomTypePipeline::new(self.ctx.clone())
            .upload_all(&manifest.custom_types, &mut report)
            .await?;

        let documents = DocumentPipeline::new(self.ctx.clone());
        info!(count = manifest.document_count(), "uploading documents");
        documents.upload_all(&manifest, &mut report).await?;

        if report.documents.failed > 0 {
            warn!(
                failed = report.documents.failed,
                "skipping cross-referencing until every document is uploaded"
            );
            report.pass2_skipped = true;
        } else {
            info!("migrating document cross-references");
            documents.migrate_all(&manifest, &mut report).await?;
        }

        info!(
            assets = report.assets.done,
            custom_types = report.custom_types.done,
            documents = report.documents.done,
            migrations = report.migrations.done,
            failures = report.failures.len(),
            "create run finished"
        );
        Ok(report)
    }
}

/// The configured default locale, else the first source language.
pub(crate) fn default_locale(ctx: &MigrationContext, manifest: &CloneManifest) -> MigrateResult<String> {
    ctx.settings()
        .default_locale
        .clone()
        .or_else(|| manifest.languages.first().cloned())
        .ok_or(MigrateError::NoLanguages)
}

/// Locales in processing order: default first, then source order, then any
/// staged locale the source no longer reports.
pub(crate) fn ordered_locales(manifest: &CloneManifest, default_locale: &str) -> Vec<String> {
    let listed = manifest
        .languages
        .iter()
        .chain(manifest.documents.keys())
        .map(String::as_str);
    locale_order(listed, default_locale)
}

pub(crate) fn warn_on_collisions(label: &str, subs: &Substitutions) {
    let collisions = subs.collisions();
    if !collisions.is_empty() {
        warn!(
            map = label,
            count = collisions.len(),
            first = collisions[0],
            "ids appear both as source and destination ids; they are rewritten once, not chained"
        );
    }
}

pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
