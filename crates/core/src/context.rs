use std::sync::Arc;
use std::time::Duration;

use crate::events::{EventBus, MigrationEvent};
use crate::progress::ProgressStore;
use crate::remote::{DestinationRepository, SourceRepository};
use crate::rewrite::RewriteMode;
use crate::stage::Stage;

/// Tunables handed to every pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Master locale; the first source language when unset.
    pub default_locale: Option<String>,
    /// Pause after each document create call.
    pub upload_delay: Duration,
    /// Pause after each document update call.
    pub migration_delay: Duration,
    pub rewrite_mode: RewriteMode,
    pub asset_page_size: u32,
    pub document_page_size: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            default_locale: None,
            upload_delay: Duration::from_millis(1000),
            migration_delay: Duration::from_millis(1500),
            rewrite_mode: RewriteMode::Exact,
            asset_page_size: 1000,
            document_page_size: 100,
        }
    }
}

/// Shared migration state, passed to every pipeline.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct MigrationContext {
    inner: Arc<InnerContext>,
}

struct InnerContext {
    source: Arc<dyn SourceRepository>,
    destination: Arc<dyn DestinationRepository>,
    stage: Stage,
    store: ProgressStore,
    events: EventBus,
    settings: PipelineSettings,
}

impl MigrationContext {
    pub fn new(
        source: Arc<dyn SourceRepository>,
        destination: Arc<dyn DestinationRepository>,
        stage: Stage,
        events: EventBus,
        settings: PipelineSettings,
    ) -> Self {
        let store = stage.progress_store();
        Self {
            inner: Arc::new(InnerContext {
                source,
                destination,
                stage,
                store,
                events,
                settings,
            }),
        }
    }

    pub fn source(&self) -> &dyn SourceRepository {
        self.inner.source.as_ref()
    }

    pub fn destination(&self) -> &dyn DestinationRepository {
        self.inner.destination.as_ref()
    }

    pub fn stage(&self) -> &Stage {
        &self.inner.stage
    }

    pub fn store(&self) -> &ProgressStore {
        &self.inner.store
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.inner.settings
    }

    pub(crate) fn publish(&self, event: MigrationEvent) {
        self.inner.events.publish(event);
    }
}
