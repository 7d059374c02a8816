use prismic_migrate_core::events::{EventBus, MigrationEvent};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Log a running counter of migration events until the bus closes or the
/// returned task is aborted.
pub fn spawn_reporter(bus: &EventBus) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        let mut seen = 0usize;
        loop {
            match rx.recv().await {
                Ok(event) => {
                    seen += 1;
                    log_event(seen, &event);
                }
                Err(RecvError::Lagged(missed)) => {
                    seen += missed as usize;
                    tracing::debug!(missed, "progress reporter lagged behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn log_event(seen: usize, event: &MigrationEvent) {
    match event {
        MigrationEvent::ItemStaged { kind, id } => tracing::debug!(seen, %kind, %id, "staged"),
        MigrationEvent::AssetUploaded { source_id, destination_id } => {
            tracing::info!(seen, %source_id, %destination_id, "asset uploaded")
        }
        MigrationEvent::CustomTypeInserted { id } => tracing::info!(seen, %id, "custom type inserted"),
        MigrationEvent::DocumentUploaded { lang, source_id, destination_id } => {
            tracing::info!(seen, %lang, %source_id, %destination_id, "document uploaded")
        }
        MigrationEvent::DocumentMigrated { destination_id, at } => {
            tracing::info!(seen, %destination_id, %at, "document cross-referenced")
        }
        MigrationEvent::ItemSkipped { kind, id } => tracing::debug!(seen, %kind, %id, "already done"),
        MigrationEvent::ItemFailed(failure) => {
            tracing::debug!(seen, kind = %failure.kind, id = %failure.id, "failure recorded")
        }
    }
}
