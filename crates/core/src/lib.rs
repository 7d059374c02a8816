//! Core of the Prismic repository migrator: data model, resumable progress
//! ledger, identifier rewriting and the clone / upload pipelines.

pub mod asset;
pub mod context;
pub mod custom_type;
pub mod document;
mod durable;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod progress;
pub mod remote;
pub mod repository;
pub mod rewrite;
pub mod stage;

pub use context::{MigrationContext, PipelineSettings};
pub use error::{MigrateError, MigrateResult};
