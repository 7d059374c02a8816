use thiserror::Error;

use crate::progress::StoreError;
use crate::remote::UpstreamError;
use crate::rewrite::RewriteError;
use crate::stage::StageError;

/// Errors that abort a clone or create run.
///
/// Per-item write failures (asset upload, document create, ...) never show up
/// here; they are collected in the run report instead.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("source repository has no master ref")]
    MissingMasterRef,

    #[error("no default locale: source reports no languages and none was configured")]
    NoLanguages,
}

pub type MigrateResult<T> = Result<T, MigrateError>;
