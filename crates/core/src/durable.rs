//! Crash-safe file replacement shared by the progress store and the stage.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

/// Write `body` to a sibling temp file, fsync it, then rename it over `path`.
///
/// A crash leaves either the previous content or the new one at `path`,
/// never a truncated file.
pub(crate) async fn write_durably(path: &Path, body: &[u8]) -> io::Result<()> {
    let dir = path.parent().filter(|dir| !dir.as_os_str().is_empty());
    if let Some(dir) = dir {
        tokio::fs::create_dir_all(dir).await?;
    }
    let tmp = temp_path(path);
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(body).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(&tmp, path).await?;
    #[cfg(unix)]
    if let Some(dir) = dir {
        tokio::fs::File::open(dir).await?.sync_all().await?;
    }
    Ok(())
}

/// `name.ext` -> `name.ext.tmp`, so distinct targets never share a temp file.
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
