use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    Asset,
    CustomType,
    Document,
    DocumentMigration,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ItemKind::Asset => "asset",
            ItemKind::CustomType => "custom type",
            ItemKind::Document => "document",
            ItemKind::DocumentMigration => "document migration",
        })
    }
}

/// One item that could not be written to the destination. It is absent from
/// the progress ledger and will be attempted again on the next run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub kind: ItemKind,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    pub message: String,
}

impl ItemFailure {
    pub fn new(kind: ItemKind, id: &str, lang: Option<&str>, error: impl fmt::Display) -> Self {
        Self {
            kind,
            id: id.to_string(),
            lang: lang.map(str::to_string),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub done: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Outcome of a create run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub assets: Counts,
    pub custom_types: Counts,
    pub documents: Counts,
    pub migrations: Counts,
    /// Cross-referencing was not attempted because pass 1 left documents behind.
    pub pass2_skipped: bool,
    pub failures: Vec<ItemFailure>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.pass2_skipped
    }

    pub(crate) fn counts_mut(&mut self, kind: ItemKind) -> &mut Counts {
        match kind {
            ItemKind::Asset => &mut self.assets,
            ItemKind::CustomType => &mut self.custom_types,
            ItemKind::Document => &mut self.documents,
            ItemKind::DocumentMigration => &mut self.migrations,
        }
    }

    pub(crate) fn record_failure(&mut self, failure: ItemFailure) {
        self.counts_mut(failure.kind).failed += 1;
        self.failures.push(failure);
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        counts_line(f, "assets", &self.assets)?;
        counts_line(f, "custom types", &self.custom_types)?;
        counts_line(f, "documents", &self.documents)?;
        counts_line(f, "cross-references", &self.migrations)?;
        if self.pass2_skipped {
            writeln!(f, "cross-referencing skipped: rerun once every document is uploaded")?;
        }
        for failure in &self.failures {
            match &failure.lang {
                Some(lang) => writeln!(f, "  {} {} ({lang}): {}", failure.kind, failure.id, failure.message)?,
                None => writeln!(f, "  {} {}: {}", failure.kind, failure.id, failure.message)?,
            }
        }
        Ok(())
    }
}

fn counts_line(f: &mut fmt::Formatter<'_>, label: &str, c: &Counts) -> fmt::Result {
    writeln!(f, "{label:<16} {:>5} done {:>5} skipped {:>5} failed", c.done, c.skipped, c.failed)
}

/// Outcome of a clone run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloneReport {
    pub assets_downloaded: usize,
    pub assets_reused: usize,
    pub custom_types: usize,
    pub documents: BTreeMap<String, usize>,
}
