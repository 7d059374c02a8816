//! Identifier substitution inside schema-less document trees.
//!
//! Substitution is simultaneous: every occurrence is replaced at most once,
//! looked up in the map as it was before the pass. With `{A: B, B: C}` an `A`
//! becomes `B`, never `C`.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use aho_corasick::{AhoCorasick, MatchKind};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("document could not be converted to or from JSON: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("textual rewrite produced invalid JSON: {0}")]
    Reparse(#[source] serde_json::Error),
    #[error("cannot build id matcher: {0}")]
    Matcher(#[from] aho_corasick::BuildError),
}

#[derive(Debug, Error)]
#[error("unknown rewrite mode `{0}`, expected `exact` or `textual`")]
pub struct UnknownRewriteMode(pub String);

/// How identifiers are located inside a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RewriteMode {
    /// Replace string values that are exactly equal to a known id. Object
    /// keys and longer strings containing an id are left untouched.
    #[default]
    Exact,
    /// Replace every substring occurrence in the serialized document.
    /// Corrupts ordinary text that happens to contain an id, and ids that
    /// are substrings of other ids.
    Textual,
}

impl FromStr for RewriteMode {
    type Err = UnknownRewriteMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(RewriteMode::Exact),
            "textual" => Ok(RewriteMode::Textual),
            _ => Err(UnknownRewriteMode(s.to_string())),
        }
    }
}

impl fmt::Display for RewriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewriteMode::Exact => f.write_str("exact"),
            RewriteMode::Textual => f.write_str("textual"),
        }
    }
}

/// `old id -> new id` pairs applied in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitutions {
    map: BTreeMap<String, String>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty keys and identity pairs are ignored.
    pub fn insert(&mut self, old: impl Into<String>, new: impl Into<String>) {
        let (old, new) = (old.into(), new.into());
        if old.is_empty() || old == new {
            return;
        }
        self.map.insert(old, new);
    }

    pub fn get(&self, old: &str) -> Option<&str> {
        self.map.get(old).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Keys that are also used as a replacement value. Harmless for a single
    /// pass, but applying the same map twice would chain them.
    pub fn collisions(&self) -> Vec<&str> {
        let mut values: Vec<&str> = self.map.values().map(String::as_str).collect();
        values.sort_unstable();
        self.map
            .keys()
            .map(String::as_str)
            .filter(|key| values.binary_search(key).is_ok())
            .collect()
    }

    /// Leftmost-longest matcher over the keys, with the replacement of each
    /// pattern at the same index.
    fn matcher(&self) -> Result<(AhoCorasick, Vec<&str>), RewriteError> {
        let matcher = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(self.map.keys())?;
        Ok((matcher, self.map.values().map(String::as_str).collect()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Substitutions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut subs = Substitutions::new();
        for (old, new) in iter {
            subs.insert(old, new);
        }
        subs
    }
}

impl From<BTreeMap<String, String>> for Substitutions {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

/// Result of a rewrite together with the number of replacements made.
#[derive(Debug, Clone, PartialEq)]
pub struct Rewritten {
    pub value: Value,
    pub replacements: usize,
}

/// Rewrite every known id in `value` according to `mode`.
pub fn rewrite(value: &Value, subs: &Substitutions, mode: RewriteMode) -> Result<Rewritten, RewriteError> {
    match mode {
        RewriteMode::Exact => Ok(rewrite_exact(value, subs)),
        RewriteMode::Textual => rewrite_textual(value, subs),
    }
}

/// Walk the tree and replace string leaves equal to a key.
pub fn rewrite_exact(value: &Value, subs: &Substitutions) -> Rewritten {
    let mut replacements = 0;
    let value = walk(value, subs, &mut replacements);
    Rewritten { value, replacements }
}

fn walk(value: &Value, subs: &Substitutions, replacements: &mut usize) -> Value {
    match value {
        Value::String(text) => match subs.get(text) {
            Some(new) => {
                *replacements += 1;
                Value::String(new.to_string())
            }
            None => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(|item| walk(item, subs, replacements)).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, field)| (key.clone(), walk(field, subs, replacements)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Serialize, substitute substrings, parse back.
pub fn rewrite_textual(value: &Value, subs: &Substitutions) -> Result<Rewritten, RewriteError> {
    let text = serde_json::to_string(value).map_err(RewriteError::Serialize)?;
    let (replaced, replacements) = replace_all(&text, subs)?;
    if replacements == 0 {
        return Ok(Rewritten {
            value: value.clone(),
            replacements,
        });
    }
    let value = serde_json::from_str(&replaced).map_err(RewriteError::Reparse)?;
    Ok(Rewritten { value, replacements })
}

/// Leftmost-longest literal replacement of every key in `text`, in one scan.
pub fn replace_all<'a>(text: &'a str, subs: &Substitutions) -> Result<(Cow<'a, str>, usize), RewriteError> {
    if subs.is_empty() {
        return Ok((Cow::Borrowed(text), 0));
    }
    let (matcher, replacements) = subs.matcher()?;
    let mut out = String::new();
    let mut copied = 0;
    let mut count = 0;
    for found in matcher.find_iter(text) {
        out.push_str(&text[copied..found.start()]);
        out.push_str(replacements[found.pattern().as_usize()]);
        copied = found.end();
        count += 1;
    }
    if count == 0 {
        return Ok((Cow::Borrowed(text), 0));
    }
    out.push_str(&text[copied..]);
    Ok((Cow::Owned(out), count))
}

/// First of `ids` that `value` refers to, located the same way `mode`
/// would rewrite it.
pub fn find_reference(value: &Value, ids: &BTreeSet<String>, mode: RewriteMode) -> Result<Option<String>, RewriteError> {
    if ids.is_empty() {
        return Ok(None);
    }
    match mode {
        RewriteMode::Exact => Ok(find_leaf(value, ids).map(str::to_string)),
        RewriteMode::Textual => {
            let text = serde_json::to_string(value).map_err(RewriteError::Serialize)?;
            Ok(ids.iter().find(|id| text.contains(id.as_str())).cloned())
        }
    }
}

fn find_leaf<'a>(value: &'a Value, ids: &BTreeSet<String>) -> Option<&'a str> {
    match value {
        Value::String(text) if ids.contains(text) => Some(text),
        Value::Array(items) => items.iter().find_map(|item| find_leaf(item, ids)),
        Value::Object(fields) => fields.values().find_map(|field| find_leaf(field, ids)),
        _ => None,
    }
}
