use serde::{Deserialize, Serialize};

const MASTER_REF_ID: &str = "master";

/// Subset of the content API root document needed by the migrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryMeta {
    pub refs: Vec<RepositoryRef>,
    #[serde(default)]
    pub languages: Vec<Language>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RepositoryMeta {
    /// The ref whose id is `master`.
    pub fn master_ref(&self) -> Option<&RepositoryRef> {
        self.refs.iter().find(|r| r.id == MASTER_REF_ID)
    }

    /// Language ids in the order reported by the repository.
    pub fn language_ids(&self) -> Vec<String> {
        self.languages.iter().map(|l| l.id.clone()).collect()
    }
}

/// Order in which locales are processed: the default locale first, then the
/// remaining ones in their given order, without duplicates.
pub fn locale_order<'a>(languages: impl IntoIterator<Item = &'a str>, default_locale: &str) -> Vec<String> {
    let mut ordered = vec![default_locale.to_string()];
    for lang in languages {
        if !ordered.iter().any(|seen| seen == lang) {
            ordered.push(lang.to_string());
        }
    }
    ordered
}
