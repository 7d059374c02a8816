use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use prismic_migrate_client::{DestinationCredentials, SourceCredentials};
use prismic_migrate_core::rewrite::RewriteMode;
use prismic_migrate_core::PipelineSettings;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Log output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected `pretty` or `json`, got `{other}`")),
        }
    }
}

/// Migration configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub source_repository: String,
    pub source_write_token: String,
    /// Content API token for private source repositories.
    pub source_access_token: Option<String>,
    pub destination_repository: String,
    pub destination_write_token: String,
    pub migration_api_key: String,
    /// Root of the local stage.
    pub out_dir: PathBuf,
    pub default_locale: Option<String>,
    pub upload_delay: Duration,
    pub migration_delay: Duration,
    pub rewrite_mode: RewriteMode,
    pub asset_page_size: u32,
    pub document_page_size: u32,
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_level: String,
    pub log_format: LogFormat,
}

impl MigrationConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let migration_api_key = get("MIGRATION_API_KEY")
            .or_else(|| get("MIGRATION_DEMO_TOKEN"))
            .ok_or(ConfigError::Missing("MIGRATION_API_KEY"))?;

        Ok(Self {
            source_repository: required("SOURCE_REPOSITORY_NAME")?,
            source_write_token: required("SOURCE_WRITE_API_TOKEN")?,
            source_access_token: get("SOURCE_ACCESS_TOKEN"),
            destination_repository: required("DESTINATION_REPOSITORY_NAME")?,
            destination_write_token: required("DESTINATION_WRITE_API_TOKEN")?,
            migration_api_key,
            out_dir: get("OUT_DIR").map_or_else(|| PathBuf::from("prismic-data"), PathBuf::from),
            default_locale: get("DEFAULT_LOCALE"),
            upload_delay: Duration::from_millis(parsed(&get, "UPLOAD_DELAY_MS", 1000)?),
            migration_delay: Duration::from_millis(parsed(&get, "MIGRATION_DELAY_MS", 1500)?),
            rewrite_mode: parsed(&get, "REWRITE_MODE", RewriteMode::Exact)?,
            asset_page_size: positive(&get, "ASSET_PAGE_SIZE", 1000)?,
            document_page_size: positive(&get, "DOCUMENT_PAGE_SIZE", 100)?,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format: parsed(&get, "LOG_FORMAT", LogFormat::Pretty)?,
        })
    }

    pub fn source_credentials(&self) -> SourceCredentials {
        SourceCredentials {
            repository: self.source_repository.clone(),
            write_token: self.source_write_token.clone(),
            access_token: self.source_access_token.clone(),
        }
    }

    pub fn destination_credentials(&self) -> DestinationCredentials {
        DestinationCredentials {
            repository: self.destination_repository.clone(),
            write_token: self.destination_write_token.clone(),
            migration_api_key: self.migration_api_key.clone(),
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            default_locale: self.default_locale.clone(),
            upload_delay: self.upload_delay,
            migration_delay: self.migration_delay,
            rewrite_mode: self.rewrite_mode,
            asset_page_size: self.asset_page_size,
            document_page_size: self.document_page_size,
        }
    }
}

fn parsed<T>(get: &impl Fn(&str) -> Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(name) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|err: T::Err| ConfigError::Invalid {
            name,
            reason: err.to_string(),
            value,
        }),
    }
}

fn positive(get: &impl Fn(&str) -> Option<String>, name: &'static str, default: u32) -> Result<u32, ConfigError> {
    match parsed(get, name, default)? {
        0 => Err(ConfigError::Invalid {
            name,
            value: "0".to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        n => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<MigrationConfig, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        MigrationConfig::from_lookup(|name| vars.get(name).cloned())
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("SOURCE_REPOSITORY_NAME", "old-site"),
        ("SOURCE_WRITE_API_TOKEN", "src-token"),
        ("DESTINATION_REPOSITORY_NAME", "new-site"),
        ("DESTINATION_WRITE_API_TOKEN", "dst-token"),
        ("MIGRATION_API_KEY", "key"),
    ];

    fn with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        REQUIRED.iter().chain(extra).copied().collect()
    }

    #[test]
    fn applies_defaults() {
        let config = load(REQUIRED).unwrap();
        assert_eq!(config.out_dir, PathBuf::from("prismic-data"));
        assert_eq!(config.default_locale, None);
        assert_eq!(config.upload_delay, Duration::from_millis(1000));
        assert_eq!(config.migration_delay, Duration::from_millis(1500));
        assert_eq!(config.rewrite_mode, RewriteMode::Exact);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.pipeline_settings(), PipelineSettings::default());
    }

    #[test]
    fn reports_first_missing_variable() {
        let err = load(&REQUIRED[1..]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SOURCE_REPOSITORY_NAME")));
    }

    #[test]
    fn empty_value_counts_as_missing() {
        // later entries win when collected
        let err = load(&with(&[("SOURCE_WRITE_API_TOKEN", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SOURCE_WRITE_API_TOKEN")));
    }

    #[test]
    fn accepts_legacy_migration_token_name() {
        let vars: Vec<_> = with(&[("MIGRATION_DEMO_TOKEN", "demo")])
            .into_iter()
            .filter(|(k, _)| *k != "MIGRATION_API_KEY")
            .collect();
        assert_eq!(load(&vars).unwrap().migration_api_key, "demo");
    }

    #[test]
    fn parses_overrides() {
        let config = load(&with(&[
            ("OUT_DIR", "/tmp/stage"),
            ("DEFAULT_LOCALE", "fr-fr"),
            ("UPLOAD_DELAY_MS", "0"),
            ("REWRITE_MODE", "textual"),
            ("DOCUMENT_PAGE_SIZE", "20"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(config.out_dir, PathBuf::from("/tmp/stage"));
        assert_eq!(config.default_locale.as_deref(), Some("fr-fr"));
        assert_eq!(config.upload_delay, Duration::ZERO);
        assert_eq!(config.rewrite_mode, RewriteMode::Textual);
        assert_eq!(config.document_page_size, 20);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn rejects_unparseable_numbers_and_zero_page_size() {
        let err = load(&with(&[("UPLOAD_DELAY_MS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "UPLOAD_DELAY_MS", .. }));

        let err = load(&with(&[("ASSET_PAGE_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "ASSET_PAGE_SIZE", .. }));
    }

    #[test]
    fn rejects_unknown_rewrite_mode() {
        let err = load(&with(&[("REWRITE_MODE", "regex")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "REWRITE_MODE", .. }));
    }
}
