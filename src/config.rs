use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CODE_FIELD: &str = "CODIGO";
pub const DEFAULT_RELATION_FIELD: &str = "BASE_OAE_ANTIGA";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub fields: FieldsConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Name of the environment variable holding the integration token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            token_env: default_token_env(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.notion.com".to_string()
}
fn default_api_version() -> String {
    "2022-06-28".to_string()
}
fn default_token_env() -> String {
    "NOTION_TOKEN".to_string()
}
fn default_page_size() -> u32 {
    100
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FieldsConfig {
    #[serde(default = "default_code_field")]
    pub code: String,
    #[serde(default = "default_relation_field")]
    pub relation: String,
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            code: default_code_field(),
            relation: default_relation_field(),
        }
    }
}

fn default_code_field() -> String {
    DEFAULT_CODE_FIELD.to_string()
}
fn default_relation_field() -> String {
    DEFAULT_RELATION_FIELD.to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RunConfig {
    #[serde(default)]
    pub allow_partial: bool,
    #[serde(default = "default_unresolved_preview")]
    pub unresolved_preview: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            allow_partial: false,
            unresolved_preview: default_unresolved_preview(),
        }
    }
}

fn default_unresolved_preview() -> usize {
    20
}

impl Config {
    /// Built-in defaults, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Check cross-field constraints. Called by [`load_config`] and again
    /// after command-line overrides are applied.
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.store.page_size) {
            anyhow::bail!("store.page_size must be in [1, 100]");
        }
        if self.store.timeout_secs == 0 {
            anyhow::bail!("store.timeout_secs must be > 0");
        }
        let url = &self.store.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!(
                "store.base_url must start with http:// or https:// (got '{}')",
                self.store.base_url
            );
        }
        if self.store.token_env.trim().is_empty() {
            anyhow::bail!("store.token_env must not be empty");
        }
        if self.fields.code.trim().is_empty() {
            anyhow::bail!("fields.code must not be empty");
        }
        if self.fields.relation.trim().is_empty() {
            anyhow::bail!("fields.relation must not be empty");
        }
        if self.fields.code == self.fields.relation {
            anyhow::bail!(
                "fields.code and fields.relation must differ (both are '{}')",
                self.fields.code
            );
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn empty_file_uses_defaults() {
        let f = write_config("");
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.fields.code, "CODIGO");
        assert_eq!(cfg.fields.relation, "BASE_OAE_ANTIGA");
        assert_eq!(cfg.store.page_size, 100);
        assert_eq!(cfg.store.token_env, "NOTION_TOKEN");
        assert!(!cfg.run.allow_partial);
        assert_eq!(cfg.run.unresolved_preview, 20);
    }

    #[test]
    fn overrides_are_read() {
        let f = write_config(
            r#"
[store]
base_url = "http://localhost:9999"
page_size = 25

[fields]
code = "KEY"
relation = "PARENT"

[run]
allow_partial = true
"#,
        );
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.store.base_url, "http://localhost:9999");
        assert_eq!(cfg.store.page_size, 25);
        assert_eq!(cfg.fields.code, "KEY");
        assert_eq!(cfg.fields.relation, "PARENT");
        assert!(cfg.run.allow_partial);
    }

    #[test]
    fn rejects_invalid_values() {
        for bad in [
            "[store]\npage_size = 0",
            "[store]\npage_size = 101",
            "[store]\ntimeout_secs = 0",
            "[store]\nbase_url = \"ftp://x\"",
            "[fields]\ncode = \"\"",
            "[fields]\ncode = \"A\"\nrelation = \"A\"",
        ] {
            let f = write_config(bad);
            assert!(load_config(f.path()).is_err(), "accepted: {}", bad);
        }
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Path::new("/definitely/not/here.toml")).is_err());
    }
}
