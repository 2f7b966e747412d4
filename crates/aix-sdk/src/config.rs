//! Configuration for the portal SDK

use crate::error::{Result, SdkError};
use crate::votes::VoteTable;
use aix_store_client::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default directory for device-local data
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("1aix")
}

/// Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Directory for device-local data (vote ledger, categories)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Table holding shared like/dislike counters
    #[serde(default = "default_vote_table")]
    pub vote_table: String,

    /// Conflict column of `vote_table`
    #[serde(default = "default_vote_key_column")]
    pub vote_key_column: String,

    /// Smartphone catalog table
    #[serde(default = "default_catalog_table")]
    pub catalog_table: String,

    /// Comments table
    #[serde(default = "default_comment_table")]
    pub comment_table: String,

    /// Hosted store connection
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_vote_table() -> String {
    VoteTable::default().table
}

fn default_vote_key_column() -> String {
    VoteTable::default().key_column
}

fn default_catalog_table() -> String {
    "smartphones".to_string()
}

fn default_comment_table() -> String {
    "comments".to_string()
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            vote_table: default_vote_table(),
            vote_key_column: default_vote_key_column(),
            catalog_table: default_catalog_table(),
            comment_table: default_comment_table(),
            store: StoreConfig::default(),
        }
    }
}

impl PortalConfig {
    /// Load config from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| SdkError::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        toml::from_str(&content).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// Save config to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override fields from `AIX_STORE_URL`, `AIX_STORE_ANON_KEY` and `AIX_DATA_DIR`
    pub fn apply_env(self) -> Self {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    fn apply_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = var("AIX_STORE_URL").filter(|v| !v.is_empty()) {
            self.store.base_url = url;
        }
        if let Some(key) = var("AIX_STORE_ANON_KEY").filter(|v| !v.is_empty()) {
            self.store.anon_key = Some(key);
        }
        if let Some(dir) = var("AIX_DATA_DIR").filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        self
    }

    /// Where votes are aggregated remotely
    pub fn vote_table(&self) -> VoteTable {
        VoteTable {
            table: self.vote_table.clone(),
            key_column: self.vote_key_column.clone(),
        }
    }

    /// Path of the local storage file
    pub fn local_storage_path(&self) -> PathBuf {
        self.data_dir.join("local-storage.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: PortalConfig = toml::from_str(
            r#"
            comment_table = "article_comments"

            [store]
            base_url = "https://project.example.co"
            "#,
        )
        .unwrap();

        assert_eq!(config.comment_table, "article_comments");
        assert_eq!(config.catalog_table, "smartphones");
        assert_eq!(config.store.base_url, "https://project.example.co");
        assert_eq!(config.store.timeout_secs, 30);
        assert_eq!(config.vote_table().key_column, "target_id");
    }

    #[test]
    fn test_env_overrides() {
        let config = PortalConfig::default().apply_vars(|name| match name {
            "AIX_STORE_URL" => Some("https://env.example.co".to_string()),
            "AIX_STORE_ANON_KEY" => Some(String::new()),
            "AIX_DATA_DIR" => Some("/tmp/1aix".to_string()),
            _ => None,
        });

        assert_eq!(config.store.base_url, "https://env.example.co");
        assert_eq!(config.store.anon_key, None);
        assert_eq!(config.local_storage_path(), PathBuf::from("/tmp/1aix/local-storage.json"));
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("portal.toml");

        let mut config = PortalConfig::default();
        config.vote_table = "article_votes".to_string();
        config.save(&path).unwrap();

        let loaded = PortalConfig::load(&path).unwrap();
        assert_eq!(loaded.vote_table, "article_votes");
        let missing = PortalConfig::load(temp.path().join("missing.toml"));
        assert!(matches!(missing, Err(SdkError::Config(_))));
    }
}
