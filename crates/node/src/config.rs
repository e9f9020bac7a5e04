use anyhow::{ensure, Context};
use iptag_storage::DatabaseSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};


pub const DEFAULT_DATABASE_DIR: &str = "iptag.db";


#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database_dir: Option<PathBuf>,
    #[serde(default)]
    pub cache_size_mb: Option<usize>,
    #[serde(default)]
    pub wal_compression: Option<bool>,
    /// Short names for frequently used reasons
    #[serde(default)]
    pub reasons: BTreeMap<String, String>
}


impl Config {
    pub fn read(file: &Path) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_reader(
            std::io::BufReader::new(std::fs::File::open(file)?)
        )?;
        config.validate().context("invalid config")?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(size) = self.cache_size_mb {
            ensure!(size > 0, "cache size must be positive");
        }
        for (alias, reason) in self.reasons.iter() {
            ensure!(!alias.trim().is_empty(), "reason alias can't be blank");
            ensure!(!reason.is_empty(), "reason alias '{}' has an empty text", alias);
            ensure!(
                !self.reasons.contains_key(reason) || reason == alias,
                "reason alias '{}' expands to another alias '{}'",
                alias,
                reason
            );
        }
        Ok(())
    }

    pub fn database_settings(&self) -> DatabaseSettings {
        let mut settings = DatabaseSettings::default();
        if let Some(size) = self.cache_size_mb {
            settings = settings.with_cache_size(size * 1024 * 1024);
        }
        if let Some(yes) = self.wal_compression {
            settings = settings.with_wal_compression(yes);
        }
        settings
    }

    pub fn database_dir(&self, over: Option<&Path>) -> PathBuf {
        over.map(Path::to_path_buf)
            .or_else(|| self.database_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_DIR))
    }

    /// Expands a reason alias, any other text is taken as is.
    pub fn resolve_reason<'a>(&'a self, reason: &'a str) -> &'a str {
        self.reasons.get(reason).map(String::as_str).unwrap_or(reason)
    }
}
