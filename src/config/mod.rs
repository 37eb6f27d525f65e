use std::env;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::search::{SortKey, SortOrder, SortSpec};
use crate::storage::DEFAULT_HISTORY_KEY;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "Dreamshelf";
const APP_NAME: &str = "dreamshelf";

pub const CONFIG_ENV: &str = "DREAMSHELF_CONFIG";
pub const DATA_ENV: &str = "DREAMSHELF_DATA";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load(&self.paths)?;
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load(&self.paths)?;
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let override_data = env::var(DATA_ENV).ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let data_dir = override_data.unwrap_or_else(|| project_dirs.data_dir().to_path_buf());

        Ok(Self::rooted(config_dir, config_file, data_dir))
    }

    /// Places the database inside `data_dir`.
    pub fn rooted(config_dir: PathBuf, config_file: PathBuf, data_dir: PathBuf) -> Self {
        let database_path = data_dir.join("storage.db");
        Self {
            config_dir,
            config_file,
            data_dir,
            database_path,
        }
    }

    pub fn under(root: &Path) -> Self {
        let config_dir = root.join("config");
        let config_file = config_dir.join("config.toml");
        Self::rooted(config_dir, config_file, root.join("data"))
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.data_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub collection: CollectionConfig,
    pub notice: NoticeConfig,
    pub storage: StorageOptions,
    pub ai: AiTemplate,
}

impl AppConfig {
    fn post_load(&mut self, paths: &ConfigPaths) -> Result<()> {
        self.storage
            .resolve(paths)
            .context("resolving storage paths")?;
        if self.storage.history_key.trim().is_empty() {
            tracing::warn!("empty storage.history_key in config, falling back to default");
            self.storage.history_key = DEFAULT_HISTORY_KEY.to_string();
        }
        if self.collection.preview_chars == 0 {
            tracing::warn!("collection.preview_chars must be positive, using default");
            self.collection.preview_chars = CollectionConfig::default().preview_chars;
        }
        if self.notice.duration_ms == 0 {
            tracing::warn!("notice.duration_ms of 0 would hide every notice, using default");
            self.notice.duration_ms = NoticeConfig::default().duration_ms;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    pub default_sort: SortSpec,
    pub search_debounce_ms: u64,
    /// Characters of content shown per row before truncation.
    pub preview_chars: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            default_sort: SortSpec {
                field: SortKey::Time,
                direction: SortOrder::Desc,
            },
            search_debounce_ms: 300,
            preview_chars: 80,
        }
    }
}

impl CollectionConfig {
    pub fn debounce_duration(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeConfig {
    pub duration_ms: u64,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self { duration_ms: 2000 }
    }
}

impl NoticeConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    #[serde(skip)]
    pub database_path: PathBuf,
    pub history_key: String,
    pub wal_autocheckpoint: u32,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            database_path: PathBuf::new(),
            history_key: DEFAULT_HISTORY_KEY.to_string(),
            wal_autocheckpoint: 1000,
        }
    }
}

impl StorageOptions {
    fn resolve(&mut self, paths: &ConfigPaths) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            self.database_path = paths.database_path.clone();
        }
        Ok(())
    }
}

/// Credentials template for an AI text service. Carried in the config file for
/// deployments that fill it in; nothing in this crate issues requests with it.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTemplate {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

impl Default for AiTemplate {
    fn default() -> Self {
        Self {
            endpoint: "https://api.example.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: String::new(),
        }
    }
}

impl AiTemplate {
    pub fn is_configured(&self) -> bool {
        !self.endpoint.trim().is_empty()
            && !self.api_key.trim().is_empty()
            && !self.model.trim().is_empty()
    }
}

impl fmt::Debug for AiTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = if self.api_key.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };
        f.debug_struct("AiTemplate")
            .field("endpoint", &self.endpoint)
            .field("api_key", &key)
            .field("model", &self.model)
            .finish()
    }
}
