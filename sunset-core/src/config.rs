use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use crate::provider::ProviderId;

/// Credentials for one weather provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Settings for the HTTP front-end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: SocketAddr,
    /// Where uploaded photos are written.
    pub uploads_dir: PathBuf,
    pub max_upload_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from(([127, 0, 0, 1], 5003)),
            uploads_dir: PathBuf::from("static/uploads"),
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Settings shared by every outbound HTTP call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: "sunset_predictor".to_string(),
        }
    }
}

/// Everything `sunset` reads from `config.toml`.
///
/// ```toml
/// default_provider = "openweather"
///
/// [providers.openweather]
/// api_key = "..."
///
/// [server]
/// address = "0.0.0.0:5003"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub default_provider: Option<String>,
    /// Keyed by [`ProviderId::as_str`].
    pub providers: HashMap<String, ProviderConfig>,
    pub server: ServerConfig,
    pub http: HttpConfig,
}

impl Config {
    /// The configured default provider, parsed.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        match self.default_provider.as_deref() {
            Some(name) => ProviderId::try_from(name),
            None => Err(anyhow!(
                "No default provider configured.\n\
                 Hint: run `sunset configure <provider>` (e.g. `sunset configure openweather`) first."
            )),
        }
    }

    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Load from the platform config file; a missing file means defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Write as pretty TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let rendered =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;
        fs::write(path, rendered)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    pub fn config_file_path() -> Result<PathBuf> {
        ProjectDirs::from("dev", "sunset-predictor", "sunset")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Overlay API keys found in the environment (`OPENWEATHER_API_KEY`,
    /// `WEATHERAPI_API_KEY`) on top of the file configuration.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for id in ProviderId::all() {
            if let Some(key) = lookup(id.api_key_env()).filter(|k| !k.trim().is_empty()) {
                tracing::debug!(provider = %id, "using API key from environment");
                self.upsert_provider_api_key(*id, key.trim().to_string());
            }
        }
    }

    /// Store a key for `id`; the first provider given a key becomes the default.
    pub fn upsert_provider_api_key(&mut self, id: ProviderId, api_key: String) {
        self.providers
            .insert(id.as_str().to_string(), ProviderConfig { api_key });
        self.default_provider
            .get_or_insert_with(|| id.as_str().to_string());
    }

    pub fn provider_api_key(&self, id: ProviderId) -> Option<&str> {
        self.providers
            .get(id.as_str())
            .map(|provider| provider.api_key.as_str())
    }
}
