use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::error::ImportError;

pub const DEFAULT_CONFIG_FILE: &str = "inat-import.json";
pub const DEFAULT_API_BASE: &str = "https://api.inaturalist.org/v1";
pub const DEFAULT_AUTH_BASE: &str = "https://www.inaturalist.org";
pub const DEFAULT_PAGE_DELAY_MS: u64 = 1000;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub app_secret: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: Option<Utf8PathBuf>,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub auth_base: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub page_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub app_id: String,
    pub app_secret: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_base: String,
    pub auth_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            auth_base: DEFAULT_AUTH_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub credentials: Credentials,
    pub database: Utf8PathBuf,
    pub endpoints: Endpoints,
    pub timeout: Option<Duration>,
    pub page_delay: Duration,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, ImportError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Err(ImportError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ImportError::ConfigRead(config_path.clone()))?;
        let mut config: Config = serde_json::from_str(&content)
            .map_err(|err| ImportError::ConfigParse(err.to_string()))?;

        if let Some(secret) = env_override("INAT_APP_SECRET") {
            config.app_secret = Some(secret);
        }
        if let Some(password) = env_override("INAT_PASSWORD") {
            config.password = Some(password);
        }

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, ImportError> {
        let credentials = Credentials {
            app_id: required(config.app_id, "app_id")?,
            app_secret: required(config.app_secret, "app_secret")?,
            username: required(config.username, "username")?,
            password: required(config.password, "password")?,
        };

        let database = match config.database {
            Some(path) => path,
            None => default_database_path()?,
        };

        let endpoints = Endpoints {
            api_base: trim_base(config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)),
            auth_base: trim_base(config.auth_base.as_deref().unwrap_or(DEFAULT_AUTH_BASE)),
        };

        Ok(ResolvedConfig {
            credentials,
            database,
            endpoints,
            timeout: config.timeout_secs.map(Duration::from_secs),
            page_delay: Duration::from_millis(
                config.page_delay_ms.unwrap_or(DEFAULT_PAGE_DELAY_MS),
            ),
        })
    }
}

pub fn default_database_path() -> Result<Utf8PathBuf, ImportError> {
    BaseDirs::new()
        .and_then(|dirs| {
            Utf8PathBuf::from_path_buf(
                dirs.data_dir()
                    .join("inat-barcode-importer")
                    .join("observations.sqlite"),
            )
            .ok()
        })
        .ok_or_else(|| ImportError::Database("unable to resolve data directory".to_string()))
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ImportError> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or(ImportError::MissingCredential(name))
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn trim_base(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}
