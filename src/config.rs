use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::portal::forms::ImapDefaults;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const API_URL_ENV: &str = "MAIL_PORTAL_API_URL";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the session token is persisted.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub download_dir: Option<String>,
    pub token_backend: Option<TokenBackend>,
    pub request_timeout_secs: Option<u64>,
    pub default_imap_server: Option<String>,
    pub default_imap_port: Option<u16>,
}

impl Config {
    pub fn template() -> Self {
        Self {
            api_base_url: Some(DEFAULT_API_BASE_URL.to_string()),
            download_dir: None,
            token_backend: Some(TokenBackend::File),
            request_timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            default_imap_server: Some(ImapDefaults::default().server),
            default_imap_port: Some(ImapDefaults::default().port),
        }
    }

    /// Base url precedence: `--api-url`, then `MAIL_PORTAL_API_URL`, then the file.
    pub fn api_base_url(&self, cli_override: Option<&str>) -> String {
        let env = std::env::var(API_URL_ENV).ok();
        pick_api_base_url(cli_override, env.as_deref(), self.api_base_url.as_deref())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn token_backend(&self) -> TokenBackend {
        self.token_backend.unwrap_or_default()
    }

    pub fn imap_defaults(&self) -> ImapDefaults {
        let fallback = ImapDefaults::default();
        ImapDefaults {
            server: self
                .default_imap_server
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(fallback.server),
            port: self
                .default_imap_port
                .filter(|p| *p != 0)
                .unwrap_or(fallback.port),
        }
    }
}

fn pick_api_base_url(cli: Option<&str>, env: Option<&str>, file: Option<&str>) -> String {
    [cli, env, file]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_API_BASE_URL)
        .to_string()
}

pub fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config dir available"))?
        .join("mail_portal"))
}

pub fn config_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("config.toml");
    Ok(p)
}

pub fn log_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("mail_portal.log");
    Ok(p)
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

/// Read the config at `path`. A missing file is replaced by the template, which
/// is then used as-is.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        let sample = Config::template();
        let tom = toml::to_string_pretty(&sample)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, tom)?;
        info!("created template config at {}", path.display());
        return Ok(sample);
    }
    let s = fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&s)?;
    Ok(cfg)
}

/// Configured download dir, else the platform's, else the working directory.
pub fn resolve_download_dir(cfg: &Config) -> PathBuf {
    if let Some(p) = cfg.download_dir.as_deref().filter(|p| !p.trim().is_empty()) {
        PathBuf::from(p)
    } else {
        dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
    }
}
