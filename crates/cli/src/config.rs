use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use sentiflow_client::DEFAULT_WS_URL;
use sentiflow_core::tabular::{self, DEFAULT_DELIMITER};

pub const DEFAULT_CONFIG: &str = "sentiflow.toml";
pub const DEFAULT_HTTP_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub client: ClientSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientSection {
    pub server_url: Option<String>,
    pub http_url: Option<String>,
    /// Must match the service's `[analyzer] delimiter`.
    pub delimiter: Option<String>,
}

/// Where the client talks to, after flags, environment and file are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub ws_url: String,
    pub http_url: String,
}

impl AppConfig {
    /// Flag, then `SENTIFLOW_SERVER`, then the file, then the built-in default.
    pub fn endpoints(&self, flag: Option<&str>, env_server: Option<String>) -> Endpoints {
        let ws_url = flag
            .map(str::to_string)
            .or(env_server)
            .or_else(|| self.client.server_url.clone())
            .unwrap_or_else(|| DEFAULT_WS_URL.to_string());
        let http_url = self
            .client
            .http_url
            .clone()
            .or_else(|| http_base_for(&ws_url))
            .unwrap_or_else(|| DEFAULT_HTTP_URL.to_string());
        Endpoints {
            ws_url,
            http_url: http_url.trim_end_matches('/').to_string(),
        }
    }

    /// Flag, then `[client] delimiter`, then `,`.
    pub fn delimiter(&self, flag: Option<&str>) -> Result<u8> {
        match flag.or(self.client.delimiter.as_deref()) {
            Some(value) => tabular::parse_delimiter(value).ok_or_else(|| {
                anyhow!(format!(
                    "delimiter must be a single ASCII character, got {value:?}"
                ))
            }),
            None => Ok(DEFAULT_DELIMITER),
        }
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&contents).map_err(|e| anyhow!("invalid config: {e}"))
}

/// `ws://host:port/...` maps to `http://host:port`, `wss` to `https`.
fn http_base_for(ws_url: &str) -> Option<String> {
    let (scheme, rest) = ws_url.split_once("://")?;
    let scheme = match scheme {
        "ws" => "http",
        "wss" => "https",
        _ => return None,
    };
    let authority = rest.split('/').next().filter(|host| !host.is_empty())?;
    Some(format!("{scheme}://{authority}"))
}
