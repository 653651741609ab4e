use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use sentiflow_classifier::ClassifierConfig;
use sentiflow_core::tabular;
use sentiflow_core::{AnalyzerConfig, DEFAULT_BATCH_SIZE};

pub const DEFAULT_CONFIG_PATH: &str = "sentiflow.toml";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerSection,
    pub analyzer: AnalyzerSection,
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind_addr: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyzerSection {
    pub batch_size: usize,
    pub delimiter: String,
}

impl Default for AnalyzerSection {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            delimiter: ",".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Reads `path` (defaults when absent) and applies the process environment.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = load_config(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(size) = lookup("SENTIFLOW_BATCH_SIZE") {
            self.analyzer.batch_size = size
                .trim()
                .parse()
                .with_context(|| format!("invalid SENTIFLOW_BATCH_SIZE {size:?}"))?;
        }
        if let Some(provider) = lookup("SENTIFLOW_CLASSIFIER") {
            self.classifier.provider = provider;
        }
        if let Some(endpoint) = lookup("SENTIFLOW_CLASSIFIER_URL") {
            self.classifier.endpoint = Some(endpoint);
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind_addr
            .parse()
            .with_context(|| format!("invalid bind address {}", self.server.bind_addr))
    }

    pub fn analyzer_config(&self) -> Result<AnalyzerConfig> {
        if self.analyzer.batch_size == 0 {
            return Err(anyhow!("analyzer.batch_size must be at least 1"));
        }
        Ok(AnalyzerConfig {
            batch_size: self.analyzer.batch_size,
            delimiter: parse_delimiter(&self.analyzer.delimiter)?,
        })
    }
}

pub fn load_config(path: &Path) -> Result<ServiceConfig> {
    if !path.exists() {
        return Ok(ServiceConfig::default());
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

fn parse_delimiter(value: &str) -> Result<u8> {
    tabular::parse_delimiter(value).ok_or_else(|| {
        anyhow!(format!(
            "delimiter must be a single ASCII character, got {value:?}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.analyzer.batch_size, 10);
        assert_eq!(config.classifier.provider, "lexicon");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[analyzer]\nbatch_size = 25\ndelimiter = \";\"\n\n[classifier]\nprovider = \"remote\"\nendpoint = \"http://localhost:9000/classify\""
        )
        .unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.bind_addr, DEFAULT_BIND_ADDR);
        let analyzer = config.analyzer_config().unwrap();
        assert_eq!(analyzer.batch_size, 25);
        assert_eq!(analyzer.delimiter, b';');
        assert_eq!(config.classifier.provider, "remote");
        assert_eq!(config.classifier.max_retries, 4);
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = ServiceConfig::default();
        config
            .apply_overrides(env(&[
                ("BIND_ADDR", "127.0.0.1:9100"),
                ("SENTIFLOW_BATCH_SIZE", "3"),
                ("SENTIFLOW_CLASSIFIER_URL", "http://models/sentiment"),
            ]))
            .unwrap();
        assert_eq!(config.bind_addr().unwrap().port(), 9100);
        assert_eq!(config.analyzer_config().unwrap().batch_size, 3);
        assert_eq!(
            config.classifier.endpoint.as_deref(),
            Some("http://models/sentiment")
        );
    }

    #[test]
    fn bad_values_are_rejected() {
        let mut config = ServiceConfig::default();
        assert!(config
            .apply_overrides(env(&[("SENTIFLOW_BATCH_SIZE", "ten")]))
            .is_err());

        config.analyzer.batch_size = 0;
        assert!(config.analyzer_config().is_err());

        config.analyzer.batch_size = 10;
        config.analyzer.delimiter = "::".to_string();
        assert!(config.analyzer_config().is_err());

        config.analyzer.delimiter = "\\t".to_string();
        assert_eq!(config.analyzer_config().unwrap().delimiter, b'\t');
    }
}
