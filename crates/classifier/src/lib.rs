use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

use sentiflow_core::{Classifier, ClassifierError, SentimentLabel};

mod lexicon;
mod remote;

pub use lexicon::LexiconClassifier;
pub use remote::{map_label, parse_predictions, RemoteClassifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierProvider {
    Lexicon,
    Remote,
}

impl ClassifierProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierProvider::Lexicon => "lexicon",
            ClassifierProvider::Remote => "remote",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "lexicon" | "local" => Some(ClassifierProvider::Lexicon),
            "remote" | "http" => Some(ClassifierProvider::Remote),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub provider: String,
    pub endpoint: Option<String>,
    /// Name of the environment variable holding the bearer token.
    pub api_key_env: Option<String>,
    pub max_retries: usize,
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: "lexicon".to_string(),
            endpoint: None,
            api_key_env: None,
            max_retries: 4,
            timeout_secs: 60,
        }
    }
}

#[derive(Clone)]
enum ClassifierBackend {
    Lexicon(LexiconClassifier),
    Remote(RemoteClassifier),
}

#[derive(Clone)]
pub struct ClassifierClient {
    backend: ClassifierBackend,
}

impl ClassifierClient {
    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        let provider = ClassifierProvider::from_str(&config.provider)
            .ok_or_else(|| anyhow!(format!("unknown classifier provider {}", config.provider)))?;
        let backend = match provider {
            ClassifierProvider::Lexicon => ClassifierBackend::Lexicon(LexiconClassifier::new()),
            ClassifierProvider::Remote => {
                let endpoint = config.endpoint.clone().ok_or_else(|| {
                    anyhow!("classifier endpoint is required for the remote provider")
                })?;
                let api_key = match &config.api_key_env {
                    Some(var) => Some(read_api_key(var)?),
                    None => None,
                };
                ClassifierBackend::Remote(RemoteClassifier::new(
                    endpoint,
                    api_key,
                    config.max_retries,
                    Duration::from_secs(config.timeout_secs.max(1)),
                )?)
            }
        };
        Ok(Self { backend })
    }

    pub fn lexicon() -> Self {
        Self {
            backend: ClassifierBackend::Lexicon(LexiconClassifier::new()),
        }
    }

    pub fn provider(&self) -> ClassifierProvider {
        match &self.backend {
            ClassifierBackend::Lexicon(_) => ClassifierProvider::Lexicon,
            ClassifierBackend::Remote(_) => ClassifierProvider::Remote,
        }
    }
}

impl Classifier for ClassifierClient {
    fn classify(
        &self,
        batch: &[String],
    ) -> std::result::Result<Vec<SentimentLabel>, ClassifierError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        match &self.backend {
            ClassifierBackend::Lexicon(lexicon) => lexicon.classify(batch),
            ClassifierBackend::Remote(remote) => remote.classify(batch),
        }
    }
}

fn read_api_key(var: &str) -> Result<String> {
    let value = env::var(var).map_err(|_| anyhow!(format!("{var} is not set")))?;
    if value.trim().is_empty() {
        return Err(anyhow!(format!("{var} is empty")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_round_trip() {
        for provider in [ClassifierProvider::Lexicon, ClassifierProvider::Remote] {
            assert_eq!(ClassifierProvider::from_str(provider.as_str()), Some(provider));
        }
        assert_eq!(ClassifierProvider::from_str("onnx"), None);
    }

    #[test]
    fn default_config_builds_lexicon_client() {
        let client = ClassifierClient::from_config(&ClassifierConfig::default()).unwrap();
        assert_eq!(client.provider(), ClassifierProvider::Lexicon);
    }

    #[test]
    fn remote_provider_requires_endpoint() {
        let config = ClassifierConfig {
            provider: "remote".to_string(),
            ..ClassifierConfig::default()
        };
        let err = ClassifierClient::from_config(&config).err().unwrap();
        assert!(err.to_string().contains("endpoint"));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let config = ClassifierConfig {
            provider: "magic".to_string(),
            ..ClassifierConfig::default()
        };
        assert!(ClassifierClient::from_config(&config).is_err());
    }

    #[test]
    fn config_fills_missing_fields_with_defaults() {
        let config: ClassifierConfig = serde_json::from_value(serde_json::json!({
            "provider": "remote",
            "endpoint": "http://127.0.0.1:9000/classify",
            "max_retries": 2
        }))
        .unwrap();
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.timeout_secs, 60);
    }
}
