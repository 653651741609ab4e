use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sentiflow_classifier::ClassifierClient;
use sentiflow_core::Classifier;
use sentiflow_service::{serve, AppState, ServiceConfig, DEFAULT_CONFIG_PATH};

fn main() -> Result<()> {
    init_tracing();
    let config_path =
        std::env::var("SENTIFLOW_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = ServiceConfig::load(Path::new(&config_path))?;
    let addr = config.bind_addr()?;

    // The remote backend holds a blocking HTTP client, which must be built
    // and dropped outside the async runtime.
    let classifier: Option<Arc<dyn Classifier>> =
        match ClassifierClient::from_config(&config.classifier) {
            Ok(client) => {
                info!(provider = client.provider().as_str(), "classifier loaded");
                Some(Arc::new(client))
            }
            Err(err) => {
                error!(
                    error = %err,
                    "classifier failed to load; analysis requests will be rejected"
                );
                None
            }
        };
    let state = Arc::new(AppState::new(classifier, config.analyzer_config()?));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let result = runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        serve(listener, Arc::clone(&state)).await
    });
    drop(runtime);
    result
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
