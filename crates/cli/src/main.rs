mod cli;
mod config;
mod input;
mod logging;
mod render;
mod session;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use reqwest::blocking::Client as HttpClient;
use tracing::info;

use sentiflow_client::{Update, WebSocketTransport};
use sentiflow_core::{AnalyzeRequest, ErrorBody, Filter, ResultsStore, TextRequest, TextResponse};

use crate::cli::{Cli, Command};
use crate::config::{load_config, Endpoints, DEFAULT_CONFIG};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = if cli.verbose {
        true
    } else {
        logging::env_flag()
    };
    logging::init(verbose);
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let file_config = load_config(&config_path)?;
    let endpoints = file_config.endpoints(
        cli.server.as_deref(),
        std::env::var("SENTIFLOW_SERVER").ok(),
    );

    match cli.command {
        Command::Columns { file, delimiter } => {
            let delimiter = file_config.delimiter(delimiter.as_deref())?;
            let data = input::read_dataset(&file)?;
            for column in input::columns(&data, delimiter)? {
                println!("{column}");
            }
            Ok(())
        }
        Command::Analyze {
            file,
            column,
            filter,
            page,
            export,
            out_dir,
            delimiter,
        } => {
            let delimiter = file_config.delimiter(delimiter.as_deref())?;
            let filter = Filter::from_str(&filter).ok_or_else(|| {
                anyhow!("unknown filter {filter}; expected all, positive, negative or neutral")
            })?;
            analyze(
                &endpoints,
                &file,
                delimiter,
                column,
                filter,
                page,
                export.then_some(out_dir),
            )
        }
        Command::Text { text } => classify_text(&endpoints, text),
    }
}

fn analyze(
    endpoints: &Endpoints,
    file: &Path,
    delimiter: u8,
    column: String,
    filter: Filter,
    page: usize,
    export_dir: Option<PathBuf>,
) -> Result<()> {
    let data = input::read_dataset(file)?;
    input::require_column(&data, delimiter, &column)?;
    let request = AnalyzeRequest::new(column, data);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let transport = WebSocketTransport::new(endpoints.ws_url.clone());
    info!(server = %endpoints.ws_url, "submitting job");
    let results = runtime.block_on(session::run_job(transport, &request, print_update))?;

    let mut store = ResultsStore::new();
    store.set_results(results);
    store.set_filter(filter);
    store.set_page(page)?;
    println!("{}", render::summary(&store.counts_by_label()));
    print!("{}", render::page_table(filter, &store.current_page()));

    if let Some(dir) = export_dir {
        let csv = store.export_csv(filter)?;
        fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
        let path = dir.join(filter.export_filename());
        fs::write(&path, csv).with_context(|| format!("failed to write {}", path.display()))?;
        println!("exported {} rows to {}", store.filtered_view(filter).len(), path.display());
    }
    Ok(())
}

fn print_update(update: &Update) {
    let mut stderr = io::stderr();
    let _ = match update {
        Update::Info(message) => writeln!(stderr, "{message}"),
        Update::Progress(percent) => write!(stderr, "\r{}", render::progress_bar(*percent)),
        Update::Completed { .. } => writeln!(stderr),
        Update::Connected | Update::Closed | Update::Failed(_) => Ok(()),
    };
}

fn classify_text(endpoints: &Endpoints, text: String) -> Result<()> {
    if text.trim().is_empty() {
        bail!("text must not be empty");
    }
    let url = format!("{}/analyze-text/", endpoints.http_url);
    let response = HttpClient::new()
        .post(&url)
        .json(&TextRequest { text })
        .send()
        .with_context(|| format!("could not reach {url}"))?;
    let status = response.status();
    if !status.is_success() {
        let message = response
            .json::<ErrorBody>()
            .map(|body| body.error)
            .unwrap_or_else(|_| status.to_string());
        bail!("server returned {status}: {message}");
    }
    let body: TextResponse = response.json().context("invalid response body")?;
    println!("{}", body.sentiment);
    Ok(())
}
