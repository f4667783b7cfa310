//! Command-line uploader.
//!
//! Sends a file or stdin to an HTTP endpoint, logging byte-level progress.
//!
//! ```text
//! progressive-upload http://127.0.0.1:8080/upload --file big.bin
//! cat log.txt | progressive-upload http://127.0.0.1:8080/logs --stdin --json
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use http::Method;
use url::Url;

use progressive_upload::config::{load_config, UploadConfig};
use progressive_upload::lifecycle::cancel_on_ctrl_c;
use progressive_upload::observability::{logging, metrics};
use progressive_upload::{BodySource, ProgressSnapshot, TransferRequest, Uploader};

#[derive(Parser)]
#[command(name = "progressive-upload")]
#[command(about = "Upload a body over HTTP with byte-level progress", long_about = None)]
#[command(group(ArgGroup::new("body").required(true).args(["file", "stdin"])))]
struct Cli {
    /// Target URL (http only).
    url: String,

    /// File to send (length-delimited).
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Send standard input (chunked).
    #[arg(long)]
    stdin: bool,

    /// HTTP method.
    #[arg(short = 'X', long, default_value = "POST")]
    method: String,

    /// Extra header, `Name: value`. Repeatable.
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Override `transfer.max_write_size`.
    #[arg(long)]
    max_write_size: Option<usize>,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the final summary as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => UploadConfig::default(),
    };
    if let Some(size) = cli.max_write_size {
        config.transfer.max_write_size = size;
        config.transfer.stream_chunk_size = config.transfer.stream_chunk_size.min(size);
    }
    progressive_upload::config::validate_config(&config)
        .map_err(progressive_upload::config::ConfigError::Validation)?;

    logging::init(&config.observability.log_filter);

    tracing::info!(
        max_write_size = config.transfer.max_write_size,
        connect_timeout_secs = config.timeouts.connect_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse::<SocketAddr>() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let body = match &cli.file {
        Some(path) => BodySource::file(path).await?,
        None => BodySource::stream(tokio::io::stdin()),
    };

    let method = Method::from_bytes(cli.method.as_bytes())
        .map_err(|_| progressive_upload::http::RequestError::InvalidMethod(cli.method.clone()))?;
    let mut request = TransferRequest::new(method, Url::parse(&cli.url)?, body)?;
    for line in &cli.headers {
        request.headers_mut().append_line(line)?;
    }

    let uploader = Uploader::new(config);
    let pending = uploader.start(request, |snapshot: ProgressSnapshot| {
        tracing::info!("{}", snapshot);
    });
    tokio::spawn(cancel_on_ctrl_c(pending.cancel_handle()));

    let ack = pending.finish().await?;

    if cli.json {
        let out = serde_json::json!({
            "status": ack.status.as_u16(),
            "summary": ack.summary,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "{} {} bytes ({}) -> {}",
            ack.summary.transfer_id, ack.summary.bytes_sent, ack.summary.framing, ack.status
        );
    }

    if !ack.status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
