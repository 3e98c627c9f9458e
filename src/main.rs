use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod extract;
mod identify;
mod ocr;
mod pipeline;
mod preprocessing;
mod search;
mod server;
mod summarize;

#[derive(Parser, Debug)]
#[command(name = "medscan-server")]
#[command(about = "Medicine label scanner: OCR, web search and LLM summarization")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "MEDSCAN_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "MEDSCAN_PORT", default_value = "8080")]
    pub port: u16,

    /// OCR language (e.g., "eng", "deu", "fra")
    #[arg(long, env = "MEDSCAN_LANGUAGE", default_value = "eng")]
    pub language: String,

    /// Maximum upload size in bytes (default: 20MB)
    #[arg(long, env = "MEDSCAN_MAX_FILE_SIZE", default_value = "20971520")]
    pub max_file_size: usize,

    /// Path to tessdata directory (downloaded to a cache dir if not set)
    #[arg(long, env = "TESSDATA_PREFIX")]
    pub tessdata_path: Option<String>,

    /// Google Custom Search API key; search degrades to a fixed message without it
    #[arg(long, env = "GOOGLE_API_KEY")]
    pub google_api_key: Option<String>,

    /// Google Custom Search engine identifier (cx)
    #[arg(long, env = "GOOGLE_SEARCH_ENGINE_ID")]
    pub search_engine_id: Option<String>,

    /// Groq API key; summarization degrades to a fixed message without it
    #[arg(long, env = "GROQ_API_KEY")]
    pub groq_api_key: Option<String>,

    /// Chat model used for summarization
    #[arg(long, env = "MEDSCAN_LLM_MODEL", default_value = "llama3-70b-8192")]
    pub llm_model: String,

    /// Directory for per-request diagnostic images (disabled when unset)
    #[arg(long, env = "MEDSCAN_SCRATCH_DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Timeout in seconds for outbound search/LLM calls
    #[arg(long, env = "MEDSCAN_PROVIDER_TIMEOUT", default_value = "15")]
    pub provider_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from(args);

    tracing::info!("Starting medscan-server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Binding to {}:{}", config.host, config.port);

    server::run(config).await
}
