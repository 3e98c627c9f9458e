use crate::Args;
use std::path::PathBuf;

/// Server configuration
///
/// Provider credentials are optional on purpose: a missing search or LLM key
/// degrades that stage to a fixed message instead of failing image
/// processing.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub language: String,
    pub max_file_size: usize,
    pub tessdata_path: Option<String>,
    pub google_api_key: Option<String>,
    pub search_engine_id: Option<String>,
    pub groq_api_key: Option<String>,
    pub llm_model: String,
    pub scratch_dir: Option<PathBuf>,
    pub provider_timeout_secs: u64,
}

impl Config {
    /// Both values the search provider needs, or None if either is absent.
    pub fn search_credentials(&self) -> Option<(String, String)> {
        match (&self.google_api_key, &self.search_engine_id) {
            (Some(key), Some(cx)) => Some((key.clone(), cx.clone())),
            _ => None,
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            language: args.language,
            max_file_size: args.max_file_size,
            tessdata_path: args.tessdata_path,
            google_api_key: args.google_api_key,
            search_engine_id: args.search_engine_id,
            groq_api_key: args.groq_api_key,
            llm_model: args.llm_model,
            scratch_dir: args.scratch_dir,
            provider_timeout_secs: args.provider_timeout_secs,
        }
    }
}
