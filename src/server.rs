use crate::config::Config;
use crate::error::ScanError;
use crate::ocr::tesseract::TesseractRecognizer;
use crate::pipeline::{ScanPipeline, ScanReport};
use crate::search::{GoogleSearch, InfoRetriever};
use crate::summarize::{GroqChat, Summarizer};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ScanPipeline>,
    pub config: Arc<Config>,
}

/// Scan response shared by the upload and camera endpoints
#[derive(Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    pub extracted_text: String,
    /// Base64-encoded PNG with token annotations
    pub processed_image: String,
    pub medicine_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_response: Option<String>,
    pub preprocessing_degraded: bool,
}

#[derive(Deserialize)]
pub struct CameraRequest {
    /// Data URL ("data:image/jpeg;base64,...") or bare base64
    pub image: String,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub language: String,
    pub max_file_size_bytes: usize,
    pub llm_model: String,
    pub search_configured: bool,
    pub summarizer_configured: bool,
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let recognizer = TesseractRecognizer::new(&config)?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.provider_timeout_secs))
        .build()?;

    let retriever = match config.search_credentials() {
        Some((api_key, engine_id)) => {
            InfoRetriever::new(Arc::new(GoogleSearch::new(http.clone(), api_key, engine_id)))
        }
        None => {
            tracing::warn!("Search credentials missing; search stage will degrade");
            InfoRetriever::disabled()
        }
    };

    let summarizer = match &config.groq_api_key {
        Some(api_key) => Summarizer::new(
            Arc::new(GroqChat::new(http, api_key.clone())),
            config.llm_model.clone(),
        ),
        None => {
            tracing::warn!("LLM API key missing; summarization stage will degrade");
            Summarizer::disabled()
        }
    };

    let pipeline = ScanPipeline::new(
        Arc::new(recognizer),
        retriever,
        summarizer,
        config.scratch_dir.clone(),
    );

    let addr = format!("{}:{}", config.host, config.port);
    let max_file_size = config.max_file_size;

    let state = AppState {
        pipeline: Arc::new(pipeline),
        config: Arc::new(config),
    };

    let app = Router::new()
        .route("/", get(handle_index))
        .route("/api/process", post(handle_process))
        .route("/api/process_camera", post(handle_process_camera))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(DefaultBodyLimit::max(max_file_size))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Serve the minimal upload form
async fn handle_index() -> Html<&'static str> {
    Html(include_str!("../assets/index.html"))
}

/// Handle multipart image uploads
async fn handle_process(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ProcessResponse>, ScanError> {
    let mut file_data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ScanError::InvalidRequest(format!("Failed to parse multipart: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "image" | "file" => {
                file_data = Some(field.bytes().await.map_err(|e| {
                    ScanError::InvalidRequest(format!("Failed to read image data: {}", e))
                })?);
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let data = file_data.ok_or(ScanError::MissingImage)?;
    scan(&state, &data).await
}

/// Handle inline base64 camera captures
async fn handle_process_camera(
    State(state): State<AppState>,
    Json(request): Json<CameraRequest>,
) -> Result<Json<ProcessResponse>, ScanError> {
    // Data URLs carry a "data:<mime>;base64," prefix; bare base64 is accepted too
    let encoded = request
        .image
        .split_once(',')
        .map(|(_, tail)| tail)
        .unwrap_or(&request.image);

    let data = BASE64
        .decode(encoded.trim())
        .map_err(|e| ScanError::InvalidRequest(format!("Invalid base64 image: {}", e)))?;

    scan(&state, &data).await
}

async fn scan(state: &AppState, data: &[u8]) -> Result<Json<ProcessResponse>, ScanError> {
    if data.len() > state.config.max_file_size {
        return Err(ScanError::ImageTooLarge {
            size: data.len(),
            max: state.config.max_file_size,
        });
    }

    let request_id = Uuid::new_v4().to_string();
    let report = state.pipeline.process(data, &request_id).await?;

    Ok(Json(to_response(report)))
}

fn to_response(report: ScanReport) -> ProcessResponse {
    ProcessResponse {
        success: true,
        extracted_text: report.extracted_text,
        processed_image: BASE64.encode(&report.annotated_png),
        medicine_name: report.medicine_name,
        llm_response: report.summary,
        preprocessing_degraded: report.preprocessing_degraded,
    }
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        language: state.config.language.clone(),
        max_file_size_bytes: state.config.max_file_size,
        llm_model: state.config.llm_model.clone(),
        search_configured: state.pipeline.search_configured(),
        summarizer_configured: state.pipeline.summarizer_configured(),
    })
}
