use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde::{Deserialize, Serialize};
use sitechat::telemetry::init_tracing;
use sitechat::{
    AskOutcome, EncoderArgs, HttpRenderer, PageListing, PipelineArgs, ProviderArgs, SiteChat,
    SourceCitation,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "sitechat-api",
    about = "HTTP API for crawling a website and chatting with its content"
)]
struct ApiCli {
    /// Address to bind the HTTP server to (host:port).
    #[arg(long, env = "SITECHAT_BIND", default_value = "127.0.0.1:8080")]
    bind: String,

    #[command(flatten)]
    pipeline: PipelineArgs,

    #[command(flatten)]
    encoder: EncoderArgs,

    #[command(flatten)]
    provider: ProviderArgs,
}

#[derive(Clone)]
struct AppState {
    chat: Arc<SiteChat>,
    default_max_pages: usize,
}

#[derive(Debug, Deserialize)]
struct ScrapeRequest {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    max_pages: Option<PageCount>,
    #[serde(default)]
    api_key: Option<String>,
}

/// Page limit as sent by clients: a JSON number or a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PageCount {
    Count(usize),
    Text(String),
}

impl PageCount {
    fn resolve(self) -> Result<usize, String> {
        match self {
            PageCount::Count(count) => Ok(count),
            PageCount::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| format!("max_pages must be a whole number, got {text:?}")),
        }
    }
}

#[derive(Debug, Serialize)]
struct ScrapeResponse {
    message: String,
    site_url: String,
    pages_scraped: usize,
    chunks_indexed: usize,
    cached: bool,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    query: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
    sources: Vec<SourceCitation>,
    outcome: AskOutcome,
}

#[derive(Debug, Serialize)]
struct PagesResponse {
    site_url: Option<String>,
    pages: Vec<PageListing>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn main() -> Result<()> {
    let cli = ApiCli::parse();
    init_tracing()?;

    // Blocking clients must be built and dropped outside the async runtime.
    let controls = cli.pipeline.build_controls();
    let renderer = HttpRenderer::new(&controls.fetch).context("failed to build HTTP renderer")?;
    let encoder = cli.encoder.build_encoder()?;
    let composer = cli.provider.build_composer()?;
    let chat = Arc::new(SiteChat::new(Box::new(renderer), encoder, composer, controls));

    let state = AppState {
        chat: Arc::clone(&chat),
        default_max_pages: cli.pipeline.max_pages.max(1),
    };
    let addr: SocketAddr = cli
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", cli.bind))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    runtime.block_on(serve(addr, state))?;
    drop(runtime);
    drop(chat);
    Ok(())
}

async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/scrape", post(scrape_handler))
        .route("/chat", post(chat_handler))
        .route("/pages", get(pages_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "sitechat-api listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server shutdown")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn scrape_handler(
    State(state): State<AppState>,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Json<ScrapeResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| bad_request(rejection.body_text()))?;
    let max_pages = resolve_max_pages(request.max_pages, state.default_max_pages)?;
    let url = request.url.unwrap_or_default();
    let api_key = request.api_key.unwrap_or_default();
    let chat = Arc::clone(&state.chat);

    let outcome = tokio::task::spawn_blocking(move || chat.scrape(&url, max_pages, &api_key))
        .await
        .map_err(|err| internal_error(anyhow!("scrape task join error: {err}")))?;
    match outcome {
        Ok(summary) => Ok(Json(ScrapeResponse {
            message: summary.message(),
            site_url: summary.site_url,
            pages_scraped: summary.pages_scraped,
            chunks_indexed: summary.chunks_indexed,
            cached: summary.cached,
        })),
        Err(err) if err.is_input_error() => Err(bad_request(err.to_string())),
        Err(err) => Err(internal_error(anyhow::Error::new(err))),
    }
}

async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| bad_request(rejection.body_text()))?;
    let query = request.query.unwrap_or_default();
    let chat = Arc::clone(&state.chat);

    let outcome = tokio::task::spawn_blocking(move || chat.ask(&query))
        .await
        .map_err(|err| internal_error(anyhow!("chat task join error: {err}")))?;
    let response = outcome.map_err(|err| bad_request(err.to_string()))?;
    Ok(Json(ChatResponse {
        response: response.answer,
        sources: response.sources,
        outcome: response.outcome,
    }))
}

async fn pages_handler(State(state): State<AppState>) -> Json<PagesResponse> {
    Json(PagesResponse {
        site_url: state.chat.live_site_url(),
        pages: state.chat.pages(),
    })
}

fn resolve_max_pages(requested: Option<PageCount>, default: usize) -> Result<usize, ApiError> {
    match requested {
        None => Ok(default),
        Some(count) => count.resolve().map_err(bad_request),
    }
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

fn internal_error(err: anyhow::Error) -> ApiError {
    warn!(error = %format!("{err:#}"), "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}
