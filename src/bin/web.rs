//! AskAgent Web - browser front end.
//!
//! Serves a single page with a question box. `POST /api/ask` runs the agent
//! and streams the answer back as plain text, one character at a time.
//! `GET /api/events` streams the same answer as server-sent events, preceded
//! by one `status` event per round.

use askagent::agent::{validate_question, AgentLoop, LoopCallback, LoopTrace};
use askagent::config::load_config;
use askagent::logging::{init_logging, log_startup};
use askagent::typewriter;
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

/// Embedded page
const INDEX_HTML: &str = include_str!("../../static/index.html");

// ---- CLI ----

#[derive(Parser)]
#[command(name = "askagent-web", about = "AskAgent browser front end")]
struct Args {
    /// Bind address (defaults to config/ASKAGENT_BIND)
    #[arg(long)]
    bind: Option<String>,

    /// Port (defaults to config/ASKAGENT_PORT)
    #[arg(long, short)]
    port: Option<u16>,
}

// ---- App State ----

#[derive(Clone)]
struct WebState {
    agent: Arc<AgentLoop>,
    stream_delay: Duration,
}

// ---- Error Handling ----

struct AppError(askagent::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            askagent::Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<askagent::Error> for AppError {
    fn from(err: askagent::Error) -> Self {
        AppError(err)
    }
}

// ---- Status ----

/// Round progress for the plain-text endpoint goes to the log.
struct LogStatus;

#[async_trait]
impl LoopCallback for LogStatus {
    async fn on_status(&self, status: &str) {
        debug!("{}", status);
    }

    async fn on_loop_complete(&self, trace: &LoopTrace) {
        debug!(
            "Request finished: outcome={:?}, rounds={}",
            trace.outcome,
            trace.steps.len()
        );
    }
}

/// Forwards round progress to an event stream.
struct EventStatus {
    tx: mpsc::UnboundedSender<Event>,
}

#[async_trait]
impl LoopCallback for EventStatus {
    async fn on_status(&self, status: &str) {
        debug!("{}", status);
        let _ = self.tx.send(Event::default().event("status").data(status));
    }
}

// ---- Handlers ----

#[derive(Deserialize)]
struct AskRequest {
    #[serde(default)]
    question: String,
}

async fn serve_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn ask(
    State(state): State<WebState>,
    Json(req): Json<AskRequest>,
) -> Result<Response, AppError> {
    let question = validate_question(&req.question).map_err(|e| {
        warn!("Search button clicked but no question entered");
        e
    })?;
    info!("Question received: {} chars", question.chars().count());

    let output = state.agent.run_with_callback(question, &LogStatus).await;
    debug!("Answer length: {} characters", output.response.len());

    let body = typewriter::chars(&output.response, state.stream_delay).map(Ok::<_, Infallible>);

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(body),
    )
        .into_response())
}

async fn ask_events(
    State(state): State<WebState>,
    Query(req): Query<AskRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let question = validate_question(&req.question)?.to_string();
    info!("Question received: {} chars", question.chars().count());

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let status = EventStatus { tx: tx.clone() };
        let output = state.agent.run_with_callback(&question, &status).await;

        let mut chars = Box::pin(typewriter::chars(&output.response, state.stream_delay));
        while let Some(c) = chars.next().await {
            let Ok(event) = Event::default().event("token").json_data(c) else {
                continue;
            };
            if tx.send(event).is_err() {
                debug!("Event stream closed by client");
                return;
            }
        }
        let _ = tx.send(Event::default().event("done").data("end"));
    });

    let events = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (Ok(event), rx))
    });
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn build_router(state: WebState) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/health", get(health_check))
        .route("/api/ask", post(ask))
        .route("/api/events", get(ask_events))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

// ---- Main ----

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = load_config()?;
    init_logging(&config.log)?;
    log_startup("web");

    config.validate()?;
    let agent = AgentLoop::from_config(&config)?;

    let state = WebState {
        agent: Arc::new(agent),
        stream_delay: config.ui.stream_delay,
    };

    let app = build_router(state);

    let bind = args.bind.unwrap_or_else(|| config.ui.bind.clone());
    let port = args.port.unwrap_or(config.ui.port);
    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("AskAgent listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
