use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    serve, Form, Json, Router,
};
use minijinja::{context, path_loader, value::Value, Environment};
use minijinja_autoreload::AutoReloader;
use serde::{Deserialize, Serialize};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

use crate::relay::{RelayOutcome, RelayPolicy};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    templates: Arc<AutoReloader>,
    relay: Arc<RelayPolicy>,
}

impl AppState {
    pub fn new(relay: Arc<RelayPolicy>) -> Result<Self> {
        let templates = create_minijinja_env().context("Failed to initialize template engine")?;
        Ok(Self {
            templates: Arc::new(templates),
            relay,
        })
    }
}

// Minijinja Environment setup
fn create_minijinja_env() -> Result<AutoReloader> {
    // Use AutoReloader for development convenience
    let reloader = AutoReloader::new(|notifier| {
        let loader = path_loader("templates");
        let mut env = Environment::new();
        env.set_loader(loader);
        // Watch the templates directory for changes
        notifier.watch_path("templates", true);
        Ok(env)
    });
    Ok(reloader)
}

/// Form payload for the redirect transport. `message` is optional because a
/// broken client may post an empty body; missing is treated like empty.
#[derive(Debug, Deserialize)]
pub struct ChatInput {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApiChatResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, Html<String>> {
    let history = state.relay.history().await;

    // Acquire env, get template, and render within the same block
    state
        .templates
        .acquire_env()
        .and_then(|env| {
            env.get_template("index.html").and_then(|tmpl| {
                let context = context! {
                    title => "AI Chatbot",
                    chat_history => Value::from_serializable(&history),
                };
                tmpl.render(context)
            })
        })
        .map(Html)
        .map_err(|e| {
            error!("Failed to get or render template: {}", e);
            Html(format!("Internal Server Error: {}", e))
        })
}

// Redirect transport: browser form posts land here and bounce back to the
// conversation view, which re-renders the updated history.
async fn chat_form_handler(
    State(state): State<AppState>,
    Form(input): Form<ChatInput>,
) -> Redirect {
    state.relay.handle_message(&input.message).await;
    Redirect::to("/")
}

async fn clear_form_handler(State(state): State<AppState>) -> Redirect {
    state.relay.reset().await;
    Redirect::to("/")
}

// JSON transport over the same relay. Degraded replies look identical to
// fulfilled ones here; only empty input reports failure.
async fn chat_api_handler(
    State(state): State<AppState>,
    Json(input): Json<ChatInput>,
) -> Json<ApiChatResponse> {
    let response = match state.relay.handle_message(&input.message).await {
        RelayOutcome::Rejected { warning } => ApiChatResponse {
            success: false,
            response: None,
            error: Some(warning),
        },
        RelayOutcome::Fulfilled { reply } | RelayOutcome::Degraded { reply } => ApiChatResponse {
            success: true,
            response: Some(reply),
            error: None,
        },
    };
    Json(response)
}

async fn clear_api_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.relay.reset().await;
    Json(ApiChatResponse {
        success: true,
        response: None,
        error: None,
    })
}

/// Router construction is separate from socket binding so tests can drive
/// the handlers directly.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/chat", post(chat_form_handler))
        .route("/clear", post(clear_form_handler))
        .route("/api/chat", post(chat_api_handler))
        .route("/api/clear", post(clear_api_handler))
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state)
        .layer(TraceLayer::new_for_http()) // Add request logging
}

pub async fn start_web_server(port: u16, relay: Arc<RelayPolicy>) -> Result<()> {
    let state = AppState::new(relay)?;
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
