use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Request, State,
    },
    response::{Html, IntoResponse, Response},
    routing::get,
    serve, Router,
};
use futures::{
    channel::mpsc,
    sink::{Sink, SinkExt},
    stream::StreamExt,
};
use minijinja::{path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use serde::{Deserialize, Serialize};
use std::{
    convert::Infallible,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::constants::{SEARCH_USED_NOTICE, SEED_ACKNOWLEDGEMENT};
use crate::conversation::{ConversationLog, Turn};
use crate::orchestrator::{Orchestrator, TurnOutcome};

/// Message sent by the browser for one user turn.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientMessage {
    pub message: String,
}

/// Messages pushed to the browser over the chat WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    History {
        turns: Vec<Turn>,
    },
    Thinking,
    /// The turn decided to search; sent before the search request goes out.
    Searching,
    Reply {
        text: String,
        searched_web: bool,
        search_error: Option<String>,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RateLimited,
    Failed,
    BadRequest,
}

impl ServerMessage {
    fn bad_request(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            kind: ErrorKind::BadRequest,
            message: message.into(),
        }
    }
}

impl From<TurnOutcome> for ServerMessage {
    fn from(outcome: TurnOutcome) -> Self {
        let message = outcome.error_message().unwrap_or_default();
        match outcome {
            TurnOutcome::Answered(reply) => ServerMessage::Reply {
                text: reply.text,
                searched_web: reply.searched_web,
                search_error: None,
            },
            TurnOutcome::SearchFailed { reply, detail } => ServerMessage::Reply {
                text: reply.text,
                searched_web: reply.searched_web,
                search_error: Some(detail),
            },
            TurnOutcome::RateLimited => ServerMessage::Error {
                kind: ErrorKind::RateLimited,
                message,
            },
            TurnOutcome::Failed(_) => ServerMessage::Error {
                kind: ErrorKind::Failed,
                message,
            },
        }
    }
}

/// Shared application state. Holds no conversation data: every socket owns its
/// own log.
#[derive(Clone)]
pub struct AppState {
    templates: Arc<AutoReloader>,
    orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates: Arc::new(create_minijinja_env(templates_dir.into())),
            orchestrator,
        }
    }
}

fn create_minijinja_env(templates_dir: PathBuf) -> AutoReloader {
    AutoReloader::new(move |notifier| {
        let mut env = Environment::new();
        env.set_loader(path_loader(&templates_dir));
        notifier.watch_path(&templates_dir, true);
        Ok(env)
    })
}

async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, Html<String>> {
    state
        .templates
        .acquire_env()
        .and_then(|env| {
            env.get_template("index.html").and_then(|tmpl| {
                tmpl.render(minijinja::context! {
                    title => "Gamkers AI Assistant",
                    greeting => SEED_ACKNOWLEDGEMENT,
                    search_notice => SEARCH_USED_NOTICE,
                })
            })
        })
        .map(Html)
        .map_err(|e| {
            error!("Failed to get or render template: {}", e);
            Html(format!("Internal Server Error: {}", e))
        })
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("WebSocket connection upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state.orchestrator))
}

/// Handles one raw client frame against this connection's log, pushing every
/// resulting server message into `out` in order.
pub async fn process_client_text<S>(
    orchestrator: &Orchestrator,
    log: &mut ConversationLog,
    text: &str,
    out: &mut S,
) where
    S: Sink<ServerMessage> + Unpin,
{
    let user_text = match serde_json::from_str::<ClientMessage>(text) {
        Ok(request) if !request.message.trim().is_empty() => request.message.trim().to_string(),
        Ok(_) => {
            let _ = out
                .send(ServerMessage::bad_request("Message must not be empty"))
                .await;
            return;
        }
        Err(e) => {
            warn!("Malformed client message: {}", e);
            let _ = out
                .send(ServerMessage::bad_request(format!("Malformed message: {}", e)))
                .await;
            return;
        }
    };

    let _ = out.send(ServerMessage::Thinking).await;
    let search = orchestrator.needs_search(&user_text).await;
    if search {
        let _ = out.send(ServerMessage::Searching).await;
    }
    let outcome = orchestrator
        .exchange_decided(log, &user_text, search)
        .await;
    let _ = out.send(outcome.into()).await;
}

// One socket is one chat session
async fn handle_socket(socket: WebSocket, orchestrator: Arc<Orchestrator>) {
    info!("New chat session established");
    let (mut sender, mut receiver) = socket.split();
    let (mut tx, mut rx) = mpsc::unbounded::<ServerMessage>();

    // Serializes queued server messages onto the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.next().await {
            let json_msg = match serde_json::to_string(&msg) {
                Ok(json_msg) => json_msg,
                Err(e) => {
                    error!("Failed to serialize server message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json_msg)).await.is_err() {
                warn!("WebSocket client disconnected or send error. Closing connection.");
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        let mut log = ConversationLog::new();
        let history = ServerMessage::History {
            turns: log.history().to_vec(),
        };
        if tx.send(history).await.is_err() {
            return;
        }

        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    process_client_text(&orchestrator, &mut log, &text, &mut tx).await;
                }
                Message::Binary(_) => {
                    warn!("Received unexpected binary message from client");
                }
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Close(_) => {
                    info!("Client requested WebSocket close");
                    break;
                }
            }
        }
        info!(turns = log.len(), "Chat session closed");
    });

    // Whichever side finishes first ends the session
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

pub fn create_router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    let static_files_service =
        ServeDir::new(static_dir.as_ref()).not_found_service(tower::service_fn(
            |_: Request| async { Ok::<_, Infallible>(Response::new(Body::from("Not Found"))) },
        ));

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .nest_service("/static", static_files_service)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn start_web_server(port: u16, orchestrator: Arc<Orchestrator>) -> Result<()> {
    let state = AppState::new(orchestrator, "templates");
    let app = create_router(state, "static");

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
