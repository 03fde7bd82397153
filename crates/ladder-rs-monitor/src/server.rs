//! Implements the core web server and WebSocket logic using axum.

use crate::model::{parse_command, EngineCommand, MonitorEvent};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use crossbeam_channel::Sender;
use log::{error, info, trace, warn};
use std::net::SocketAddr;
use tokio::sync::broadcast;

/// The shared application state: the broadcast channel feeding all
/// connected WebSocket clients, and the command channel into the scan
/// thread.
#[derive(Clone)]
pub(super) struct AppState {
    pub(super) event_tx: broadcast::Sender<MonitorEvent>,
    pub(super) command_tx: Sender<EngineCommand>,
}

/// The main entry point for starting the web server.
///
/// This function binds to the given address and sets up all routes.
pub(super) async fn start_web_server(
    addr: SocketAddr,
    event_tx: broadcast::Sender<MonitorEvent>,
    command_tx: Sender<EngineCommand>,
) {
    let app_state = AppState {
        event_tx,
        command_tx,
    };

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/ws", get(websocket_handler))
        .with_state(app_state);

    info!("Web monitor listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind web server to {}: {}", addr, e);
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        error!("Web server encountered an error: {}", e);
    }
}

/// Handles the root HTTP GET request, serving the embedded monitor HTML.
async fn root_handler() -> impl IntoResponse {
    // Embed the HTML file directly into the binary
    Html(include_str!("web/monitor.html"))
}

/// Handles HTTP GET requests to `/ws`, upgrading them to a WebSocket connection.
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// The main task for an individual WebSocket connection.
///
/// Subscribes to the broadcast channel, pushes every event to the client as
/// JSON, and forwards the client's commands to the scan thread.
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    info!("New WebSocket client connected.");

    // Subscribe before requesting a refresh so the reply is not missed.
    let mut event_rx = state.event_tx.subscribe();
    if state.command_tx.try_send(EngineCommand::Refresh).is_err() {
        warn!("Scan thread not reachable, new client gets no initial snapshot.");
    }

    loop {
        tokio::select! {
            // Push a new event from the broadcast channel to the client
            Ok(event) = event_rx.recv() => {
                match serde_json::to_string(&event) {
                    Ok(json_payload) => {
                        if socket.send(Message::Text(json_payload.into())).await.is_err() {
                            // Client disconnected
                            info!("WebSocket client disconnected (send error).");
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Failed to serialize event to JSON: {}", e);
                    }
                }
            }
            // Receive a command from the client
            Some(Ok(msg)) = socket.recv() => {
                match msg {
                    Message::Text(text) => {
                        match parse_command(&text) {
                            Some(command) => {
                                trace!("Forwarding client command: {:?}", command);
                                if state.command_tx.try_send(command).is_err() {
                                    error!("Command channel full or closed, command dropped.");
                                }
                            }
                            None => warn!("Unparseable client message: {:?}", text),
                        }
                    }
                    Message::Close(_) => {
                        info!("WebSocket client disconnected (received close message).");
                        break;
                    }
                    // Ignore ping/pong and binary frames; axum answers pongs.
                    _ => {}
                }
            }
            // Client disconnected without a close message
            else => {
                info!("WebSocket client disconnected (channel closed).");
                break;
            }
        }
    }
}
