/*!
WebSocket server implementation.
*/

use std::sync::Arc;
use std::time::Duration;

use axum::{
  extract::{
    ws::{Message, WebSocket, WebSocketUpgrade},
    State,
  },
  response::Response,
  routing::get,
  Router,
};
use log::error;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use unveil::{Event, MemoryDocument, PageAgent, DEFAULT_TICK_INTERVAL_MS};

/// Default WebSocket server port.
pub const DEFAULT_WS_PORT: u16 = 3031;
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// WebSocket state.
#[derive(Clone)]
pub struct WebSocketState {
  agent: PageAgent<MemoryDocument>,
  json_sender: Arc<broadcast::Sender<String>>,
  port: u16,
  tick_interval: Duration,
}

impl std::fmt::Debug for WebSocketState {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("WebSocketState")
      .field("port", &self.port)
      .finish_non_exhaustive()
  }
}

impl WebSocketState {
  /// Create with default port.
  pub fn new(agent: PageAgent<MemoryDocument>) -> Self {
    Self::with_port(agent, DEFAULT_WS_PORT)
  }

  /// Create with custom port.
  pub fn with_port(agent: PageAgent<MemoryDocument>, port: u16) -> Self {
    let (json_tx, _) = broadcast::channel::<String>(DEFAULT_CHANNEL_CAPACITY);
    Self {
      agent,
      json_sender: Arc::new(json_tx),
      port,
      tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
    }
  }

  /// How often agent timers are fired. Default: 50ms.
  #[must_use]
  pub const fn with_tick_interval(mut self, interval: Duration) -> Self {
    self.tick_interval = interval;
    self
  }

  /// Port the server binds on 127.0.0.1.
  pub const fn port(&self) -> u16 {
    self.port
  }
}

/// Start the WebSocket server. Runs until the listener fails.
pub async fn start_server(ws_state: WebSocketState) -> std::io::Result<()> {
  let port = ws_state.port;

  let sender = ws_state.json_sender.clone();
  let mut rx = ws_state.agent.subscribe();
  tokio::spawn(async move {
    while let Ok(event) = rx.recv().await {
      if let Ok(json) = serde_json::to_string(&event) {
        drop(sender.send(json));
      }
    }
  });

  let agent = ws_state.agent.clone();
  let tick_interval = ws_state.tick_interval;
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(tick_interval);
    loop {
      interval.tick().await;
      let agent = agent.clone();
      if tokio::task::spawn_blocking(move || agent.tick()).await.is_err() {
        error!("[ws] Timer tick panicked");
      }
    }
  });

  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods(Any)
    .allow_headers(Any);

  let app = Router::new()
    .route("/ws", get(websocket_handler))
    .layer(cors)
    .with_state(ws_state);

  let addr = format!("127.0.0.1:{port}");
  let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
    error!("Failed to bind WebSocket server to {addr}: {e}");
    e
  })?;

  log::info!("WebSocket server: ws://{addr}/ws");

  axum::serve(listener, app).await.map_err(|e| {
    error!("WebSocket server failed: {e}");
    e
  })
}

async fn websocket_handler(
  ws: WebSocketUpgrade,
  State(ws_state): State<WebSocketState>,
) -> Response {
  ws.on_upgrade(|socket| handle_websocket(socket, ws_state))
}

async fn handle_websocket(mut socket: WebSocket, ws_state: WebSocketState) {
  let mut rx = ws_state.json_sender.subscribe();

  let agent = ws_state.agent.clone();
  let Ok(last) = tokio::task::spawn_blocking(move || agent.last_snapshot()).await else {
    return;
  };
  if !last.is_empty() {
    let event = Event::ScanComplete { elements: last };
    if let Ok(msg) = serde_json::to_string(&event) {
      if socket.send(Message::Text(msg)).await.is_err() {
        return;
      }
    }
  }

  loop {
    tokio::select! {
        msg = socket.recv() => {
            match msg {
                Some(Ok(Message::Text(text))) => {
                    let response = handle_request_async(text, &ws_state).await;
                    while let Ok(event_json) = rx.try_recv() {
                        drop(socket.send(Message::Text(event_json)).await);
                    }
                    drop(socket.send(Message::Text(response)).await);
                }
                Some(Ok(Message::Close(_))) => {
                    log::debug!("[client] closed connection");
                    break;
                }
                Some(Err(e)) => {
                    log::warn!("WebSocket error: {e}");
                    break;
                }
                None => {
                    log::debug!("[client] disconnected");
                    break;
                }
                Some(Ok(Message::Binary(_) | Message::Ping(_) | Message::Pong(_))) => {}
            }
        }

        broadcast = rx.recv() => {
            match broadcast {
                Ok(event_json) => {
                    if socket.send(Message::Text(event_json)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    log::warn!("[ws] Client lagged, dropped {n} events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
  }
}

async fn handle_request_async(request: String, ws_state: &WebSocketState) -> String {
  let agent = ws_state.agent.clone();
  let dispatch_result =
    tokio::task::spawn_blocking(move || crate::rpc::handle_text(&agent, &request)).await;

  match dispatch_result {
    Ok(r) => r,
    Err(_) => serde_json::json!({ "success": false, "error": "Request task panicked" }).to_string(),
  }
}
