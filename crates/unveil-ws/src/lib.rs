/*! Unveil page-agent protocol over WebSocket. */

mod rpc;
mod server;

pub use rpc::{dispatch_frame, handle_text};
pub use server::{start_server, WebSocketState, DEFAULT_WS_PORT};
