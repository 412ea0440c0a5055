//! Local servers used by the unit tests.
//!
//! `spawn_ws_server` accepts one `graphql-ws` connection and hands the
//! server side to a test script. `spawn_graphql_server` serves a tiny
//! GraphQL-over-HTTP endpoint that echoes what it received.

use std::future::Future;
use std::net::SocketAddr;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use crate::protocol::GRAPHQL_WS_PROTOCOL;

/// Server side of a test WebSocket connection.
pub(crate) type ServerSocket = WebSocketStream<TcpStream>;

async fn bind() -> (TcpListener, SocketAddr) {
    let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
        panic!("failed to bind test listener");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("test listener has no local address");
    };
    (listener, addr)
}

/// Echoes `graphql-ws` back when the client offers it.
fn negotiate(request: &Request, mut response: Response) -> Result<Response, ErrorResponse> {
    let offered = request
        .headers()
        .get(SEC_WEBSOCKET_PROTOCOL)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if offered
        .split(',')
        .any(|p| p.trim() == GRAPHQL_WS_PROTOCOL)
    {
        response.headers_mut().insert(
            SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static(GRAPHQL_WS_PROTOCOL),
        );
    }
    Ok(response)
}

/// Starts a WebSocket server on a free port and runs `script` on the first
/// connection. Returns the `ws://` URL and the script's join handle.
pub(crate) async fn spawn_ws_server<F, Fut, T>(script: F) -> (String, JoinHandle<T>)
where
    F: FnOnce(ServerSocket) -> Fut + Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let (listener, addr) = bind().await;
    let handle = tokio::spawn(async move {
        let Ok((tcp, _)) = listener.accept().await else {
            panic!("test server accept failed");
        };
        let Ok(ws) = tokio_tungstenite::accept_hdr_async(tcp, negotiate).await else {
            panic!("test server upgrade failed");
        };
        script(ws).await
    });
    (format!("ws://{addr}/subscriptions"), handle)
}

/// A `ws://` URL on which nothing is listening.
pub(crate) async fn unused_ws_url() -> String {
    let (listener, addr) = bind().await;
    drop(listener);
    format!("ws://{addr}/subscriptions")
}

/// Reads the next text frame from the client as JSON.
pub(crate) async fn recv_json(ws: &mut ServerSocket) -> Value {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                let Ok(value) = serde_json::from_str(text.as_str()) else {
                    panic!("client sent non-JSON text: {}", text.as_str());
                };
                return value;
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
            other => panic!("expected a text frame, got {other:?}"),
        }
    }
}

/// Sends a raw text frame. Failures are ignored: the client may already be
/// gone, which is what several tests provoke.
pub(crate) async fn send_text(ws: &mut ServerSocket, text: &str) {
    let _ = ws.send(Message::text(text.to_string())).await;
}

/// Sends `value` as a JSON text frame.
pub(crate) async fn send_json(ws: &mut ServerSocket, value: &Value) {
    send_text(ws, &value.to_string()).await;
}

/// Reads until the connection ends. Returns the last close frame seen, if
/// the client sent one (`Some(None)` for a close without status).
pub(crate) async fn drain(ws: &mut ServerSocket) -> Option<Option<CloseFrame>> {
    let mut close = None;
    while let Some(Ok(message)) = ws.next().await {
        if let Message::Close(frame) = message {
            close = Some(frame);
        }
    }
    close
}

/// Starts a close handshake with the given code and waits for it to finish.
pub(crate) async fn close_with(ws: &mut ServerSocket, code: CloseCode, reason: &'static str) {
    let _ = ws
        .close(Some(CloseFrame {
            code,
            reason: reason.into(),
        }))
        .await;
    drain(ws).await;
}

fn header_text(headers: &HeaderMap, name: HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// `POST /graphql`: echoes the query and request headers as `data`. A query
/// containing `missing` gets a GraphQL `errors` array instead.
async fn graphql(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    let query = body.get("query").and_then(Value::as_str).unwrap_or_default();
    if query.contains("missing") {
        return Json(json!({
            "data": null,
            "errors": [{"message": "variable not found", "path": ["floatVariable"]}]
        }));
    }
    Json(json!({
        "data": {
            "query": query,
            "authorization": header_text(&headers, AUTHORIZATION),
            "contentType": header_text(&headers, CONTENT_TYPE),
        }
    }))
}

/// `POST /empty-errors`: data alongside an empty `errors` array.
async fn empty_errors() -> Json<Value> {
    Json(json!({ "data": { "x": 1 }, "errors": [] }))
}

/// `POST /broken`: answers with a non-JSON error page.
async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::BAD_GATEWAY, "upstream unavailable")
}

/// Starts the GraphQL HTTP test server and returns its `http://` base URL.
pub(crate) async fn spawn_graphql_server() -> String {
    let app = Router::new()
        .route("/graphql", post(graphql))
        .route("/empty-errors", post(empty_errors))
        .route("/broken", post(broken));
    let (listener, addr) = bind().await;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}
