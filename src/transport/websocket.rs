//! # Websocket Print Bridge
//!
//! Client for a local print-spooler bridge speaking JSON over a websocket.
//!
//! ## Wire Format
//!
//! Every request carries a fresh `uid`; the matching reply echoes it back
//! with either a `result` or an `error`:
//!
//! ```text
//! → {"uid":"7c1e…","call":"printers.find","params":{}}
//! ← {"uid":"7c1e…","result":["TSC TE244","Office Laser"]}
//!
//! → {"uid":"a90b…","call":"print","params":{
//!      "printer":{"name":"TSC TE244"},
//!      "options":{},
//!      "data":[{"type":"raw","format":"plain","data":"SIZE 50 mm,25 mm\r\n…"}]}}
//! ← {"uid":"a90b…","result":null}
//! ```
//!
//! Messages with an unknown `uid` (bridge events, stale replies) are
//! skipped. A call with no reply within [`REPLY_TIMEOUT`] fails and drops
//! the socket.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use uuid::Uuid;

use super::PrintBridge;
use crate::error::EtiquetaError;

/// Default bridge endpoint on the local machine
pub const DEFAULT_BRIDGE_URL: &str = "ws://localhost:8182";

/// How long a call waits for its reply before the socket is dropped
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(10);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Serialize)]
struct BridgeRequest<'a> {
    uid: String,
    call: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct BridgeReply {
    uid: String,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

/// Print bridge reached over a websocket.
pub struct WebSocketBridge {
    url: String,
    reply_timeout: Duration,
    socket: Mutex<Option<Socket>>,
}

impl WebSocketBridge {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reply_timeout: REPLY_TIMEOUT,
            socket: Mutex::new(None),
        }
    }

    /// Override how long a call waits for its reply.
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one call and wait for its reply.
    async fn call(&self, call: &str, params: Value) -> Result<Value, EtiquetaError> {
        let mut guard = self.socket.lock().await;
        let Some(socket) = guard.as_mut() else {
            return Err(EtiquetaError::Connectivity(
                "print bridge is not connected".to_string(),
            ));
        };

        let uid = Uuid::new_v4().to_string();
        let request = serde_json::to_string(&BridgeRequest {
            uid: uid.clone(),
            call,
            params,
        })
        .map_err(|e| EtiquetaError::InvalidCommand(e.to_string()))?;

        if let Err(e) = socket.send(Message::Text(request.into())).await {
            *guard = None;
            return Err(EtiquetaError::Connectivity(format!("print bridge send failed: {}", e)));
        }

        let reply = tokio::time::timeout(self.reply_timeout, async {
            loop {
                match socket.next().await {
                    Some(Ok(Message::Text(text))) => {
                        let Ok(reply) = serde_json::from_str::<BridgeReply>(&text) else {
                            tracing::debug!(message = %text.as_str(), "ignoring unparseable bridge message");
                            continue;
                        };
                        if reply.uid == uid {
                            return Ok(reply);
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return Err("print bridge closed the connection".to_string());
                    }
                    Some(Err(e)) => return Err(format!("print bridge error: {}", e)),
                    Some(Ok(_)) => {}
                }
            }
        })
        .await;

        match reply {
            Ok(Ok(reply)) => match reply.error {
                Some(error) => Err(EtiquetaError::Connectivity(format!(
                    "print bridge rejected {}: {}",
                    call, error
                ))),
                None => Ok(reply.result),
            },
            Ok(Err(message)) => {
                *guard = None;
                Err(EtiquetaError::Connectivity(message))
            }
            Err(_) => {
                *guard = None;
                tracing::warn!(
                    call,
                    timeout_ms = self.reply_timeout.as_millis() as u64,
                    "print bridge did not reply"
                );
                Err(EtiquetaError::Connectivity(format!(
                    "print bridge did not reply to {} within {}s",
                    call,
                    self.reply_timeout.as_secs_f64()
                )))
            }
        }
    }
}

impl Default for WebSocketBridge {
    fn default() -> Self {
        Self::new(DEFAULT_BRIDGE_URL)
    }
}

#[async_trait]
impl PrintBridge for WebSocketBridge {
    async fn connect(&self) -> Result<(), EtiquetaError> {
        let mut guard = self.socket.lock().await;
        if guard.is_some() {
            return Ok(());
        }
        let (socket, _) = connect_async(self.url.as_str()).await.map_err(|e| {
            EtiquetaError::Connectivity(format!("cannot reach print bridge at {}: {}", self.url, e))
        })?;
        *guard = Some(socket);
        tracing::info!(url = %self.url, "connected to print bridge");
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.socket.lock().await.is_some()
    }

    async fn find_printers(&self) -> Result<Vec<String>, EtiquetaError> {
        let result = self.call("printers.find", json!({})).await?;
        Ok(match result {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Value::String(name) => vec![name],
            _ => Vec::new(),
        })
    }

    async fn submit_raw(&self, printer: &str, payload: &str) -> Result<(), EtiquetaError> {
        let params = json!({
            "printer": { "name": printer },
            "options": {},
            "data": [{ "type": "raw", "format": "plain", "data": payload }],
        });
        self.call("print", params).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    /// Spawn a fake bridge; returns its URL and the requests it received.
    async fn fake_bridge() -> (String, Arc<std::sync::Mutex<Vec<Value>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = seen.clone();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            while let Some(Ok(msg)) = ws.next().await {
                let Message::Text(text) = msg else { continue };
                let request: Value = serde_json::from_str(&text).unwrap();
                log.lock().unwrap().push(request.clone());

                // An unrelated event first, to be skipped by the client
                let event = json!({ "uid": "event", "result": "status" });
                ws.send(Message::Text(event.to_string().into())).await.unwrap();

                let reply = match request["call"].as_str() {
                    Some("printers.find") => json!({ "uid": request["uid"], "result": ["TSC TE244", "Office"] }),
                    Some("print") if request["params"]["printer"]["name"] == "Offline" => {
                        json!({ "uid": request["uid"], "error": "printer offline" })
                    }
                    _ => json!({ "uid": request["uid"], "result": null }),
                };
                ws.send(Message::Text(reply.to_string().into())).await.unwrap();
            }
        });

        (format!("ws://{}", addr), seen)
    }

    #[tokio::test]
    async fn test_find_printers() {
        let (url, _) = fake_bridge().await;
        let bridge = WebSocketBridge::new(url);
        bridge.connect().await.unwrap();
        assert!(bridge.is_connected().await);
        assert_eq!(bridge.find_printers().await.unwrap(), vec!["TSC TE244", "Office"]);
    }

    #[tokio::test]
    async fn test_submit_raw_sends_single_plain_item() {
        let (url, seen) = fake_bridge().await;
        let bridge = WebSocketBridge::new(url);
        bridge.connect().await.unwrap();
        bridge.submit_raw("TSC TE244", "CLS\r\nPRINT 1\r\n").await.unwrap();

        let requests = seen.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let data = &requests[0]["params"]["data"];
        assert_eq!(data.as_array().unwrap().len(), 1);
        assert_eq!(data[0]["type"], "raw");
        assert_eq!(data[0]["format"], "plain");
        assert_eq!(data[0]["data"], "CLS\r\nPRINT 1\r\n");
        assert_eq!(requests[0]["call"], "print");
    }

    #[tokio::test]
    async fn test_bridge_error_reply() {
        let (url, _) = fake_bridge().await;
        let bridge = WebSocketBridge::new(url);
        bridge.connect().await.unwrap();
        let err = bridge.submit_raw("Offline", "PRINT 1").await.unwrap_err();
        assert!(err.is_connectivity());
        assert!(err.to_string().contains("printer offline"));
    }

    #[tokio::test]
    async fn test_silent_bridge_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            // Read requests forever, never answer
            while let Some(Ok(_)) = ws.next().await {}
        });

        let bridge = WebSocketBridge::new(format!("ws://{}", addr))
            .with_reply_timeout(Duration::from_millis(200));
        bridge.connect().await.unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            bridge.submit_raw("TSC TE244", "PRINT 1\r\n"),
        )
        .await
        .expect("submit_raw must not hang");
        let err = result.unwrap_err();
        assert!(err.is_connectivity());
        assert!(err.to_string().contains("did not reply"));
        assert!(!bridge.is_connected().await);
    }

    #[tokio::test]
    async fn test_calls_require_connection() {
        let bridge = WebSocketBridge::new("ws://127.0.0.1:9");
        assert!(!bridge.is_connected().await);
        assert!(bridge.find_printers().await.unwrap_err().is_connectivity());
    }

    #[tokio::test]
    async fn test_unreachable_bridge() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let bridge = WebSocketBridge::new(format!("ws://{}", addr));
        let err = bridge.connect().await.unwrap_err();
        assert!(err.is_connectivity());
        assert!(!bridge.is_connected().await);
    }
}
