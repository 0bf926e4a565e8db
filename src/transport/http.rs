// HTTP + WebSocket implementation of the transport
// Contains the history/search/upload/import calls and the push channel tasks

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use reqwest::{multipart, Client};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use url::Url;

use super::envelope::{decode_push, encode_command, Command, PushEvent};
use super::error::{TransportError, TransportResult};
use super::Transport;
use crate::attachments::UploadFile;
use crate::models::{ImportResponse, Message, MessageId, UploadedFile};

/// Capacity of the channel that hands push events to the controller
const PUSH_BUFFER: usize = 100;

pub struct HttpTransport {
    client: Client,
    base_url: String,
    outbound: Option<mpsc::UnboundedSender<String>>,
    // Cleared by the reader task when the socket goes away
    open: Arc<AtomicBool>,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> TransportResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TransportError::ConnectionFailed {
                url: base_url.to_string(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            outbound: None,
            open: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_push_open(&self) -> bool {
        self.outbound.is_some() && self.open.load(Ordering::SeqCst)
    }

    /// Open the push channel and return the stream of decoded events.
    ///
    /// Events are delivered in the order the server sent them. Frames that do
    /// not decode are logged and skipped.
    pub async fn connect_push(&mut self) -> TransportResult<mpsc::Receiver<PushEvent>> {
        let ws_url = push_url(&self.base_url)?;
        info!("Connecting push channel to {}", ws_url);

        let (socket, _) = connect_async(ws_url.as_str())
            .await
            .map_err(|e| TransportError::Channel(format!("Failed to connect to {}: {}", ws_url, e)))?;

        let (mut sink, mut stream) = socket.split();
        let (event_tx, event_rx) = mpsc::channel(PUSH_BUFFER);
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();

        self.open.store(true, Ordering::SeqCst);
        self.outbound = Some(out_tx);

        // Writer: forward serialized commands to the socket
        let open_writer = self.open.clone();
        tokio::spawn(async move {
            while let Some(text) = out_rx.recv().await {
                if let Err(e) = sink.send(WsMessage::Text(text.into())).await {
                    error!("Failed to send command over push channel: {}", e);
                    open_writer.store(false, Ordering::SeqCst);
                    break;
                }
            }
            debug!("Push channel writer finished");
        });

        // Reader: decode frames and hand them to the controller
        let open_reader = self.open.clone();
        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(WsMessage::Text(text)) => match decode_push(text.as_str()) {
                        Ok(event) => {
                            debug!("Push event received: {}", event.kind());
                            if event_tx.send(event).await.is_err() {
                                debug!("Push event receiver dropped, stopping reader");
                                break;
                            }
                        }
                        Err(e) => warn!("Skipping undecodable push frame: {}", e),
                    },
                    Ok(WsMessage::Close(_)) => {
                        info!("Push channel closed by server");
                        break;
                    }
                    Ok(_) => {} // Ping/pong and binary frames carry nothing for us
                    Err(e) => {
                        error!("Push channel error: {}", e);
                        break;
                    }
                }
            }
            open_reader.store(false, Ordering::SeqCst);
        });

        Ok(event_rx)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> TransportResult<T> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| connection_failed(url, e))?;

        handle_response(url, response).await
    }
}

fn connection_failed(url: &str, e: reqwest::Error) -> TransportError {
    error!("Request to {} failed: {}", url, e);
    TransportError::ConnectionFailed {
        url: url.to_string(),
        message: e.to_string(),
    }
}

async fn handle_response<T: DeserializeOwned>(url: &str, response: reqwest::Response) -> TransportResult<T> {
    let status = response.status();
    if !status.is_success() {
        warn!("{} returned {}", url, status);
        return Err(TransportError::BadStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.json().await.map_err(|e| TransportError::ParseError {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// The push channel lives on the same host as the HTTP API, `http` becoming
/// `ws` and `https` becoming `wss`.
pub fn push_url(base_url: &str) -> TransportResult<Url> {
    let mut url = Url::parse(base_url).map_err(|e| TransportError::InvalidUrl(format!("{}: {}", base_url, e)))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(TransportError::InvalidUrl(format!("Unsupported scheme: {}", other))),
    };
    url.set_scheme(scheme)
        .map_err(|_| TransportError::InvalidUrl(format!("Cannot use {} with {}", scheme, base_url)))?;
    Ok(url)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_history(&self, before: Option<&MessageId>, count: usize) -> TransportResult<Vec<Message>> {
        let url = format!("{}/messages", self.base_url);
        let from_id = before.map(|id| id.to_string()).unwrap_or_default();
        let count = count.to_string();
        debug!("Fetching history before '{}' (count {})", from_id, count);
        self.get_json(&url, &[("fromId", from_id.as_str()), ("count", count.as_str())])
            .await
    }

    async fn search(&self, query: &str) -> TransportResult<Vec<Message>> {
        let url = format!("{}/messages", self.base_url);
        debug!("Searching messages for '{}'", query);
        self.get_json(&url, &[("search", query)]).await
    }

    async fn upload_file(&self, file: UploadFile) -> TransportResult<UploadedFile> {
        let url = format!("{}/upload", self.base_url);
        info!("Uploading {} ({} bytes, {})", file.name, file.bytes.len(), file.mime);

        let part = multipart::Part::bytes(file.bytes)
            .file_name(file.name)
            .mime_str(&file.mime)
            .map_err(|e| TransportError::ParseError {
                url: url.clone(),
                message: format!("Invalid MIME type: {}", e),
            })?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| connection_failed(&url, e))?;

        handle_response(&url, response).await
    }

    async fn import_history(&self, records: Vec<serde_json::Value>) -> TransportResult<ImportResponse> {
        let url = format!("{}/import", self.base_url);
        info!("Importing {} history records", records.len());

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "history": records }))
            .send()
            .await
            .map_err(|e| connection_failed(&url, e))?;

        handle_response(&url, response).await
    }

    fn send_command(&self, command: Command) {
        let sender = match &self.outbound {
            Some(sender) if self.open.load(Ordering::SeqCst) => sender,
            _ => {
                debug!("Push channel not open, dropping command {:?}", command);
                return;
            }
        };

        match encode_command(&command) {
            Ok(text) => {
                if sender.send(text).is_err() {
                    debug!("Push channel writer gone, command dropped");
                }
            }
            Err(e) => error!("Failed to encode command: {}", e),
        }
    }

    fn export_url(&self) -> String {
        format!("{}/export", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_url_scheme_mapping() {
        assert_eq!(push_url("http://localhost:7070").unwrap().as_str(), "ws://localhost:7070/");
        assert_eq!(push_url("https://chat.example.com/").unwrap().as_str(), "wss://chat.example.com/");
        assert!(push_url("ftp://example.com").is_err());
        assert!(push_url("not a url").is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let transport = HttpTransport::new("http://localhost:7070/").unwrap();
        assert_eq!(transport.base_url(), "http://localhost:7070");
        assert_eq!(transport.export_url(), "http://localhost:7070/export");
    }

    #[test]
    fn test_commands_dropped_without_push_channel() {
        let transport = HttpTransport::new("http://localhost:7070").unwrap();
        assert!(!transport.is_push_open());
        // Must not panic or block
        transport.send_command(Command::ToggleFavorite { id: MessageId::Number(1) });
    }
}
