// Transport module for chatline
// Request/response calls go over HTTP, live notifications arrive over the push channel

use async_trait::async_trait;

use crate::attachments::UploadFile;
use crate::models::{ImportResponse, Message, MessageId, UploadedFile};

pub mod envelope;
pub mod error;
pub mod http;

pub use envelope::{Command, PushEvent};
pub use error::{TransportError, TransportResult};
pub use http::HttpTransport;

/// Number of messages requested per history page unless configured otherwise
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Everything the sync controller needs from the server.
///
/// Implementations must not reorder or deduplicate anything; the controller
/// relies on pages arriving oldest-to-newest.
#[async_trait]
pub trait Transport: Send + Sync {
    /// One page of history. `before` is the id of the oldest message already
    /// held; `None` asks for the most recent page. Empty when exhausted.
    async fn fetch_history(&self, before: Option<&MessageId>, count: usize) -> TransportResult<Vec<Message>>;

    /// Server-side full text search.
    async fn search(&self, query: &str) -> TransportResult<Vec<Message>>;

    async fn upload_file(&self, file: UploadFile) -> TransportResult<UploadedFile>;

    /// Submit externally supplied records. They are passed through untouched.
    async fn import_history(&self, records: Vec<serde_json::Value>) -> TransportResult<ImportResponse>;

    /// Fire-and-forget. Dropped without error if the push channel is not open.
    fn send_command(&self, command: Command);

    /// Link to the server-rendered export of the whole history.
    fn export_url(&self) -> String;
}
