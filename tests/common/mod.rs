// Common test utilities for integration tests
// A scripted transport, a presenter that records what it was told, and message builders
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use log::LevelFilter;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, Once};

use chatline::attachments::UploadFile;
use chatline::models::{ImportResponse, Message, MessageId, MessageType, Sender, UploadedFile};
use chatline::presenter::{Notice, NoticeLevel, Presenter};
use chatline::transport::{Command, Transport, TransportError, TransportResult};

// Initialize logging once
static INIT_LOGGER: Once = Once::new();

/// Set up the logger for the tests
pub fn setup_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();
    });
}

/// A text message from the bot with a predictable timestamp.
pub fn text(id: i64, content: &str) -> Message {
    Message {
        id: MessageId::Number(id),
        sender: Sender::Bot,
        kind: MessageType::Text,
        content: content.to_string(),
        file_name: None,
        date: Utc.timestamp_millis_opt(1_700_000_000_000 + id * 1000).unwrap(),
        is_favorite: false,
        is_encrypted: false,
    }
}

pub fn of_kind(id: i64, kind: MessageType) -> Message {
    Message {
        kind,
        content: format!("http://test/uploads/{}", id),
        file_name: Some(format!("file-{}", id)),
        ..text(id, "")
    }
}

pub fn favorite(id: i64, content: &str) -> Message {
    Message {
        is_favorite: true,
        ..text(id, content)
    }
}

pub fn page(ids: std::ops::RangeInclusive<i64>) -> Vec<Message> {
    ids.map(|id| text(id, &format!("message {}", id))).collect()
}

pub fn ids(messages: &[Message]) -> Vec<MessageId> {
    messages.iter().map(|m| m.id.clone()).collect()
}

/// One request the controller made.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Fetch { before: Option<MessageId>, count: usize },
    Search(String),
    Upload { name: String, mime: String, size: usize },
    Import(usize),
}

/// Transport that serves scripted history pages and records every call.
#[derive(Default)]
pub struct MockTransport {
    pages: Mutex<VecDeque<Vec<Message>>>,
    search_results: Mutex<Vec<Message>>,
    import_success: Mutex<Option<bool>>,
    fail_requests: AtomicBool,
    rejected_uploads: Mutex<Vec<String>>,
    calls: Mutex<Vec<Call>>,
    sent: Mutex<Vec<Command>>,
    uploads: Mutex<Vec<UploadFile>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a page for the next history fetch. Unqueued fetches return nothing.
    pub fn with_page(self, page: Vec<Message>) -> Self {
        self.pages.lock().unwrap().push_back(page);
        self
    }

    pub fn with_search_results(self, results: Vec<Message>) -> Self {
        *self.search_results.lock().unwrap() = results;
        self
    }

    pub fn with_import_success(self, success: bool) -> Self {
        *self.import_success.lock().unwrap() = Some(success);
        self
    }

    pub fn queue_page(&self, page: Vec<Message>) {
        self.pages.lock().unwrap().push_back(page);
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_requests.store(failing, Ordering::SeqCst);
    }

    /// Make uploads of the named file fail with a server error.
    pub fn reject_upload(&self, name: &str) {
        self.rejected_uploads.lock().unwrap().push(name.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<Command> {
        self.sent.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<UploadFile> {
        self.uploads.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> TransportResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail_requests.load(Ordering::SeqCst) {
            return Err(TransportError::BadStatus {
                url: "http://test".to_string(),
                status: 500,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch_history(&self, before: Option<&MessageId>, count: usize) -> TransportResult<Vec<Message>> {
        self.record(Call::Fetch {
            before: before.cloned(),
            count,
        })?;
        Ok(self.pages.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn search(&self, query: &str) -> TransportResult<Vec<Message>> {
        self.record(Call::Search(query.to_string()))?;
        Ok(self.search_results.lock().unwrap().clone())
    }

    async fn upload_file(&self, file: UploadFile) -> TransportResult<UploadedFile> {
        self.record(Call::Upload {
            name: file.name.clone(),
            mime: file.mime.clone(),
            size: file.bytes.len(),
        })?;
        if self.rejected_uploads.lock().unwrap().contains(&file.name) {
            return Err(TransportError::BadStatus {
                url: "http://test/upload".to_string(),
                status: 500,
            });
        }
        let uploaded = UploadedFile {
            url: format!("http://test/uploads/{}", file.name),
            mime: file.mime.clone(),
            name: file.name.clone(),
        };
        self.uploads.lock().unwrap().push(file);
        Ok(uploaded)
    }

    async fn import_history(&self, records: Vec<serde_json::Value>) -> TransportResult<ImportResponse> {
        self.record(Call::Import(records.len()))?;
        Ok(ImportResponse {
            success: self.import_success.lock().unwrap().unwrap_or(true),
        })
    }

    fn send_command(&self, command: Command) {
        self.sent.lock().unwrap().push(command);
    }

    fn export_url(&self) -> String {
        "http://test/export".to_string()
    }
}

/// Presenter that keeps what a screen would show, plus counters.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub shown: Vec<MessageId>,
    pub full_renders: usize,
    pub incremental_renders: usize,
    pub scrolls: usize,
    pub pinned: Option<(MessageId, String)>,
    pub revealed: HashMap<MessageId, String>,
    pub notices: Vec<Notice>,
}

impl RecordingPresenter {
    pub fn errors(&self) -> Vec<String> {
        self.notices
            .iter()
            .filter(|n| n.level == NoticeLevel::Error)
            .map(|n| n.text.clone())
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.notices
            .iter()
            .filter(|n| n.level == NoticeLevel::Info)
            .map(|n| n.text.clone())
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn render_all(&mut self, visible: &[&Message]) {
        self.full_renders += 1;
        self.shown = visible.iter().map(|m| m.id.clone()).collect();
    }

    fn render_message(&mut self, message: &Message) {
        self.incremental_renders += 1;
        self.shown.push(message.id.clone());
    }

    fn scroll_to_bottom(&mut self) {
        self.scrolls += 1;
    }

    fn show_pinned(&mut self, id: &MessageId, preview: &str) {
        self.pinned = Some((id.clone(), preview.to_string()));
    }

    fn hide_pinned(&mut self) {
        self.pinned = None;
    }

    fn reveal_plaintext(&mut self, id: &MessageId, plaintext: &str) {
        self.revealed.insert(id.clone(), plaintext.to_string());
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}
