//! Sync controller
//!
//! Owns the session state and is the only thing that mutates it. Push events
//! from the server and intents from the user both land here; after each
//! change the controller tells the presenter what to show.
//!
//! Nothing is atomic across an `.await`: a page fetch and a push can
//! interleave, and no ordering between them is promised.

use chrono::Utc;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::attachments::{self, UploadFile};
use crate::crypto;
use crate::error::{ClientError, ClientResult};
use crate::filter::{self, CategoryFilter, ViewMode};
use crate::location::{FixedLocation, LocationProvider};
use crate::models::{Message, MessageDraft, MessageId};
use crate::palette;
use crate::presenter::{Notice, Presenter};
use crate::render;
use crate::store::MessageStore;
use crate::transport::{Command, PushEvent, Transport, DEFAULT_PAGE_SIZE};

/// State for one chat session.
#[derive(Debug, Default)]
pub struct Session {
    pub store: MessageStore,
    pub view: ViewMode,
    /// Category to return to when a search is cleared
    pub category: CategoryFilter,
    pub pinned: Option<MessageId>,
    pub encryption: bool,
}

pub struct SyncController<T: Transport, P: Presenter> {
    transport: T,
    presenter: P,
    session: Session,
    page_size: usize,
    location: Box<dyn LocationProvider>,
}

impl<T: Transport, P: Presenter> SyncController<T, P> {
    pub fn new(transport: T, presenter: P) -> Self {
        SyncController {
            transport,
            presenter,
            session: Session::default(),
            page_size: DEFAULT_PAGE_SIZE,
            location: Box::new(FixedLocation::unavailable()),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_location(mut self, location: Box<dyn LocationProvider>) -> Self {
        self.location = location;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn visible(&self) -> Vec<&Message> {
        filter::visible(&self.session.store, &self.session.view)
    }

    // ---- push events ----

    pub async fn handle_push(&mut self, event: PushEvent) {
        debug!("Handling push event {}", event.kind());
        match event {
            PushEvent::NewMessage { data } => self.on_new_message(data),
            PushEvent::UpdateMessage { data } => self.on_update_message(data),
            PushEvent::PinMessage { id } => self.on_pin_message(&id),
            PushEvent::HistoryUpdated => self.on_history_updated().await,
        }
    }

    fn on_new_message(&mut self, message: Message) {
        let shown = self.session.view.shows(&message);
        self.session.store.append(message);

        if shown {
            if let Some(newest) = self.session.store.newest() {
                self.presenter.render_message(newest);
            }
            self.presenter.scroll_to_bottom();
        }
    }

    fn on_update_message(&mut self, message: Message) {
        let id = message.id.clone();
        if !self.session.store.replace_by_id(message) {
            return;
        }

        self.rerender();

        // Keep the banner preview in step with the pinned record
        if self.session.pinned.as_ref() == Some(&id) {
            self.on_pin_message(&id);
        }
    }

    fn on_pin_message(&mut self, id: &MessageId) {
        match self.session.store.find(id) {
            Some(message) => {
                let preview = render::pin_preview(message);
                self.session.pinned = Some(id.clone());
                self.presenter.show_pinned(id, &preview);
            }
            None => {
                // The pinned record is outside what we hold locally
                debug!("Pinned message {} not in local store, hiding banner", id);
                self.session.pinned = None;
                self.presenter.hide_pinned();
            }
        }
    }

    async fn on_history_updated(&mut self) {
        info!("Server invalidated history, resyncing");
        self.session.store.clear();
        self.rerender();
        if self.session.pinned.take().is_some() {
            self.presenter.hide_pinned();
        }

        // Failures are already reported to the user by load_latest
        let _ = self.load_latest().await;
        self.presenter
            .notify(Notice::info("Chat history was updated by the server"));
    }

    // ---- history and views ----

    /// Replace the store with the most recent page.
    pub async fn load_latest(&mut self) -> ClientResult<()> {
        let page = match self.transport.fetch_history(None, self.page_size).await {
            Ok(page) => page,
            Err(e) => return self.fail(e.into()),
        };

        info!("Loaded {} recent messages", page.len());
        self.session.store.reset(page);
        self.rerender();
        self.presenter.scroll_to_bottom();
        Ok(())
    }

    /// Load the page before the oldest held message. Returns whether anything
    /// was added.
    pub async fn load_older(&mut self) -> ClientResult<bool> {
        let before = match self.session.store.oldest_id() {
            Some(id) => id.clone(),
            None => return Ok(false),
        };

        let page = match self.transport.fetch_history(Some(&before), self.page_size).await {
            Ok(page) => page,
            Err(e) => return self.fail(e.into()),
        };

        if page.is_empty() {
            debug!("No history before {}", before);
            return Ok(false);
        }

        self.session.store.prepend(page);
        self.rerender();
        Ok(true)
    }

    pub fn set_filter(&mut self, category: CategoryFilter) {
        info!("Filter set to {}", category);
        self.session.category = category;
        self.session.view = ViewMode::Category(category);
        self.rerender();
    }

    /// Run a server-side search. Blank input leaves search mode and reloads
    /// the most recent page.
    pub async fn search(&mut self, raw_query: &str) -> ClientResult<()> {
        let query = match filter::normalize_query(raw_query) {
            Some(query) => query,
            None => {
                self.session.view = ViewMode::Category(self.session.category);
                return self.load_latest().await;
            }
        };

        let results = match self.transport.search(&query).await {
            Ok(results) => results,
            Err(e) => return self.fail(e.into()),
        };

        info!("Search '{}' returned {} messages", query, results.len());
        self.session.store.reset(results);
        self.session.view = ViewMode::Search(query);
        self.rerender();
        Ok(())
    }

    // ---- outgoing content ----

    pub fn toggle_encryption(&mut self) -> bool {
        self.session.encryption = !self.session.encryption;
        info!("Encryption mode {}", if self.session.encryption { "on" } else { "off" });
        self.session.encryption
    }

    pub fn encryption_enabled(&self) -> bool {
        self.session.encryption
    }

    /// Send a text message. Blank text is ignored. With encryption on, a
    /// missing or empty passphrase silently cancels the send. Returns whether
    /// a command went out.
    pub fn send_text(&mut self, text: &str, passphrase: Option<&str>) -> ClientResult<bool> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(false);
        }

        let draft = if self.session.encryption {
            let passphrase = match passphrase {
                Some(p) if !p.is_empty() => p,
                _ => return Ok(false),
            };
            match crypto::encrypt_text(text, passphrase) {
                Ok(sealed) => MessageDraft::encrypted_text(sealed),
                Err(e) => return self.fail(e.into()),
            }
        } else {
            MessageDraft::text(text)
        };

        self.transport.send_command(Command::NewMessage { data: draft });
        Ok(true)
    }

    pub fn send_sticker(&mut self, index: usize) -> ClientResult<()> {
        let url = match palette::sticker(index) {
            Some(url) => url,
            None => return self.fail(ClientError::Validation(format!("No sticker #{}", index))),
        };
        self.transport
            .send_command(Command::NewMessage { data: MessageDraft::sticker(url) });
        Ok(())
    }

    pub async fn send_geo(&mut self) -> ClientResult<()> {
        let point = match self.location.current_location().await {
            Ok(point) => point,
            Err(e) => return self.fail(e),
        };
        self.transport
            .send_command(Command::NewMessage { data: MessageDraft::geo(point) });
        Ok(())
    }

    /// Upload files and announce each as a message. Several files are either
    /// bundled into one ZIP archive or uploaded one by one. Returns the number
    /// of messages sent. One by one, a failed upload is reported and the rest
    /// still go out; the call fails only when nothing was sent.
    pub async fn send_files(&mut self, paths: &[PathBuf], bundle: bool) -> ClientResult<usize> {
        if paths.is_empty() {
            return Ok(0);
        }

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            match UploadFile::from_path(path) {
                Ok(file) => files.push(file),
                Err(e) => return self.fail(e),
            }
        }

        if files.len() > 1 && bundle {
            let archive = match attachments::bundle_zip(&files, Utc::now()) {
                Ok(archive) => archive,
                Err(e) => return self.fail(e),
            };
            self.upload_and_send(archive).await?;
            return Ok(1);
        }

        let mut sent = 0;
        let mut last_err = None;
        for file in files {
            // upload_and_send has already notified the user on failure
            match self.upload_and_send(file).await {
                Ok(()) => sent += 1,
                Err(e) => last_err = Some(e),
            }
        }
        match last_err {
            Some(e) if sent == 0 => Err(e),
            _ => Ok(sent),
        }
    }

    /// Send a recorded voice clip.
    pub async fn send_voice(&mut self, path: &Path) -> ClientResult<()> {
        let file = match UploadFile::from_path(path) {
            Ok(file) => file,
            Err(ClientError::Io(e)) => {
                return self.fail(ClientError::Permission(format!("No access to the recording: {}", e)))
            }
            Err(e) => return self.fail(e),
        };

        if !file.mime.starts_with("audio/") {
            return self.fail(ClientError::Validation(format!(
                "{} is not an audio recording",
                file.name
            )));
        }
        self.upload_and_send(file).await
    }

    async fn upload_and_send(&mut self, file: UploadFile) -> ClientResult<()> {
        let uploaded = match self.transport.upload_file(file).await {
            Ok(uploaded) => uploaded,
            Err(e) => return self.fail(e.into()),
        };

        let kind = attachments::categorize(&uploaded.mime);
        debug!("Uploaded {} as {} -> {}", uploaded.name, kind, uploaded.url);
        self.transport.send_command(Command::NewMessage {
            data: MessageDraft::attachment(kind, &uploaded.url, &uploaded.name),
        });
        Ok(())
    }

    // ---- favorites and pinning ----

    pub fn toggle_favorite(&mut self, id: MessageId) {
        self.transport.send_command(Command::ToggleFavorite { id });
    }

    pub fn pin(&mut self, id: MessageId) {
        self.transport.send_command(Command::PinMessage { id });
    }

    /// Dismiss the pinned banner locally. The server keeps its pin.
    pub fn unpin(&mut self) {
        self.session.pinned = None;
        self.presenter.hide_pinned();
    }

    // ---- import / export / decrypt ----

    /// Submit an exported history. The payload must be a JSON array; anything
    /// else is rejected before contacting the server. Returns the server's
    /// verdict.
    pub async fn import_history(&mut self, payload: &[u8]) -> ClientResult<bool> {
        let records = match serde_json::from_slice::<serde_json::Value>(payload) {
            Ok(serde_json::Value::Array(records)) => records,
            Ok(_) | Err(_) => {
                return self.fail(ClientError::Validation(
                    "Import failed: the file is not a message history".to_string(),
                ))
            }
        };

        let response = match self.transport.import_history(records).await {
            Ok(response) => response,
            Err(e) => return self.fail(e.into()),
        };

        if response.success {
            self.presenter.notify(Notice::info("Import succeeded"));
        } else {
            warn!("Server rejected history import");
            self.presenter.notify(Notice::error("The server rejected the import"));
        }
        Ok(response.success)
    }

    pub async fn import_file(&mut self, path: &Path) -> ClientResult<bool> {
        let payload = match std::fs::read(path) {
            Ok(payload) => payload,
            Err(e) => return self.fail(e.into()),
        };
        self.import_history(&payload).await
    }

    pub fn export_url(&self) -> String {
        self.transport.export_url()
    }

    /// Decrypt an encrypted message for display. The stored ciphertext is left
    /// as it is.
    pub fn decrypt(&mut self, id: &MessageId, passphrase: &str) -> ClientResult<String> {
        let found = self
            .session
            .store
            .find(id)
            .map(|m| (m.is_encrypted, m.content.clone()));
        let sealed = match found {
            Some((true, content)) => content,
            Some((false, _)) => {
                return self.fail(ClientError::Validation(format!("Message {} is not encrypted", id)))
            }
            None => return self.fail(ClientError::Validation(format!("Message {} not found", id))),
        };

        match crypto::decrypt_text(&sealed, passphrase) {
            Ok(plaintext) => {
                self.presenter.reveal_plaintext(id, &plaintext);
                Ok(plaintext)
            }
            Err(e) => self.fail(e.into()),
        }
    }

    // ---- helpers ----

    fn rerender(&mut self) {
        let visible = filter::visible(&self.session.store, &self.session.view);
        debug!("Rendering {} of {} messages", visible.len(), self.session.store.len());
        self.presenter.render_all(&visible);
    }

    /// Report `err` to the user and hand it back to the caller.
    fn fail<R>(&mut self, err: ClientError) -> ClientResult<R> {
        warn!("{}", err);
        self.presenter.notify(Notice::error(err.user_message()));
        Err(err)
    }
}
