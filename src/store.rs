//! In-memory message store for one session.
//!
//! Records are kept in ascending identifier order. The store itself never
//! sorts or deduplicates; it trusts that the server delivers pages
//! oldest-to-newest and pushes in creation order.

use log::{debug, trace};

use crate::models::{Message, MessageId};

#[derive(Debug, Default, Clone)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        MessageStore { messages }
    }

    /// Add a message at the tail. Duplicate pushes are not filtered out.
    pub fn append(&mut self, message: Message) {
        trace!("Appending message {}", message.id);
        self.messages.push(message);
    }

    /// Insert an older page at the head, keeping the page's own order.
    pub fn prepend(&mut self, page: Vec<Message>) {
        if page.is_empty() {
            return;
        }
        debug!("Prepending {} older messages", page.len());
        let mut merged = page;
        merged.append(&mut self.messages);
        self.messages = merged;
    }

    /// Replace the record carrying the same id. Returns `false` and leaves the
    /// store untouched when no such record exists.
    pub fn replace_by_id(&mut self, message: Message) -> bool {
        match self.messages.iter().position(|m| m.id == message.id) {
            Some(idx) => {
                trace!("Replacing message {} at position {}", message.id, idx);
                self.messages[idx] = message;
                true
            }
            None => {
                debug!("Ignoring update for unknown message {}", message.id);
                false
            }
        }
    }

    /// Drop everything and adopt a new collection.
    pub fn reset(&mut self, messages: Vec<Message>) {
        debug!("Resetting store: {} -> {} messages", self.messages.len(), messages.len());
        self.messages = messages;
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn find(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    /// Cursor for loading the page before everything we hold.
    pub fn oldest_id(&self) -> Option<&MessageId> {
        self.messages.first().map(|m| &m.id)
    }

    pub fn newest(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }
}
