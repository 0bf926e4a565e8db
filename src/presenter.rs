// Presentation seam: the controller pushes snapshots and notices through this trait

use crate::models::{Message, MessageId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message for the user, the equivalent of a blocking alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

pub trait Presenter {
    /// Replace everything shown with `visible`, oldest first.
    fn render_all(&mut self, visible: &[&Message]);

    /// Add one message at the bottom of what is shown.
    fn render_message(&mut self, message: &Message);

    fn scroll_to_bottom(&mut self);

    fn show_pinned(&mut self, id: &MessageId, preview: &str);

    fn hide_pinned(&mut self);

    /// Show decrypted text in place of an encrypted message.
    fn reveal_plaintext(&mut self, id: &MessageId, plaintext: &str);

    fn notify(&mut self, notice: Notice);
}
