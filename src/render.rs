//! Text rendering helpers shared by every presenter.
//!
//! These turn a [`Message`] into the strings a front end shows: the pinned
//! banner preview, the message body, link segments and the time label.

use chrono::{DateTime, Local, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Message, MessageType};

static LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s]+").expect("link pattern is valid"));

/// A piece of message text, either plain or a clickable link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Link(&'a str),
}

/// Split text into plain runs and `http(s)://` links.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut last = 0;
    for found in LINK_RE.find_iter(text) {
        if found.start() > last {
            out.push(Segment::Plain(&text[last..found.start()]));
        }
        out.push(Segment::Link(found.as_str()));
        last = found.end();
    }
    if last < text.len() {
        out.push(Segment::Plain(&text[last..]));
    }
    out
}

/// Banner preview for a pinned message: text content, or `[type]` otherwise.
pub fn pin_preview(message: &Message) -> String {
    match message.kind {
        MessageType::Text => message.content.clone(),
        other => format!("[{}]", other),
    }
}

pub fn map_link(coords: &str) -> String {
    format!("https://maps.google.com/?q={}", coords)
}

/// One-line body for terminal display.
pub fn body(message: &Message) -> String {
    if message.is_encrypted {
        return format!("🔒 Secret message (/decrypt {})", message.id);
    }
    let file_name = message.file_name.as_deref().unwrap_or("file");
    match message.kind {
        MessageType::Text => message.content.clone(),
        MessageType::Sticker => format!("[sticker] {}", message.content),
        MessageType::Geo => format!("📍 Location: {}", map_link(&message.content)),
        MessageType::Image => format!("🖼 {} ({})", file_name, message.content),
        MessageType::Video => format!("🎬 {} ({})", file_name, message.content),
        MessageType::Audio => format!("🎵 {} ({})", file_name, message.content),
        MessageType::File => format!("💾 {} ({})", file_name, message.content),
    }
}

/// Local wall-clock time of a message, e.g. `14:03:27`.
pub fn time_label(date: &DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageId, Sender};

    fn msg(kind: MessageType, content: &str) -> Message {
        Message {
            id: MessageId::Number(1),
            sender: Sender::Me,
            kind,
            content: content.to_string(),
            file_name: None,
            date: Utc::now(),
            is_favorite: false,
            is_encrypted: false,
        }
    }

    #[test]
    fn test_pin_preview() {
        assert_eq!(pin_preview(&msg(MessageType::Text, "hello")), "hello");
        assert_eq!(pin_preview(&msg(MessageType::Image, "http://x/a.png")), "[image]");
        assert_eq!(pin_preview(&msg(MessageType::Geo, "1,2")), "[geo]");
    }

    #[test]
    fn test_segments() {
        let text = "see https://example.com/a?b=1 and http://x.org";
        assert_eq!(
            segments(text),
            vec![
                Segment::Plain("see "),
                Segment::Link("https://example.com/a?b=1"),
                Segment::Plain(" and "),
                Segment::Link("http://x.org"),
            ]
        );
        assert_eq!(segments("no links"), vec![Segment::Plain("no links")]);
        assert!(segments("").is_empty());
    }

    #[test]
    fn test_body_variants() {
        assert_eq!(
            body(&msg(MessageType::Geo, "55.75,37.61")),
            "📍 Location: https://maps.google.com/?q=55.75,37.61"
        );

        let mut file = msg(MessageType::File, "http://x/report.pdf");
        file.file_name = Some("report.pdf".to_string());
        assert_eq!(body(&file), "💾 report.pdf (http://x/report.pdf)");

        let mut secret = msg(MessageType::Text, "U2FsdGVk");
        secret.is_encrypted = true;
        assert!(body(&secret).starts_with("🔒"));
        assert!(!body(&secret).contains("U2FsdGVk"));
    }
}
