use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Server-assigned message identifier.
///
/// The server hands out numeric ids in practice, but the wire format does not
/// promise it, so string ids are accepted too. Numbers order numerically and
/// sort before strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    Number(i64),
    Text(String),
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Number(n) => write!(f, "{}", n),
            MessageId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for MessageId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed.parse::<i64>() {
            Ok(n) => MessageId::Number(n),
            Err(_) => MessageId::Text(trimmed.to_string()),
        })
    }
}

impl From<i64> for MessageId {
    fn from(n: i64) -> Self {
        MessageId::Number(n)
    }
}

/// Who wrote a message. The server tags the remote peer as "bot"; every other
/// tag is the local user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sender {
    #[default]
    Me,
    Bot,
}

impl From<String> for Sender {
    fn from(tag: String) -> Self {
        if tag == "bot" {
            Sender::Bot
        } else {
            Sender::Me
        }
    }
}

impl From<Sender> for String {
    fn from(sender: Sender) -> Self {
        match sender {
            Sender::Me => "user".to_string(),
            Sender::Bot => "bot".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    Text,
    Image,
    Video,
    Audio,
    File,
    Sticker,
    Geo,
}

impl MessageType {
    pub const ALL: [MessageType; 7] = [
        MessageType::Text,
        MessageType::Image,
        MessageType::Video,
        MessageType::Audio,
        MessageType::File,
        MessageType::Sticker,
        MessageType::Geo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
            MessageType::Video => "video",
            MessageType::Audio => "audio",
            MessageType::File => "file",
            MessageType::Sticker => "sticker",
            MessageType::Geo => "geo",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown message type: {}", s))
    }
}

// Anything the server sends that we don't know is rendered as a downloadable file
impl From<String> for MessageType {
    fn from(tag: String) -> Self {
        tag.parse().unwrap_or(MessageType::File)
    }
}

impl From<MessageType> for String {
    fn from(kind: MessageType) -> Self {
        kind.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sender: Sender,
    #[serde(rename = "type", default = "unknown_kind", deserialize_with = "kind_or_file")]
    pub kind: MessageType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default = "epoch", with = "date_format")]
    pub date: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_favorite: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_encrypted: bool,
}

// A null field reads as if it were absent
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn kind_or_file<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<MessageType, D::Error> {
    Ok(Option::<MessageType>::deserialize(deserializer)?.unwrap_or_else(unknown_kind))
}

fn unknown_kind() -> MessageType {
    MessageType::File
}

impl Message {
    pub fn is_from_me(&self) -> bool {
        self.sender == Sender::Me
    }
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

/// Content the client builds locally and hands to the server. It has no id or
/// date and is never put in the store; the authoritative copy comes back
/// through the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDraft {
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_encrypted: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl MessageDraft {
    pub fn text(content: &str) -> Self {
        MessageDraft {
            kind: MessageType::Text,
            content: content.to_string(),
            file_name: None,
            is_encrypted: false,
        }
    }

    pub fn encrypted_text(ciphertext: String) -> Self {
        MessageDraft {
            kind: MessageType::Text,
            content: ciphertext,
            file_name: None,
            is_encrypted: true,
        }
    }

    pub fn sticker(url: &str) -> Self {
        MessageDraft {
            kind: MessageType::Sticker,
            content: url.to_string(),
            file_name: None,
            is_encrypted: false,
        }
    }

    pub fn geo(point: GeoPoint) -> Self {
        MessageDraft {
            kind: MessageType::Geo,
            content: point.to_string(),
            file_name: None,
            is_encrypted: false,
        }
    }

    pub fn attachment(kind: MessageType, url: &str, file_name: &str) -> Self {
        MessageDraft {
            kind,
            content: url.to_string(),
            file_name: Some(file_name.to_string()),
            is_encrypted: false,
        }
    }
}

/// A latitude/longitude pair, carried on the wire as `"lat,lon"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Result<Self, String> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(format!("Latitude out of range: {}", lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(format!("Longitude out of range: {}", lon));
        }
        Ok(GeoPoint { lat, lon })
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

impl FromStr for GeoPoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| format!("Expected \"lat,lon\", got \"{}\"", s))?;
        let lat = lat
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("Invalid latitude: {}", e))?;
        let lon = lon
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("Invalid longitude: {}", e))?;
        GeoPoint::new(lat, lon)
    }
}

/// Server reply to an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub url: String,
    #[serde(rename = "type")]
    pub mime: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResponse {
    #[serde(default)]
    pub success: bool,
}

// The server writes dates as milliseconds since the epoch; older exports carry
// RFC 3339 strings instead.
mod date_format {
    use super::*;
    use serde::{Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDate {
        Millis(i64),
        Float(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(date.timestamp_millis())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = match Option::<RawDate>::deserialize(deserializer)? {
            Some(raw) => raw,
            None => return Ok(epoch()),
        };
        let parsed = match raw {
            RawDate::Millis(ms) => Utc.timestamp_millis_opt(ms).single(),
            RawDate::Float(ms) => Utc.timestamp_millis_opt(ms as i64).single(),
            RawDate::Text(text) => DateTime::parse_from_rfc3339(&text)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        };
        parsed.ok_or_else(|| serde::de::Error::custom("invalid message date"))
    }
}
