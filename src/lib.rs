// Re-export needed modules for testing
pub mod attachments;
pub mod crypto;
pub mod error;
pub mod filter;
pub mod location;
pub mod models;
pub mod palette;
pub mod presenter;
pub mod render;
pub mod store;
pub mod sync;
pub mod transport; // HTTP requests plus the WebSocket push channel

// Re-export main types for convenience
pub use error::{ClientError, ClientResult};
pub use models::*;
pub use sync::{Session, SyncController};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_message_from_server_json() {
        let raw = json!({
            "id": 42,
            "sender": "bot",
            "type": "image",
            "content": "http://localhost:7070/uploads/cat.png",
            "fileName": "cat.png",
            "date": 1_700_000_000_123i64,
            "isFavorite": true
        });

        let msg: Message = serde_json::from_value(raw).unwrap();
        assert_eq!(msg.id, MessageId::Number(42));
        assert_eq!(msg.sender, Sender::Bot);
        assert!(!msg.is_from_me());
        assert_eq!(msg.kind, MessageType::Image);
        assert_eq!(msg.file_name.as_deref(), Some("cat.png"));
        assert_eq!(msg.date, Utc.timestamp_millis_opt(1_700_000_000_123).unwrap());
        assert!(msg.is_favorite);
        // Missing flags default to false
        assert!(!msg.is_encrypted);
    }

    #[test]
    fn test_message_tolerates_loose_fields() {
        let raw = json!({
            "id": "abc",
            "sender": "user",
            "type": "hologram",
            "content": "x",
            "date": "2024-03-01T12:00:00Z"
        });

        let msg: Message = serde_json::from_value(raw).unwrap();
        assert_eq!(msg.id, MessageId::Text("abc".to_string()));
        assert!(msg.is_from_me());
        // Unknown types fall back to a downloadable file
        assert_eq!(msg.kind, MessageType::File);
        assert_eq!(msg.date, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_message_treats_null_fields_as_absent() {
        let raw = json!([
            {
                "id": 1,
                "sender": null,
                "type": null,
                "content": null,
                "fileName": null,
                "date": null,
                "isFavorite": null,
                "isEncrypted": null
            },
            { "id": 2, "sender": "bot", "type": "text", "content": "fine", "date": 1700000000000i64 }
        ]);

        let page: Vec<Message> = serde_json::from_value(raw).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].content, "");
        assert_eq!(page[0].kind, MessageType::File);
        assert!(page[0].is_from_me());
        assert!(page[0].file_name.is_none());
        assert_eq!(page[0].date, DateTime::<Utc>::default());
        assert!(!page[0].is_favorite);
        assert!(!page[0].is_encrypted);
        assert_eq!(page[1].content, "fine");
    }

    #[test]
    fn test_message_id_ordering() {
        let mut ids = vec![
            MessageId::Text("b".to_string()),
            MessageId::Number(10),
            MessageId::Text("a".to_string()),
            MessageId::Number(2),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                MessageId::Number(2),
                MessageId::Number(10),
                MessageId::Text("a".to_string()),
                MessageId::Text("b".to_string()),
            ]
        );
        assert_eq!("17".parse::<MessageId>().unwrap(), MessageId::Number(17));
        assert_eq!(" x1 ".parse::<MessageId>().unwrap(), MessageId::Text("x1".to_string()));
    }

    #[test]
    fn test_draft_wire_shape() {
        let plain = serde_json::to_value(MessageDraft::text("hi")).unwrap();
        assert_eq!(plain, json!({"type": "text", "content": "hi"}));

        let secret = serde_json::to_value(MessageDraft::encrypted_text("c2VjcmV0".to_string())).unwrap();
        assert_eq!(secret, json!({"type": "text", "content": "c2VjcmV0", "isEncrypted": true}));

        let file = serde_json::to_value(MessageDraft::attachment(
            MessageType::Audio,
            "http://h/v.webm",
            "voice.webm",
        ))
        .unwrap();
        assert_eq!(
            file,
            json!({"type": "audio", "content": "http://h/v.webm", "fileName": "voice.webm"})
        );
    }

    #[test]
    fn test_geo_point_parsing() {
        let point: GeoPoint = "55.7558, 37.6173".parse().unwrap();
        assert_eq!(point, GeoPoint::new(55.7558, 37.6173).unwrap());
        assert_eq!(MessageDraft::geo(point).content, "55.7558,37.6173");

        assert!("91,0".parse::<GeoPoint>().is_err());
        assert!("0,181".parse::<GeoPoint>().is_err());
        assert!("nowhere".parse::<GeoPoint>().is_err());
    }
}
