//! Local files headed for the upload endpoint.
//!
//! Handles reading files from disk, guessing their MIME type, mapping an
//! uploaded MIME type to a message category, and bundling several files into
//! a single ZIP archive before upload.

use chrono::{DateTime, Utc};
use log::{debug, info};
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::{ClientError, ClientResult};
use crate::models::MessageType;

/// One binary payload for the upload endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: &str, mime: &str, bytes: Vec<u8>) -> Self {
        UploadFile {
            name: name.to_string(),
            mime: mime.to_string(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub fn from_path(path: &Path) -> ClientResult<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());
        let mime = mime_guess::from_path(path).first_or_octet_stream().essence_str().to_string();

        debug!("Read {} ({} bytes, {})", path.display(), bytes.len(), mime);
        Ok(UploadFile { name, mime, bytes })
    }
}

/// Message category for an uploaded file, chosen by the first segment of its
/// MIME type.
pub fn categorize(mime: &str) -> MessageType {
    match mime.split('/').next().unwrap_or("").trim() {
        "image" => MessageType::Image,
        "audio" => MessageType::Audio,
        "video" => MessageType::Video,
        _ => MessageType::File,
    }
}

pub fn archive_name(now: DateTime<Utc>) -> String {
    format!("archive_{}.zip", now.timestamp_millis())
}

/// Pack `files` into one in-memory ZIP archive.
pub fn bundle_zip(files: &[UploadFile], now: DateTime<Utc>) -> ClientResult<UploadFile> {
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for file in files {
        zip.start_file(file.name.as_str(), options)
            .map_err(|e| ClientError::Archive(e.to_string()))?;
        zip.write_all(&file.bytes)?;
    }

    let bytes = zip
        .finish()
        .map_err(|e| ClientError::Archive(e.to_string()))?
        .into_inner();

    let name = archive_name(now);
    info!("Bundled {} files into {} ({} bytes)", files.len(), name, bytes.len());
    Ok(UploadFile::new(&name, "application/zip", bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Read;

    #[test]
    fn test_categorize() {
        assert_eq!(categorize("image/png"), MessageType::Image);
        assert_eq!(categorize("audio/wav"), MessageType::Audio);
        assert_eq!(categorize("video/mp4"), MessageType::Video);
        assert_eq!(categorize("application/zip"), MessageType::File);
        assert_eq!(categorize("text/plain"), MessageType::File);
        assert_eq!(categorize(""), MessageType::File);
    }

    #[test]
    fn test_from_path_guesses_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, b"\x89PNG fake").unwrap();

        let file = UploadFile::from_path(&path).unwrap();
        assert_eq!(file.name, "photo.png");
        assert_eq!(file.mime, "image/png");
        assert_eq!(file.bytes, b"\x89PNG fake");
    }

    #[test]
    fn test_from_missing_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = UploadFile::from_path(&dir.path().join("missing.bin"));
        assert!(matches!(result, Err(ClientError::Io(_))));
    }

    #[test]
    fn test_bundle_zip_contains_every_file() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let files = vec![
            UploadFile::new("a.txt", "text/plain", b"alpha".to_vec()),
            UploadFile::new("b.txt", "text/plain", b"beta".to_vec()),
        ];

        let archive = bundle_zip(&files, now).unwrap();
        assert_eq!(archive.name, "archive_1700000000123.zip");
        assert_eq!(archive.mime, "application/zip");

        let mut reader = zip::ZipArchive::new(Cursor::new(archive.bytes)).unwrap();
        assert_eq!(reader.len(), 2);
        let mut contents = String::new();
        reader.by_name("b.txt").unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "beta");
    }
}
