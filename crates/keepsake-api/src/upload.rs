//! Multipart upload intake.
//!
//! File parts are buffered fully in memory; nothing touches disk.
//! A part is rejected before any storage or database call when its
//! declared content type is outside the image/video/audio allowlist or
//! its size exceeds the per-file ceiling. Non-file parts are collected
//! as text metadata fields.

use std::collections::HashMap;

use axum::extract::Multipart;

use keepsake_core::{Error, MediaKind, Result};

use crate::error::ApiError;

/// Per-file size ceiling: 50 MiB, sized for phone video clips.
pub const MAX_FILE_BYTES: usize = 50 * 1024 * 1024;

/// Ceiling on file parts in one request, matching the bulk endpoint's
/// batch size.
pub const MAX_FILES_PER_REQUEST: usize = 20;

/// One fully-buffered uploaded file part.
pub struct UploadedFile {
    /// Multipart field name ("file", "audio", "files"...).
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// File extension from the client-supplied name.
    pub fn extension(&self) -> &str {
        match self.file_name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext,
            _ => "bin",
        }
    }

    /// Media classification from the declared content type.
    pub fn media_kind(&self) -> MediaKind {
        media_kind_for(&self.content_type)
    }
}

/// Everything one multipart request carried.
#[derive(Default)]
pub struct MultipartBody {
    pub files: Vec<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl MultipartBody {
    /// First file uploaded under `field`, if any.
    pub fn file(&self, field: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.field == field)
    }

    /// Text field by name, empty strings treated as absent.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }
}

/// Reject content types outside the allowlist.
pub fn validate_content_type(content_type: &str) -> Result<()> {
    if content_type.starts_with("image/")
        || content_type.starts_with("video/")
        || content_type.starts_with("audio/")
    {
        Ok(())
    } else {
        Err(Error::UnsupportedFileType(format!(
            "{} — please upload an image, video, or audio file",
            content_type
        )))
    }
}

/// Reject a request already carrying the maximum number of file parts.
pub fn ensure_file_capacity(current_files: usize) -> Result<()> {
    if current_files >= MAX_FILES_PER_REQUEST {
        Err(Error::InvalidInput(format!(
            "too many files; limit is {} per request",
            MAX_FILES_PER_REQUEST
        )))
    } else {
        Ok(())
    }
}

/// Map a declared content type to its media row classification.
pub fn media_kind_for(content_type: &str) -> MediaKind {
    if content_type.starts_with("video") {
        MediaKind::Video
    } else if content_type.starts_with("audio") {
        MediaKind::Audio
    } else {
        MediaKind::Image
    }
}

/// Drain a multipart stream into buffered files and text fields.
///
/// Validation happens per part, before the next part is read, so an
/// unsupported or oversized file aborts the request without side
/// effects.
pub async fn collect_multipart(mut multipart: Multipart) -> std::result::Result<MultipartBody, ApiError> {
    let mut body = MultipartBody::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(file_name) = field.file_name().map(ToString::to_string) {
            ensure_file_capacity(body.files.len())?;
            let content_type = field.content_type().unwrap_or_default().to_string();
            validate_content_type(&content_type)?;

            let data = field.bytes().await?;
            if data.len() > MAX_FILE_BYTES {
                return Err(Error::FileTooLarge(format!(
                    "{} is {} bytes, ceiling is {}",
                    file_name,
                    data.len(),
                    MAX_FILE_BYTES
                ))
                .into());
            }

            body.files.push(UploadedFile {
                field: name,
                file_name,
                content_type,
                data: data.to_vec(),
            });
        } else {
            let value = field.text().await?;
            body.fields.insert(name, value);
        }
    }

    Ok(body)
}
