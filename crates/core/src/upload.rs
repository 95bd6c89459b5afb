//! Upload request model and client-side validation.
//!
//! Validation runs before any network traffic. Checks are ordered (file
//! presence, extension, size, target language) and stop at the first
//! failure so the user sees one actionable warning at a time.

use std::path::PathBuf;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Video container extensions the dubbing server accepts.
pub const ALLOWED_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm"];

/// Largest accepted upload: 500 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// Multipart field carrying the video payload.
pub const FIELD_VIDEO: &str = "video";

/// Multipart field carrying the target language code.
pub const FIELD_TARGET_LANGUAGE: &str = "target_language";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where the bytes of a [`VideoFile`] come from.
#[derive(Debug, Clone)]
pub enum VideoSource {
    /// Contents already held in memory.
    Memory(Vec<u8>),
    /// A file on disk, read while the upload streams.
    Path(PathBuf),
}

/// A video file selected for upload.
#[derive(Debug, Clone)]
pub struct VideoFile {
    /// File name as chosen by the user, including extension.
    pub name: String,
    size: u64,
    source: VideoSource,
}

impl VideoFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: data.len() as u64,
            source: VideoSource::Memory(data),
        }
    }

    /// A file on disk with its declared size, normally taken from the
    /// file's metadata. Nothing is read until the upload starts.
    pub fn from_path(name: impl Into<String>, path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            source: VideoSource::Path(path.into()),
        }
    }

    /// Declared size of the payload in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn source(&self) -> &VideoSource {
        &self.source
    }

    pub fn into_source(self) -> VideoSource {
        self.source
    }

    /// Lower-cased extension after the last `.`, if any.
    pub fn extension(&self) -> Option<String> {
        file_extension(&self.name)
    }
}

/// Raw form input gathered at submit time.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub file: Option<VideoFile>,
    pub target_language: String,
}

impl UploadRequest {
    pub fn new(file: VideoFile, target_language: impl Into<String>) -> Self {
        Self {
            file: Some(file),
            target_language: target_language.into(),
        }
    }
}

/// An [`UploadRequest`] that passed [`validate`]. Only this type can be
/// transmitted.
#[derive(Debug, Clone)]
pub struct ValidRequest {
    file: VideoFile,
    target_language: String,
}

impl ValidRequest {
    pub fn file(&self) -> &VideoFile {
        &self.file
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    pub fn into_parts(self) -> (VideoFile, String) {
        (self.file, self.target_language)
    }
}

/// Why an upload request was rejected locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("Please select a video file to upload.")]
    MissingFile,

    #[error("Invalid file type '{extension}'. Please select a video file (mp4, avi, mov, mkv, webm).")]
    UnsupportedExtension { extension: String },

    #[error("File is too large ({size} bytes). Maximum size is 500MB.")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Please select a target language.")]
    MissingTargetLanguage,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Extract the lower-cased extension of a file name.
///
/// Returns `None` when there is no `.` or nothing follows it.
pub fn file_extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

/// Validate an upload request, consuming it on success.
pub fn validate(request: UploadRequest) -> Result<ValidRequest, ValidationError> {
    let file = match request.file {
        Some(file) if !file.name.trim().is_empty() => file,
        _ => return Err(ValidationError::MissingFile),
    };

    let extension = file.extension().unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ValidationError::UnsupportedExtension { extension });
    }

    let size = file.size();
    if size > MAX_UPLOAD_BYTES {
        return Err(ValidationError::FileTooLarge {
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }

    let target_language = request.target_language.trim();
    if target_language.is_empty() {
        return Err(ValidationError::MissingTargetLanguage);
    }

    Ok(ValidRequest {
        target_language: target_language.to_string(),
        file,
    })
}
