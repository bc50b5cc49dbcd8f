//! Text Extraction
//!
//! Turns an uploaded artifact into plain text. Files are classified by
//! extension: audio and video go through the transcription path (with an
//! ffmpeg demux/compress step first, see [`media`]), everything else goes
//! to the cloud document parser requesting markdown.
//!
//! In-memory uploads are spilled to a named temp file because both ffmpeg
//! and the hosted services want a file path or a sized body. Temp files and
//! compressed intermediates are owned by RAII guards, so they are deleted
//! on every exit path including errors.

pub mod media;
pub mod parse;
pub mod transcribe;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempPath;
use tracing::{debug, info};

use crate::config::MediaConfig;
use crate::errors::ExtractError;
use crate::telemetry::sanitize_for_log;
use parse::DocumentParser;
use transcribe::SpeechClient;

/// Extensions routed to the transcription path.
pub const AUDIO_VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "avi", "mp3", "m4a", "wav", "ogg", "mpeg", "mkv", "webm", "wmv",
];

/// Extensions routed to the document parser.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "docx", "pptx", "txt", "xlsx", "csv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    AudioVideo,
    Document,
}

/// Lowercased extension of a file name, without the dot.
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Classify an upload by extension. Anything outside the supported upload
/// surface is rejected up front rather than bounced off a hosted service.
pub fn classify(file_name: &str) -> Result<MediaKind, ExtractError> {
    let ext = extension_of(file_name).unwrap_or_default();
    if AUDIO_VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Ok(MediaKind::AudioVideo)
    } else if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
        Ok(MediaKind::Document)
    } else {
        Err(ExtractError::UnsupportedType { extension: ext })
    }
}

/// Input to an extraction job: a path on disk, or an in-memory upload as
/// received from a front door. Lifetime is a single request.
#[derive(Debug)]
pub enum UploadSource {
    Path(PathBuf),
    Memory { file_name: String, bytes: Vec<u8> },
}

impl UploadSource {
    pub fn file_name(&self) -> String {
        match self {
            UploadSource::Path(p) => p
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string(),
            UploadSource::Memory { file_name, .. } => file_name.clone(),
        }
    }
}

/// An upload staged on disk. Holds the temp guard for in-memory uploads so
/// the file disappears when the extraction job ends, however it ends.
struct StagedUpload {
    path: PathBuf,
    _tmp: Option<TempPath>,
}

async fn stage(source: &UploadSource) -> Result<StagedUpload, ExtractError> {
    match source {
        UploadSource::Path(p) => Ok(StagedUpload {
            path: p.clone(),
            _tmp: None,
        }),
        UploadSource::Memory { file_name, bytes } => {
            let suffix = extension_of(file_name)
                .map(|e| format!(".{e}"))
                .unwrap_or_default();
            let tmp = tempfile::Builder::new()
                .prefix("quizforge-upload-")
                .suffix(&suffix)
                .tempfile()
                .map_err(|e| ExtractError::Unreadable {
                    name: file_name.clone(),
                    message: e.to_string(),
                })?
                .into_temp_path();
            // Upload bodies can be large; the write must not block the
            // runtime thread.
            tokio::fs::write(&tmp, bytes)
                .await
                .map_err(|e| ExtractError::Unreadable {
                    name: file_name.clone(),
                    message: e.to_string(),
                })?;
            Ok(StagedUpload {
                path: tmp.to_path_buf(),
                _tmp: Some(tmp),
            })
        }
    }
}

/// The extraction dispatcher. Client seams are traits so tests run without
/// network access.
pub struct Extractor {
    speech: Arc<dyn SpeechClient>,
    parser: Arc<dyn DocumentParser>,
    media: MediaConfig,
}

impl Extractor {
    pub fn new(
        speech: Arc<dyn SpeechClient>,
        parser: Arc<dyn DocumentParser>,
        media: MediaConfig,
    ) -> Self {
        Self {
            speech,
            parser,
            media,
        }
    }

    /// Extract plain text from an upload. Terminal on failure; the caller
    /// surfaces the error and the user resubmits.
    pub async fn extract_text(&self, source: &UploadSource) -> Result<String, ExtractError> {
        let file_name = source.file_name();
        let kind = classify(&file_name)?;
        let staged = stage(source).await?;
        debug!(file = %sanitize_for_log(&file_name), ?kind, "staged upload for extraction");

        let text = match kind {
            MediaKind::AudioVideo => {
                let prepared = media::prepare_audio(&staged.path, &self.media).await?;
                self.speech.transcribe(&prepared.path).await?
            }
            MediaKind::Document => {
                let fragments = self.parser.parse_markdown(&staged.path, &file_name).await?;
                fragments.join("\n\n")
            }
        };

        if text.trim().is_empty() {
            return Err(ExtractError::EmptyResult);
        }
        info!(file = %sanitize_for_log(&file_name), chars = text.len(), "extraction finished");
        Ok(text)
    }
}
