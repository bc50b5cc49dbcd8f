//! Audio preparation for transcription.
//!
//! The transcription service caps request bodies at roughly 25 MB, so we
//! keep a safety margin: video is always demuxed to a low-bitrate mp3
//! track, and standalone audio above the configured threshold (24 MiB by
//! default) is re-encoded at the same bitrate. Audio at or below the
//! threshold is passed through untouched.
//!
//! Re-encoded intermediates are `TempPath` guards, deleted when the
//! extraction job ends regardless of outcome.

use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::process::Command;
use tracing::debug;

use crate::config::MediaConfig;
use crate::errors::ExtractError;

/// Container formats that need a demux step before transcription.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm", "wmv", "mpeg"];

pub fn is_video_container(extension: &str) -> bool {
    VIDEO_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str())
}

/// The compress-or-pass-through boundary. Strictly greater: a file exactly
/// at the threshold is still submitted as-is.
pub fn needs_compression(len_bytes: u64, threshold_bytes: u64) -> bool {
    len_bytes > threshold_bytes
}

/// Audio ready for the transcription service. When a re-encode happened the
/// guard owns the intermediate file.
#[derive(Debug)]
pub struct PreparedAudio {
    pub path: PathBuf,
    _compressed: Option<TempPath>,
}

/// Demux/compress an audio or video file as needed and return a path that
/// is safe to submit for transcription.
pub async fn prepare_audio(
    input: &Path,
    config: &MediaConfig,
) -> Result<PreparedAudio, ExtractError> {
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if is_video_container(&ext) {
        debug!(input = %input.display(), "demuxing video to audio track");
        let tmp = reencode_to_mp3(input, config).await?;
        return Ok(PreparedAudio {
            path: tmp.to_path_buf(),
            _compressed: Some(tmp),
        });
    }

    let len = tokio::fs::metadata(input)
        .await
        .map_err(|e| ExtractError::AudioPrep(format!("cannot stat {}: {e}", input.display())))?
        .len();

    if needs_compression(len, config.compress_threshold_bytes) {
        debug!(
            input = %input.display(),
            len,
            threshold = config.compress_threshold_bytes,
            "audio exceeds threshold, re-encoding"
        );
        let tmp = reencode_to_mp3(input, config).await?;
        Ok(PreparedAudio {
            path: tmp.to_path_buf(),
            _compressed: Some(tmp),
        })
    } else {
        Ok(PreparedAudio {
            path: input.to_path_buf(),
            _compressed: None,
        })
    }
}

/// Run ffmpeg to produce a low-bitrate mp3, dropping any video stream.
async fn reencode_to_mp3(input: &Path, config: &MediaConfig) -> Result<TempPath, ExtractError> {
    let tmp = tempfile::Builder::new()
        .prefix("quizforge-audio-")
        .suffix(".mp3")
        .tempfile()
        .map_err(|e| ExtractError::AudioPrep(format!("cannot create temp file: {e}")))?
        .into_temp_path();

    let output = Command::new(&config.ffmpeg_bin)
        .arg("-y")
        .arg("-i")
        .arg(input)
        .arg("-vn")
        .args(["-b:a", &config.audio_bitrate])
        .args(["-f", "mp3"])
        .arg(&tmp)
        .output()
        .await
        .map_err(|e| {
            ExtractError::AudioPrep(format!("failed to run {}: {e}", config.ffmpeg_bin))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        // ffmpeg stderr is verbose; keep only the tail for the error.
        let tail: String = stderr
            .lines()
            .rev()
            .take(3)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ExtractError::AudioPrep(format!(
            "{} exited with {}: {tail}",
            config.ffmpeg_bin, output.status
        )));
    }

    Ok(tmp)
}
