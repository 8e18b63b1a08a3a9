//! Bitrate-targeted compression for files over the analysis upload limit.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::remove_if_exists;
use crate::probe::probe_duration;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Compression parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionSettings {
    /// Files strictly larger than this are compressed.
    pub threshold_mb: u64,
    /// Size the bitrate is computed for.
    pub target_mb: u64,
    /// Lower bound on the computed video bitrate.
    pub min_bitrate_kbps: u64,
    pub audio_bitrate: String,
    pub preset: String,
    pub timeout_secs: u64,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            threshold_mb: 500,
            target_mb: 450,
            min_bitrate_kbps: 500,
            audio_bitrate: "128k".to_string(),
            preset: "medium".to_string(),
            timeout_secs: 600,
        }
    }
}

/// Whether a file of `size_bytes` exceeds `threshold_mb`.
pub fn should_compress(size_bytes: u64, threshold_mb: u64) -> bool {
    size_bytes > threshold_mb.saturating_mul(BYTES_PER_MB)
}

/// Video bitrate that makes `duration_secs` of video fit in `target_mb`.
///
/// `floor(target_mb * 8192 / duration_secs)`, never below `min_kbps`.
pub fn target_bitrate_kbps(target_mb: u64, duration_secs: f64, min_kbps: u64) -> MediaResult<u64> {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return Err(MediaError::invalid_video(format!(
            "cannot compute bitrate for duration {}",
            duration_secs
        )));
    }
    let kbps = ((target_mb as f64) * 8192.0 / duration_secs).floor() as u64;
    Ok(kbps.max(min_kbps))
}

/// `<stem>_compressed.<ext>` next to the input.
pub fn compressed_path_for(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    let name = match input.extension() {
        Some(ext) => format!("{}_compressed.{}", stem, ext.to_string_lossy()),
        None => format!("{}_compressed", stem),
    };
    input.with_file_name(name)
}

/// Re-encode `input` into `output` sized for `settings.target_mb`.
///
/// Returns the output size in bytes. A partial output is removed on failure.
pub async fn compress_video(
    input: &Path,
    output: &Path,
    settings: &CompressionSettings,
) -> MediaResult<u64> {
    let duration = probe_duration(input).await?;
    let bitrate = target_bitrate_kbps(settings.target_mb, duration, settings.min_bitrate_kbps)?;

    info!(
        duration_secs = duration,
        bitrate_kbps = bitrate,
        "Compressing {} for analysis",
        input.display()
    );

    let cmd = FfmpegCommand::new(input, output)
        .video_codec("libx264")
        .video_bitrate_kbps(bitrate)
        .audio_codec("aac")
        .audio_bitrate(settings.audio_bitrate.clone())
        .preset(settings.preset.clone())
        .movflags("+faststart");

    let total_ms = (duration * 1000.0) as i64;
    let run = FfmpegRunner::new()
        .with_timeout(settings.timeout_secs)
        .run_with_progress(&cmd, move |progress| {
            debug!(
                percent = progress.percentage(total_ms),
                speed = progress.speed,
                done = progress.is_complete,
                "Compression progress"
            );
        })
        .await;

    if let Err(e) = run {
        if let Err(cleanup) = remove_if_exists(output).await {
            warn!("Failed to remove partial output {}: {}", output.display(), cleanup);
        }
        return Err(e);
    }

    let size = tokio::fs::metadata(output).await?.len();
    let size_mb = size as f64 / BYTES_PER_MB as f64;
    if size_mb > settings.target_mb as f64 * 1.1 {
        warn!(
            "Compressed size {:.2} MB exceeds target {} MB",
            size_mb, settings.target_mb
        );
    } else {
        info!("Compression complete: {:.2} MB", size_mb);
    }

    Ok(size)
}
