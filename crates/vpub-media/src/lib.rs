//! FFmpeg CLI wrapper and thumbnail image processing.
//!
//! This crate provides:
//! - FFmpeg command builder and runner with progress and timeout
//! - FFprobe duration and size probing
//! - Size-limit compression for analysis uploads
//! - Thumbnail post-processing: fit to 1280x720, JPEG size budget,
//!   gradient placeholder, randomized title overlay

pub mod command;
pub mod compress;
pub mod error;
pub mod fs_utils;
pub mod probe;
pub mod thumbnail;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegProgress, FfmpegRunner};
pub use compress::{
    compress_video, compressed_path_for, should_compress, target_bitrate_kbps, CompressionSettings,
};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{remove_if_exists, sanitize_file_name};
pub use probe::{probe_duration, probe_video, VideoInfo};
pub use thumbnail::{
    encode_jpeg_within, fit_thumbnail, gradient_placeholder, process_generated, write_placeholder,
    TitleOverlay, MAX_THUMBNAIL_BYTES, THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH,
};
