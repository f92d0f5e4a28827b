//! FFmpeg module - wrappers and utilities for FFmpeg library access
//!
//! This module handles:
//! - FFmpeg initialization
//! - Opt-in log level configuration
//! - Timebase conversion and other utilities

pub mod helpers;
pub mod utils;

pub use ffmpeg_next as ffmpeg;
#[allow(unused_imports)]
pub use utils::*;

/// Initialize the FFmpeg library.
///
/// This should be called exactly once at application startup before any other
/// FFmpeg-related functions (like `probe` or `split_one`) are used.
pub fn init() -> Result<(), crate::error::ChunkError> {
    ffmpeg::init().map_err(|e| {
        crate::error::ChunkError::Ffmpeg(format!("ffmpeg::init() failed: {}", e))
    })?;

    tracing::debug!("FFmpeg initialized");

    Ok(())
}

/// FFmpeg log verbosity, mapped onto `av_log_set_level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Quiet,
    Error,
    Warning,
    Info,
    Verbose,
}

/// Set FFmpeg's global log level.
///
/// Altering the level is process-wide state, so the library never calls this
/// on its own; applications opt in (typically once at startup, before any
/// threads start demuxing).
pub fn set_log_level(level: LogLevel) {
    let raw = match level {
        LogLevel::Quiet => ffmpeg::ffi::AV_LOG_QUIET,
        LogLevel::Error => ffmpeg::ffi::AV_LOG_ERROR,
        LogLevel::Warning => ffmpeg::ffi::AV_LOG_WARNING,
        LogLevel::Info => ffmpeg::ffi::AV_LOG_INFO,
        LogLevel::Verbose => ffmpeg::ffi::AV_LOG_VERBOSE,
    };
    // SAFETY: av_log_set_level writes a plain int in global FFmpeg state and
    // is safe to call after `ffmpeg::init()`.
    unsafe {
        ffmpeg::ffi::av_log_set_level(raw as i32);
    }
}

/// Get the version information of the linked FFmpeg libraries.
pub fn version_info() -> String {
    // Return a simple version string since the API changed in FFmpeg 8.0
    "FFmpeg 8.0+".to_string()
}
