//! Output container selection
//!
//! The supported muxer set is closed (mp4, mov, matroska, webm) and modeled
//! as a tagged variant so format-specific behavior lives here instead of in
//! string switches at the write sites.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ChunkError, Result};

/// A resolved output container plus its format-specific options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Mp4 { frag: bool, faststart: bool },
    Mov,
    Matroska,
    Webm,
}

impl OutputFormat {
    /// Muxer short name passed to FFmpeg.
    pub fn short_name(&self) -> &'static str {
        match self {
            OutputFormat::Mp4 { .. } => "mp4",
            OutputFormat::Mov => "mov",
            OutputFormat::Matroska => "matroska",
            OutputFormat::Webm => "webm",
        }
    }

    /// File extension for outputs in this container.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mp4 { .. } => "mp4",
            OutputFormat::Mov => "mov",
            OutputFormat::Matroska => "mkv",
            OutputFormat::Webm => "webm",
        }
    }

    /// The `movflags` option value for this format, if any.
    ///
    /// Fragmented output takes precedence over faststart; both are mp4-only.
    pub fn movflags(&self) -> Option<&'static str> {
        match self {
            OutputFormat::Mp4 { frag: true, .. } => {
                Some("frag_keyframe+empty_moov+omit_tfhd_offset")
            }
            OutputFormat::Mp4 {
                frag: false,
                faststart: true,
            } => Some("faststart"),
            _ => None,
        }
    }

    /// Resolve a muxer short name into a format variant.
    ///
    /// `mkv` is accepted as an alias for `matroska`.  Names outside the
    /// supported set are rejected.
    pub fn from_name(name: &str, frag: bool, faststart: bool) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "mp4" => Ok(OutputFormat::Mp4 { frag, faststart }),
            "mov" => Ok(OutputFormat::Mov),
            "matroska" | "mkv" => Ok(OutputFormat::Matroska),
            "webm" => Ok(OutputFormat::Webm),
            other => Err(ChunkError::InvalidArgument(format!(
                "unsupported output format: {}",
                other
            ))),
        }
    }

    /// Derive a format from a file extension, defaulting to mp4.
    pub fn from_path(path: &Path, frag: bool, faststart: bool) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("mov") => OutputFormat::Mov,
            Some("mkv") => OutputFormat::Matroska,
            Some("webm") => OutputFormat::Webm,
            _ => OutputFormat::Mp4 { frag, faststart },
        }
    }
}

/// Output selection for the splitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitMode {
    /// Derive the container from the source extension
    pub auto_mode: bool,
    /// Muxer short name override (used when `auto_mode` is false)
    pub force_fmt: Option<String>,
    /// Emit fragmented mp4 chunks
    pub output_frag: bool,
}

impl Default for SplitMode {
    fn default() -> Self {
        Self {
            auto_mode: true,
            force_fmt: None,
            output_frag: false,
        }
    }
}

impl SplitMode {
    /// Resolve the chunk container for a given source path.
    pub fn resolve(&self, source: &Path) -> Result<OutputFormat> {
        if !self.auto_mode {
            if let Some(name) = &self.force_fmt {
                return OutputFormat::from_name(name, self.output_frag, false);
            }
        }
        Ok(OutputFormat::from_path(source, self.output_frag, false))
    }
}

/// Output selection for the stitcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StitchMode {
    /// Derive the container from the output extension
    pub auto_mode: bool,
    /// Muxer short name override (used when `auto_mode` is false)
    pub force_fmt: Option<String>,
    /// Emit fragmented mp4
    pub output_frag: bool,
    /// Relocate the moov box to the front (mp4 only, ignored with `output_frag`)
    pub enable_faststart: bool,
}

impl Default for StitchMode {
    fn default() -> Self {
        Self {
            auto_mode: true,
            force_fmt: None,
            output_frag: false,
            enable_faststart: false,
        }
    }
}

impl StitchMode {
    /// Resolve the output container for a given output path.
    pub fn resolve(&self, out_path: &Path) -> Result<OutputFormat> {
        if !self.auto_mode {
            if let Some(name) = &self.force_fmt {
                return OutputFormat::from_name(name, self.output_frag, self.enable_faststart);
            }
        }
        Ok(OutputFormat::from_path(
            out_path,
            self.output_frag,
            self.enable_faststart,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_path_extension_mapping() {
        let plain = |p: &str| OutputFormat::from_path(&PathBuf::from(p), false, false);
        assert_eq!(plain("a/video.mp4").short_name(), "mp4");
        assert_eq!(plain("a/video.MOV").short_name(), "mov");
        assert_eq!(plain("a/video.mkv").short_name(), "matroska");
        assert_eq!(plain("a/video.webm").short_name(), "webm");
        // Unknown extensions fall back to mp4.
        assert_eq!(plain("a/video.ts").short_name(), "mp4");
        assert_eq!(plain("noext").short_name(), "mp4");
    }

    #[test]
    fn test_extension_matches_muxer() {
        assert_eq!(OutputFormat::Matroska.extension(), "mkv");
        assert_eq!(OutputFormat::Matroska.short_name(), "matroska");
    }

    #[test]
    fn test_movflags() {
        let frag = OutputFormat::Mp4 {
            frag: true,
            faststart: true,
        };
        assert_eq!(
            frag.movflags(),
            Some("frag_keyframe+empty_moov+omit_tfhd_offset")
        );

        let faststart = OutputFormat::Mp4 {
            frag: false,
            faststart: true,
        };
        assert_eq!(faststart.movflags(), Some("faststart"));

        assert_eq!(OutputFormat::Webm.movflags(), None);
    }

    #[test]
    fn test_from_name_rejects_unknown() {
        assert!(OutputFormat::from_name("avi", false, false).is_err());
        assert_eq!(
            OutputFormat::from_name("mkv", false, false)
                .unwrap()
                .short_name(),
            "matroska"
        );
    }

    #[test]
    fn test_split_mode_force_overrides_auto() {
        let mode = SplitMode {
            auto_mode: false,
            force_fmt: Some("webm".to_string()),
            output_frag: false,
        };
        let fmt = mode.resolve(&PathBuf::from("input.mp4")).unwrap();
        assert_eq!(fmt.short_name(), "webm");
    }

    #[test]
    fn test_stitch_mode_frag_wins_over_faststart() {
        let mode = StitchMode {
            output_frag: true,
            enable_faststart: true,
            ..Default::default()
        };
        let fmt = mode.resolve(&PathBuf::from("out.mp4")).unwrap();
        assert_eq!(
            fmt.movflags(),
            Some("frag_keyframe+empty_moov+omit_tfhd_offset")
        );
    }
}
