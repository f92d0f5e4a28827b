//! # chunkmux
//!
//! `chunkmux` slices a video container into a sequence of self-contained,
//! keyframe-aligned chunk files and concatenates such chunks back into one
//! container.  It leverages FFmpeg (via `ffmpeg-next`) at the packet layer
//! only: chunks are produced by stream copy, never by re-encoding, and the
//! stitched output re-bases timestamps so every stream presents a single
//! monotonic timeline.
//!
//! ## Core Features
//!
//! - **Metadata-only planning:** cut points are chosen from keyframe
//!   timestamps gathered by a linear packet scan; nothing is decoded.
//! - **Lossless extraction:** each chunk is a standalone container holding
//!   the source's compressed bitstreams, opened by a keyframe.
//! - **Gap-free stitching:** chunk timelines are re-based end to end, with
//!   the first chunk preserved verbatim.
//! - **Parallel splitting:** independent chunks can be extracted on a
//!   worker pool, one demuxer context per worker.
//!
//! ## Usage
//!
//! ```ignore
//! fn main() -> chunkmux::Result<()> {
//!     chunkmux::ffmpeg_init()?;
//!
//!     let probe = chunkmux::probe("movie.mp4")?;
//!     let plan = chunkmux::plan(&probe, &chunkmux::PlanConfig {
//!         target_dur: 10.0,
//!         ..Default::default()
//!     })?;
//!
//!     let mode = chunkmux::SplitMode::default();
//!     chunkmux::split_all("movie.mp4".as_ref(), &plan, "chunks".as_ref(), &mode)?;
//!     chunkmux::stitch(
//!         "rejoined.mp4".as_ref(),
//!         &plan,
//!         "chunks".as_ref(),
//!         &chunkmux::StitchMode::default(),
//!     )
//! }
//! ```

pub mod error;
pub mod ffmpeg_utils;
pub mod format;
pub mod parallel;
pub mod plan;
pub mod probe;
pub mod split;
pub mod stitch;

#[cfg(test)]
pub(crate) mod tests;

pub use error::{ChunkError, Result};
pub use ffmpeg_utils::version_info as ffmpeg_version_info;
pub use ffmpeg_utils::{init as ffmpeg_init, set_log_level, LogLevel};
pub use format::{OutputFormat, SplitMode, StitchMode};
pub use parallel::split_all_parallel;
pub use plan::{plan, read_plan_json, write_plan_json, Chunk, ChunkPlan, PlanConfig};
pub use probe::{probe, source_info, FrameMeta, ProbeResult, SourceInfo};
pub use split::{split_all, split_one};
pub use stitch::stitch;
