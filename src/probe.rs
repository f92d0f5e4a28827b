//! Packet-level probe - extracts per-frame metadata from the best video stream
//!
//! The probe performs a single linear demux pass and records one `FrameMeta`
//! per video packet.  No packets are decoded and no seeks are issued; the
//! cost is bounded by container parsing alone.

use std::path::Path;

use ffmpeg_next as ffmpeg;

use crate::error::{ChunkError, Result};
use crate::ffmpeg_utils::utils::ts_to_seconds;

/// Metadata for one compressed video packet, in stream order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMeta {
    /// Best-effort presentation time in seconds (pts, falling back to dts,
    /// falling back to the running stream end)
    pub pts_time: f64,
    /// Whether the packet decodes without reference to any other packet
    pub is_keyframe: bool,
    /// Compressed payload size in bytes
    pub pkt_size: u64,
}

/// Result of probing a source file.
#[derive(Debug, Clone, Default)]
pub struct ProbeResult {
    /// One entry per video packet, non-decreasing by `pts_time`
    pub frames: Vec<FrameMeta>,
    /// Total duration in seconds; at least the end of the last observed packet
    pub duration: f64,
}

impl ProbeResult {
    /// Number of keyframes observed in the video stream.
    pub fn keyframe_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_keyframe).count()
    }

    /// Timestamps of all keyframes, in stream order.
    pub fn keyframe_times(&self) -> Vec<f64> {
        self.frames
            .iter()
            .filter(|f| f.is_keyframe)
            .map(|f| f.pts_time)
            .collect()
    }
}

/// Scan the best video stream of `path` and collect per-packet metadata.
///
/// Opening the file parses the container header; the subsequent demux loop
/// reads packet headers only.  The reported duration is the first available
/// of: the maximum observed packet end time, the stream duration, or the
/// container duration.
pub fn probe<P: AsRef<Path>>(path: P) -> Result<ProbeResult> {
    let path = path.as_ref();

    let mut input = ffmpeg::format::input(&path)
        .map_err(|e| ChunkError::OpenInput(format!("{:?}: {}", path, e)))?;

    let (vstream_index, time_base, stream_duration) = {
        let stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or(ChunkError::NoVideoStream)?;
        (stream.index(), stream.time_base(), stream.duration())
    };
    let container_duration = input.duration();

    let mut frames: Vec<FrameMeta> = Vec::new();
    let mut best_end = 0.0f64;

    for (stream, packet) in input.packets() {
        if stream.index() != vstream_index {
            continue;
        }

        let pts_time = packet
            .pts()
            .or(packet.dts())
            .map(|ts| ts_to_seconds(ts, time_base))
            .unwrap_or(best_end);

        frames.push(FrameMeta {
            pts_time,
            is_keyframe: packet.is_key(),
            pkt_size: packet.size() as u64,
        });

        let end = if packet.duration() > 0 {
            pts_time + ts_to_seconds(packet.duration(), time_base)
        } else {
            pts_time
        };
        if end > best_end {
            best_end = end;
        }
    }

    let duration = if best_end > 0.0 {
        best_end
    } else if stream_duration > 0 {
        ts_to_seconds(stream_duration, time_base)
    } else if container_duration > 0 {
        container_duration as f64 / ffmpeg::ffi::AV_TIME_BASE as f64
    } else {
        0.0
    };

    tracing::debug!(
        "Probed {:?}: {} packets, {} keyframes, duration={:.3}s",
        path,
        frames.len(),
        frames.iter().filter(|f| f.is_keyframe).count(),
        duration
    );

    Ok(ProbeResult { frames, duration })
}

/// Summary of the best video stream, for display.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub codec: &'static str,
    pub bit_rate: u64,
    pub duration: f64,
}

/// Read the best video stream's parameters without demuxing any packets.
pub fn source_info<P: AsRef<Path>>(path: P) -> Result<SourceInfo> {
    let path = path.as_ref();

    let input = ffmpeg::format::input(&path)
        .map_err(|e| ChunkError::OpenInput(format!("{:?}: {}", path, e)))?;

    let stream = input
        .streams()
        .best(ffmpeg::media::Type::Video)
        .ok_or(ChunkError::NoVideoStream)?;
    let params = stream.parameters();

    let fps = stream.avg_frame_rate();
    let frame_rate = if fps.numerator() > 0 && fps.denominator() > 0 {
        f64::from(fps)
    } else {
        0.0
    };

    let duration = if input.duration() > 0 {
        input.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64
    } else if stream.duration() > 0 {
        ts_to_seconds(stream.duration(), stream.time_base())
    } else {
        0.0
    };

    Ok(SourceInfo {
        width: crate::ffmpeg_utils::helpers::codec_params_width(&params),
        height: crate::ffmpeg_utils::helpers::codec_params_height(&params),
        frame_rate,
        codec: params.id().name(),
        bit_rate: crate::ffmpeg_utils::helpers::codec_params_bit_rate(&params),
        duration,
    })
}
