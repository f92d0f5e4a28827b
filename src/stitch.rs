//! Stitcher - concatenates chunk files into one container with a monotonic
//! timeline
//!
//! Chunks are consumed strictly in plan order.  The first chunk's packets
//! pass through verbatim, preserving the source timeline exactly when the
//! plan starts at 0.  Every later chunk is re-based per stream: timestamps
//! are shifted so the chunk begins right after the previous chunk's tail,
//! leaving no gap and no overlap.

use std::path::Path;

use ffmpeg_next as ffmpeg;

use crate::error::{ChunkError, Result};
use crate::ffmpeg_utils::helpers;
use crate::ffmpeg_utils::utils::rescale_ts;
use crate::format::StitchMode;
use crate::plan::ChunkPlan;

/// Per-output-stream stitching state, carried across chunks.
#[derive(Debug, Clone)]
pub struct StreamState {
    /// Index of this stream in the output container
    pub out_index: usize,
    /// Input time_base, identical across all chunks (enforced)
    pub time_base: ffmpeg::Rational,
    /// Media type of the stream
    pub media_type: ffmpeg::media::Type,
    /// Accumulated timestamp offset in input time_base units
    pub offset: i64,
    /// Most recently written pts, rebased, in input time_base units
    pub last_pts: Option<i64>,
    /// Most recently written dts, rebased, in input time_base units
    pub last_dts: Option<i64>,
    /// Duration of one frame in input time_base units (offset fallback)
    frame_duration: i64,
}

/// Concatenate the plan's chunk files from `chunk_dir` into `out_path`.
///
/// All chunks must present the same stream count and per-stream time_base
/// as the first one; a mismatch aborts with `LayoutMismatch`.  On success
/// every output stream's pts and dts are non-decreasing across chunk
/// boundaries.
pub fn stitch(
    out_path: &Path,
    plan: &ChunkPlan,
    chunk_dir: &Path,
    mode: &StitchMode,
) -> Result<()> {
    if plan.is_empty() {
        return Err(ChunkError::StitchInput("empty chunk plan".to_string()));
    }

    let fmt = mode.resolve(out_path)?;
    let extension = fmt.extension();

    let mut output = ffmpeg::format::output_as(&out_path, fmt.short_name())
        .map_err(|e| ChunkError::Output(format!("{:?}: {}", out_path, e)))?;

    let mut states: Vec<StreamState> = Vec::new();

    for (ci, chunk) in plan.chunks.iter().enumerate() {
        let chunk_path = chunk_dir.join(chunk.file_name(extension));
        let chunk_path = std::fs::canonicalize(&chunk_path)
            .map_err(|e| ChunkError::OpenInput(format!("{:?}: {}", chunk_path, e)))?;

        let mut input = ffmpeg::format::input(&chunk_path)
            .map_err(|e| ChunkError::OpenInput(format!("{:?}: {}", chunk_path, e)))?;

        // Map chunk stream index -> state index, skipping attachments.
        let chunk_streams = input.streams().count();
        let mut chunk_map: Vec<Option<usize>> = vec![None; chunk_streams];
        let mut media_count = 0usize;
        for ist in input.streams() {
            if ist.parameters().medium() == ffmpeg::media::Type::Attachment {
                continue;
            }
            chunk_map[ist.index()] = Some(media_count);
            media_count += 1;
        }

        if states.is_empty() {
            // First chunk defines the output layout.
            for ist in input.streams() {
                if chunk_map[ist.index()].is_none() {
                    continue;
                }

                let mut ost = output
                    .add_stream(ffmpeg::encoder::find(ffmpeg::codec::Id::None))
                    .map_err(|e| {
                        ChunkError::StreamSetup(format!("stream {}: {}", ist.index(), e))
                    })?;
                ost.set_parameters(ist.parameters());
                helpers::stream_reset_codec_tag(&mut ost);
                ost.set_time_base(ist.time_base());
                helpers::stream_copy_framing(&mut ost, &ist);
                helpers::stream_copy_metadata(&mut ost, &ist);

                let fps = ist.avg_frame_rate();
                let frame_duration = if fps.numerator() > 0 && fps.denominator() > 0 {
                    rescale_ts(
                        1,
                        ffmpeg::Rational::new(fps.denominator(), fps.numerator()),
                        ist.time_base(),
                    )
                    .max(1)
                } else {
                    1
                };

                states.push(StreamState {
                    out_index: ost.index(),
                    time_base: ist.time_base(),
                    media_type: ist.parameters().medium(),
                    offset: 0,
                    last_pts: None,
                    last_dts: None,
                    frame_duration,
                });
            }

            let mut opts = ffmpeg::Dictionary::new();
            if let Some(flags) = fmt.movflags() {
                opts.set("movflags", flags);
            }
            // Keep negative DTS exactly as the chunks carry them; the mp4
            // muxer would otherwise shift the whole timeline.
            opts.set("avoid_negative_ts", "disabled");
            output
                .write_header_with(opts)
                .map_err(|e| ChunkError::Write(format!("header: {}", e)))?;
        } else if media_count != states.len() {
            return Err(ChunkError::LayoutMismatch(format!(
                "chunk {} has {} media streams, expected {}",
                chunk.index,
                media_count,
                states.len()
            )));
        }

        let out_timebases: Vec<ffmpeg::Rational> =
            output.streams().map(|s| s.time_base()).collect();

        // Per-chunk tracking: rebase origin per input stream, written tail
        // per state, in input time_base units.
        let mut first_ts: Vec<Option<i64>> = vec![None; chunk_streams];
        let mut chunk_max_pts: Vec<Option<i64>> = vec![None; states.len()];
        let mut chunk_max_dts: Vec<Option<i64>> = vec![None; states.len()];
        let mut chunk_last_duration: Vec<i64> = vec![0; states.len()];

        for (ist, mut packet) in input.packets() {
            let in_index = ist.index();
            let state_idx = match chunk_map[in_index] {
                Some(idx) => idx,
                None => continue,
            };

            let state = &mut states[state_idx];
            if ist.time_base() != state.time_base {
                return Err(ChunkError::LayoutMismatch(format!(
                    "chunk {} stream {}: time_base {}/{} differs from {}/{}",
                    chunk.index,
                    in_index,
                    ist.time_base().numerator(),
                    ist.time_base().denominator(),
                    state.time_base.numerator(),
                    state.time_base.denominator()
                )));
            }

            let mut rebased_pts = packet.pts();
            let mut rebased_dts = packet.dts();

            if ci > 0 {
                let base = *first_ts[in_index]
                    .get_or_insert_with(|| packet.pts().or(packet.dts()).unwrap_or(0));

                rebased_pts = packet.pts().map(|p| p - base + state.offset);
                rebased_dts = packet.dts().map(|d| d - base + state.offset);

                // Mirror a missing timestamp from its sibling and keep
                // pts >= dts, as stream copy requires.
                if rebased_pts.is_none() {
                    rebased_pts = rebased_dts;
                }
                if rebased_dts.is_none() {
                    rebased_dts = rebased_pts;
                }
                if let (Some(p), Some(d)) = (rebased_pts, rebased_dts) {
                    if d > p {
                        rebased_pts = Some(d);
                    }
                }

                packet.set_pts(rebased_pts);
                packet.set_dts(rebased_dts);
            }

            if let Some(p) = rebased_pts {
                chunk_max_pts[state_idx] =
                    Some(chunk_max_pts[state_idx].map_or(p, |m| m.max(p)));
                state.last_pts = Some(p);
            }
            if let Some(d) = rebased_dts {
                chunk_max_dts[state_idx] =
                    Some(chunk_max_dts[state_idx].map_or(d, |m| m.max(d)));
                state.last_dts = Some(d);
            }
            if packet.duration() > 0 {
                chunk_last_duration[state_idx] = packet.duration();
            }

            let out_index = state.out_index;
            packet.rescale_ts(state.time_base, out_timebases[out_index]);
            packet.set_stream(out_index);
            packet.set_position(-1);
            packet
                .write_interleaved(&mut output)
                .map_err(|e| ChunkError::Write(format!("packet: {}", e)))?;
        }

        // Advance each stream's offset past this chunk's tail so the next
        // chunk continues the timeline without gap or overlap.
        for (idx, state) in states.iter_mut().enumerate() {
            let tail = chunk_max_pts[idx].or(chunk_max_dts[idx]);
            if let Some(tail) = tail {
                let increment = if chunk_last_duration[idx] > 0 {
                    chunk_last_duration[idx]
                } else {
                    state.frame_duration
                };
                state.offset = tail + increment;
            }
        }

        tracing::debug!(
            "Stitched chunk {} ({} of {}) from {:?}",
            chunk.index,
            ci + 1,
            plan.len(),
            chunk_path
        );
    }

    output
        .write_trailer()
        .map_err(|e| ChunkError::Write(format!("trailer: {}", e)))?;

    tracing::info!("Stitched {} chunks into {:?}", plan.len(), out_path);

    Ok(())
}
