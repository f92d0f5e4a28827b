//! Splitter - stream-copy extraction of one chunk per output file
//!
//! Each chunk is produced by seeking the source to just before the chunk
//! start, arming on the first video keyframe at or after it, and copying
//! compressed packets until every mapped stream has passed the chunk end.
//! Timestamps are rescaled between timebases but never re-based; the
//! stitcher owns timeline continuity.

use std::path::Path;

use ffmpeg_next as ffmpeg;

use crate::error::{ChunkError, Result};
use crate::ffmpeg_utils::helpers;
use crate::ffmpeg_utils::utils::ts_to_seconds;
use crate::format::SplitMode;
use crate::plan::{Chunk, ChunkPlan};

/// Extract a single chunk of `source` into `out_path` by stream copy.
///
/// The output contains every non-attachment stream of the source.  Video
/// packets are included from the first keyframe at or after `chunk.start`
/// until the first keyframe at or after `chunk.end`; other streams are cut
/// at `chunk.end` directly.
pub fn split_one(source: &Path, chunk: &Chunk, out_path: &Path, mode: &SplitMode) -> Result<()> {
    let mut input = ffmpeg::format::input(&source)
        .map_err(|e| ChunkError::OpenInput(format!("{:?}: {}", source, e)))?;

    let fmt = mode.resolve(source)?;
    let mut output = ffmpeg::format::output_as(&out_path, fmt.short_name())
        .map_err(|e| ChunkError::Output(format!("{:?}: {}", out_path, e)))?;

    // Mirror every non-attachment input stream onto the output.
    let stream_count = input.streams().count();
    let mut stream_map: Vec<Option<usize>> = vec![None; stream_count];
    for ist in input.streams() {
        if ist.parameters().medium() == ffmpeg::media::Type::Attachment {
            continue;
        }

        let mut ost = output
            .add_stream(ffmpeg::encoder::find(ffmpeg::codec::Id::None))
            .map_err(|e| ChunkError::StreamSetup(format!("stream {}: {}", ist.index(), e)))?;
        ost.set_parameters(ist.parameters());
        helpers::stream_reset_codec_tag(&mut ost);
        ost.set_time_base(ist.time_base());

        stream_map[ist.index()] = Some(ost.index());
    }

    if fmt.movflags().is_some() {
        let mut opts = ffmpeg::Dictionary::new();
        if let Some(flags) = fmt.movflags() {
            opts.set("movflags", flags);
        }
        output
            .write_header_with(opts)
            .map_err(|e| ChunkError::Write(format!("header: {}", e)))?;
    } else {
        output
            .write_header()
            .map_err(|e| ChunkError::Write(format!("header: {}", e)))?;
    }

    // The muxer may have replaced the requested timebases when the header
    // was written; capture the effective ones for packet rescaling.
    let out_timebases: Vec<ffmpeg::Rational> = output.streams().map(|s| s.time_base()).collect();

    // Position the demuxer at or before the chunk start.  The upper-bounded
    // seek range forces backward keyframe resolution, so the armed window
    // below always sees the chunk's opening keyframe.
    let seek_ts = (chunk.start * ffmpeg::ffi::AV_TIME_BASE as f64) as i64;
    input
        .seek(seek_ts, ..seek_ts)
        .map_err(|e| ChunkError::Seek(format!("to {:.3}s: {}", chunk.start, e)))?;

    let mut stream_ended = vec![false; stream_count];
    let mut first_keyframe_found = false;
    let mut video_ended = false;

    for (ist, mut packet) in input.packets() {
        let in_index = ist.index();
        let out_index = match stream_map[in_index] {
            Some(idx) => idx,
            None => continue,
        };

        let time_base = ist.time_base();
        let t = packet
            .pts()
            .or(packet.dts())
            .map(|ts| ts_to_seconds(ts, time_base))
            .unwrap_or(0.0);
        let is_video = ist.parameters().medium() == ffmpeg::media::Type::Video;

        // Arm extraction at the first intra frame at or after the start.
        if !first_keyframe_found {
            if is_video {
                if !packet.is_key() || t < chunk.start {
                    continue;
                }
                first_keyframe_found = true;
            } else if t < chunk.start {
                continue;
            }
        }

        let all_ended = |ended: &[bool]| {
            ended
                .iter()
                .enumerate()
                .all(|(i, e)| stream_map[i].is_none() || *e)
        };

        if is_video {
            // The next GOP's keyframe closes the video window; trailing
            // B-frames of this GOP may still arrive and are kept.
            if t >= chunk.end && packet.is_key() {
                video_ended = true;
                stream_ended[in_index] = true;
                if all_ended(&stream_ended) {
                    break;
                }
                continue;
            }
            if video_ended {
                continue;
            }
        } else if t >= chunk.end {
            stream_ended[in_index] = true;
            if all_ended(&stream_ended) {
                break;
            }
            continue;
        }

        packet.rescale_ts(time_base, out_timebases[out_index]);
        packet.set_position(-1);
        packet.set_stream(out_index);
        packet
            .write_interleaved(&mut output)
            .map_err(|e| ChunkError::Write(format!("packet: {}", e)))?;
    }

    output
        .write_trailer()
        .map_err(|e| ChunkError::Write(format!("trailer: {}", e)))?;

    tracing::debug!(
        "Split chunk {} [{:.3}, {:.3}) -> {:?}",
        chunk.index,
        chunk.start,
        chunk.end,
        out_path
    );

    Ok(())
}

/// Split every chunk of `plan` into `outdir`, sequentially.
///
/// Files are named `chunk_%04d.<ext>` with the extension of the resolved
/// container.  The directory is created if missing; the first chunk failure
/// aborts the run.
pub fn split_all(source: &Path, plan: &ChunkPlan, outdir: &Path, mode: &SplitMode) -> Result<()> {
    if plan.is_empty() {
        return Ok(());
    }

    std::fs::create_dir_all(outdir)
        .map_err(|e| ChunkError::Output(format!("mkdir {:?}: {}", outdir, e)))?;

    let extension = mode.resolve(source)?.extension();

    for chunk in &plan.chunks {
        let out_path = outdir.join(chunk.file_name(extension));
        tracing::info!(
            "[split] {:?} ({:.3} -> {:.3})",
            out_path,
            chunk.start,
            chunk.end
        );
        split_one(source, chunk, &out_path, mode)?;
    }

    Ok(())
}
