//! Chunk planner - turns probe output into keyframe-aligned cut intervals
//!
//! The planner is a pure function over `ProbeResult` + `PlanConfig`: no I/O,
//! no globals.  Cut points are chosen greedily over the keyframe timestamps,
//! then post-processed for chunk-count constraints, tiny tails, and exact
//! contiguity.

use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ChunkError, Result};
use crate::probe::ProbeResult;

/// Timestamp comparison slack, in seconds.
const EPS: f64 = 1e-6;

/// Maximum allowed drift between the plan's total duration and the source
/// duration before the last chunk absorbs the residual.
const DURATION_TOLERANCE: f64 = 1e-3;

/// One planned `[start, end)` interval, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: i32,
    pub start: f64,
    pub end: f64,
}

impl Chunk {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// File name of this chunk on disk, e.g. `chunk_0003.mp4`.
    pub fn file_name(&self, extension: &str) -> String {
        format!("chunk_{:04}.{}", self.index, extension)
    }
}

/// An ordered, contiguous, zero-based sequence of chunks covering
/// `[0, duration)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkPlan {
    pub chunks: Vec<Chunk>,
}

impl ChunkPlan {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn total_duration(&self) -> f64 {
        self.chunks.iter().map(Chunk::duration).sum()
    }
}

/// Planning options.  Zero (or 0.0) means "unset" and selects the documented
/// default; see `plan` for the derivation order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Target chunk duration in seconds (10 when unset)
    pub target_dur: f64,
    /// Minimum chunk duration (0.5 x target when unset)
    pub min_dur: f64,
    /// Maximum chunk duration (2.0 x target when unset, never below min)
    pub max_dur: f64,
    /// Merge a trailing chunk shorter than half the minimum into its predecessor
    pub avoid_tiny_last: bool,
    /// Lower bound on chunk count (0 = unconstrained)
    pub min_chunks: u32,
    /// Upper bound on chunk count (0 = unconstrained)
    pub max_chunks: u32,
    /// When > 0, overrides the target with `duration / ideal_parallel`
    pub ideal_parallel: u32,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            target_dur: 0.0,
            min_dur: 0.0,
            max_dur: 0.0,
            avoid_tiny_last: true,
            min_chunks: 0,
            max_chunks: 0,
            ideal_parallel: 0,
        }
    }
}

/// Build a chunk plan for `probe` under `cfg`.
///
/// Every boundary except 0 lands on a keyframe timestamp (when the source
/// has keyframes); the resulting plan is contiguous, covers `[0, duration)`
/// within 1e-3, and is indexed `0..n`.
pub fn plan(probe: &ProbeResult, cfg: &PlanConfig) -> Result<ChunkPlan> {
    if probe.frames.is_empty() {
        return Err(ChunkError::InvalidArgument(
            "probe result contains no frames".to_string(),
        ));
    }
    if probe.duration <= 0.0 {
        return Err(ChunkError::InvalidArgument(format!(
            "non-positive source duration: {}",
            probe.duration
        )));
    }

    let duration = probe.duration;
    let (target, min_dur, max_dur) = effective_targets(cfg, duration);

    let key_times = probe.keyframe_times();
    if key_times.is_empty() {
        // Without keyframes there is no safe interior cut point.
        return Ok(ChunkPlan {
            chunks: vec![Chunk {
                index: 0,
                start: 0.0,
                end: duration,
            }],
        });
    }

    let mut chunks = greedy_pass(duration, &key_times, target, min_dur, max_dur);

    if cfg.min_chunks > 0 && (chunks.len() as u32) < cfg.min_chunks {
        let retarget = duration / cfg.min_chunks as f64;
        chunks = greedy_pass(duration, &key_times, retarget, min_dur, max_dur);
    }

    if cfg.max_chunks > 0 && (chunks.len() as u32) > cfg.max_chunks {
        merge_to_max(&mut chunks, cfg.max_chunks as usize);
    }

    if chunks.is_empty() {
        return Err(ChunkError::InvalidArgument(
            "planning produced no chunks".to_string(),
        ));
    }

    if cfg.avoid_tiny_last {
        merge_tiny_tail(&mut chunks, min_dur, duration);
    }

    normalize(&mut chunks, duration);

    tracing::debug!(
        "Planned {} chunks (target={:.3}s min={:.3}s max={:.3}s) over {:.3}s",
        chunks.len(),
        target,
        min_dur,
        max_dur,
        duration
    );

    Ok(ChunkPlan { chunks })
}

/// Derive the effective target/min/max durations from the config.
fn effective_targets(cfg: &PlanConfig, duration: f64) -> (f64, f64, f64) {
    let mut target = cfg.target_dur;
    if cfg.ideal_parallel > 0 {
        target = duration / cfg.ideal_parallel as f64;
    }
    if target <= 0.0 {
        target = 10.0;
    }

    let min_dur = if cfg.min_dur > 0.0 {
        cfg.min_dur
    } else {
        target * 0.5
    };
    let max_dur = if cfg.max_dur > 0.0 {
        cfg.max_dur
    } else {
        target * 2.0
    };

    (target, min_dur, max_dur.max(min_dur))
}

/// Select the next cut after `start`.
///
/// Candidates are keyframes with span in `[min_dur, max_dur]`, scored by
/// distance to the target (first-wins on ties).  With no candidate in range
/// the first keyframe beyond `max_dur` is used, and failing that the source
/// end.  The cursor is advanced past the chosen cut.
fn choose_cut(
    start: f64,
    duration: f64,
    target: f64,
    min_dur: f64,
    max_dur: f64,
    key_times: &[f64],
    cursor: &mut usize,
) -> f64 {
    let mut best_cut = -1.0f64;
    let mut best_score = f64::MAX;
    let mut fallback = -1.0f64;

    let mut idx = *cursor;
    while idx < key_times.len() && key_times[idx] <= start + EPS {
        idx += 1;
    }

    while idx < key_times.len() {
        let t = key_times[idx];
        if t >= duration - EPS {
            best_cut = duration;
            break;
        }

        let span = t - start;
        if span < min_dur - EPS {
            idx += 1;
            continue;
        }
        if span > max_dur + EPS {
            fallback = t;
            break;
        }

        let score = (span - target).abs();
        if score < best_score {
            best_score = score;
            best_cut = t;
        }
        idx += 1;
    }

    if best_cut < 0.0 {
        best_cut = if fallback > 0.0 { fallback } else { duration };
    }

    if best_cut > duration {
        best_cut = duration;
    }
    if best_cut < start + min_dur {
        best_cut = (start + min_dur).min(duration);
    }

    while *cursor < key_times.len() && key_times[*cursor] <= best_cut + EPS {
        *cursor += 1;
    }

    best_cut
}

/// Greedy cut selection over the whole timeline.
fn greedy_pass(
    duration: f64,
    key_times: &[f64],
    target: f64,
    min_dur: f64,
    max_dur: f64,
) -> Vec<Chunk> {
    let mut chunks: Vec<Chunk> = Vec::new();
    let mut start = 0.0f64;
    let mut cursor = 0usize;

    while start < duration - EPS {
        let mut cut = choose_cut(
            start, duration, target, min_dur, max_dur, key_times, &mut cursor,
        );
        if cut <= start + EPS {
            cut = (start + max_dur).min(duration);
        }

        if cut > start + EPS {
            chunks.push(Chunk {
                index: chunks.len() as i32,
                start,
                end: cut,
            });
        }
        start = cut;
    }

    // The last chunk absorbs any tail the cut selection left behind.
    if let Some(last) = chunks.last_mut() {
        last.end = duration;
    }

    chunks
}

/// Merge adjacent chunk pairs (smallest summed duration first) until the
/// count satisfies `target`.
fn merge_to_max(chunks: &mut Vec<Chunk>, target: usize) {
    while chunks.len() > target && chunks.len() > 1 {
        let mut best = 0usize;
        let mut best_sum = f64::MAX;
        for i in 0..chunks.len() - 1 {
            let sum = chunks[i].duration() + chunks[i + 1].duration();
            if sum < best_sum {
                best_sum = sum;
                best = i;
            }
        }
        chunks[best].end = chunks[best + 1].end;
        chunks.remove(best + 1);
    }
}

/// Fold a trailing chunk shorter than half the minimum into its predecessor.
fn merge_tiny_tail(chunks: &mut Vec<Chunk>, min_dur: f64, duration: f64) {
    if chunks.len() < 2 {
        return;
    }
    let last = chunks[chunks.len() - 1];
    if last.duration() < min_dur * 0.5 {
        chunks.pop();
        if let Some(prev) = chunks.last_mut() {
            prev.end = duration;
        }
    }
}

/// Enforce exact contiguity, absorb residual drift into the last chunk, and
/// renumber indices `0..n`.
fn normalize(chunks: &mut [Chunk], duration: f64) {
    let mut total = 0.0f64;
    for i in 0..chunks.len() {
        if i > 0 {
            chunks[i].start = chunks[i - 1].end;
        }
        if chunks[i].end < chunks[i].start {
            chunks[i].end = chunks[i].start;
        }
        total += chunks[i].end - chunks[i].start;
    }

    if (total - duration).abs() > DURATION_TOLERANCE {
        if let Some(last) = chunks.last_mut() {
            last.end += duration - total;
        }
    }

    for (i, c) in chunks.iter_mut().enumerate() {
        c.index = i as i32;
    }
}

/// Write a plan as a JSON array of `{"index", "start", "end"}` objects with
/// three decimal places, stable key order, and a trailing newline.
pub fn write_plan_json<P: AsRef<Path>>(path: P, plan: &ChunkPlan) -> Result<()> {
    use std::fmt::Write as _;

    let mut out = String::from("[\n");
    for (i, c) in plan.chunks.iter().enumerate() {
        let sep = if i + 1 == plan.chunks.len() { "" } else { "," };
        // Infallible: writing to a String cannot fail.
        let _ = writeln!(
            out,
            "  {{\"index\": {}, \"start\": {:.3}, \"end\": {:.3}}}{}",
            c.index, c.start, c.end, sep
        );
    }
    out.push_str("]\n");

    std::fs::write(path, out)?;
    Ok(())
}

/// Read a plan previously written by [`write_plan_json`].
pub fn read_plan_json<P: AsRef<Path>>(path: P) -> Result<ChunkPlan> {
    let file = std::fs::File::open(path.as_ref())?;
    let chunks: Vec<Chunk> = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| ChunkError::InvalidArgument(format!("malformed plan JSON: {}", e)))?;
    if chunks.is_empty() {
        return Err(ChunkError::InvalidArgument(
            "plan JSON contains no chunks".to_string(),
        ));
    }
    Ok(ChunkPlan { chunks })
}
