//! Test fixtures
//!
//! Synthetic probe results for exercising the planner without media files.

use crate::probe::{FrameMeta, ProbeResult};

/// Frame spacing of the synthetic sources, in seconds.
const FRAME_STEP: f64 = 0.25;

/// A probe whose keyframes sit on a regular grid: one frame every 0.25 s
/// from 0 through `duration` inclusive, keyframes wherever the timestamp is
/// a multiple of `kf_interval`.
pub fn grid_probe(duration: f64, kf_interval: f64) -> ProbeResult {
    let count = (duration / FRAME_STEP).round() as usize;
    let mut frames = Vec::with_capacity(count + 1);

    for i in 0..=count {
        let t = i as f64 * FRAME_STEP;
        let ratio = t / kf_interval;
        let is_keyframe = (ratio - ratio.round()).abs() < 1e-6;
        frames.push(FrameMeta {
            pts_time: t,
            is_keyframe,
            pkt_size: if is_keyframe { 4096 } else { 512 },
        });
    }

    ProbeResult { frames, duration }
}

/// A probe with a single keyframe at t=0 and delta frames thereafter.
pub fn single_keyframe_probe(duration: f64) -> ProbeResult {
    let count = (duration / FRAME_STEP).ceil() as usize;
    let mut frames = Vec::with_capacity(count);

    for i in 0..count {
        let t = i as f64 * FRAME_STEP;
        frames.push(FrameMeta {
            pts_time: t,
            is_keyframe: i == 0,
            pkt_size: if i == 0 { 4096 } else { 512 },
        });
    }

    ProbeResult { frames, duration }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_probe_keyframe_grid() {
        let probe = grid_probe(30.0, 2.0);
        let keys = probe.keyframe_times();
        assert_eq!(keys.len(), 16); // 0, 2, 4, ..., 30
        assert_eq!(keys[0], 0.0);
        assert_eq!(*keys.last().unwrap(), 30.0);
    }

    #[test]
    fn test_single_keyframe_probe() {
        let probe = single_keyframe_probe(5.0);
        assert_eq!(probe.keyframe_count(), 1);
        assert_eq!(probe.duration, 5.0);
    }
}
