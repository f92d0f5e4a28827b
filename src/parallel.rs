//! Parallel chunk extraction.
//!
//! Distributes [`split_one`](crate::split::split_one) calls across a rayon
//! pool.  Each worker opens its own input context, so there is no shared
//! mutable state; the stitcher, by contrast, is strictly sequential.

use std::path::Path;

use rayon::prelude::*;

use crate::error::{ChunkError, Result};
use crate::format::SplitMode;
use crate::plan::ChunkPlan;
use crate::split::split_one;

/// Split every chunk of `plan` into `outdir` using a worker pool.
///
/// `jobs` overrides the pool size; by default the pool matches the host's
/// available parallelism, capped at the chunk count.  The first failing
/// chunk aborts the run (workers already in flight finish their file).
pub fn split_all_parallel(
    source: &Path,
    plan: &ChunkPlan,
    outdir: &Path,
    mode: &SplitMode,
    jobs: Option<usize>,
) -> Result<()> {
    if plan.is_empty() {
        return Ok(());
    }

    std::fs::create_dir_all(outdir)
        .map_err(|e| ChunkError::Output(format!("mkdir {:?}: {}", outdir, e)))?;

    let extension = mode.resolve(source)?.extension();

    let jobs = jobs
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
        .clamp(1, plan.len());

    tracing::info!("Splitting {} chunks using {} workers", plan.len(), jobs);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| ChunkError::Output(format!("worker pool: {}", e)))?;

    pool.install(|| {
        plan.chunks.par_iter().try_for_each(|chunk| {
            let out_path = outdir.join(chunk.file_name(extension));
            tracing::info!(
                "[split] {:?} ({:.3} -> {:.3})",
                out_path,
                chunk.start,
                chunk.end
            );
            split_one(source, chunk, &out_path, mode)
        })
    })
}
