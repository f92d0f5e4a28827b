//! chunkmux CLI
//!
//! Probes a source video, plans keyframe-aligned chunks, extracts them in
//! parallel by stream copy, and optionally stitches them back into a single
//! container.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chunkmux::{ChunkPlan, LogLevel, PlanConfig, SplitMode, StitchMode};

/// Exit code for argument errors
const EXIT_USAGE: u8 = 1;
/// Exit code for probe failures
const EXIT_PROBE: u8 = 2;
/// Exit code for planning failures
const EXIT_PLAN: u8 = 3;
/// Exit code for split failures
const EXIT_SPLIT: u8 = 4;
/// Exit code for stitch failures
const EXIT_STITCH: u8 = 5;

#[derive(Parser, Debug)]
#[command(
    name = "chunkmux",
    version,
    about = "Keyframe-aligned video chunking and lossless stitching"
)]
struct CliOpts {
    /// Source video file
    input: PathBuf,

    /// Directory receiving the chunk files
    chunks_dir: PathBuf,

    /// Stitched output file (omit to skip stitching)
    final_output: Option<PathBuf>,

    /// Target chunk duration in seconds
    #[arg(long, default_value_t = 60.0)]
    target: f64,

    /// Minimum chunk duration in seconds
    #[arg(long)]
    min: Option<f64>,

    /// Maximum chunk duration in seconds
    #[arg(long)]
    max: Option<f64>,

    /// Ideal parallel workers (overrides --target with duration / n)
    #[arg(long = "ideal-par")]
    ideal_par: Option<u32>,

    /// Minimum number of chunks
    #[arg(long = "min-chunks")]
    min_chunks: Option<u32>,

    /// Maximum number of chunks (merge to meet)
    #[arg(long = "max-chunks")]
    max_chunks: Option<u32>,

    /// Keep very small tail chunks
    #[arg(long = "allow-tiny-last")]
    allow_tiny_last: bool,

    /// Skip chunk extraction (stitch only)
    #[arg(long = "no-split")]
    no_split: bool,

    /// Skip stitching
    #[arg(long = "no-stitch")]
    no_stitch: bool,

    /// Enable fragmented MP4 outputs
    #[arg(long)]
    frag: bool,

    /// Force muxer short name (mp4/mov/matroska/webm)
    #[arg(long = "force-format")]
    force_format: Option<String>,

    /// Write the plan as a JSON array
    #[arg(long = "plan-json")]
    plan_json: Option<PathBuf>,

    /// Worker count for parallel splitting (default: hardware concurrency)
    #[arg(long)]
    jobs: Option<usize>,
}

fn main() -> ExitCode {
    let cli = match CliOpts::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            use clap::error::ErrorKind;
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_USAGE),
            };
        }
    };

    init_logging();

    if let Err(e) = chunkmux::ffmpeg_init() {
        tracing::error!("FFmpeg initialization failed: {}", e);
        return ExitCode::from(EXIT_PROBE);
    }
    chunkmux::set_log_level(LogLevel::Warning);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run(cli: CliOpts) -> Result<(), u8> {
    print_source_info(&cli);

    let (plan, loaded_from_json) = build_plan(&cli)?;
    dump_plan(&plan);

    if let Some(path) = &cli.plan_json {
        if !loaded_from_json {
            if let Err(e) = chunkmux::write_plan_json(path, &plan) {
                tracing::error!("Failed to write plan JSON {:?}: {}", path, e);
                return Err(EXIT_PLAN);
            }
            tracing::info!("Plan written to {:?}", path);
        }
    }

    if !cli.no_split {
        let mode = SplitMode {
            auto_mode: cli.force_format.is_none(),
            force_fmt: cli.force_format.clone(),
            output_frag: cli.frag,
        };
        if let Err(e) =
            chunkmux::split_all_parallel(&cli.input, &plan, &cli.chunks_dir, &mode, cli.jobs)
        {
            tracing::error!("Split failed: {}", e);
            return Err(EXIT_SPLIT);
        }
    }

    // A missing output path implies stitch-less operation.
    if !cli.no_stitch {
        if let Some(final_output) = &cli.final_output {
            let mode = StitchMode {
                auto_mode: cli.force_format.is_none(),
                force_fmt: cli.force_format.clone(),
                output_frag: cli.frag,
                enable_faststart: false,
            };
            if let Err(e) = chunkmux::stitch(final_output, &plan, &cli.chunks_dir, &mode) {
                tracing::error!("Stitch failed: {}", e);
                return Err(EXIT_STITCH);
            }
        }
    }

    Ok(())
}

/// Build the chunk plan: probe + plan, or reload a previously written plan
/// JSON when running stitch-only.
fn build_plan(cli: &CliOpts) -> Result<(ChunkPlan, bool), u8> {
    if cli.no_split {
        if let Some(path) = cli.plan_json.as_ref().filter(|p| p.exists()) {
            return match chunkmux::read_plan_json(path) {
                Ok(plan) => {
                    tracing::info!("Loaded plan from {:?} ({} chunks)", path, plan.len());
                    Ok((plan, true))
                }
                Err(e) => {
                    tracing::error!("Failed to read plan JSON {:?}: {}", path, e);
                    Err(EXIT_PLAN)
                }
            };
        }
    }

    let probe = match chunkmux::probe(&cli.input) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Probe failed for {:?}: {}", cli.input, e);
            return Err(EXIT_PROBE);
        }
    };
    tracing::info!(
        "Probed {:?}: {} packets, {} keyframes, {:.3}s",
        cli.input,
        probe.frames.len(),
        probe.keyframe_count(),
        probe.duration
    );

    let cfg = PlanConfig {
        target_dur: cli.target,
        min_dur: cli.min.unwrap_or(0.0),
        max_dur: cli.max.unwrap_or(0.0),
        avoid_tiny_last: !cli.allow_tiny_last,
        min_chunks: cli.min_chunks.unwrap_or(0),
        max_chunks: cli.max_chunks.unwrap_or(0),
        ideal_parallel: cli.ideal_par.unwrap_or(0),
    };

    match chunkmux::plan(&probe, &cfg) {
        Ok(plan) => Ok((plan, false)),
        Err(e) => {
            tracing::error!("Chunk planning failed: {}", e);
            Err(EXIT_PLAN)
        }
    }
}

fn print_source_info(cli: &CliOpts) {
    match chunkmux::source_info(&cli.input) {
        Ok(info) => {
            tracing::info!(
                "Source: {}x{} @ {:.3} fps, codec={}, bitrate={}, duration={:.3}s",
                info.width,
                info.height,
                info.frame_rate,
                info.codec,
                info.bit_rate,
                info.duration
            );
        }
        Err(e) => tracing::warn!("Could not read source info: {}", e),
    }
}

fn dump_plan(plan: &ChunkPlan) {
    println!("Chunk plan ({} chunks):", plan.len());
    for c in &plan.chunks {
        println!(
            "  #{:03}  {:.3} -> {:.3}  ({:.3} s)",
            c.index,
            c.start,
            c.end,
            c.duration()
        );
    }
}

/// Initialize logging with tracing
fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chunkmux=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
