use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use code_inspect::acquisition::FileCamera;
use code_inspect::config::{PipelineConfig, WorkerConfig};
use code_inspect::decoder::RxingDecoder;
use code_inspect::tools::{frame_limit_from_env, load_rgb};
use code_inspect::{
    FramePipeline, InspectionControl, InspectionWorker, ParameterStore, PdiParameters,
    ProfileStore, RawFrame, SessionStatus, SymbologyDecoder, WorkerEvent,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "code-inspect", version, about = "Optical code inspection tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect codes in a single image
    Detect {
        #[arg(long)]
        image: PathBuf,
    },
    /// Replay a directory of frames through a full inspection cycle
    Run {
        #[arg(long)]
        dir: PathBuf,
        /// Expected number of distinct codes
        #[arg(long, default_value_t = 1)]
        expected: u32,
        /// Cycle timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout: u64,
        /// Process every third frame
        #[arg(long)]
        fast: bool,
        /// Restart at the first frame when the directory is exhausted
        #[arg(long = "loop")]
        looping: bool,
        /// Load the latest profile from this directory first
        #[arg(long)]
        profiles: Option<PathBuf>,
    },
    /// Save a parameter profile
    SaveProfile {
        #[arg(long)]
        dir: PathBuf,
        #[arg(long)]
        gain: Option<i32>,
        #[arg(long)]
        brightness: Option<i32>,
        #[arg(long)]
        contrast: Option<i32>,
        #[arg(long)]
        boost: Option<bool>,
        #[arg(long)]
        alpha: Option<f32>,
        #[arg(long)]
        beta: Option<i32>,
    },
    /// Print the latest parameter profile
    LoadProfile {
        #[arg(long)]
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Detect { image } => detect_cmd(&image),
        Command::Run {
            dir,
            expected,
            timeout,
            fast,
            looping,
            profiles,
        } => run_cmd(&dir, expected, Duration::from_secs(timeout), fast, looping, profiles.as_deref()),
        Command::SaveProfile {
            dir,
            gain,
            brightness,
            contrast,
            boost,
            alpha,
            beta,
        } => {
            let store = ProfileStore::new(dir);
            let mut params = match store.load_latest() {
                Ok((_, params)) => params,
                Err(_) => PdiParameters::default(),
            };
            if let Some(v) = gain {
                params.hardware.gain = v;
            }
            if let Some(v) = brightness {
                params.hardware.brightness = v;
            }
            if let Some(v) = contrast {
                params.hardware.contrast = v;
            }
            if let Some(v) = boost {
                params.software.boost = v;
            }
            if let Some(v) = alpha {
                params.software.alpha = v;
            }
            if let Some(v) = beta {
                params.software.beta = v;
            }
            let path = store.save(&params)?;
            println!("Saved {}", path.display());
            Ok(())
        }
        Command::LoadProfile { dir } => {
            let (path, params) = ProfileStore::new(dir).load_latest()?;
            println!("{}", path.display());
            println!("{}", serde_json::to_string_pretty(&params)?);
            Ok(())
        }
    }
}

fn decoder() -> Arc<dyn SymbologyDecoder> {
    Arc::new(RxingDecoder::new())
}

fn detect_cmd(image: &Path) -> Result<()> {
    let rgb = load_rgb(image).with_context(|| format!("failed to load {}", image.display()))?;
    let (width, height) = rgb.dimensions();
    let pipeline = FramePipeline::with_config(decoder(), PipelineConfig::from_env());

    let start = Instant::now();
    let result = pipeline.process(&RawFrame::new(rgb, 0));
    let elapsed = start.elapsed();

    println!("Image: {} ({}x{})", image.display(), width, height);
    println!(
        "Found {} codes in {} regions{} ({:.1} ms)",
        result.codes.len(),
        result.regions,
        if result.fallback_used { ", whole-frame pass" } else { "" },
        elapsed.as_secs_f64() * 1000.0
    );
    for (i, code) in result.codes.iter().enumerate() {
        println!(
            "  {}: [{}] {} via {} ({:?})",
            i, code.symbology, code.content, code.variant, code.origin
        );
    }
    Ok(())
}

fn run_cmd(
    dir: &Path,
    expected: u32,
    timeout: Duration,
    fast: bool,
    looping: bool,
    profiles: Option<&Path>,
) -> Result<()> {
    let params = match profiles {
        Some(profiles) => {
            let (path, params) = ProfileStore::new(profiles).load_latest()?;
            info!(path = %path.display(), "using profile");
            params
        }
        None => PdiParameters::default(),
    };
    let store = Arc::new(ParameterStore::new(params)?);
    let camera = FileCamera::open(dir, looping)?;
    let pipeline = FramePipeline::with_config(decoder(), PipelineConfig::from_env());

    let config = WorkerConfig::from_env();
    let control = InspectionControl::new(store, &config);
    control.set_fast_mode(fast);
    control.start(expected, timeout)?;
    let (worker, events) = InspectionWorker::spawn_with(control.clone(), camera, pipeline, &config)
        .context("failed to start inspection worker")?;

    let limit = frame_limit_from_env();
    let mut frames = 0usize;
    let mut verdict = SessionStatus::Running;

    for event in events.iter() {
        match event {
            WorkerEvent::Frame(report) => {
                frames += 1;
                for code in &report.codes {
                    println!("frame {:>5}: [{}] {}", report.sequence, code.symbology, code.content);
                }
                if report.session.status.is_verdict() {
                    verdict = report.session.status;
                    break;
                }
                if limit.is_some_and(|limit| frames >= limit) {
                    warn!(frames, "frame limit reached before a verdict");
                    break;
                }
            }
            WorkerEvent::Fatal(err) => {
                warn!(%err, "acquisition ended");
                break;
            }
        }
    }

    let snapshot = control.snapshot();
    if !verdict.is_verdict() {
        verdict = snapshot.status;
    }
    worker.shutdown();

    println!(
        "Verdict: {} ({} of {} codes, {:.2} s)",
        verdict,
        snapshot.count(),
        expected,
        snapshot.elapsed.as_secs_f64()
    );
    for code in &snapshot.codes {
        println!("  [{}] {}", code.symbology, code.content);
    }
    if verdict != SessionStatus::Ok {
        bail!("inspection did not pass: {verdict}");
    }
    Ok(())
}
