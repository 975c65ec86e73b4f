use anyhow::{Context, Result};
use clap::Parser;
use code_inspect::config::EnhanceConfig;
use code_inspect::enhance::EnhancementPipeline;
use code_inspect::models::Raster;
use code_inspect::tools::{grayscale_stats, load_rgb};
use std::path::PathBuf;
use std::time::Instant;

/// Write the three enhancement variants of an image as PNG files
#[derive(Parser)]
#[command(name = "variants", version)]
struct Args {
    #[arg(long)]
    image: PathBuf,
    /// Output directory (defaults to the image's directory)
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let rgb = load_rgb(&args.image).with_context(|| format!("failed to load {}", args.image.display()))?;
    let out_dir = args
        .out
        .or_else(|| args.image.parent().map(PathBuf::from))
        .unwrap_or_default();
    std::fs::create_dir_all(&out_dir)?;
    let stem = args
        .image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".into());

    let pipeline = EnhancementPipeline::new(EnhanceConfig::from_env());
    let start = Instant::now();
    let variants = pipeline.enhance(&rgb);
    println!(
        "Enhanced {}x{} in {:.1} ms",
        variants.width(),
        variants.height(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    for (tag, raster) in variants.iter() {
        let path = out_dir.join(format!("{stem}_{tag}.png"));
        let stats = grayscale_stats(&raster.to_luma());
        match raster {
            Raster::Gray(img) => img.save(&path)?,
            Raster::Rgb(img) => img.save(&path)?,
        }
        println!(
            "  {:<14} min={:>3} max={:>3} avg={:>3} dark={:.1}% -> {}",
            tag.as_str(),
            stats.min,
            stats.max,
            stats.avg,
            stats.dark_ratio * 100.0,
            path.display()
        );
    }
    Ok(())
}
