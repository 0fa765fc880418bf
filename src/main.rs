use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use vehicle_scan::capture::{FileSource, ImageSource};
use vehicle_scan::detection;
use vehicle_scan::output::{DirectoryOutput, OutputSink};
use vehicle_scan::{load_config, DetectorConfig, VehicleDetector};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input images (3-channel RGB)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Path to the trained model artifact (JSON)
    #[arg(short, long)]
    model: PathBuf,

    /// Detector configuration (JSON); defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the heatmap vote threshold
    #[arg(long)]
    threshold: Option<u32>,

    /// Directory for annotated images, heatmaps and JSON summaries
    #[arg(short, long, default_value = "detections")]
    output_dir: PathBuf,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("vehicle-scan starting");

    let mut config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DetectorConfig::default(),
    };
    if let Some(threshold) = args.threshold {
        config.heat_threshold = threshold;
    }
    let detector = detection::create_default_detector(&args.model, config)
        .context("Failed to load detector model")?;
    tracing::info!(
        "Scale bands: {}, heat threshold: {}",
        detector.config().scale_table.len(),
        detector.config().heat_threshold
    );

    let mut source = FileSource::new(args.inputs.clone());
    let mut output =
        DirectoryOutput::new(&args.output_dir).context("Failed to initialize output")?;

    run_pipeline(&mut source, &mut output, &detector)
}

fn run_pipeline<S, O>(source: &mut S, output: &mut O, detector: &VehicleDetector) -> Result<()>
where
    S: ImageSource,
    O: OutputSink,
{
    let mut image_count = 0u64;
    let mut vehicle_count = 0usize;
    let mut total_detect_time = Duration::ZERO;

    while let Some(frame) = source.next_image().context("Failed to read image")? {
        let start = Instant::now();
        let result = detector
            .detect(&frame.image)
            .with_context(|| format!("Detection failed on {}", frame.name))?;
        let elapsed = start.elapsed();
        total_detect_time += elapsed;

        output
            .write_result(&frame, &result)
            .with_context(|| format!("Failed to write results for {}", frame.name))?;

        image_count += 1;
        vehicle_count += result.boxes.len();
        tracing::info!(
            "{}: {} vehicle(s) from {} raw window(s) in {:.1}ms",
            frame.name,
            result.boxes.len(),
            result.raw_boxes.len(),
            elapsed.as_secs_f64() * 1000.0
        );
    }

    if image_count > 0 {
        tracing::info!(
            "Processed {} image(s), {} vehicle(s), avg {:.1}ms/image",
            image_count,
            vehicle_count,
            total_detect_time.as_secs_f64() * 1000.0 / image_count as f64
        );
    }
    Ok(())
}
