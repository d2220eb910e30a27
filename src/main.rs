//! Background-Subtraction Bounding Boxes CLI
//!
//! Computes the foreground bounding box of every frame in an image
//! directory and writes the results as JSON.

use bgsub_boxes::{
    metrics::{MetricsRegistry, MetricsSnapshot},
    persist, BoxCalculator, BoxRecords, CalculatorConfig, CancellationToken, FileConfig,
    ImageDirectory,
};
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "bgsub-boxes", version, about)]
struct Args {
    /// Directory holding one image per frame
    frames: PathBuf,

    /// File name suffix selecting frame images
    #[arg(long, default_value = ".png")]
    extension: String,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frames sampled for the background median
    #[arg(long)]
    bg_probes: Option<usize>,

    /// Intensity difference a pixel must exceed to count as foreground
    #[arg(long)]
    diff_thresh: Option<u8>,

    /// Worker threads for the batch (0 forces sequential)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Frame indices per unit of parallel work
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Seed for background sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Only compute these frame indices
    #[arg(short, long, value_delimiter = ',')]
    indices: Vec<usize>,

    /// Write boxes as JSON to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the background model image to this path
    #[arg(long)]
    background: Option<PathBuf>,

    /// Write Prometheus metrics to this path
    #[arg(long)]
    metrics: Option<PathBuf>,
}

impl Args {
    fn file_config(&self) -> FileConfig {
        let mut file = match &self.config {
            Some(path) => FileConfig::from_file(path).unwrap_or_else(|e| {
                eprintln!("Failed to load {}: {}", path.display(), e);
                process::exit(1);
            }),
            None => FileConfig::default(),
        };

        let calculator = &mut file.calculator;
        if let Some(bg_probes) = self.bg_probes {
            calculator.bg_probes = bg_probes;
        }
        if let Some(diff_thresh) = self.diff_thresh {
            calculator.diff_thresh = diff_thresh;
        }
        if let Some(workers) = self.workers {
            calculator.num_workers = Some(workers);
        }
        if let Some(chunk_size) = self.chunk_size {
            calculator.chunk_size = chunk_size;
        }
        if self.seed.is_some() {
            calculator.seed = self.seed;
        }

        let output = &mut file.output;
        if self.output.is_some() {
            output.boxes_path = self.output.clone();
        }
        if self.background.is_some() {
            output.background_path = self.background.clone();
        }
        if self.metrics.is_some() {
            output.metrics_path = self.metrics.clone();
        }

        file
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("bgsub-boxes v{}", bgsub_boxes::VERSION);

    let FileConfig { calculator, output } = args.file_config();

    let frames = match ImageDirectory::open(&args.frames, &args.extension) {
        Ok(frames) => frames,
        Err(e) => {
            eprintln!("Failed to open frames: {}", e);
            process::exit(1);
        }
    };

    let mut calc = match BoxCalculator::new(frames, calculator.clone()) {
        Ok(calc) => calc,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    let token = CancellationToken::new();
    let handler_token = token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        warn!("Interrupt received, cancelling batch");
        handler_token.cancel();
    }) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let options = calculator.batch_options().with_cancellation(token);
    let result = if args.indices.is_empty() {
        calc.calc_all(&options)
    } else {
        calc.calc_specified(&args.indices, &options)
    };

    let boxes = match result {
        Ok(boxes) => boxes,
        Err(e) => {
            error!("Box extraction failed: {}", e);
            process::exit(1);
        }
    };

    let stats = calc.stats();
    info!(
        "Computed {} boxes ({} empty, {} cached) with {} workers",
        boxes.len(),
        stats.empty_boxes,
        stats.cache_hits,
        stats.last_batch_workers
    );

    if let Err(e) = write_outputs(&mut calc, &calculator, &output) {
        error!("{}", e);
        process::exit(1);
    }

    if output.boxes_path.is_none() {
        for (index, bbox) in calc.all_bboxes().iter().enumerate() {
            if let Some(bbox) = bbox {
                println!("{}\t{}", index, bbox);
            }
        }
    }
}

fn write_outputs(
    calc: &mut BoxCalculator<ImageDirectory>,
    config: &CalculatorConfig,
    output: &bgsub_boxes::calculator::OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &output.boxes_path {
        let records = BoxRecords::new(config, calc.all_bboxes().to_vec());
        persist::save_records(&records, path)?;
    }

    if let Some(path) = &output.background_path {
        let background = calc.get_background()?;
        persist::save_background(&background, path)?;
    }

    if let Some(path) = &output.metrics_path {
        let registry = MetricsRegistry::new()?;
        registry.update(&MetricsSnapshot::from(calc.stats()));
        persist::create_parent_directory(path)?;
        std::fs::write(path, registry.encode()?)?;
        info!("Metrics written to {}", path.display());
    }

    Ok(())
}
