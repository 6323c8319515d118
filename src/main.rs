use anyhow::{Context, Result};
use clap::Parser;
use irislens::capture::{CaptureSource, StillImageSource, WebcamCapture};
use irislens::catalog::{CatalogManifest, DefaultFetcher, LogoAsset, TextureCatalog};
use irislens::console::{self, DeliveryOptions};
use irislens::landmarks::{self, LandmarkSource, NoDetector};
use irislens::output::{OutputSink, V4L2Output};
use irislens::overlay::{BlendIntensity, OverlayCompositor, SelectionCell, TextureSelection};
use irislens::pipeline::{self, FrameProcessor, LiveStatus};
use irislens::snapshot::CaptureSession;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tokio::sync::watch;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input webcam device index
    #[arg(short, long, default_value_t = 0)]
    input_device: u32,

    /// Replay a still image instead of opening a webcam
    #[arg(long)]
    input_image: Option<PathBuf>,

    /// Capture resolution width
    #[arg(long, default_value_t = 1280)]
    capture_width: u32,

    /// Capture resolution height
    #[arg(long, default_value_t = 720)]
    capture_height: u32,

    /// Output v4l2loopback device path for the mirrored live preview
    #[arg(short, long)]
    output_device: Option<String>,

    /// Output resolution width
    #[arg(long, default_value_t = 1280)]
    output_width: u32,

    /// Output resolution height
    #[arg(long, default_value_t = 720)]
    output_height: u32,

    /// Target frames per second
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Path to face mesh model (ONNX file)
    /// If not provided, runs in passthrough mode without overlay
    #[arg(long)]
    model: Option<String>,

    /// Texture catalog manifest (JSON), local path or http(s) URL
    #[arg(short, long, default_value = "assets/catalog.json")]
    catalog: String,

    /// Branding logo location, overrides the manifest's logo
    #[arg(long)]
    logo: Option<String>,

    /// Initial overlay intensity
    #[arg(long, value_enum, default_value = "medium")]
    intensity: BlendIntensity,

    /// Directory finished captures are saved to
    #[arg(long, default_value = "captures")]
    capture_dir: PathBuf,

    /// Open each capture with the system image viewer
    #[arg(long)]
    share: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
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

    tracing::info!("IrisLens starting");
    tracing::info!("Capture: {}x{}", args.capture_width, args.capture_height);
    tracing::info!("Target FPS: {}", args.fps);

    let fetcher = DefaultFetcher::new();

    // Texture catalog
    let manifest = CatalogManifest::load(&fetcher, &args.catalog)
        .await
        .with_context(|| format!("Failed to load catalog manifest from {}", args.catalog))?;
    let (catalog, failures) = TextureCatalog::load(&fetcher, &manifest.resolved_textures()).await;
    for failure in &failures {
        eprintln!("Iris texture unavailable: {failure}");
    }
    let catalog = Arc::new(catalog);

    let initial = catalog.first_id().unwrap_or_default();
    if initial.is_empty() {
        tracing::warn!("No iris textures loaded; the live view stays unmodified");
    }
    let selection = Arc::new(SelectionCell::new(TextureSelection::new(initial, args.intensity)));

    // Capture session
    let (feed_tx, feed_rx) = pipeline::live_feed();
    let logo = args
        .logo
        .clone()
        .or_else(|| manifest.resolved_logo())
        .map(|url| Arc::new(LogoAsset::new(url, fetcher.clone())));
    if logo.is_none() {
        tracing::warn!("No branding logo configured; captures are disabled");
    }
    let session = Arc::new(CaptureSession::new(feed_rx, logo));

    // Frame loop
    let stop = Arc::new(AtomicBool::new(false));
    let frame_loop = {
        let args = args.clone();
        let compositor = OverlayCompositor::new(Arc::clone(&catalog));
        let selection = Arc::clone(&selection);
        let stop = Arc::clone(&stop);
        thread::Builder::new()
            .name("frame-loop".into())
            .spawn(move || {
                if let Err(err) = run_frame_loop(&args, compositor, selection, feed_tx, &stop) {
                    tracing::error!("Frame loop ended: {:#}", err);
                    eprintln!("Live view stopped: {err:#}. Type `quit` to exit.");
                }
            })
            .context("Failed to start frame loop")?
    };

    console::run(
        catalog,
        selection,
        session,
        DeliveryOptions {
            dir: args.capture_dir.clone(),
            share: args.share,
        },
    )
    .await?;

    stop.store(true, Ordering::Relaxed);
    if frame_loop.join().is_err() {
        tracing::error!("Frame loop panicked");
    }

    tracing::info!("IrisLens stopped");
    Ok(())
}

fn run_frame_loop(
    args: &Args,
    compositor: OverlayCompositor,
    selection: Arc<SelectionCell>,
    feed: watch::Sender<LiveStatus>,
    stop: &AtomicBool,
) -> Result<()> {
    // Initialize landmark detector if provided
    let detector: Box<dyn LandmarkSource> = if let Some(model_path) = &args.model {
        tracing::info!("Loading face mesh model from {}", model_path);
        let detector = landmarks::create_default_detector(model_path)
            .context("Failed to load face mesh model")?;
        tracing::info!("Face mesh model loaded successfully");
        detector
    } else {
        tracing::info!("Running in passthrough mode (no face mesh)");
        Box::new(NoDetector)
    };

    let mut processor = FrameProcessor::new(detector, compositor, selection, feed);

    let mut output = match &args.output_device {
        Some(path) => Some(
            V4L2Output::new(path, args.output_width, args.output_height, true)
                .context("Failed to initialize v4l2loopback output")?,
        ),
        None => None,
    };
    let output = output.as_mut().map(|o| o as &mut dyn OutputSink);
    if let Some(sink) = &output {
        let (width, height) = sink.resolution();
        tracing::info!("Mirrored preview at {}x{}", width, height);
    }

    match &args.input_image {
        Some(path) => {
            let mut capture = StillImageSource::open(path)?;
            log_source(&capture);
            pipeline::run_pipeline(&mut capture, output, &mut processor, args.fps, stop)
        }
        None => {
            let mut capture = WebcamCapture::new(
                args.input_device,
                args.capture_width,
                args.capture_height,
                args.fps,
            )
            .context("Failed to initialize webcam capture")?;
            log_source(&capture);
            pipeline::run_pipeline(&mut capture, output, &mut processor, args.fps, stop)
        }
    }
}

fn log_source(capture: &impl CaptureSource) {
    let (width, height) = capture.resolution();
    tracing::info!("Frames arrive at {}x{}", width, height);
}
