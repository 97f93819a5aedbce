use clap::Parser;
use image::ImageReader;
use image::imageops::FilterType;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use facemark::{
    DisplaySize, FaceDetector, FacePipeline, ImageSize, OverlayRenderer, OverlayStyle,
    ReplayDetector, ScaledDetection, confidence_label,
};

#[derive(Parser)]
#[command(name = "facemark")]
#[command(author, version, about = "Map face detections onto a displayed image and draw their overlay")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Raw detections recorded as JSON (normalized, bottom-left origin)
    #[arg(long, value_name = "JSON")]
    detections: Option<PathBuf>,

    /// SeetaFace model used to detect faces instead of a recording
    #[cfg(feature = "rustface")]
    #[arg(long, value_name = "BIN")]
    model: Option<PathBuf>,

    /// Display region size, e.g. 300x300 (axes scale independently)
    #[arg(long, value_name = "WxH", value_parser = parse_display, conflicts_with = "fit")]
    display: Option<DisplaySize>,

    /// Fit the image inside this size, keeping its aspect ratio
    #[arg(long, value_name = "WxH", value_parser = parse_display)]
    fit: Option<DisplaySize>,

    /// Write the image with the overlay drawn on it
    #[arg(long, value_name = "PNG")]
    overlay: Option<PathBuf>,

    /// Bounding box stroke width in pixels
    #[arg(long, default_value = "2")]
    stroke: u32,

    /// Skip landmark markers and paths
    #[arg(long)]
    no_landmarks: bool,

    /// Output as JSON
    #[arg(short, long)]
    json: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    image: String,
    image_size: ImageSize,
    display_size: DisplaySize,
    faces_detected: usize,
    faces: &'a [ScaledDetection],
}

fn parse_display(value: &str) -> Result<DisplaySize, String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{value}'"))?;
    let width: f64 = w.trim().parse().map_err(|_| format!("invalid width '{w}'"))?;
    let height: f64 = h.trim().parse().map_err(|_| format!("invalid height '{h}'"))?;
    if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
        return Err(format!("display size must be positive, got '{value}'"));
    }
    Ok(DisplaySize::new(width, height))
}

#[cfg(feature = "rustface")]
fn model_detector(args: &Cli) -> anyhow::Result<Option<Box<dyn FaceDetector>>> {
    match &args.model {
        Some(path) => {
            let detector: Box<dyn FaceDetector> = Box::new(facemark::RustfaceDetector::from_file(path)?);
            Ok(Some(detector))
        }
        None => Ok(None),
    }
}

#[cfg(not(feature = "rustface"))]
fn model_detector(_args: &Cli) -> anyhow::Result<Option<Box<dyn FaceDetector>>> {
    Ok(None)
}

fn build_detector(args: &Cli) -> anyhow::Result<Box<dyn FaceDetector>> {
    if let Some(detector) = model_detector(args)? {
        return Ok(detector);
    }

    match &args.detections {
        Some(path) => Ok(Box::new(ReplayDetector::from_file(path)?)),
        None => anyhow::bail!("no detector given: pass --detections <JSON>"),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let img = ImageReader::open(&args.image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
    let image_size = ImageSize::of(&img);
    tracing::info!(width = image_size.width, height = image_size.height, "image loaded");

    let display = match (args.display, args.fit) {
        (Some(display), _) => display,
        (None, Some(bounds)) => DisplaySize::fit_within(image_size, bounds),
        (None, None) => DisplaySize::native(image_size),
    };

    let pipeline = FacePipeline::new(build_detector(&args)?);
    let detections = pipeline.detect(&img);
    let faces = pipeline.layout(&detections, image_size, display)?;

    if let Some(path) = &args.overlay {
        let width = display.width.round().max(1.0) as u32;
        let height = display.height.round().max(1.0) as u32;
        let mut canvas = image::imageops::resize(&img.to_rgba8(), width, height, FilterType::Triangle);
        let style = OverlayStyle::default()
            .with_box_stroke(args.stroke)
            .with_landmarks(!args.no_landmarks);
        OverlayRenderer::new(style).render(&mut canvas, &faces);
        canvas
            .save(path)
            .map_err(|e| anyhow::anyhow!("Failed to save overlay: {}", e))?;
        tracing::info!(path = %path.display(), "overlay written");
    }

    let text = if args.json {
        let report = Report {
            image: args.image_path.display().to_string(),
            image_size,
            display_size: display,
            faces_detected: faces.len(),
            faces: &faces,
        };
        serde_json::to_string_pretty(&report)?
    } else {
        human_report(&faces, image_size, display)
    };

    match &args.output {
        Some(path) => std::fs::write(path, text)?,
        None => println!("{}", text),
    }

    Ok(())
}

fn human_report(faces: &[ScaledDetection], image: ImageSize, display: DisplaySize) -> String {
    let mut out = String::new();
    out.push_str("=== Face Detection Results ===\n");
    out.push_str(&format!(
        "Image {}x{} shown at {:.0}x{:.0}\n",
        image.width, image.height, display.width, display.height
    ));
    out.push_str(&format!("Total faces: {}\n", faces.len()));

    if faces.is_empty() {
        out.push_str("No faces detected.\n");
        return out;
    }

    for (i, face) in faces.iter().enumerate() {
        let b = &face.bounding_box;
        out.push_str(&format!(
            "  Face {} at ({:.1}, {:.1}) size {:.1}x{:.1} - {} ({})\n",
            i + 1,
            b.x,
            b.y,
            b.width,
            b.height,
            confidence_label(face.confidence),
            face.quality
        ));
        if let Some(landmarks) = &face.landmarks {
            for (kind, points) in landmarks.groups() {
                out.push_str(&format!("    {}: {} point(s)\n", kind.name(), points.len()));
            }
        }
    }
    out
}
