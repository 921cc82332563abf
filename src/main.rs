use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use tracing::{info, warn};

use sc_translator::annotation::ShapeKind;
use sc_translator::capture::{ScreenGrabber, WindowHandle};
use sc_translator::clipboard::{self, SystemClipboard};
use sc_translator::export::{self, ExportFormat};
use sc_translator::font::TextRasterizer;
use sc_translator::history::HistoryStore;
use sc_translator::mosaic;
use sc_translator::ocr::default_recognizer;
use sc_translator::pipeline::{Pipeline, PipelineMode, PipelineOutcome, PipelineRequest, Session};
use sc_translator::selection::Effect;
use sc_translator::translation::{MyMemoryTranslator, TextBlockTranslator};
use sc_translator::{ConfigManager, OverlayRenderer, PixelBuffer, PixelRect, Point, Settings, Size};

#[derive(Parser, Debug)]
#[command(
    name = "sc_translator",
    version,
    about = "Capture the screen, annotate, recognize and translate text in screenshots"
)]
struct Cli {
    /// Verbose logging (RUST_LOG is honoured)
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    debug: bool,

    /// Settings file (default: <config dir>/sc_translator/settings.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Capture the screen (whole virtual desktop by default) and save it
    Capture {
        /// Region as x,y,width,height in physical pixels
        #[arg(long, value_parser = parse_rect, conflicts_with_all = ["window_id", "primary"])]
        region: Option<PixelRect>,
        /// Capture the area covered by this window
        #[arg(long)]
        window_id: Option<u64>,
        /// Capture the primary display only
        #[arg(long, action = ArgAction::SetTrue)]
        primary: bool,
        /// Copy to the clipboard; the file is then written only with OUT or auto-save
        #[arg(long, action = ArgAction::SetTrue)]
        copy: bool,
        /// Output file; format follows the extension (default: timestamped file in the save directory)
        out: Option<PathBuf>,
    },
    /// Draw shapes onto an image with the configured stroke
    Annotate {
        input: PathBuf,
        output: PathBuf,
        /// Shape as KIND:x1,y1,x2,y2 (rectangle, ellipse, arrow, line, mosaic); repeatable
        #[arg(long = "shape", value_parser = parse_shape, required = true)]
        shapes: Vec<(ShapeKind, [f64; 4])>,
        /// Also copy the result to the clipboard
        #[arg(long, action = ArgAction::SetTrue)]
        copy: bool,
    },
    /// Pixelate a rectangle of an image
    Mosaic {
        input: PathBuf,
        output: PathBuf,
        /// Rectangle as x,y,width,height
        #[arg(long, value_parser = parse_rect)]
        rect: PixelRect,
        /// Cell edge length in pixels
        #[arg(long, default_value_t = mosaic::DEFAULT_BLOCK_SIZE)]
        block: u32,
    },
    /// Recognize text in an image
    Ocr {
        image: PathBuf,
        /// Recognition language tag (default: from settings)
        #[arg(long)]
        lang: Option<String>,
        /// Copy the recognized text to the clipboard
        #[arg(long, action = ArgAction::SetTrue)]
        copy: bool,
    },
    /// Recognize and translate text in an image
    Translate {
        image: PathBuf,
        /// Source language code or "auto"
        #[arg(long)]
        from: Option<String>,
        /// Target language code
        #[arg(long)]
        to: Option<String>,
        /// Write the translated overlay to this file
        #[arg(long)]
        overlay: Option<PathBuf>,
        /// Overlay display area as WIDTHxHEIGHT (default: the image size)
        #[arg(long, value_parser = parse_size)]
        display: Option<Size>,
        /// Copy the translated text to the clipboard
        #[arg(long, action = ArgAction::SetTrue)]
        copy: bool,
    },
    /// Inspect or clear the capture history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// List entries, newest first
    List,
    /// Delete every entry and its files
    Clear,
}

fn parse_rect(s: &str) -> Result<PixelRect, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid rectangle {s:?}: {e}"))?;
    match parts.as_slice() {
        [x, y, w, h] => Ok(PixelRect::new(*x, *y, *w, *h)),
        _ => Err(format!("expected x,y,width,height, got {s:?}")),
    }
}

fn parse_shape(s: &str) -> Result<(ShapeKind, [f64; 4]), String> {
    let (kind, coords) = s
        .split_once(':')
        .ok_or_else(|| format!("expected KIND:x1,y1,x2,y2, got {s:?}"))?;
    let kind = match kind.trim().to_ascii_lowercase().as_str() {
        "rectangle" | "rect" => ShapeKind::Rectangle,
        "ellipse" => ShapeKind::Ellipse,
        "arrow" => ShapeKind::Arrow,
        "line" => ShapeKind::Line,
        "mosaic" => ShapeKind::Mosaic,
        other => return Err(format!("unknown shape kind {other:?}")),
    };
    let values = coords
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid coordinates {coords:?}: {e}"))?;
    match values.as_slice() {
        [x1, y1, x2, y2] => Ok((kind, [*x1, *y1, *x2, *y2])),
        _ => Err(format!("expected x1,y1,x2,y2, got {coords:?}")),
    }
}

fn parse_size(s: &str) -> Result<Size, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let w: f64 = w.trim().parse().map_err(|e| format!("invalid width: {e}"))?;
    let h: f64 = h.trim().parse().map_err(|e| format!("invalid height: {e}"))?;
    if w <= 0.0 || h <= 0.0 {
        return Err(format!("display size must be positive, got {s:?}"));
    }
    Ok(Size::new(w, h))
}

fn load_image(path: &Path) -> Result<PixelBuffer> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    PixelBuffer::decode(&bytes).with_context(|| format!("Failed to decode {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    sc_translator::logging::init(cli.debug);

    let config = match &cli.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let settings = config.get();

    match cli.command {
        Commands::Capture {
            region,
            window_id,
            primary,
            copy,
            out,
        } => capture(&settings, region, window_id, primary, copy, out).await,
        Commands::Annotate {
            input,
            output,
            shapes,
            copy,
        } => {
            let mut canvas = settings.annotation_canvas(load_image(&input)?);
            for (kind, [x1, y1, x2, y2]) in shapes {
                canvas.set_tool(kind);
                canvas.pointer_down(Point::new(x1, y1));
                canvas.pointer_move(Point::new(x2, y2));
                canvas.pointer_up(Point::new(x2, y2));
            }
            info!("Drew {} shape(s)", canvas.shapes().len());
            let result = canvas.flatten()?;
            let format = ExportFormat::from_path(&output, settings.jpeg_quality)?;
            export::save(&result, &output, format)?;
            if copy {
                clipboard::copy_image(&result)?;
            }
            Ok(())
        }
        Commands::Mosaic {
            input,
            output,
            rect,
            block,
        } => {
            let image = load_image(&input)?;
            let result = mosaic::apply(&image, rect, block);
            let format = ExportFormat::from_path(&output, settings.jpeg_quality)?;
            export::save(&result, &output, format)?;
            Ok(())
        }
        Commands::Ocr { image, lang, copy } => {
            let image = load_image(&image)?;
            let request = PipelineRequest {
                image,
                mode: PipelineMode::Recognize,
                ocr_language: lang.unwrap_or(settings.ocr_language.clone()),
                source_lang: settings.source_language.clone(),
                target_lang: settings.target_language.clone(),
            };
            let text = report(run_pipeline(&settings, request).await?)?;
            if copy {
                clipboard::copy_text(&text)?;
            }
            Ok(())
        }
        Commands::Translate {
            image,
            from,
            to,
            overlay,
            display,
            copy,
        } => {
            let image = load_image(&image)?;
            let request = PipelineRequest {
                image: image.clone(),
                mode: PipelineMode::Translate,
                ocr_language: settings.ocr_language.clone(),
                source_lang: from.unwrap_or(settings.source_language.clone()),
                target_lang: to.unwrap_or(settings.target_language.clone()),
            };
            let outcome = run_pipeline(&settings, request).await?;
            if let (Some(path), PipelineOutcome::Translated { translation, .. }) =
                (&overlay, &outcome)
            {
                let display = display
                    .unwrap_or_else(|| Size::new(image.width() as f64, image.height() as f64));
                let font = TextRasterizer::discover(settings.font_path.as_deref());
                let rendered = OverlayRenderer::new(font).render(&image, display, &translation.blocks)?;
                let format = ExportFormat::from_path(path, settings.jpeg_quality)?;
                export::save(&rendered, path, format)?;
            }
            let text = report(outcome)?;
            if copy {
                clipboard::copy_text(&text)?;
            }
            Ok(())
        }
        Commands::History { action } => {
            let mut store = HistoryStore::open(HistoryStore::default_dir(), settings.max_history_count);
            match action {
                HistoryAction::List => {
                    for item in store.items() {
                        println!(
                            "{}  {}  {}x{}{}  {}",
                            item.id,
                            item.capture_time.format("%Y-%m-%d %H:%M:%S"),
                            item.width,
                            item.height,
                            if item.pinned { "  [pinned]" } else { "" },
                            item.file_path.display()
                        );
                    }
                }
                HistoryAction::Clear => {
                    let count = store.len();
                    store.clear();
                    info!("Removed {} history entries", count);
                }
            }
            Ok(())
        }
    }
}

async fn capture(
    settings: &Settings,
    region: Option<PixelRect>,
    window_id: Option<u64>,
    primary: bool,
    copy: bool,
    out: Option<PathBuf>,
) -> Result<()> {
    if settings.delay_seconds > 0 {
        info!("Capturing in {} s", settings.delay_seconds);
        tokio::time::sleep(Duration::from_secs(settings.delay_seconds as u64)).await;
    }

    let grabber = ScreenGrabber::platform_default()?;
    let image = match (region, window_id) {
        (Some(r), _) => grabber.capture_region(r.x, r.y, r.width, r.height)?,
        (None, Some(id)) => match grabber.capture_window(WindowHandle(id)) {
            Some(image) => image,
            None => bail!("Window {id} could not be captured"),
        },
        (None, None) if primary => grabber.capture_primary_display()?,
        (None, None) => grabber.capture_full_virtual_desktop()?,
    };

    let saved = match (copy, out) {
        (true, out) => {
            let auto_saved = clipboard::confirm(&image, settings, &mut SystemClipboard)?;
            match out {
                Some(path) => Some(save_to(&image, path, settings)?),
                None => auto_saved,
            }
        }
        (false, Some(path)) => Some(save_to(&image, path, settings)?),
        (false, None) => {
            let format = settings.export_format();
            let path = export::default_save_path(&settings.save_directory, format);
            export::save(&image, &path, format)?;
            Some(path)
        }
    };
    if let Some(path) = &saved {
        println!("{}", path.display());
    }

    if settings.keep_history {
        let mut store = HistoryStore::open(HistoryStore::default_dir(), settings.max_history_count);
        if let Err(e) = store.record(&image, None, None) {
            warn!("Capture kept but not added to history: {}", e);
        }
    }

    follow_capture_mode(settings, image).await
}

fn save_to(image: &PixelBuffer, path: PathBuf, settings: &Settings) -> Result<PathBuf> {
    let format = ExportFormat::from_path(&path, settings.jpeg_quality)?;
    export::save(image, &path, format)?;
    Ok(path)
}

/// Treat the captured image as a settled selection and run what the capture mode asks for.
async fn follow_capture_mode(settings: &Settings, image: PixelBuffer) -> Result<()> {
    let screen = Size::new(image.width() as f64, image.height() as f64);
    let mut model = settings.selection_model(screen).with_source(Arc::new(image));
    let mode = model.select_all().into_iter().find_map(|effect| match effect {
        Effect::RunOcr { .. } => Some(PipelineMode::Recognize),
        Effect::RunTranslate { .. } => Some(PipelineMode::Translate),
        _ => None,
    });
    let (Some(mode), Some(selected)) = (mode, model.selected_image()) else {
        return Ok(());
    };
    let request = PipelineRequest {
        image: selected,
        mode,
        ocr_language: settings.ocr_language.clone(),
        source_lang: settings.source_language.clone(),
        target_lang: settings.target_language.clone(),
    };
    report(run_pipeline(settings, request).await?)?;
    Ok(())
}

async fn run_pipeline(settings: &Settings, request: PipelineRequest) -> Result<PipelineOutcome> {
    let recognizer = default_recognizer(&settings.ocr_models_dir);
    let translator = Arc::new(MyMemoryTranslator::new()?);
    let pipeline = Arc::new(Pipeline::new(recognizer, TextBlockTranslator::new(translator)));

    let session = Session::new();
    let Some(rx) = pipeline.spawn(&session, request) else {
        bail!("A pipeline is already running");
    };
    rx.await.context("Pipeline task ended without a result")
}

/// Print the outcome; returns the text a copy would put on the clipboard.
fn report(outcome: PipelineOutcome) -> Result<String> {
    match outcome {
        PipelineOutcome::Recognized(ocr) => {
            println!("{}", ocr.text);
            Ok(ocr.text)
        }
        PipelineOutcome::Translated { translation, .. } => {
            for block in &translation.blocks {
                println!("{}\t{}", block.original_text, block.translated_text);
            }
            Ok(translation.translated_text)
        }
        PipelineOutcome::NoText => {
            println!("No text recognized");
            Ok(String::new())
        }
        PipelineOutcome::RecognitionUnavailable(msg) => {
            bail!("Text recognition is not available: {msg}")
        }
        PipelineOutcome::Failed(msg) => bail!("Text recognition failed: {msg}"),
        PipelineOutcome::Discarded => bail!("Pipeline was cancelled"),
    }
}
