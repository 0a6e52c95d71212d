use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use retouch::adjustments::Adjustment;
use retouch::config;
use retouch::imaging::{Effect, ImageCodec};
use retouch::imaging::rust_backend::{is_supported_image, supported_input_extensions};
use retouch::output::{self, EditEvent, FrameSummary, KnobValue, SessionSummary};
use retouch::recipe::{self, Recipe, RecipeError};
use retouch::session::ImageSession;
use retouch::types::Point;
use retouch::viewport::{RenderQuality, Viewport};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use walkdir::WalkDir;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "retouch")]
#[command(about = "Non-destructive raster image editing from the command line")]
#[command(long_about = "\
Non-destructive raster image editing from the command line

Tonal adjustments are re-applied to the working image on every render and
never change it. Effects are destructive: each one replaces the working
image and records an undo snapshot.

Adjustments (--set name=value):
  brightness contrast saturation exposure shadows highlights blacks whites
  hue temperature white_balance warmth
  width height resize_method=resize|crop crop_side=center|top|bottom|left|right

Effects (--effect kind[:key=value,...]):
  glow invert emboss grayscale sepia sharpen details smoothing
  noise_reduction pixelate posterize vignette blur oil_painting noise
  color_match (needs --reference or reference=path)

Run 'retouch gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Directory holding config.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Log debug detail (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Edits shared by `edit`, `batch` and `info`.
#[derive(Args, Clone)]
struct EditArgs {
    /// Adjustment as name=value (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    adjustments: Vec<Adjustment>,

    /// Effect as kind[:key=value,...] (repeatable, applied in order)
    #[arg(long = "effect", value_name = "SPEC", value_parser = recipe::parse_effect_spec)]
    effects: Vec<Effect>,

    /// TOML recipe applied before --effect and --set
    #[arg(long)]
    recipe: Option<PathBuf>,

    /// Reference image for color_match
    #[arg(long)]
    reference: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Edit one image and save the result
    Edit {
        input: PathBuf,
        /// Output file (format from extension)
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        edits: EditArgs,
    },
    /// Edit every supported image under a directory in parallel
    Batch {
        input: PathBuf,
        output: PathBuf,
        /// Output extension (keeps each source's extension when omitted)
        #[arg(long)]
        format: Option<String>,
        #[command(flatten)]
        edits: EditArgs,
    },
    /// Render the viewport for a scripted zoom/pan and save the drawn region
    Preview {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Canvas size as WIDTHxHEIGHT
        #[arg(long, default_value = "800x600", value_parser = parse_pair::<f64, 'x'>)]
        canvas: (f64, f64),
        /// Wheel notches: positive zooms in, negative zooms out
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        wheel: i32,
        /// Wheel cursor as X,Y (canvas centre when omitted)
        #[arg(long, value_parser = parse_pair::<f64, ','>)]
        cursor: Option<(f64, f64)>,
        /// Drag distance as DX,DY
        #[arg(long, value_parser = parse_pair::<f64, ','>, allow_hyphen_values = true)]
        pan: Option<(f64, f64)>,
        /// Print the frame summary as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        edits: EditArgs,
    },
    /// Show dimensions, adjustments and history for an image
    Info {
        input: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        edits: EditArgs,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Edit {
            input,
            output,
            edits,
        } => {
            let config = config::load_config(&cli.config_dir)?;
            let plan = EditPlan::new(edits)?;
            let event = edit_file(1, &input, &output, &plan, config.history.capacity)?;
            output::print_edit_event(&event);
        }
        Command::Batch {
            input,
            output,
            format,
            edits,
        } => {
            let supported = supported_input_extensions();
            if let Some(ext) = format.as_deref()
                && !supported.contains(&ext.to_ascii_lowercase().as_str())
            {
                return Err(format!(
                    "unsupported output format '{ext}' (expected one of: {})",
                    supported.join(", ")
                )
                .into());
            }
            let config = config::load_config(&cli.config_dir)?;
            init_thread_pool(&config.processing);
            let plan = EditPlan::new(edits)?;
            let sources = collect_images(&input);
            if sources.is_empty() {
                log::warn!(
                    "no {} files under {}",
                    supported.join("/"),
                    input.display()
                );
            }
            log::info!("batch: {} image(s) under {}", sources.len(), input.display());

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                let mut failed = 0usize;
                let mut edited = 0usize;
                for event in rx {
                    match &event {
                        EditEvent::Edited { .. } => edited += 1,
                        EditEvent::Failed { .. } => failed += 1,
                    }
                    output::print_edit_event(&event);
                }
                (edited, failed)
            });

            sources
                .par_iter()
                .enumerate()
                .for_each_with(tx, |tx, (i, source)| {
                    let target = batch_target(&input, &output, source, format.as_deref());
                    let event = edit_file(i + 1, source, &target, &plan, config.history.capacity)
                        .unwrap_or_else(|e| EditEvent::Failed {
                            index: i + 1,
                            source: source.clone(),
                            error: e.to_string(),
                        });
                    // Receiver outlives every sender
                    let _ = tx.send(event);
                });

            let (edited, failed) = printer.join().map_err(|_| "output thread panicked")?;
            println!();
            println!("{}", output::format_batch_summary(edited, failed));
            if failed > 0 {
                return Err(format!("{failed} image(s) failed").into());
            }
        }
        Command::Preview {
            input,
            output,
            canvas,
            wheel,
            cursor,
            pan,
            json,
            edits,
        } => {
            let config = config::load_config(&cli.config_dir)?;
            let plan = EditPlan::new(edits)?;
            let mut session = open_session(&input, &plan, config.history.capacity)?;
            let mut viewport = Viewport::new(config.viewport_settings());
            let (w, h) = session
                .working()
                .map(|b| b.dimensions())
                .ok_or("no image loaded")?;
            viewport.on_document_loaded(w, h);
            viewport.on_canvas_resize(canvas.0, canvas.1);

            let cursor = cursor
                .map(|(x, y)| Point::new(x, y))
                .unwrap_or(Point::new(canvas.0 / 2.0, canvas.1 / 2.0));
            drive_viewport(&mut viewport, &mut session, wheel, cursor, pan)?;

            match viewport.render(&mut session, RenderQuality::Full)? {
                Some(frame) => {
                    session
                        .codec()
                        .encode(&frame.buffer, &output)
                        .map_err(retouch::session::SessionError::Encode)?;
                    let summary = FrameSummary::new(&frame, viewport.state());
                    if json {
                        println!("{}", serde_json::to_string_pretty(&summary)?);
                    } else {
                        output::print_frame(&summary);
                    }
                }
                None => println!("{}", output::format_empty_frame(viewport.state())),
            }
        }
        Command::Info { input, json, edits } => {
            let config = config::load_config(&cli.config_dir)?;
            let plan = EditPlan::new(edits)?;
            let mut session = open_session(&input, &plan, config.history.capacity)?;
            session.processed(true)?;
            let summary = SessionSummary::from_session(&input, &session).ok_or("no image loaded")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                output::print_session_info(&summary);
            }
        }
    }

    Ok(())
}

/// Install env_logger; `--verbose` raises the default filter to debug.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Everything to do to each image, parsed once up front.
struct EditPlan {
    recipe: Recipe,
    effects: Vec<Effect>,
    adjustments: Vec<Adjustment>,
    reference: Option<PathBuf>,
}

impl EditPlan {
    fn new(args: EditArgs) -> Result<Self, RecipeError> {
        let recipe = match &args.recipe {
            Some(path) => recipe::load_recipe(path)?,
            None => Recipe::default(),
        };
        // Fail before touching any image
        recipe.adjustments()?;
        Ok(Self {
            recipe,
            effects: args.effects,
            adjustments: args.adjustments,
            reference: args.reference,
        })
    }

    fn apply<C: ImageCodec>(&self, session: &mut ImageSession<C>) -> Result<(), RecipeError> {
        if let Some(reference) = &self.reference {
            session.load_reference(reference)?;
        }
        self.recipe.apply_to(session)?;
        for effect in &self.effects {
            session.apply_effect(effect)?;
        }
        for adjustment in &self.adjustments {
            session.set_adjustment(*adjustment)?;
        }
        Ok(())
    }

    fn effect_names(&self) -> Vec<String> {
        self.recipe
            .effects
            .iter()
            .chain(&self.effects)
            .map(|e| e.name().to_string())
            .collect()
    }
}

fn open_session(
    input: &Path,
    plan: &EditPlan,
    capacity: usize,
) -> Result<ImageSession, RecipeError> {
    let mut session = ImageSession::new().with_history_capacity(capacity);
    session.load_image(input)?;
    plan.apply(&mut session)?;
    Ok(session)
}

fn edit_file(
    index: usize,
    input: &Path,
    output: &Path,
    plan: &EditPlan,
    capacity: usize,
) -> Result<EditEvent, RecipeError> {
    let mut session = open_session(input, plan, capacity)?;
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).map_err(|source| RecipeError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    session.save_image(output)?;
    let dimensions = session.processed(false)?.dimensions();
    let adjustments = session
        .adjustments()
        .map(|set| {
            set.active_knobs()
                .map(|(knob, value)| KnobValue {
                    name: knob.name().to_string(),
                    value,
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(EditEvent::Edited {
        index,
        source: input.to_path_buf(),
        output: output.to_path_buf(),
        effects: plan.effect_names(),
        adjustments,
        dimensions,
    })
}

/// Supported images under `root`, sorted for stable numbering.
fn collect_images(root: &Path) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_supported_image(e.path()))
        .map(|e| e.into_path())
        .collect();
    images.sort();
    images
}

/// Mirror `source`'s position under `input` into `output`.
fn batch_target(input: &Path, output: &Path, source: &Path, format: Option<&str>) -> PathBuf {
    let relative = source.strip_prefix(input).unwrap_or(source);
    let target = output.join(relative);
    match format {
        Some(ext) => target.with_extension(ext),
        None => target,
    }
}

/// Replay wheel and drag input against synthetic time, settling every
/// animation before the final render.
fn drive_viewport(
    viewport: &mut Viewport,
    session: &mut ImageSession,
    wheel: i32,
    cursor: Point,
    pan: Option<(f64, f64)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut now = Instant::now();
    let notch = Duration::from_millis(5) + viewport.settings().wheel_debounce;
    for _ in 0..wheel.unsigned_abs() {
        viewport.on_wheel(f64::from(wheel.signum()), cursor, now);
        while viewport.is_zooming() {
            now += viewport.tick_interval();
            if viewport.tick(now) == Some(RenderQuality::Fast) {
                viewport.render(session, RenderQuality::Fast)?;
            }
        }
        now += notch;
    }
    if let Some((dx, dy)) = pan {
        viewport.begin_drag();
        // Split into steps so the drag limiter is exercised as in a real drag
        let steps = 10;
        for _ in 0..steps {
            now += Duration::from_millis(16);
            if viewport
                .on_drag_delta(dx / f64::from(steps), dy / f64::from(steps), now)
                .is_some()
            {
                viewport.render(session, RenderQuality::Fast)?;
            }
        }
        viewport.end_drag();
    }
    Ok(())
}

/// Parse `A<sep>B` into a pair.
fn parse_pair<T: std::str::FromStr, const SEP: char>(s: &str) -> Result<(T, T), String> {
    let (a, b) = s
        .split_once(SEP)
        .ok_or_else(|| format!("expected two values separated by '{SEP}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<T>()
            .map_err(|_| format!("invalid number '{v}'"))
    };
    Ok((parse(a)?, parse(b)?))
}
