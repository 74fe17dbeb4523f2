use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use startrail::{
    Container, Frame, PipelineParams, PipelineRun, PixelLayout, ResolutionPreset, RunState,
    Telemetry, TrailMode,
};

#[derive(Parser, Debug)]
#[command(name = "startrail", version, about = "Turn a night-sky clip into a star-trail video")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a video into a star-trail video (requires `ffmpeg`/`ffprobe` on PATH).
    Render(RenderArgs),
    /// Print source properties and the trail mode/output size a render would use.
    Probe(ProbeArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input video.
    #[arg(long = "in", required_unless_present = "params")]
    in_path: Option<PathBuf>,

    /// Output video. Defaults to `<input>_StarTrail_<height>p.<ext>` next to the input.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Load every setting from a JSON parameter file instead of flags.
    #[arg(long, conflicts_with_all = ["in_path", "trail", "fade", "height", "preset", "format"])]
    params: Option<PathBuf>,

    /// Trail length in frames. At or above the clip length this is a full long exposure.
    #[arg(long, default_value_t = startrail::DEFAULT_TRAIL_LENGTH)]
    trail: u32,

    /// Fade amount in [0, 0.99]; higher fades older trail segments more.
    #[arg(long, default_value_t = startrail::DEFAULT_FADE)]
    fade: f32,

    /// Output height in pixels (0 keeps the source resolution).
    #[arg(long, conflicts_with = "preset")]
    height: Option<u32>,

    /// Named output height.
    #[arg(long, value_enum)]
    preset: Option<PresetChoice>,

    /// Output container. Defaults to the `--out` extension, else mp4.
    #[arg(long, value_enum)]
    format: Option<FormatChoice>,

    /// Also save the last composited frame as a PNG.
    #[arg(long)]
    still: Option<PathBuf>,

    /// Save the most recent preview frame as a PNG when the run ends.
    #[arg(long)]
    preview_png: Option<PathBuf>,

    /// Hide the progress bar.
    #[arg(long)]
    quiet: bool,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Trail length used to pick the mode.
    #[arg(long, default_value_t = startrail::DEFAULT_TRAIL_LENGTH)]
    trail: u32,

    /// Output height used to compute the output size.
    #[arg(long, default_value_t = 0)]
    height: u32,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PresetChoice {
    Original,
    #[value(name = "2160")]
    Uhd,
    #[value(name = "1080")]
    Fhd,
    #[value(name = "720")]
    Hd,
}

impl From<PresetChoice> for ResolutionPreset {
    fn from(p: PresetChoice) -> Self {
        match p {
            PresetChoice::Original => Self::Original,
            PresetChoice::Uhd => Self::Uhd,
            PresetChoice::Fhd => Self::Fhd,
            PresetChoice::Hd => Self::Hd,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Mp4,
    Mov,
}

impl From<FormatChoice> for Container {
    fn from(f: FormatChoice) -> Self {
        match f {
            FormatChoice::Mp4 => Self::Mp4,
            FormatChoice::Mov => Self::Mov,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Probe(args) => cmd_probe(args),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn params_from_args(args: &RenderArgs) -> anyhow::Result<PipelineParams> {
    if let Some(path) = &args.params {
        let mut params = PipelineParams::from_json_path(path)?;
        if let Some(out) = &args.out {
            params.output = out.clone();
        }
        return Ok(params);
    }

    let input = args
        .in_path
        .clone()
        .context("--in is required without --params")?;
    let target_height = match (args.height, args.preset) {
        (Some(h), _) => h,
        (None, Some(p)) => ResolutionPreset::from(p).height(),
        (None, None) => 0,
    };
    let container = args
        .format
        .map(Container::from)
        .or_else(|| args.out.as_deref().and_then(Container::from_path))
        .unwrap_or_default();
    let output = args.out.clone().unwrap_or_else(|| {
        startrail::default_output_path(&input, target_height, container)
    });

    Ok(PipelineParams {
        input,
        output,
        trail_length: args.trail,
        fade: args.fade,
        target_height,
        container,
    })
}

fn progress_bar(quiet: bool) -> anyhow::Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("invalid progress bar template")?
            .progress_chars("#>-"),
    );
    Ok(bar)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let params = params_from_args(&args)?;
    let mut run = PipelineRun::new(params)?;

    let cancel = run.cancel_token();
    ctrlc::set_handler(move || {
        cancel.cancel();
        eprintln!("\ninterrupt received, finishing queued frames...");
    })
    .context("failed to install Ctrl-C handler")?;

    let bar = progress_bar(args.quiet)?;
    let mut last_preview: Option<Frame> = None;
    let report = {
        let mut telemetry = Telemetry::none().on_progress(|p| {
            if p.total_frames > 0 && bar.length() != Some(p.total_frames) {
                bar.set_length(p.total_frames);
            }
            bar.set_position(p.frames_done);
            bar.set_message(format!("{:.1} fps", p.fps));
        });
        if args.preview_png.is_some() {
            telemetry = telemetry.on_preview(|_, preview| last_preview = Some(preview));
        }
        run.execute_to_file(&mut telemetry)
    };
    match &report {
        Ok(r) if r.state == RunState::Cancelled => bar.abandon_with_message("cancelled"),
        Ok(_) => bar.finish_with_message("done"),
        Err(_) => bar.abandon_with_message("failed"),
    }
    let report = report?;

    if let Some(path) = &args.still {
        let frame = report
            .final_frame
            .as_ref()
            .context("no frames were composited, nothing to save")?;
        save_png(path, frame)?;
        eprintln!("wrote {}", path.display());
    }
    if let (Some(path), Some(frame)) = (&args.preview_png, &last_preview) {
        save_png(path, frame)?;
        eprintln!("wrote {}", path.display());
    }

    let out = &run.params().output;
    match report.state {
        RunState::Cancelled => eprintln!(
            "cancelled after {} frames; partial output kept at {}",
            report.frames_committed,
            out.display()
        ),
        _ => eprintln!(
            "wrote {} ({} frames, {}, {})",
            out.display(),
            report.frames_committed,
            report.output_dimensions,
            report.mode
        ),
    }
    Ok(())
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct ProbeReport {
        source: startrail::SourceInfo,
        mode: String,
        output: startrail::Dimensions,
    }

    let info = startrail::probe_source(&args.in_path)?;
    let mode = TrailMode::select(args.trail, startrail::DEFAULT_FADE, info.frame_count);
    let report = ProbeReport {
        source: info,
        mode: mode.label().to_owned(),
        output: startrail::target_dimensions(info.dimensions, args.height),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serialize probe report")?
    );
    Ok(())
}

fn save_png(path: &Path, frame: &Frame) -> anyhow::Result<()> {
    startrail::ensure_parent_dir(path)?;
    let rgb = frame.clone().into_layout(PixelLayout::Rgb8);
    image::save_buffer_with_format(
        path,
        &rgb.to_packed_bytes(),
        rgb.width(),
        rgb.height(),
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}
