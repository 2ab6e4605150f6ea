use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "blurest", version)]
struct Cli {
    /// Log decoder and element diagnostics to stderr.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a placeholder string into a PNG.
    Decode(DecodeArgs),
    /// Print the CSS gradient approximation of a placeholder string.
    Css(CssArgs),
    /// Check placeholder strings. Exits non-zero if any is invalid.
    Validate(ValidateArgs),
    /// Print the element markup for a set of attributes.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct DecodeArgs {
    /// Placeholder string.
    hash: String,

    /// Output width in pixels.
    #[arg(long, default_value_t = 32)]
    width: u32,

    /// Output height in pixels.
    #[arg(long, default_value_t = 32)]
    height: u32,

    /// AC contrast multiplier.
    #[arg(long, default_value_t = 1.0)]
    punch: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct CssArgs {
    /// Placeholder string.
    hash: String,

    /// Raster width; one colour stop per column.
    #[arg(long, default_value_t = 32)]
    width: u32,

    /// Raster height; one gradient per row.
    #[arg(long, default_value_t = 32)]
    height: u32,

    /// Blur radius in CSS pixels.
    #[arg(long, default_value_t = 24.0)]
    blur: f64,

    /// Scale factor.
    #[arg(long, default_value_t = 1.2)]
    scale: f64,

    /// AC contrast multiplier.
    #[arg(long, default_value_t = 1.0)]
    punch: f64,

    /// Output format.
    #[arg(long, value_enum, default_value_t = CssFormat::Json)]
    format: CssFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CssFormat {
    /// The six properties as a JSON object.
    Json,
    /// A single inline `style` declaration list.
    Style,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Placeholder strings to check.
    #[arg(required = true)]
    hashes: Vec<String>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Element attribute as `name=value`, or `name` for a presence flag. Repeatable.
    #[arg(long = "attr", value_parser = parse_attr)]
    attrs: Vec<(String, String)>,

    /// Backend lookup reply (JSON). Combined with `--src` and `--alt` instead of `--attr`.
    #[arg(long, conflicts_with = "attrs", requires = "src")]
    lookup: Option<PathBuf>,

    /// Image reference used with `--lookup`.
    #[arg(long, conflicts_with = "attrs")]
    src: Option<String>,

    /// Alternative text used with `--lookup`.
    #[arg(long)]
    alt: Option<String>,

    /// Element configuration (JSON). Missing keys keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// How far to drive the element before printing.
    #[arg(long, value_enum, default_value_t = Stage::Attached)]
    until: Stage,

    /// Simulated fetch duration in milliseconds, for `--until loaded`.
    #[arg(long, default_value_t = 0)]
    load_ms: u64,

    /// Also print dispatched events as JSON lines on stderr.
    #[arg(long)]
    events: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Stage {
    /// Initial render.
    Attached,
    /// Scrolled into view; debug delays are run to completion.
    InView,
    /// Fetch succeeded.
    Loaded,
    /// Fetch failed.
    Errored,
}

fn parse_attr(s: &str) -> Result<(String, String), String> {
    let (name, value) = s.split_once('=').unwrap_or((s, ""));
    if name.is_empty() {
        return Err(format!("attribute '{s}' has an empty name"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }
    match cli.cmd {
        Command::Decode(args) => cmd_decode(args),
        Command::Css(args) => cmd_css(args),
        Command::Validate(args) => cmd_validate(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn cmd_decode(args: DecodeArgs) -> anyhow::Result<()> {
    let raster = blurest::decode(&args.hash, args.width, args.height, args.punch)
        .with_context(|| format!("decode '{}'", args.hash))?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        raster.as_bytes(),
        raster.width(),
        raster.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_css(args: CssArgs) -> anyhow::Result<()> {
    let opts = blurest::CssOptions {
        width: args.width,
        height: args.height,
        blur_radius: args.blur,
        scale_factor: args.scale,
        punch: args.punch,
    };
    let css = blurest::to_css(&args.hash, &opts)
        .with_context(|| format!("approximate '{}'", args.hash))?;

    match args.format {
        CssFormat::Json => {
            let json = serde_json::to_string_pretty(&css).context("serialize css")?;
            println!("{json}");
        }
        CssFormat::Style => println!("{}", css.to_declarations()),
    }
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let mut invalid = 0usize;
    for hash in &args.hashes {
        let validity = blurest::is_valid(hash);
        match validity.reason {
            None => println!("ok {hash}"),
            Some(reason) => {
                invalid += 1;
                println!("invalid {hash}: {reason}");
            }
        }
    }
    if invalid > 0 {
        anyhow::bail!("{invalid} of {} placeholder strings invalid", args.hashes.len());
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let f = File::open(path).with_context(|| format!("open {what} '{}'", path.display()))?;
    let r = BufReader::new(f);
    serde_json::from_reader(r).with_context(|| format!("parse {what} JSON"))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => {
            let config: blurest::ElementConfig = read_json(path, "element config")?;
            config.validate().context("validate element config")?;
            config
        }
        None => blurest::ElementConfig::default(),
    };

    let attrs = match (&args.lookup, &args.src) {
        (Some(path), Some(src)) => {
            let lookup: blurest::PlaceholderLookup = read_json(path, "lookup reply")?;
            blurest::ElementAttrs::from_lookup(src, args.alt.as_deref(), Some(&lookup))
        }
        (None, Some(src)) => blurest::ElementAttrs::from_lookup(src, args.alt.as_deref(), None),
        _ => blurest::ElementAttrs::from_pairs(args.attrs.iter().cloned()),
    };

    let mut host = blurest::RecordingHost::new();
    let mut element = blurest::ProgressiveImage::new(attrs, config)?;
    element.on_attach(&mut host);
    if args.until != Stage::Attached {
        drive(&mut element, &mut host, args.until, args.load_ms)?;
    }

    let html = element
        .to_html()
        .context("element has no markup while attached (bug)")?;
    println!("{html}");

    if args.events {
        for event in host.events() {
            let line = serde_json::to_string(event).context("serialize event")?;
            eprintln!("{line}");
        }
    }
    Ok(())
}

fn drive(
    element: &mut blurest::ProgressiveImage,
    host: &mut blurest::RecordingHost,
    until: Stage,
    load_ms: u64,
) -> anyhow::Result<()> {
    let Some(observer) = element.observer() else {
        // Fallback markup lazy-loads on its own.
        return Ok(());
    };
    element.on_visibility_change(host, observer, true);

    if let blurest::Phase::PendingLoad { .. } = element.phase() {
        let delay = element
            .attrs()
            .debug_delay(element.config().default_debug_delay());
        host.advance(delay);
        for timer in host.take_due_timers() {
            element.on_timer(host, timer);
        }
    }
    if until == Stage::InView {
        return Ok(());
    }

    let Some(ticket) = host.live_fetches().first().map(|(t, _)| *t) else {
        anyhow::bail!("element did not start a fetch; is `src` set?");
    };
    host.complete_fetch(ticket);
    host.advance(Duration::from_millis(load_ms));
    match until {
        Stage::Loaded => element.on_image_load(host, ticket),
        Stage::Errored => element.on_image_error(host, ticket, "simulated failure"),
        Stage::Attached | Stage::InView => {}
    }
    Ok(())
}
