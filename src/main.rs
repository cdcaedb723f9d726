use anyhow::{Context, Result};
use captionsmith::app::{App, CaptionOutcome, CaptionStyle, RenderOptions};
use captionsmith::history::HistoryStore;
use captionsmith::models::{parse_hex_color, Config, HistoryEntry, OverlayPosition, Provider, TurnRole};
use captionsmith::render::{available_fonts, resolve_font, BackgroundStyle};
use clap::{Args, Parser, Subcommand, ValueEnum};
use image::Rgb;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Pixel size of a scalable overlay font at `--scale 1.0`.
const OVERLAY_BASE_PX: f32 = 20.0;
const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Parser)]
#[command(name = "captionsmith")]
#[command(about = "Caption images with hosted vision models and render the caption onto them")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a caption with a provider and save the captioned image.
    Caption {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
        #[arg(long, value_enum, default_value_t = Provider::Gemini)]
        provider: Provider,
        #[command(flatten)]
        style: StyleArgs,
        /// Output file (defaults to captioned_<name>.png next to the image).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render a caption you supply, without calling a provider.
    Render {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
        #[arg(long)]
        text: String,
        #[command(flatten)]
        style: StyleArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show or clear the caption history.
    History(HistoryArgs),
    /// List the fonts available for captions.
    Fonts,
    /// Show which providers have API keys configured.
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StyleKind {
    Overlay,
    Background,
}

#[derive(Debug, Args)]
struct StyleArgs {
    #[arg(long, value_enum, default_value_t = StyleKind::Overlay)]
    style: StyleKind,
    #[arg(long, value_enum, default_value_t = OverlayPosition::Bottom)]
    position: OverlayPosition,
    /// Overlay text scale.
    #[arg(long, default_value_t = 1.0)]
    scale: f32,
    /// Stroke thickness of the built-in overlay font.
    #[arg(long, default_value_t = 2)]
    thickness: u32,
    /// TrueType/OpenType font file.
    #[arg(long)]
    font: Option<PathBuf>,
    /// Background mode font size in pixels (defaults to CAPTION_FONT_SIZE).
    #[arg(long)]
    font_size: Option<f32>,
    #[arg(long, default_value = "#000000", value_parser = parse_color_arg)]
    bg_color: Rgb<u8>,
    #[arg(long, default_value = "#FFFFFF", value_parser = parse_color_arg)]
    text_color: Rgb<u8>,
    #[arg(long, default_value_t = 50)]
    margin: u32,
}

#[derive(Debug, Args)]
struct HistoryArgs {
    /// Show every entry instead of the most recent ones.
    #[arg(long, conflicts_with = "recent")]
    all: bool,
    #[arg(long, value_name = "N")]
    recent: Option<usize>,
    #[arg(long, value_name = "MODEL")]
    model: Option<String>,
    #[arg(long, value_name = "NAME")]
    image: Option<String>,
    /// Print entries as a request/answer transcript.
    #[arg(long)]
    transcript: bool,
    /// Delete the whole history.
    #[arg(long, exclusive = true)]
    clear: bool,
}

fn parse_color_arg(input: &str) -> std::result::Result<Rgb<u8>, String> {
    parse_hex_color(input).map_err(|e| e.to_string())
}

fn render_options(style: &StyleArgs, config: &Config) -> RenderOptions {
    let font_path = style.font.clone().or_else(|| config.font_path_or_default());

    match style.style {
        StyleKind::Overlay => RenderOptions {
            style: CaptionStyle::Overlay {
                position: style.position,
            },
            font: resolve_font(font_path.as_deref(), style.scale * OVERLAY_BASE_PX)
                .with_thickness(style.thickness),
        },
        StyleKind::Background => RenderOptions {
            style: CaptionStyle::Background(BackgroundStyle {
                background: style.bg_color,
                text: style.text_color,
                margin: style.margin,
            }),
            font: resolve_font(
                font_path.as_deref(),
                style.font_size.unwrap_or(config.font_size),
            ),
        },
    }
}

/// Apply the history filters; the result is newest first.
fn select_history(entries: Vec<HistoryEntry>, args: &HistoryArgs) -> Vec<HistoryEntry> {
    let mut selected: Vec<HistoryEntry> = entries
        .into_iter()
        .filter(|e| args.model.as_deref().map_or(true, |m| e.model == m))
        .filter(|e| args.image.as_deref().map_or(true, |i| e.image_name == i))
        .collect();
    selected.reverse();

    if !args.all {
        selected.truncate(args.recent.unwrap_or(DEFAULT_HISTORY_LIMIT));
    }
    selected
}

fn print_history(history: &dyn HistoryStore, args: &HistoryArgs) -> Result<()> {
    if args.clear {
        history.clear()?;
        println!("History cleared.");
        return Ok(());
    }

    let entries = select_history(history.list()?, args);
    if entries.is_empty() {
        println!("No captions recorded yet.");
        return Ok(());
    }

    for entry in &entries {
        if args.transcript {
            for turn in entry.to_turns() {
                let speaker = match turn.role {
                    TurnRole::Human => "You",
                    TurnRole::Assistant => "Assistant",
                };
                println!("{}: {}", speaker, turn.content);
            }
        } else {
            println!("{} - {} ({})", entry.timestamp, entry.image_name, entry.model);
            println!("  {}", entry.caption);
        }
        println!();
    }
    Ok(())
}

fn print_outcome(outcome: &CaptionOutcome) {
    println!("{}", outcome.caption);
    println!(
        "Saved {} ({}x{})",
        outcome.output_path.display(),
        outcome.width,
        outcome.height
    );
}

async fn run(command: Command, config: Config) -> Result<()> {
    match command {
        Command::Caption {
            image,
            provider,
            style,
            output,
        } => {
            let app = App::new(&config);
            let options = render_options(&style, &config);
            let outcome = app
                .caption_image(&image, provider, &options, output.as_deref())
                .await
                .with_context(|| format!("Failed to caption {}", image.display()))?;
            print_outcome(&outcome);
        }
        Command::Render {
            image,
            text,
            style,
            output,
        } => {
            let app = App::new(&config);
            let options = render_options(&style, &config);
            let outcome = app
                .render_caption(&image, &text, &options, output.as_deref())
                .await
                .with_context(|| format!("Failed to render {}", image.display()))?;
            print_outcome(&outcome);
        }
        Command::History(args) => {
            let app = App::new(&config);
            print_history(app.history(), &args)?;
        }
        Command::Fonts => {
            for choice in available_fonts(&config.fonts_dir) {
                match &choice.path {
                    Some(path) => println!("{}  ({})", choice.name, path.display()),
                    None => println!("{}", choice.name),
                }
            }
        }
        Command::Status => {
            for (provider, configured) in config.provider_status() {
                let state = if configured { "configured" } else { "missing API key" };
                println!("{:<7} {} [{}]", provider.to_string(), state, provider.api_key_var());
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "captionsmith=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Starting captionsmith");

    if let Err(e) = run(args.command, config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
