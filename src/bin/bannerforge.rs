//! BannerForge CLI
//!
//! Commands: ascii, svg, png, combo, batch, info, palette, example
//! Returns 1 on any error, 2 when a batch finished with failed entries

use anyhow::Context as _;
use chrono::Utc;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bannerforge::ascii::AnsiColor;
use bannerforge::batch::{self, DEFAULT_OUT_DIR};
use bannerforge::palettes::{self, PaletteRecord};
use bannerforge::pipeline::{default_combo_prefix, default_output_path, write_artifact};
use bannerforge::{
    BannerPipeline, BannerSpec, Effect, FontStyle, Format, Palette, PaletteStore, TemplateStore,
};

const CUSTOM_PALETTE_FILE: &str = "custom_palettes.json";
const BATCH_FAILURE: u8 = 2;

#[derive(Parser)]
#[command(name = "bannerforge", version)]
#[command(about = "BannerForge - ASCII, SVG and PNG banner generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Extra palettes (JSON or YAML map of name -> colors)
    #[arg(long, global = true)]
    palette_file: Option<PathBuf>,

    /// Directory of additional *.svg templates
    #[arg(long, global = true)]
    templates_dir: Option<PathBuf>,

    /// Log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

/// Options shared by the SVG, PNG and combo commands
#[derive(Args)]
struct LookArgs {
    /// Subtitle text
    #[arg(short, long)]
    subtitle: Option<String>,

    /// Color palette
    #[arg(short, long)]
    palette: Option<String>,

    /// Predefined style/palette/effects bundle
    #[arg(long)]
    preset: Option<String>,

    /// Canvas width
    #[arg(short = 'W', long, default_value_t = bannerforge::render::DEFAULT_WIDTH)]
    width: u32,

    /// Canvas height
    #[arg(short = 'H', long, default_value_t = bannerforge::render::DEFAULT_HEIGHT)]
    height: u32,

    /// Suggest a subtitle when none is given
    #[arg(long)]
    ai: bool,
}

impl LookArgs {
    fn spec(self, text: String) -> BannerSpec {
        BannerSpec {
            subtitle: self.subtitle,
            palette: self.palette,
            preset: self.preset,
            width: self.width,
            height: self.height,
            suggest_subtitle: self.ai,
            ..BannerSpec::new(text)
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an ASCII banner
    Ascii {
        text: String,

        /// Font style
        #[arg(short, long, default_value = "standard")]
        font: String,

        /// Plain subtitle line
        #[arg(short, long)]
        subtitle: Option<String>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Terminal color, stdout only
        #[arg(short, long, value_enum)]
        color: Option<AnsiColor>,
    },

    /// Generate an SVG banner
    Svg {
        text: String,

        #[command(flatten)]
        look: LookArgs,

        /// Template style
        #[arg(long)]
        style: Option<String>,

        /// Use the animated template
        #[arg(long)]
        animated: bool,

        /// Output SVG path
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Generate a PNG banner
    Png {
        text: String,

        #[command(flatten)]
        look: LookArgs,

        /// Visual effects (repeat or comma-separate)
        #[arg(short, long, value_enum, value_delimiter = ',')]
        effects: Vec<Effect>,

        /// TrueType/OpenType font for the PNG text
        #[arg(long)]
        font: Option<PathBuf>,

        /// Output PNG path
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Generate ASCII + SVG + PNG sharing one path prefix
    Combo {
        text: String,

        #[command(flatten)]
        look: LookArgs,

        /// ASCII font style
        #[arg(short, long)]
        font: Option<String>,

        /// SVG template style
        #[arg(long)]
        style: Option<String>,

        /// PNG effects
        #[arg(short, long, value_enum, value_delimiter = ',')]
        effects: Vec<Effect>,

        /// TrueType/OpenType font for the PNG text
        #[arg(long)]
        font_file: Option<PathBuf>,

        /// Output path prefix; extensions are appended
        #[arg(long)]
        prefix: Option<PathBuf>,
    },

    /// Generate every banner listed in a JSON/YAML file
    Batch {
        spec: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = DEFAULT_OUT_DIR)]
        outdir: PathBuf,

        /// Write a JSON report with artifact digests
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// List palettes, styles, fonts, presets and effects
    Info,

    /// Create a custom palette
    Palette {
        #[arg(short, long)]
        name: String,
        #[arg(long)]
        bg: String,
        #[arg(long)]
        accent: String,
        #[arg(long)]
        text: String,
        #[arg(long)]
        muted: String,

        /// Save to the palette file (default custom_palettes.json)
        #[arg(long)]
        save: bool,
    },

    /// Write an example batch file
    Example {
        #[arg(short, long, value_enum, default_value_t = ExampleFormat::Json)]
        format: ExampleFormat,

        /// Output filename without extension
        #[arg(short, long, default_value = "banner_config")]
        out: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExampleFormat {
    Json,
    Yaml,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // A subscriber may already be installed; keep it.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::new(level))
        .try_init();
}

fn load_pipeline(cli: &Cli) -> anyhow::Result<BannerPipeline> {
    let mut palettes = PaletteStore::builtin();
    if let Some(path) = &cli.palette_file {
        palettes
            .load_file(path)
            .with_context(|| format!("load palettes from '{}'", path.display()))?;
    }

    let mut templates = TemplateStore::builtin();
    if let Some(dir) = &cli.templates_dir {
        templates
            .load_dir(dir)
            .with_context(|| format!("load templates from '{}'", dir.display()))?;
    }

    Ok(BannerPipeline::new(palettes, templates))
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    // `palette --save` may be creating the palette file, so it is not loaded.
    let pipeline = match cli.command {
        Commands::Palette { .. } => BannerPipeline::default(),
        _ => load_pipeline(&cli)?,
    };

    match cli.command {
        Commands::Ascii { text, font, subtitle, out, color } => {
            let spec = BannerSpec { font: Some(font), subtitle, ..BannerSpec::new(text) };
            let artifact = pipeline.render(&spec, Format::Ascii)?;
            match out {
                Some(path) => {
                    write_artifact(&path, &artifact)?;
                    println!("✓ Wrote ASCII banner to {}", path.display());
                }
                None => {
                    let banner = String::from_utf8_lossy(&artifact.bytes);
                    match color {
                        Some(color) => print!("{}", color.paint(&banner)),
                        None => print!("{}", banner),
                    }
                }
            }
        }

        Commands::Svg { text, look, style, animated, out } => {
            let spec = BannerSpec { style, animated, ..with_suggestion(&pipeline, look.spec(text)) };
            generate(&pipeline, &spec, Format::Svg, out)?;
        }

        Commands::Png { text, look, effects, font, out } => {
            let spec = BannerSpec { effects, font_file: font, ..with_suggestion(&pipeline, look.spec(text)) };
            generate(&pipeline, &spec, Format::Png, out)?;
        }

        Commands::Combo { text, look, font, style, effects, font_file, prefix } => {
            let spec = BannerSpec {
                font,
                style,
                effects,
                font_file,
                ..with_suggestion(&pipeline, look.spec(text))
            };
            let prefix = prefix.unwrap_or_else(|| default_combo_prefix(&spec.text, Utc::now()));
            for path in pipeline.combo(&spec, &prefix)? {
                println!("✓ {}", path.display());
            }
        }

        Commands::Batch { spec, outdir, report } => {
            let result = batch::run(&pipeline, &spec, &outdir)
                .with_context(|| format!("batch '{}'", spec.display()))?;

            for artifact in &result.artifacts {
                println!("  ✓ {}", artifact.path.display());
            }
            for failure in &result.failures {
                println!("  ✗ [{}] {}: {}", failure.entry, failure.text, failure.error);
            }
            println!(
                "\nBatch complete: {} succeeded, {} failed, {} files in {}",
                result.succeeded,
                result.failed,
                result.artifacts.len(),
                outdir.display()
            );

            if let Some(path) = report {
                result
                    .write_json(&path)
                    .with_context(|| format!("write report '{}'", path.display()))?;
                println!("Report: {}", path.display());
            }

            if result.has_failures() {
                return Ok(ExitCode::from(BATCH_FAILURE));
            }
        }

        Commands::Info => print_info(&pipeline),

        Commands::Palette { name, bg, accent, text, muted, save } => {
            let record = PaletteRecord { bg, accent, text, muted, gradient_start: None, gradient_end: None };
            let palette = Palette::from_record(&name, &record)?;
            print_palette(&palette);

            if save {
                let path = cli.palette_file.as_deref().unwrap_or(Path::new(CUSTOM_PALETTE_FILE));
                palettes::save_to_file(path, &palette)?;
                println!("\n✓ Saved to {}", path.display());
                println!("  Load with: --palette-file {}", path.display());
            }
        }

        Commands::Example { format, out } => {
            let ext = match format {
                ExampleFormat::Json => "json",
                ExampleFormat::Yaml => "yaml",
            };
            let path = PathBuf::from(format!("{}.{}", out, ext));
            batch::write_example(&path)?;
            println!("✓ Created example config: {}", path.display());
            println!("  Run with: bannerforge batch {}", path.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Resolve `--ai` up front so the suggestion can be shown to the user.
fn with_suggestion(pipeline: &BannerPipeline, spec: BannerSpec) -> BannerSpec {
    if spec.suggest_subtitle && spec.subtitle.is_none() {
        let tagline = pipeline.suggest_tagline(&spec.text);
        println!("Suggested subtitle: {}", tagline);
        return BannerSpec { subtitle: Some(tagline), ..spec };
    }
    spec
}

fn generate(
    pipeline: &BannerPipeline,
    spec: &BannerSpec,
    format: Format,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let path = out.unwrap_or_else(|| default_output_path(&spec.text, format, Utc::now()));
    pipeline
        .generate(spec, format, &path)
        .with_context(|| format!("generate {} banner '{}'", format, path.display()))?;
    println!("✓ Wrote {} to {}", format.name().to_uppercase(), path.display());
    Ok(())
}

fn print_palette(palette: &Palette) {
    println!("\n✓ Palette '{}':", palette.name);
    for (key, color) in [
        ("bg", &palette.background),
        ("accent", &palette.accent),
        ("text", &palette.text),
        ("muted", &palette.muted),
        ("gradient_start", &palette.gradient_start),
        ("gradient_end", &palette.gradient_end),
    ] {
        println!("  {:15} : {}", key, color);
    }
}

fn print_info(pipeline: &BannerPipeline) {
    println!("Available Palettes:");
    for palette in pipeline.palettes().list() {
        println!("  {:12} - bg:{} accent:{}", palette.name, palette.background, palette.accent);
    }

    println!("\nSVG Styles:");
    for style in pipeline.templates().svg_styles() {
        println!("  - {}", style);
    }

    println!("\nASCII Fonts:");
    for font in FontStyle::ALL {
        println!("  - {}", font);
    }

    println!("\nPresets:");
    for (name, preset) in pipeline.templates().presets() {
        println!("  {:12} - {} palette, {} style", name, preset.palette, preset.style);
    }

    println!("\nVisual Effects (PNG):");
    for effect in Effect::ALL {
        println!("  - {}", effect.name());
    }
}
