//! # Warren Command Line Entry Point
//!
//! Generates a single level and prints it as ASCII or JSON.

use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use std::fs;
use std::path::PathBuf;
use warren::generation::utils;
use warren::{
    AngbandLevelGenerator, GeneratedLevel, GenerationConfig, Generator, NoiseKind, TownGenerator,
    TunnelStyle, WarrenResult,
};

/// Command line arguments for the Warren level generator.
#[derive(Parser, Debug)]
#[command(name = "warren")]
#[command(about = "Procedural dungeon layout and connectivity engine for roguelikes")]
#[command(version)]
struct Args {
    /// Random seed for level generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Dungeon depth; decides whether a vault or cavern appears
    #[arg(short, long)]
    depth: Option<u32>,

    /// Level width in cells
    #[arg(long)]
    width: Option<i32>,

    /// Level height in cells
    #[arg(long)]
    height: Option<i32>,

    /// JSON configuration file; command line values take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tunnel strategy for the connection pass
    #[arg(long, value_enum)]
    style: Option<StyleArg>,

    /// Cost noise applied before tunneling
    #[arg(long, value_enum)]
    noise: Option<NoiseArg>,

    /// Generate the fixed town level instead of a dungeon level
    #[arg(long)]
    town: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Ascii)]
    format: Format,

    /// Write the level here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Regenerate with seed + attempt while the level is not fully connected
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StyleArg {
    Astar,
    Angband,
}

impl From<StyleArg> for TunnelStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Astar => TunnelStyle::AStar,
            StyleArg::Angband => TunnelStyle::Angband,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum NoiseArg {
    None,
    Random,
    Block,
    Perlin,
}

impl From<NoiseArg> for NoiseKind {
    fn from(noise: NoiseArg) -> Self {
        match noise {
            NoiseArg::None => NoiseKind::None,
            NoiseArg::Random => NoiseKind::Random,
            NoiseArg::Block => NoiseKind::Block,
            NoiseArg::Perlin => NoiseKind::Perlin,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Ascii,
    Json,
}

fn main() {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    if let Err(err) = run(&args) {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn initialize_logging(log_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_target(false)
        .init();
}

fn run(args: &Args) -> WarrenResult<()> {
    info!("Starting Warren v{}", warren::VERSION);

    let config = build_config(args)?;
    let generator: Box<dyn Generator<GeneratedLevel>> = if args.town {
        Box::new(TownGenerator::new())
    } else {
        Box::new(AngbandLevelGenerator::new())
    };

    let generated = generate_with_retries(generator.as_ref(), &config, args.retries)?;

    let rendered = match args.format {
        Format::Ascii => generated.level.to_ascii(),
        Format::Json => serde_json::to_string_pretty(&generated.level)?,
    };
    match &args.output {
        Some(path) => {
            fs::write(path, rendered)?;
            info!("level written to {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

/// Starts from the config file (or the defaults) and applies command line overrides.
fn build_config(args: &Args) -> WarrenResult<GenerationConfig> {
    let mut config = match &args.config {
        Some(path) => GenerationConfig::load(path)?,
        None => GenerationConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(depth) = args.depth {
        config.depth = depth;
    }
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(style) = args.style {
        config.tunnel_style = style.into();
    }
    if let Some(noise) = args.noise {
        config.noise = noise.into();
    }

    config.validate()?;
    Ok(config)
}

fn generate_with_retries(
    generator: &dyn Generator<GeneratedLevel>,
    config: &GenerationConfig,
    retries: u32,
) -> WarrenResult<GeneratedLevel> {
    let mut attempt = 0;
    loop {
        let attempt_config = GenerationConfig {
            seed: config.seed.wrapping_add(u64::from(attempt)),
            ..config.clone()
        };
        let mut rng = utils::create_rng(&attempt_config);
        let generated = generator.generate(&attempt_config, &mut rng)?;

        if generated.connected || attempt >= retries {
            if !generated.connected {
                warn!(
                    "{} produced a disconnected level after {} attempts",
                    generator.generator_type(),
                    attempt + 1
                );
            }
            return Ok(generated);
        }

        attempt += 1;
        info!(
            "level with seed {} is not connected, retrying with seed {}",
            attempt_config.seed,
            config.seed.wrapping_add(u64::from(attempt))
        );
    }
}
