use anyhow::{Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;
use signscribe::cli::{Cli, Commands};
use signscribe::config::Config;
use signscribe::generate::{EchoGenerator, TextGenerator};
use signscribe::landmarks::{LandmarkCorrector, LandmarkSet, PrevLandmarks};
use signscribe::simulate::{Simulation, Step};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    match cli.command {
        Commands::Config { path } => {
            handle_config_command(path, cli.config.as_deref())?;
        }
        Commands::Correct { input, reference } => {
            let config = load_config(cli.config.as_deref())?;
            run_correct(&config, &input, reference.as_deref())?;
        }
        Commands::Simulate {
            glosses,
            pace,
            echo,
        } => {
            let config = load_config(cli.config.as_deref())?;
            run_simulate(&config, &glosses, pace, echo).await?;
        }
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-q` / `-v`.
fn init_logging(cli: &Cli) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/signscribe/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        let default_path = Config::default_path();
        Config::load_or_default(&default_path)
            .with_context(|| format!("Failed to load {}", default_path.display()))?
    };

    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

fn handle_config_command(path: bool, custom_path: Option<&Path>) -> Result<()> {
    if path {
        let path = custom_path
            .map(Path::to_path_buf)
            .unwrap_or_else(Config::default_path);
        println!("{}", path.display());
        return Ok(());
    }

    let config = load_config(custom_path)?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn reference_landmarks(config: &Config, reference: Option<&Path>) -> Result<PrevLandmarks> {
    let path: Option<PathBuf> = reference
        .map(Path::to_path_buf)
        .or_else(|| config.landmarks.reference_path.clone());
    match path {
        Some(path) => Ok(PrevLandmarks::load(&path)?),
        None => Ok(PrevLandmarks::neutral()),
    }
}

/// Run the corrector over a JSON-lines file, one corrected frame per line.
fn run_correct(config: &Config, input: &Path, reference: Option<&Path>) -> Result<()> {
    let mut prev = reference_landmarks(config, reference)?;
    let corrector = LandmarkCorrector::new();

    let file = std::fs::File::open(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let mut frames = 0usize;
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let detected: LandmarkSet = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid landmark set", input.display(), idx + 1))?;
        let frame = corrector.correct(&detected, &mut prev);
        writeln!(out, "{}", serde_json::to_string(&frame)?)?;
        frames += 1;
    }

    tracing::info!(frames, "Correction finished");
    Ok(())
}

fn build_generator(config: &Config, echo: bool) -> Result<Arc<dyn TextGenerator>> {
    if echo {
        return Ok(Arc::new(EchoGenerator));
    }
    http_generator(config)
}

#[cfg(feature = "http-generator")]
fn http_generator(config: &Config) -> Result<Arc<dyn TextGenerator>> {
    let generator = signscribe::generate::HttpGenerator::from_config(&config.generator)?;
    Ok(Arc::new(generator))
}

#[cfg(not(feature = "http-generator"))]
fn http_generator(_config: &Config) -> Result<Arc<dyn TextGenerator>> {
    anyhow::bail!("Built without the http-generator feature; use --echo")
}

/// Feed glosses into a gloss window at a fixed pace, generating after each.
async fn run_simulate(config: &Config, glosses: &str, pace: Duration, echo: bool) -> Result<()> {
    let mut simulation = Simulation::new(config, build_generator(config, echo)?);

    eprintln!("Generator: {}", simulation.generator_name().cyan());

    for gloss in glosses.split_whitespace() {
        tokio::time::sleep(pace).await;

        match simulation.feed(gloss, Instant::now()).await {
            Ok(Step::Buffered) => {
                eprintln!("{} {}", "+".dimmed(), gloss.dimmed());
            }
            Ok(Step::Generated { phrase, sentence }) => {
                eprintln!("{} {}", "+".dimmed(), phrase.dimmed());
                println!("{}", sentence.green());
            }
            Ok(Step::Empty { phrase }) => {
                eprintln!("{} {} (no output)", "+".dimmed(), phrase.dimmed());
            }
            Err(e) => {
                eprintln!("{} {}", "Generation failed:".red(), e);
            }
        }
    }

    Ok(())
}
