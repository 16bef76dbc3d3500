use anyhow::Result;
use catchword::cli::{Cli, Commands};
use catchword::config::Config;
use catchword::filter::FfmpegEngine;
use catchword::matcher::KeywordMatcher;
use catchword::run::Orchestrator;
use catchword::stt::backend::SttBackend;
use catchword::stt::google::GoogleSpeechBackend;
use catchword::stt::whisper::WhisperBackend;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Process {
            file,
            vocab,
            threshold,
            language,
            archive,
        } => {
            let mut config = config;
            if let Some(vocab) = vocab {
                config.matcher.vocabulary = vocab;
            }
            if let Some(threshold) = threshold {
                config.matcher.threshold = threshold;
            }
            if let Some(language) = language {
                config.stt.language = language;
            }

            let orchestrator = build_orchestrator(config)?;
            let outcome = orchestrator.process_audio(&file).await?;

            print!("{}", outcome.report_text);
            if archive {
                let archive_path = catchword::archive::pack_run_dir(&outcome.run_dir)?;
                println!("archive: {}", archive_path.display());
            }
        }
        Commands::Serve { bind } => {
            let orchestrator = Arc::new(build_orchestrator(config)?);
            catchword::server::serve(orchestrator, &bind).await?;
        }
        Commands::Check => {
            let timeout = Duration::from_secs(config.engine.timeout_secs);
            match FfmpegEngine::resolve(&config.engine.ffmpeg_path, timeout) {
                Ok(engine) => {
                    println!("filter engine: ok ({})", engine.executable().display());
                }
                Err(e) => {
                    eprintln!("filter engine: {}", e);
                    std::process::exit(1);
                }
            }
            println!("catchword {}", catchword::version_string());
        }
    }

    Ok(())
}

fn init_tracing(quiet: bool, verbose: u8) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("catchword={}", default_level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/catchword/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };
    Ok(config.with_env_overrides())
}

/// Resolve the filter engine and assemble the configured backends.
///
/// An unresolvable engine is fatal; an unconstructible backend is skipped
/// with a warning so the remaining backends still run.
fn build_orchestrator(config: Config) -> Result<Orchestrator> {
    let timeout = Duration::from_secs(config.engine.timeout_secs);
    let engine = FfmpegEngine::resolve(&config.engine.ffmpeg_path, timeout)?;

    let mut backends: Vec<Arc<dyn SttBackend>> = Vec::new();
    for id in &config.stt.backends {
        match id.as_str() {
            "google" => backends.push(Arc::new(GoogleSpeechBackend::new(
                &config.stt.google,
                config.stt.recognizer.clone(),
            ))),
            "whisper" => match WhisperBackend::new(config.stt.whisper.clone()) {
                Ok(backend) => backends.push(Arc::new(backend)),
                Err(e) => warn!(error = %e, "whisper backend skipped"),
            },
            other => warn!(backend = other, "unknown backend id skipped"),
        }
    }
    if backends.is_empty() {
        warn!("no transcription backend available; all report entries will be empty");
    }

    let matcher = KeywordMatcher::new(
        config.matcher.vocabulary.clone(),
        config.matcher.threshold,
    );

    Ok(Orchestrator::new(Arc::new(engine), backends, matcher, config))
}
