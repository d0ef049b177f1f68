//! Mystery CLI
//!
//! Serves the code runner over HTTP and runs or screens files from the shell.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mystery::{Config, EXAMPLE_CONFIG, ExecuteError, Executor, Language, Verdict, validator};
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mystery")]
#[command(about = "Run untrusted playground code under a time budget")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Port to listen on, keeping the configured host
    #[arg(short, long, global = true, env = "PORT")]
    port: Option<u16>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to listen on (overrides config and --port)
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },

    /// Execute a source file and print the result as JSON
    Run {
        /// Source file to run
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Language ID
        #[arg(short, long, default_value = "python")]
        language: String,
    },

    /// Screen a source file against the denylist without running it
    Check {
        /// Source file to screen
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Language ID
        #[arg(short, long, default_value = "python")]
        language: String,
    },

    /// Initialize a new configuration file
    Init {
        /// Output path (default: mystery.toml)
        #[arg(short, long, default_value = "mystery.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },

    /// List supported languages
    Languages,

    /// Show the effective configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = if let Some(ref path) = cli.config {
        info!(?path, "loading configuration");
        Config::from_file(path).context("failed to load configuration")?
    } else {
        debug!("using default configuration");
        Config::from_env().context("failed to load configuration")?
    };

    if let Some(port) = cli.port {
        config.server.bind.set_port(port);
    }

    match cli.command {
        Commands::Init { output, force } => init_config(&output, force).await,
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            mystery::serve(Executor::new(config))
                .await
                .context("server failed")
        }
        Commands::Run { source, language } => run_file(config, &source, &language).await,
        Commands::Check { source, language } => check_file(&source, &language).await,
        Commands::Languages => {
            list_languages(&config);
            Ok(())
        }
        Commands::ShowConfig => {
            show_config(&config);
            Ok(())
        }
    }
}

async fn read_source(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read source file '{}'", path.display()))
}

async fn run_file(config: Config, source: &Path, language_id: &str) -> Result<()> {
    let language: Language = language_id.parse().context("unknown language")?;
    let code = read_source(source).await?;

    info!(%language, "running program");
    let executor = Executor::new(config);

    match executor.execute(language, &code).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(err) => {
            let body = serde_json::json!({ "success": false, "error": err.to_string() });
            println!("{}", serde_json::to_string_pretty(&body)?);
            if let ExecuteError::UnsafeCode { pattern } = err {
                info!(pattern, "source rejected");
            }
            std::process::exit(1);
        }
    }
}

async fn check_file(source: &Path, language_id: &str) -> Result<()> {
    let language: Language = language_id.parse().context("unknown language")?;
    let code = read_source(source).await?;

    match validator::check(language, &code) {
        Verdict::Safe => {
            println!("No dangerous patterns found");
            Ok(())
        }
        Verdict::Unsafe { pattern } => {
            println!("Rejected: matches pattern '{pattern}'");
            std::process::exit(1);
        }
    }
}

fn list_languages(config: &Config) {
    println!("Supported languages:\n");

    for language in Language::ALL {
        let runtime = match config.runtime(language) {
            Ok(runtime) => format!("{} ({})", runtime.name, runtime.command.join(" ")),
            Err(_) => "not configured".to_string(),
        };
        println!("  {:<10} {}", language.id(), runtime);
    }
}

fn show_config(config: &Config) {
    println!("Server:");
    println!("  Bind: {}", config.server.bind);
    println!("  CORS: {}", config.server.cors);
    println!();
    println!("Execution:");
    println!("  Timeout: {} ms", config.execution.timeout_ms);
    println!("  Max output: {} bytes", config.execution.max_output);
    println!();

    let mut languages: Vec<_> = config.languages.iter().collect();
    languages.sort_by_key(|(id, _)| *id);

    println!("Languages configured: {}", languages.len());
    for (id, runtime) in languages {
        println!("  {id}: {}", runtime.command.join(" "));
        println!("    PATH: {}", runtime.path);
    }
}

async fn init_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at '{}'. Use --force to overwrite.",
            output.display()
        );
    }

    tokio::fs::write(output, EXAMPLE_CONFIG)
        .await
        .context("failed to write configuration file")?;

    println!("Created configuration file at '{}'", output.display());
    Ok(())
}
