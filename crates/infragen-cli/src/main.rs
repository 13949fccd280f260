mod config;
mod generate_cmd;
mod serve_cmd;
mod startup;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use infragen_core::DomainProfile;
use infragen_core::invoker::InvocationMode;

use config::{CliOverrides, InfragenConfig};

#[derive(Parser)]
#[command(name = "infragen", about = "Conversational Terraform generation service")]
struct Cli {
    /// Config file path (defaults to ~/.config/infragen/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an infragen config file
    Init {
        /// Base URL of the OpenAI-compatible backend
        #[arg(long, default_value = "https://api.openai.com/v1")]
        base_url: String,
        /// Backend protocol: direct or session
        #[arg(long, default_value = "direct")]
        mode: InvocationMode,
        /// Model name to generate with
        #[arg(long)]
        model: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Start the HTTP service
    Serve {
        /// Address to bind to
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run a single generation and print the response envelope
    Generate {
        /// Project the request belongs to
        #[arg(long)]
        project_id: String,
        /// JSON file holding prior conversation turns
        #[arg(long)]
        history: Option<PathBuf>,
        /// The infrastructure request
        prompt: String,
    },
    /// Print the static health document
    Health,
}

/// Execute the `infragen init` command: write config file.
fn cmd_init(
    path: &Path,
    base_url: &str,
    mode: InvocationMode,
    model: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        backend: config::BackendSection {
            mode: Some(mode),
            base_url: Some(base_url.to_string()),
            model: model.clone(),
            ..config::BackendSection::default()
        },
        ..config::ConfigFile::default()
    };
    config::save_config(&cfg, path)?;

    println!("Config written to {}", path.display());
    println!("  backend.mode = {mode}");
    println!("  backend.base_url = {base_url}");
    if let Some(model) = model {
        println!("  backend.model = {model}");
    }
    println!();
    println!("Next: export INFRAGEN_API_KEY and run `infragen serve`.");

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(config::config_path);

    match cli.command {
        Commands::Init {
            base_url,
            mode,
            model,
            force,
        } => {
            cmd_init(&config_path, &base_url, mode, model, force)?;
        }
        Commands::Serve { bind, port } => {
            let resolved = InfragenConfig::resolve(Some(&config_path), &CliOverrides { bind, port })?;
            let orchestrator = startup::build_orchestrator(&resolved).await?;
            serve_cmd::run_serve(orchestrator, &resolved.server.bind, resolved.server.port).await?;
        }
        Commands::Generate {
            project_id,
            history,
            prompt,
        } => {
            let resolved = InfragenConfig::resolve(Some(&config_path), &CliOverrides::default())?;
            let orchestrator = startup::build_orchestrator(&resolved).await?;
            let envelope =
                generate_cmd::run_generate(&orchestrator, &project_id, &prompt, history.as_deref())
                    .await?;
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        Commands::Health => {
            let health = serve_cmd::HealthResponse::for_profile(&DomainProfile::terraform());
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
    }

    Ok(())
}
