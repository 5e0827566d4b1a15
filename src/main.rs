use anyhow::Context;
use clap::{Parser, Subcommand};
use oxidized_newsletter::{
    agents::{NewsletterPipeline, PipelineCredentials, PipelineState},
    config::Config,
    models::download_filename,
    routes::create_router,
    utils::init_logger,
    AppState,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the web front end and JSON API
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Generate one newsletter from the terminal
    Generate {
        /// Newsletter topic
        topic: String,

        /// Model to use (defaults to NEWSLETTER_MODEL)
        #[arg(short, long)]
        model: Option<String>,

        /// Print research, insights and draft before the final newsletter
        #[arg(long)]
        show_intermediate: bool,

        /// Write the newsletter to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => serve(config, port).await,
        Command::Generate {
            topic,
            model,
            show_intermediate,
            output,
        } => generate(config, &topic, model.as_deref(), show_intermediate, output).await,
    }
}

async fn serve(mut config: Config, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    info!("Configuration loaded: {:?}", config.server);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.server.host, config.server.port))?;

    let app = create_router(AppState { config });

    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

async fn generate(
    config: Config,
    topic: &str,
    model: Option<&str>,
    show_intermediate: bool,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let pipeline = NewsletterPipeline::from_config(&config, model, &PipelineCredentials::default())?;

    let started = Instant::now();
    let result = pipeline
        .run_observed(topic, |state| {
            if let Some(banner) = progress_banner(state) {
                eprintln!("{}", banner);
            }
        })
        .await?;
    eprintln!("Newsletter generated in {:.1} seconds", started.elapsed().as_secs_f32());

    if show_intermediate {
        println!("## Research results\n\n{}\n", result.research);
        println!("## Insights\n\n{}\n", result.insights);
        println!("## Draft\n\n{}\n", result.draft);
    }

    match output {
        Some(path) => {
            tokio::fs::write(&path, &result.final_text)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Saved to {} (suggested name: {})", path.display(), download_filename(topic));
        }
        None => println!("{}", result.final_text),
    }

    Ok(())
}

fn progress_banner(state: PipelineState) -> Option<&'static str> {
    match state {
        PipelineState::Searching => Some("Searching for recent developments..."),
        PipelineState::Researching => Some("Researching..."),
        PipelineState::Synthesizing => Some("Analyzing insights..."),
        PipelineState::Drafting => Some("Writing the newsletter..."),
        PipelineState::Editing => Some("Editing..."),
        PipelineState::Idle | PipelineState::Done | PipelineState::Failed => None,
    }
}
