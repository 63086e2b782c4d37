// creative-flow - run the ad campaign pipeline from the command line

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use creative_flow::orchestration::{CampaignBrief, ImageOptions, TextPayload};
use creative_flow::{CampaignRegistry, JsonDirStore, Orchestrator, Settings};
use gemini::GeminiClient;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate ad campaigns: ideas, copy and poster images", long_about = None)]
struct Args {
    /// TOML settings file (environment variables override it)
    #[arg(short, long, global = true, env = "CREATIVE_FLOW_CONFIG")]
    config: Option<PathBuf>,

    /// User the campaigns belong to
    #[arg(short, long, global = true, env = "CREATIVE_FLOW_USER", default_value = "local")]
    user: String,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a draft campaign from a brief
    Create {
        #[arg(long)]
        brief: String,

        #[arg(long)]
        objective: String,

        #[arg(long)]
        audience: String,

        /// Ad format, repeat for several
        #[arg(long = "format", required = true)]
        formats: Vec<String>,
    },

    /// Generate, score and select campaign ideas
    Ideas { id: String },

    /// Write ad copy for one of the top ideas
    AdCopy {
        id: String,

        /// Index into the campaign's top ideas
        #[arg(short, long, default_value = "0")]
        index: usize,
    },

    /// Generate the poster image
    Image {
        id: String,

        /// Let the model render the headline into the image
        #[arg(long)]
        bake_text: bool,

        /// Headline to use instead of the generated one
        #[arg(long)]
        headline: Option<String>,
    },

    /// Bake the headline and CTA onto the current image
    Composite { id: String },

    /// Print one campaign
    Show { id: String },

    /// List campaigns, newest first
    List,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to load .env: {}", e);
        }
    }

    let args = Args::parse();

    let default_filter = if args.verbose {
        "creative_flow=debug,gemini=debug,imagent=debug"
    } else {
        "creative_flow=info,gemini=info,imagent=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;
    let store = Arc::new(
        JsonDirStore::open(settings.storage.data_dir.clone())
            .await
            .with_context(|| {
                format!("Failed to open campaign store at {}", settings.storage.data_dir.display())
            })?,
    );
    tracing::debug!(data_dir = %settings.storage.data_dir.display(), "Opened campaign store");

    let user = args.user.as_str();
    let registry = CampaignRegistry::new(store.clone());

    // Only the stage commands need a model client
    let model_pipeline = || -> Result<Orchestrator> {
        let client = Arc::new(
            GeminiClient::new(settings.gemini.clone()).context("Failed to create model client")?,
        );
        Ok(Orchestrator::new(
            client.clone(),
            client,
            store.clone(),
            settings.pipeline.clone(),
        )?)
    };

    let campaign = match args.command {
        Command::Create {
            brief,
            objective,
            audience,
            formats,
        } => {
            let brief = CampaignBrief::new(brief, objective, audience, formats);
            registry.create(user, brief).await?
        }
        Command::Show { id } => registry.get(user, &id).await?,
        Command::List => return print_json(&registry.list(user).await?),
        Command::Ideas { id } => model_pipeline()?.generate_ideas(user, &id).await?,
        Command::AdCopy { id, index } => {
            model_pipeline()?.generate_ad_copy(user, &id, index).await?
        }
        Command::Image {
            id,
            bake_text,
            headline,
        } => {
            let options = ImageOptions {
                bake_text,
                text: headline.map(|headline| TextPayload {
                    headline: Some(headline),
                }),
            };
            model_pipeline()?.generate_image(user, &id, options).await?
        }
        Command::Composite { id } => model_pipeline()?.composite_text(user, &id).await?,
    };

    print_json(&campaign)
}
