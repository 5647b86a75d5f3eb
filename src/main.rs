mod commands;

use clap::{Parser, Subcommand};
use otakulens::{models::RecommendationRequest, Config};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_QUERY: &str = "I enjoyed 'The Angel Next Door Spoils Me Rotten'. \
What similar romance anime is available this season?";

#[derive(Parser)]
#[command(name = "otakulens")]
#[command(about = "Seasonal anime scraper and LLM-backed recommender")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the season listing into a new data file
    Scrape,

    /// Ask the model for recommendations based on a data file
    Recommend {
        /// OpenRouter API key (falls back to OPENROUTER_API_KEY)
        #[arg(long)]
        api_key: Option<String>,

        /// Data file to load (default: most recent in the data directory)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// What you are looking for
        #[arg(short, long, default_value = DEFAULT_QUERY)]
        query: String,

        #[arg(long, default_value_t = 0.7)]
        temperature: f32,

        #[arg(long, default_value_t = 1600)]
        max_tokens: u32,

        /// Number of records placed in the prompt
        #[arg(long, default_value_t = 10)]
        max_entries: usize,

        /// Print the request/response debug snapshot afterwards
        #[arg(long)]
        debug: bool,
    },

    /// List scraped data files, newest first
    Datasets,

    /// Run the HTTP API
    Serve,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "otakulens=info,tower_http=info".into());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Scrape => commands::scrape::run(&config).await,
        Commands::Recommend {
            api_key,
            file,
            query,
            temperature,
            max_tokens,
            max_entries,
            debug,
        } => {
            let args = commands::recommend::RecommendArgs {
                api_key,
                file,
                request: RecommendationRequest::new(query)
                    .with_temperature(temperature)
                    .with_max_tokens(max_tokens)
                    .with_max_entries(max_entries),
                debug,
            };
            commands::recommend::run(&config, args).await
        }
        Commands::Datasets => commands::datasets::run(&config).await,
        Commands::Serve => commands::serve::run(config).await,
    }
}
