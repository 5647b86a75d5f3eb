use otakulens::{
    models::{recommendation::error_text, RecommendationRequest},
    services::Recommender,
    storage, Config,
};
use std::path::PathBuf;

pub struct RecommendArgs {
    pub api_key: Option<String>,
    pub file: Option<PathBuf>,
    pub request: RecommendationRequest,
    pub debug: bool,
}

pub async fn run(config: &Config, args: RecommendArgs) -> anyhow::Result<()> {
    args.request.validate()?;

    let mut recommender = Recommender::new(args.api_key, config)?;

    let path = match args.file {
        Some(path) => path,
        None => {
            let latest = storage::latest_record_file(&config.data_dir, &config.file_prefix).await?;
            println!("Using most recent JSON file: {}", latest.path.display());
            latest.path
        }
    };

    let count = recommender.load_records(&path).await?;
    println!(
        "Successfully loaded {} anime entries from {}\n",
        count,
        path.display()
    );

    let outcome = recommender.recommend(&args.request).await;

    match &outcome {
        Ok(recommendation) => {
            println!("{}", recommendation);
            if recommendation.looks_truncated() {
                eprintln!(
                    "\nNote: the recommendations appear to be truncated by the token limit. \
                     Try a more specific query or raise --max-tokens."
                );
            }
        }
        Err(e) => println!("{}", error_text(e)),
    }

    if args.debug {
        println!(
            "\n--- Debug ---\n{}",
            serde_json::to_string_pretty(&recommender.debug_info())?
        );
    }

    outcome.map(|_| ()).map_err(Into::into)
}
