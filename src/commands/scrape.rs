use otakulens::{services::Collector, Config};

const PREVIEW_ENTRIES: usize = 3;
const PREVIEW_CHARS: usize = 100;

pub async fn run(config: &Config) -> anyhow::Result<()> {
    println!(
        "Starting to scrape {} anime data from {}...",
        config.season, config.listing_url
    );

    let collector = Collector::new(config)?;
    let collected = collector.collect().await?;

    println!(
        "Scraped {} anime entries. Data saved to {}",
        collected.records.len(),
        collected.path.display()
    );

    if !collected.records.is_empty() {
        println!("\nPreview of the first {} entries:", PREVIEW_ENTRIES);
        for (i, anime) in collected.records.iter().take(PREVIEW_ENTRIES).enumerate() {
            println!("\n{}. {}", i + 1, anime.title);
            println!("Synopsis: {}", preview(&anime.synopsis, PREVIEW_CHARS));
        }
    }

    Ok(())
}

fn preview(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
