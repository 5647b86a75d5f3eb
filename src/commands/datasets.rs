use otakulens::{storage, Config};

pub async fn run(config: &Config) -> anyhow::Result<()> {
    let files = storage::list_record_files(&config.data_dir, &config.file_prefix).await?;

    if files.is_empty() {
        println!(
            "No anime data files found in {}. Run `otakulens scrape` first.",
            config.data_dir.display()
        );
        return Ok(());
    }

    for file in files {
        println!(
            "{}  (captured {})",
            file.file_name,
            file.captured_at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}
