/// Season listing collector
///
/// Fetches one listing page, extracts one `AnimeRecord` per entry card and
/// persists the batch as a timestamped JSON record set.
///
/// Flow:
/// 1. GET the listing URL with a browser-like User-Agent
/// 2. Split the document into entry fragments (`.anime-card`)
/// 3. Extract each fragment, spaced by a minimum interval; failures skip only that entry
/// 4. Write the batch to `<data_dir>/<prefix>_<YYYYMMDD_HHMMSS>.json`
use chrono::Local;
use reqwest::{Client as HttpClient, Url};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::AnimeRecord,
    services::throttle::MinInterval,
    storage,
};

/// CSS selectors addressing the parts of a listing entry
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    entry: Selector,
    title: Selector,
    synopsis: Selector,
    image: Selector,
}

impl ListingSelectors {
    pub fn new(entry: &str, title: &str, synopsis: &str, image: &str) -> AppResult<Self> {
        Ok(Self {
            entry: parse_selector(entry)?,
            title: parse_selector(title)?,
            synopsis: parse_selector(synopsis)?,
            image: parse_selector(image)?,
        })
    }

    /// Markup used by livechart.me season pages
    pub fn livechart() -> AppResult<Self> {
        Self::new(
            ".anime-card",
            ".main-title",
            ".anime-synopsis",
            ".poster-container img",
        )
    }
}

fn parse_selector(css: &str) -> AppResult<Selector> {
    Selector::parse(css)
        .map_err(|e| AppError::Scrape(format!("Invalid selector {:?}: {:?}", css, e)))
}

/// Result of a scrape that was persisted
#[derive(Debug, Clone, Serialize)]
pub struct Collected {
    pub records: Vec<AnimeRecord>,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Collector {
    http_client: HttpClient,
    listing_url: Url,
    season: String,
    data_dir: PathBuf,
    file_prefix: String,
    entry_delay: Duration,
    selectors: ListingSelectors,
}

impl Collector {
    pub fn new(config: &Config) -> AppResult<Self> {
        let listing_url = Url::parse(&config.listing_url).map_err(|e| {
            AppError::Configuration(format!(
                "Invalid listing URL {:?}: {}",
                config.listing_url, e
            ))
        })?;

        let http_client = HttpClient::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            http_client,
            listing_url,
            season: config.season.clone(),
            data_dir: config.data_dir.clone(),
            file_prefix: config.file_prefix.clone(),
            entry_delay: config.scrape_delay(),
            selectors: ListingSelectors::livechart()?,
        })
    }

    pub fn with_selectors(mut self, selectors: ListingSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn listing_url(&self) -> &Url {
        &self.listing_url
    }

    /// Scrapes the listing and writes the records to a new file
    ///
    /// A failed fetch writes nothing.
    pub async fn collect(&self) -> AppResult<Collected> {
        let records = self.scrape().await?;
        let path = storage::write_record_set(
            &self.data_dir,
            &self.file_prefix,
            &records,
            Local::now().naive_local(),
        )
        .await?;

        tracing::info!(
            records = records.len(),
            path = %path.display(),
            "Scrape completed"
        );

        Ok(Collected { records, path })
    }

    /// Fetches and extracts the listing without persisting anything
    pub async fn scrape(&self) -> AppResult<Vec<AnimeRecord>> {
        let body = self.fetch_listing().await?;
        let fragments = self.entry_fragments(&body);

        tracing::info!(
            url = %self.listing_url,
            entries = fragments.len(),
            "Listing page fetched"
        );

        let mut throttle = MinInterval::new(self.entry_delay);
        let mut records = Vec::with_capacity(fragments.len());

        for (index, fragment) in fragments.iter().enumerate() {
            throttle.ready().await;
            match self.extract_entry(fragment) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(entry = index, error = %e, "Skipping listing entry");
                }
            }
        }

        Ok(records)
    }

    async fn fetch_listing(&self) -> AppResult<String> {
        let response = self
            .http_client
            .get(self.listing_url.clone())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %self.listing_url, error = %e, "Listing request failed");
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(url = %self.listing_url, status = %status, "Listing request rejected");
            return Err(AppError::ExternalApi(format!(
                "Listing page returned status {}: {}",
                status, self.listing_url
            )));
        }

        Ok(response.text().await?)
    }

    /// Outer HTML of every top-level entry in the document
    pub fn entry_fragments(&self, document: &str) -> Vec<String> {
        let html = Html::parse_document(document);
        html.select(&self.selectors.entry)
            .map(|entry| entry.html())
            .collect()
    }

    /// Extracts one record from an entry fragment
    pub fn extract_entry(&self, fragment: &str) -> AppResult<AnimeRecord> {
        let html = Html::parse_fragment(fragment);

        let title = html.select(&self.selectors.title).next().map(element_text);
        let synopsis = html
            .select(&self.selectors.synopsis)
            .next()
            .map(element_text);

        let image_url = match html
            .select(&self.selectors.image)
            .next()
            .and_then(|img| img.value().attr("src"))
            .filter(|src| !src.trim().is_empty())
        {
            Some(src) => Some(resolve_url(&self.listing_url, src)?),
            None => None,
        };

        Ok(AnimeRecord::new(title, synopsis, image_url, &self.season))
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Absolute URLs are kept verbatim, relative ones resolved against the page
fn resolve_url(base: &Url, src: &str) -> AppResult<String> {
    if Url::parse(src).is_ok() {
        return Ok(src.to_string());
    }
    base.join(src)
        .map(|url| url.to_string())
        .map_err(|e| AppError::Scrape(format!("Invalid image URL {:?}: {}", src, e)))
}
