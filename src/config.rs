use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// OpenRouter API key; may also be supplied at runtime
    #[serde(default)]
    pub openrouter_api_key: Option<String>,

    /// OpenRouter API base URL
    #[serde(default = "default_openrouter_api_url")]
    pub openrouter_api_url: String,

    /// Chat model used for recommendations
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Season listing page to scrape
    #[serde(default = "default_listing_url")]
    pub listing_url: String,

    /// Season tag stamped on every scraped record
    #[serde(default = "default_season")]
    pub season: String,

    /// Directory holding scraped record files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// File name prefix for scraped record files
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Minimum interval between per-entry extractions, in milliseconds
    #[serde(default = "default_scrape_delay_ms")]
    pub scrape_delay_ms: u64,

    /// Browser-like identification sent to the listing site
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_openrouter_api_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model_id() -> String {
    "deepseek/deepseek-r1:free".to_string()
}

fn default_listing_url() -> String {
    "https://www.livechart.me/winter-2025/tv".to_string()
}

fn default_season() -> String {
    "Winter 2025".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_file_prefix() -> String {
    "winter_2025_anime".to_string()
}

fn default_scrape_delay_ms() -> u64 {
    500
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
        .to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openrouter_api_key: None,
            openrouter_api_url: default_openrouter_api_url(),
            model_id: default_model_id(),
            listing_url: default_listing_url(),
            season: default_season(),
            data_dir: default_data_dir(),
            file_prefix: default_file_prefix(),
            scrape_delay_ms: default_scrape_delay_ms(),
            user_agent: default_user_agent(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn scrape_delay(&self) -> Duration {
        Duration::from_millis(self.scrape_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_environment() {
        let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config.openrouter_api_key, None);
        assert_eq!(config.model_id, "deepseek/deepseek-r1:free");
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.file_prefix, "winter_2025_anime");
        assert_eq!(config.scrape_delay(), Duration::from_millis(500));
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_overrides() {
        let config: Config = envy::from_iter(vec![
            ("OPENROUTER_API_KEY".to_string(), "sk-test".to_string()),
            ("SEASON".to_string(), "Spring 2025".to_string()),
            ("SCRAPE_DELAY_MS".to_string(), "0".to_string()),
        ])
        .unwrap();
        assert_eq!(config.openrouter_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.season, "Spring 2025");
        assert_eq!(config.scrape_delay(), Duration::ZERO);
    }
}
