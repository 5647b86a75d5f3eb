use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const NO_SYNOPSIS: &str = "No synopsis available";

/// One scraped listing entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnimeRecord {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_synopsis")]
    pub synopsis: String,
    /// Poster image, serialized as `null` when the card has none
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub season: String,
}

fn default_title() -> String {
    UNKNOWN_TITLE.to_string()
}

fn default_synopsis() -> String {
    NO_SYNOPSIS.to_string()
}

impl AnimeRecord {
    /// Creates a record, substituting the fallbacks for missing title or synopsis
    pub fn new(
        title: Option<String>,
        synopsis: Option<String>,
        image_url: Option<String>,
        season: &str,
    ) -> Self {
        Self {
            title: title.unwrap_or_else(default_title),
            synopsis: synopsis.unwrap_or_else(default_synopsis),
            image_url,
            season: season.to_string(),
        }
    }
}

/// A persisted record set on disk
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecordFile {
    pub path: PathBuf,
    pub file_name: String,
    /// Capture time parsed from the file name
    pub captured_at: NaiveDateTime,
}
