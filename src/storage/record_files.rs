use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{AnimeRecord, RecordFile},
};

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const EXTENSION: &str = ".json";

/// File name for a record set captured at `captured_at`
pub fn record_file_name(prefix: &str, captured_at: NaiveDateTime) -> String {
    format!(
        "{}_{}{}",
        prefix,
        captured_at.format(TIMESTAMP_FORMAT),
        EXTENSION
    )
}

/// Parses the capture time back out of a record file name
pub fn parse_capture_time(file_name: &str, prefix: &str) -> Option<NaiveDateTime> {
    let stamp = file_name
        .strip_prefix(prefix)?
        .strip_prefix('_')?
        .strip_suffix(EXTENSION)?;
    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
}

/// Serializes records as 4-space indented JSON, non-ASCII kept as-is
fn to_pretty_json(records: &[AnimeRecord]) -> AppResult<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut serializer)?;
    Ok(buf)
}

/// Writes a new record set file under `dir`, creating the directory if needed
///
/// The file appears atomically: content goes to a uniquely named hidden temp
/// file that is then hard-linked into place. An existing record file is never
/// replaced; a name collision fails with `AlreadyExists`.
pub async fn write_record_set(
    dir: &Path,
    prefix: &str,
    records: &[AnimeRecord],
    captured_at: NaiveDateTime,
) -> AppResult<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;

    let file_name = record_file_name(prefix, captured_at);
    let path = dir.join(&file_name);
    let tmp_path = dir.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    let body = to_pretty_json(records)?;
    let published: std::io::Result<()> = async {
        let mut tmp = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
            .await?;
        tmp.write_all(&body).await?;
        tmp.sync_all().await?;
        drop(tmp);
        tokio::fs::hard_link(&tmp_path, &path).await
    }
    .await;
    let _ = tokio::fs::remove_file(&tmp_path).await;

    if let Err(e) = published {
        tracing::warn!(path = %path.display(), error = %e, "Record set not written");
        return Err(e.into());
    }

    tracing::info!(
        path = %path.display(),
        records = records.len(),
        "Record set written"
    );

    Ok(path)
}

/// Reads a record set file
pub async fn read_record_set(path: &Path) -> AppResult<Vec<AnimeRecord>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::Data(format!("Failed to read {}: {}", path.display(), e)))?;

    serde_json::from_str(&text)
        .map_err(|e| AppError::Data(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Lists record files in `dir`, newest first
///
/// Ordering uses creation time where the platform reports it, modification
/// time otherwise, with the file name as tie-breaker. A missing directory
/// yields an empty list.
pub async fn list_record_files(dir: &Path, prefix: &str) -> AppResult<Vec<RecordFile>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut found: Vec<(SystemTime, RecordFile)> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let file_name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(_) => continue,
        };
        let Some(captured_at) = parse_capture_time(&file_name, prefix) else {
            continue;
        };

        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let created = metadata
            .created()
            .or_else(|_| metadata.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        found.push((
            created,
            RecordFile {
                path: entry.path(),
                file_name,
                captured_at,
            },
        ));
    }

    found.sort_by(|(a_time, a), (b_time, b)| {
        b_time
            .cmp(a_time)
            .then_with(|| b.file_name.cmp(&a.file_name))
    });

    Ok(found.into_iter().map(|(_, file)| file).collect())
}

/// Most recently created record file in `dir`
pub async fn latest_record_file(dir: &Path, prefix: &str) -> AppResult<RecordFile> {
    list_record_files(dir, prefix)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No anime data files found in {}. Please scrape new data.",
                dir.display()
            ))
        })
}

/// Joins a bare file name onto the data directory
///
/// Anything that is not a single plain path component is rejected so callers
/// cannot reach outside `dir`.
pub fn resolve_record_file(dir: &Path, file_name: &str) -> AppResult<PathBuf> {
    let mut components = Path::new(file_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(dir.join(file_name)),
        _ => Err(AppError::InvalidInput(format!(
            "Invalid data file name: {:?}",
            file_name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tokio_test::{assert_err, assert_ok};

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("otakulens-store-{}", Uuid::new_v4()))
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 14)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn sample_records() -> Vec<AnimeRecord> {
        vec![
            AnimeRecord::new(
                Some("Dr. Stone Science Future".to_string()),
                Some("Senku continues to rebuild civilization.".to_string()),
                Some("https://u.livechart.me/anime/1/poster.jpg".to_string()),
                "Winter 2025",
            ),
            AnimeRecord::new(Some("薬屋のひとりごと".to_string()), None, None, "Winter 2025"),
        ]
    }

    #[test]
    fn test_record_file_name() {
        assert_eq!(
            record_file_name("winter_2025_anime", at(9, 5, 7)),
            "winter_2025_anime_20250114_090507.json"
        );
    }

    #[test]
    fn test_parse_capture_time() {
        assert_eq!(
            parse_capture_time("winter_2025_anime_20250114_090507.json", "winter_2025_anime"),
            Some(at(9, 5, 7))
        );
        assert_eq!(
            parse_capture_time("winter_2025_anime_latest.json", "winter_2025_anime"),
            None
        );
        assert_eq!(
            parse_capture_time("anime_data_20250114_090507.json", "winter_2025_anime"),
            None
        );
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let dir = temp_dir();
        let records = sample_records();

        let path = assert_ok!(
            write_record_set(&dir, "winter_2025_anime", &records, at(12, 0, 0)).await
        );
        assert!(path.ends_with("winter_2025_anime_20250114_120000.json"));

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("[\n    {\n        \"title\""));
        assert!(raw.contains("薬屋のひとりごと"));
        assert!(raw.contains("\"image_url\": null"));

        let back = read_record_set(&path).await.unwrap();
        assert_eq!(back, records);

        let leftovers: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_same_second_write_keeps_existing_file() {
        let dir = temp_dir();
        let first = vec![AnimeRecord::new(Some("First".to_string()), None, None, "Winter 2025")];
        let second = vec![AnimeRecord::new(Some("Second".to_string()), None, None, "Winter 2025")];

        let path = assert_ok!(write_record_set(&dir, "winter_2025_anime", &first, at(9, 0, 0)).await);
        let clash = assert_err!(
            write_record_set(&dir, "winter_2025_anime", &second, at(9, 0, 0)).await
        );
        assert!(matches!(
            clash,
            AppError::Io(ref e) if e.kind() == std::io::ErrorKind::AlreadyExists
        ));

        assert_eq!(read_record_set(&path).await.unwrap(), first);

        let names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["winter_2025_anime_20250114_090000.json".to_string()]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_read_invalid_json_is_data_error() {
        let dir = temp_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.json");
        std::fs::write(&path, "[{\"title\": ").unwrap();

        let result = read_record_set(&path).await;
        assert!(matches!(result, Err(AppError::Data(_))));

        let missing = read_record_set(&dir.join("nope.json")).await;
        assert!(matches!(missing, Err(AppError::Data(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_list_and_latest() {
        let dir = temp_dir();
        let records = sample_records();

        write_record_set(&dir, "winter_2025_anime", &records, at(8, 0, 0))
            .await
            .unwrap();
        write_record_set(&dir, "winter_2025_anime", &records, at(9, 0, 0))
            .await
            .unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let files = list_record_files(&dir, "winter_2025_anime").await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].file_name, "winter_2025_anime_20250114_090000.json");
        assert_eq!(files[0].captured_at, at(9, 0, 0));

        let latest = latest_record_file(&dir, "winter_2025_anime").await.unwrap();
        assert_eq!(latest.file_name, "winter_2025_anime_20250114_090000.json");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let dir = temp_dir();
        let files = assert_ok!(list_record_files(&dir, "winter_2025_anime").await);
        assert!(files.is_empty());

        let latest = assert_err!(latest_record_file(&dir, "winter_2025_anime").await);
        assert!(matches!(latest, AppError::NotFound(_)));
    }

    #[test]
    fn test_resolve_record_file() {
        let dir = Path::new("data");
        assert_eq!(
            resolve_record_file(dir, "winter_2025_anime_20250114_090000.json").unwrap(),
            PathBuf::from("data/winter_2025_anime_20250114_090000.json")
        );
        assert!(resolve_record_file(dir, "../secrets.json").is_err());
        assert!(resolve_record_file(dir, "nested/file.json").is_err());
        assert!(resolve_record_file(dir, "/etc/passwd").is_err());
        assert!(resolve_record_file(dir, "").is_err());
    }
}
