use crate::models::AnimeRecord;

pub const NO_DATA_CONTEXT: &str = "No anime data available.";

/// Synopses longer than this many characters are cut and marked with `...`
pub const SYNOPSIS_LIMIT: usize = 200;

pub const SYSTEM_PROMPT: &str = "You are an anime recommendation assistant with knowledge of \
anime across all seasons. You prioritize recommending anime from the current season when \
appropriate, but can also suggest anime from other seasons when relevant.";

/// Cuts a synopsis to `SYNOPSIS_LIMIT` characters plus an ellipsis
///
/// The marker is appended on top of the limit, so a cut synopsis is 203
/// characters long.
pub fn truncate_synopsis(synopsis: &str) -> String {
    match synopsis.char_indices().nth(SYNOPSIS_LIMIT) {
        Some((cut, _)) => format!("{}...", &synopsis[..cut]),
        None => synopsis.to_string(),
    }
}

/// Renders the first `max_entries` records as numbered paragraphs
pub fn build_context(records: &[AnimeRecord], max_entries: usize, season: &str) -> String {
    if records.is_empty() {
        return NO_DATA_CONTEXT.to_string();
    }

    let mut context = format!(
        "Here is information about anime from the {} season:\n\n",
        season
    );

    for (i, anime) in records.iter().take(max_entries).enumerate() {
        context.push_str(&format!(
            "{}. {}\nSynopsis: {}\n\n",
            i + 1,
            anime.title,
            truncate_synopsis(&anime.synopsis)
        ));
    }

    context
}

/// User message sent alongside `SYSTEM_PROMPT`
pub fn build_prompt(context: &str, query: &str, season: &str) -> String {
    format!(
        "You are an anime recommendation assistant. I'll provide you with information about \
anime from the {season} season.

{context}

User Query: {query}

Please provide anime recommendations based on the user's query. PRIORITIZE recommending anime \
from the {season} list I provided above.

However, you can also recommend anime from your general knowledge if:
1. There are no good matches in the {season} list, or
2. You want to provide additional context by comparing with well-known anime.

For each recommendation, explain why it might be a good match for the user. Clearly indicate \
which recommendations are from the {season} season and which are from your general knowledge.
"
    )
}
