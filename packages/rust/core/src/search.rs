//! Query filtering and ranking over the flat line index.
//!
//! Two matching rules exist and are deliberately kept apart:
//! - *word-for-word*: every query word equals a whitespace token of the line
//!   (after `[`/`]` are turned into spaces); used for very short queries and
//!   short all-uppercase queries such as acronyms
//! - *substring*: every query word occurs somewhere in the line; used for
//!   everything else
//!
//! Results are never scored. Word-for-word matches are moved in front of the
//! rest, keeping relative order in both groups.

use serde::Serialize;
use tracing::{debug, instrument};

use wikisift_shared::{AppConfig, IndexMode, Result, WikiSiftError};

/// Above this many candidates only word-for-word matches are kept.
pub const CANDIDATE_LIMIT: usize = 300;

/// Above this many content lines they are not shown at all.
pub const RESULT_LIMIT: usize = 700;

/// Query that is always shown in full, however many lines it matches.
pub const UNLIMITED_QUERY: &str = "⭐";

/// Longest query that is always matched word-for-word.
const SHORT_QUERY_CHARS: usize = 2;

/// Longest all-uppercase query that is matched word-for-word.
const ACRONYM_QUERY_CHARS: usize = 5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Matching options derived from configuration.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// URL prefixes replaced by `/` before substring matching, so that words
    /// inside backlinks do not match every line of a page.
    pub url_prefixes: Vec<String>,
}

impl From<&AppConfig> for SearchOptions {
    fn from(config: &AppConfig) -> Self {
        let url_prefixes = match config.search.index_mode {
            IndexMode::Annotated => vec![
                config.urls.reddit_wiki_prefix.clone(),
                config.urls.site_prefix.clone(),
            ],
            IndexMode::SinglePage => Vec::new(),
        };
        Self { url_prefixes }
    }
}

/// What a search produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Outcome<'a> {
    /// Matching content lines, best matches first.
    Found { lines: Vec<&'a str> },
    /// Nothing matched (section titles may still have).
    NoResults,
    /// Too many content lines to show; only section titles are reported.
    TooMany { count: usize },
}

/// Full result of one query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport<'a> {
    /// The trimmed query.
    pub query: String,
    /// Candidate count before narrowing to word-for-word matches, if the
    /// candidate limit was exceeded.
    pub narrowed_from: Option<usize>,
    /// Content result.
    #[serde(flatten)]
    pub outcome: Outcome<'a>,
    /// Matching heading lines, in encounter order.
    pub titles: Vec<&'a str>,
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Filter and rank `lines` against `query`.
///
/// Fails only when the query is empty after trimming.
#[instrument(skip(lines, opts), fields(lines = lines.len()))]
pub fn search<'a>(lines: &'a [String], query: &str, opts: &SearchOptions) -> Result<SearchReport<'a>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(WikiSiftError::validation("the search query is empty"));
    }

    let words = query_words(query);

    let mut candidates: Vec<&'a str> = if prefers_word_match(query) {
        lines
            .iter()
            .map(String::as_str)
            .filter(|line| is_word_for_word_match(line, &words))
            .collect()
    } else {
        lines
            .iter()
            .map(String::as_str)
            .filter(|line| contains_all_words(line, &words, &opts.url_prefixes))
            .collect()
    };

    let mut narrowed_from = None;
    if candidates.len() > CANDIDATE_LIMIT {
        debug!(candidates = candidates.len(), "candidate limit exceeded, keeping full-word matches");
        narrowed_from = Some(candidates.len());
        candidates.retain(|line| is_word_for_word_match(line, &words));
    }

    let ranked = bump_word_matches(candidates, &words);
    let (titles, content): (Vec<&'a str>, Vec<&'a str>) =
        ranked.into_iter().partition(|line| is_section_title(line));

    let outcome = if content.len() > RESULT_LIMIT && query != UNLIMITED_QUERY {
        Outcome::TooMany {
            count: content.len(),
        }
    } else if content.is_empty() {
        Outcome::NoResults
    } else {
        Outcome::Found { lines: content }
    };

    debug!(titles = titles.len(), ?narrowed_from, "search complete");

    Ok(SearchReport {
        query: query.to_string(),
        narrowed_from,
        outcome,
        titles,
    })
}

// ---------------------------------------------------------------------------
// Matching rules
// ---------------------------------------------------------------------------

/// Lowercased query words, split on single spaces with empty words dropped.
pub fn query_words(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(' ')
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// Very short queries and short acronyms would match inside too many words.
pub fn prefers_word_match(query: &str) -> bool {
    let chars = query.chars().count();
    chars <= SHORT_QUERY_CHARS || (query.to_uppercase() == query && chars <= ACRONYM_QUERY_CHARS)
}

/// Every word equals some token of the line.
pub fn is_word_for_word_match(line: &str, words: &[String]) -> bool {
    let lowered = line.to_lowercase().replace(['[', ']'], " ");
    let tokens: Vec<&str> = lowered
        .split(' ')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect();

    words.iter().all(|word| tokens.contains(&word.as_str()))
}

/// Every word is a substring of the line, ignoring the configured URL prefixes.
pub fn contains_all_words(line: &str, words: &[String], url_prefixes: &[String]) -> bool {
    let normalized = url_prefixes
        .iter()
        .filter(|prefix| !prefix.is_empty())
        .fold(line.to_string(), |acc, prefix| acc.replace(prefix.as_str(), "/"))
        .to_lowercase();

    words.iter().all(|word| normalized.contains(word.as_str()))
}

/// Heading lines are reported separately from content.
pub fn is_section_title(line: &str) -> bool {
    line.starts_with('#')
}

/// Stable two-bucket sort: word-for-word matches first.
fn bump_word_matches<'a>(lines: Vec<&'a str>, words: &[String]) -> Vec<&'a str> {
    let (mut bumped, rest): (Vec<&'a str>, Vec<&'a str>) = lines
        .into_iter()
        .partition(|line| is_word_for_word_match(line, words));
    bumped.extend(rest);
    bumped
}
