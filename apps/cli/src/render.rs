//! Text rendering of search reports.

use std::fmt::Write as _;

use wikisift_core::search::{Outcome, SearchReport};
use wikisift_shared::AppConfig;

/// Results at or below this count get a "not what you were looking for" hint.
const FEW_RESULTS: usize = 10;

/// How results are printed.
#[derive(Debug, Clone)]
pub(crate) struct RenderOptions {
    /// Wrap result lines in a markdown code fence.
    pub raw_markdown: bool,
    /// Link given for finding section titles in the full wiki.
    pub raw_page_url: String,
    /// Rendered wiki site prefix, used in help links.
    pub site_prefix: String,
}

impl From<&AppConfig> for RenderOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            raw_markdown: config.search.print_raw_markdown,
            raw_page_url: config.urls.single_page_url.clone(),
            site_prefix: config.urls.site_prefix.clone(),
        }
    }
}

/// Render a complete report.
pub(crate) fn render_report(report: &SearchReport<'_>, opts: &RenderOptions) -> String {
    let mut out = String::new();

    if let Some(count) = report.narrowed_from {
        let _ = writeln!(out, "Too many results ({count}). Showing only full-word matches.");
    }

    match &report.outcome {
        Outcome::TooMany { count } => {
            out.push_str(&warning(&format!("Too many results ({count}).")));
            render_titles(&mut out, &report.titles, "There are these section titles in the Wiki:", opts);
        }
        Outcome::NoResults => {
            let _ = writeln!(out, "No results found for {}!", report.query);
            out.push_str(&notice(&failed_search_hint(opts)));
            render_titles(&mut out, &report.titles, "Also there are these section titles in the Wiki:", opts);
        }
        Outcome::Found { lines } => {
            let _ = writeln!(out, "{} search results for {}:\n", lines.len(), report.query);
            let body = lines.join("\n\n");
            if opts.raw_markdown {
                out.push_str(&code_block(&body));
            } else {
                let _ = writeln!(out, "{body}");
            }
            render_titles(&mut out, &report.titles, "Also there are these section titles in the Wiki:", opts);

            if lines.len() <= FEW_RESULTS {
                let _ = writeln!(out, "\nNot what you were looking for?");
                out.push_str(&notice(&failed_search_hint(opts)));
            }
        }
    }

    out
}

/// A warning line.
pub(crate) fn warning(msg: &str) -> String {
    format!("⚠️  {msg}\n")
}

/// An informational line.
pub(crate) fn notice(msg: &str) -> String {
    format!("ℹ️  {msg}\n")
}

fn render_titles(out: &mut String, titles: &[&str], heading: &str, opts: &RenderOptions) {
    if titles.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{heading}");
    out.push_str(&code_block(&titles.join("\n\n")));
    let _ = writeln!(
        out,
        "Find them by searching the raw markdown: {}",
        opts.raw_page_url
    );
}

fn code_block(body: &str) -> String {
    format!("```markdown\n{body}\n```\n")
}

fn failed_search_hint(opts: &RenderOptions) -> String {
    let site = &opts.site_prefix;
    format!(
        "For specific media or software, try a [CSE]({site}internet-tools#search-tools) \
         / Live Sports [here]({site}videopiracyguide#live-tv-sports) \
         / Ask in [Discord](https://www.reddit.com/r/FREEMEDIAHECKYEAH/comments/17f8msf/public_discord_server/)"
    )
}
