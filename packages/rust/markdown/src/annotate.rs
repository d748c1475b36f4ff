//! Backlink annotation for wiki pages.
//!
//! Each content line gets a pretext of the form
//! `[<icon><category><subcategory>](<base><path><anchor>) ► `, derived from
//! the most recent headings above it. Heading context is threaded through the
//! page as an accumulator; nothing is shared between pages.

use tracing::trace;

// ---------------------------------------------------------------------------
// HeadingGrammar
// ---------------------------------------------------------------------------

/// Heading syntax of a wiki page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingGrammar {
    /// `# ►` categories and `## ▷` subcategories; both set the anchor.
    Glyph,
    /// Like [`HeadingGrammar::Glyph`], but subcategories keep the category
    /// anchor. Used where subcategory names repeat across sections.
    GlyphSectionAnchor,
    /// Plain `## ` categories and `### ` subcategories.
    Hash,
}

impl HeadingGrammar {
    /// Select the grammar for a page slug (file name without `.md`, lowercased).
    pub fn for_page(slug: &str) -> Self {
        match slug {
            "storage" => Self::Hash,
            "non-english" => Self::GlyphSectionAnchor,
            _ => Self::Glyph,
        }
    }

    /// `(category marker, subcategory marker)`.
    fn markers(self) -> (&'static str, &'static str) {
        match self {
            Self::Glyph | Self::GlyphSectionAnchor => ("# ►", "## ▷"),
            Self::Hash => ("## ", "### "),
        }
    }

    fn subcategory_sets_anchor(self) -> bool {
        !matches!(self, Self::GlyphSectionAnchor)
    }
}

// ---------------------------------------------------------------------------
// HeadingContext
// ---------------------------------------------------------------------------

/// Running heading state while walking down a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadingContext {
    /// URL fragment including the leading `#`, or empty before any heading.
    pub anchor: String,
    /// Category breadcrumb (`/ Movies `), or empty.
    pub category: String,
    /// Subcategory breadcrumb (`/ 4K `), or empty.
    pub subcategory: String,
}

impl HeadingContext {
    /// Fold one heading line into the context.
    ///
    /// Headings that match neither marker of `grammar` leave it unchanged.
    pub fn advance(mut self, heading: &str, grammar: HeadingGrammar) -> Self {
        let (category_marker, subcategory_marker) = grammar.markers();

        if let Some(text) = heading.strip_prefix(category_marker) {
            self.anchor = heading_anchor(text);
            self.category = breadcrumb_label(text);
            self.subcategory.clear();
        } else if let Some(text) = heading.strip_prefix(subcategory_marker) {
            if grammar.subcategory_sets_anchor() {
                self.anchor = heading_anchor(text);
            }
            self.subcategory = breadcrumb_label(text);
        } else {
            trace!(heading, "heading does not match grammar, ignored");
        }

        self
    }

    /// The markdown link placed in front of a content line.
    pub fn pretext(&self, icon: &str, base_url: &str, path: &str) -> String {
        format!(
            "[{icon}{}{}]({base_url}{path}{}) ► ",
            self.category, self.subcategory, self.anchor
        )
    }
}

/// Derive a URL fragment from heading text (marker already removed).
///
/// `"Video Streaming / Sites"` → `"#video-streaming-sites"`.
pub fn heading_anchor(text: &str) -> String {
    let slug = text.trim().replace(" / ", "-").replace(' ', "-").to_lowercase();
    format!("#{slug}")
}

/// Breadcrumb label for heading text (marker already removed).
///
/// Labels containing a link are dropped entirely: a URL inside the link text
/// of the pretext breaks the markdown.
pub fn breadcrumb_label(text: &str) -> String {
    let label = format!("/ {} ", text.trim());
    if label.contains("http") {
        String::new()
    } else {
        label
    }
}

/// Annotate the lines of one page.
///
/// Heading lines (starting with `#`) only update the context and are not
/// emitted. Other lines are kept when they contain an alphabetic character;
/// a leading `* ` bullet is removed.
pub fn annotate_lines<'a>(
    lines: impl IntoIterator<Item = &'a str>,
    icon: &str,
    base_url: &str,
    path: &str,
    grammar: HeadingGrammar,
) -> Vec<String> {
    let (_, annotated) = lines.into_iter().fold(
        (HeadingContext::default(), Vec::new()),
        |(context, mut annotated), line| {
            if line.starts_with('#') {
                return (context.advance(line, grammar), annotated);
            }
            if line.chars().any(char::is_alphabetic) {
                let content = line.strip_prefix("* ").unwrap_or(line);
                annotated.push(format!("{}{content}", context.pretext(icon, base_url, path)));
            }
            (context, annotated)
        },
    );

    annotated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_and_breadcrumb_from_glyph_heading() {
        let ctx = HeadingContext::default()
            .advance("# ► Video Streaming / Sites", HeadingGrammar::Glyph);
        assert_eq!(ctx.anchor, "#video-streaming-sites");
        assert_eq!(ctx.category, "/ Video Streaming / Sites ");
        assert_eq!(ctx.subcategory, "");
    }

    #[test]
    fn anchor_is_deterministic() {
        assert_eq!(heading_anchor(" Live TV / Sports "), heading_anchor("Live TV / Sports"));
        assert_eq!(heading_anchor("Live TV / Sports"), "#live-tv-sports");
    }

    #[test]
    fn annotates_categories_and_subcategories() {
        let lines = ["# ► Movies", "* Site A", "## ▷ 4K", "* Site B"];
        let out = annotate_lines(lines, "📺", "https://x/", "video", HeadingGrammar::Glyph);
        assert_eq!(
            out,
            vec![
                "[📺/ Movies ](https://x/video#movies) ► Site A",
                "[📺/ Movies / 4K ](https://x/video#4k) ► Site B",
            ]
        );
    }

    #[test]
    fn new_category_resets_subcategory() {
        let lines = ["# ► A", "## ▷ Sub", "# ► B", "* item"];
        let out = annotate_lines(lines, "", "https://x/", "p", HeadingGrammar::Glyph);
        assert_eq!(out, vec!["[/ B ](https://x/p#b) ► item"]);
    }

    #[test]
    fn section_anchor_grammar_keeps_category_anchor() {
        let lines = ["# ► Russian", "## ▷ Streaming", "* site"];
        let out = annotate_lines(
            lines,
            "🌏",
            "https://x/",
            "non-english",
            HeadingGrammar::GlyphSectionAnchor,
        );
        assert_eq!(
            out,
            vec!["[🌏/ Russian / Streaming ](https://x/non-english#russian) ► site"]
        );
    }

    #[test]
    fn hash_grammar_uses_plain_markers() {
        let lines = ["# Storage", "## Cloud Storage", "* a", "### File Hosting", "* b"];
        let out = annotate_lines(lines, "🗄️", "https://x/", "storage", HeadingGrammar::Hash);
        assert_eq!(
            out,
            vec![
                "[🗄️/ Cloud Storage ](https://x/storage#cloud-storage) ► a",
                "[🗄️/ Cloud Storage / File Hosting ](https://x/storage#file-hosting) ► b",
            ]
        );
    }

    #[test]
    fn glyph_markers_are_ignored_by_hash_grammar_and_vice_versa() {
        let ctx = HeadingContext::default().advance("# ► Movies", HeadingGrammar::Hash);
        assert_eq!(ctx, HeadingContext::default());

        let ctx = HeadingContext::default().advance("## Cloud", HeadingGrammar::Glyph);
        assert_eq!(ctx, HeadingContext::default());
    }

    #[test]
    fn labels_with_links_are_dropped() {
        let lines = ["# ► [Docs](https://example.com)", "* entry"];
        let out = annotate_lines(lines, "📂", "https://x/", "misc", HeadingGrammar::Glyph);
        assert_eq!(out, vec!["[📂](https://x/misc#[docs](https://example.com)) ► entry"]);
    }

    #[test]
    fn subcategory_labels_with_links_are_dropped_but_move_the_anchor() {
        let lines = [
            "# ► Tools",
            "## ▷ Old",
            "* a",
            "## ▷ [Guide](https://g.example)",
            "* b",
        ];
        let out = annotate_lines(lines, "🧰", "https://x/", "misc", HeadingGrammar::Glyph);
        assert_eq!(
            out,
            vec![
                "[🧰/ Tools / Old ](https://x/misc#old) ► a",
                "[🧰/ Tools ](https://x/misc#[guide](https://g.example)) ► b",
            ]
        );
    }

    #[test]
    fn lines_without_letters_are_dropped() {
        let lines = ["", "***", "  ", "123 - 456", "* ok"];
        let out = annotate_lines(lines, "", "b/", "p", HeadingGrammar::Glyph);
        assert_eq!(out, vec!["[](b/p) ► ok"]);
    }

    #[test]
    fn only_leading_bullet_is_stripped() {
        let lines = ["** bold", "* * nested"];
        let out = annotate_lines(lines, "", "b/", "p", HeadingGrammar::Glyph);
        assert_eq!(out, vec!["[](b/p) ► ** bold", "[](b/p) ► * nested"]);
    }

    #[test]
    fn grammar_selection_by_page() {
        assert_eq!(HeadingGrammar::for_page("storage"), HeadingGrammar::Hash);
        assert_eq!(
            HeadingGrammar::for_page("non-english"),
            HeadingGrammar::GlyphSectionAnchor
        );
        assert_eq!(HeadingGrammar::for_page("videopiracyguide"), HeadingGrammar::Glyph);
    }
}
