//! Core domain types for wikisift document sources.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SourceKind
// ---------------------------------------------------------------------------

/// Where a document is fetched from and how its lines are produced.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SourceKind {
    /// A wiki page on the raw-docs host, annotated by heading grammar.
    #[default]
    Wiki,
    /// The paste-service page of `***`-separated sections with encoded links.
    Base64 {
        /// Human-facing page URL; the raw text lives at `<page_url>/raw`.
        page_url: String,
    },
    /// A page mirrored elsewhere, annotated with the default grammar.
    Mirror {
        /// Raw endpoint to download.
        fetch_url: String,
        /// Page URL used as the backlink target.
        link_url: String,
    },
}

// ---------------------------------------------------------------------------
// DocumentSource
// ---------------------------------------------------------------------------

/// A `[[documents]]` entry: one page of the wiki.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSource {
    /// File name on the raw-docs host (e.g. `VideoPiracyGuide.md`).
    pub file: String,
    /// Icon shown at the start of every annotated line.
    pub icon: String,
    /// Short identifier (e.g. `video`).
    pub section: String,
    /// Fetch/processing strategy.
    #[serde(default)]
    pub kind: SourceKind,
}

impl DocumentSource {
    /// Build a wiki source.
    pub fn wiki(file: &str, icon: &str, section: &str) -> Self {
        Self {
            file: file.into(),
            icon: icon.into(),
            section: section.into(),
            kind: SourceKind::Wiki,
        }
    }

    /// Page slug on the target site: the file name without `.md`, lowercased.
    ///
    /// `Non-English.md` → `non-english`.
    pub fn page_slug(&self) -> String {
        self.file.replace(".md", "").to_lowercase()
    }
}

// ---------------------------------------------------------------------------
// IndexMode
// ---------------------------------------------------------------------------

/// How the flat line index is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndexMode {
    /// Per-document download with backlink pretexts on every line.
    #[default]
    Annotated,
    /// One download of the whole wiki as raw markdown; headings are kept.
    SinglePage,
}

impl std::fmt::Display for IndexMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Annotated => write!(f, "annotated"),
            Self::SinglePage => write!(f, "single-page"),
        }
    }
}
