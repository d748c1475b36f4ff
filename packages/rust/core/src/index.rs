//! Flat line index: every configured document → annotated lines → one list.

use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument, warn};

use wikisift_fetcher::{FetchOptions, Fetcher};
use wikisift_markdown::{HeadingGrammar, annotate_lines, extract_sections};
use wikisift_shared::{DocumentSource, IndexConfig, IndexMode, Result, SourceKind};

// ---------------------------------------------------------------------------
// LineIndex
// ---------------------------------------------------------------------------

/// One complete snapshot of the wiki as searchable lines.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LineIndex {
    /// Lines in document order, documents in configuration order.
    pub lines: Vec<String>,
    /// Documents (or URLs) that could not be downloaded during this build.
    pub failed_sources: Vec<String>,
    /// How the lines were produced.
    pub mode: IndexMode,
}

impl LineIndex {
    /// Number of indexed lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the index holds no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting index build status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each document download attempt.
    fn document_fetched(&self, file: &str, current: usize, total: usize);
    /// Called when the index is complete.
    fn done(&self, index: &LineIndex);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_fetched(&self, _file: &str, _current: usize, _total: usize) {}
    fn done(&self, _index: &LineIndex) {}
}

// ---------------------------------------------------------------------------
// IndexBuilder
// ---------------------------------------------------------------------------

/// Downloads and annotates the configured documents.
pub struct IndexBuilder {
    config: IndexConfig,
    fetcher: Fetcher,
}

impl IndexBuilder {
    /// Create a builder; the HTTP client is reused across rebuilds.
    pub fn new(config: IndexConfig) -> Result<Self> {
        let fetcher = Fetcher::new(&FetchOptions {
            timeout_secs: config.timeout_secs,
            ..FetchOptions::default()
        })?;
        Ok(Self { config, fetcher })
    }

    /// The configuration this builder indexes.
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Build a fresh index.
    ///
    /// Documents are fetched one after another. A document that fails to
    /// download is logged and contributes no lines; when every download fails
    /// the index is simply empty.
    #[instrument(skip_all, fields(mode = %self.config.mode, documents = self.config.documents.len()))]
    pub async fn build(&self, progress: &dyn ProgressReporter) -> Result<LineIndex> {
        let start = Instant::now();

        let index = match self.config.mode {
            IndexMode::Annotated => self.build_annotated(progress).await?,
            IndexMode::SinglePage => self.build_single_page(progress).await?,
        };

        info!(
            lines = index.len(),
            failed = index.failed_sources.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "index built"
        );
        progress.done(&index);

        Ok(index)
    }

    async fn build_annotated(&self, progress: &dyn ProgressReporter) -> Result<LineIndex> {
        progress.phase("Downloading wiki pages");

        let total = self.config.documents.len();
        let mut lines = Vec::new();
        let mut failed_sources = Vec::new();

        for (i, source) in self.config.documents.iter().enumerate() {
            match self
                .fetcher
                .fetch_document(source, &self.config.raw_docs_prefix)
                .await
            {
                Ok(page) => {
                    let annotated = annotate_document(source, &page, &self.config);
                    info!(file = %source.file, lines = annotated.len(), "document indexed");
                    lines.extend(annotated);
                }
                Err(e) => {
                    warn!(file = %source.file, error = %e, "download failed, skipping document");
                    failed_sources.push(source.file.clone());
                }
            }
            progress.document_fetched(&source.file, i + 1, total);
        }

        if total > 0 && failed_sources.len() == total {
            warn!(total, "no document could be downloaded, index is empty");
        }

        Ok(LineIndex {
            lines,
            failed_sources,
            mode: IndexMode::Annotated,
        })
    }

    async fn build_single_page(&self, progress: &dyn ProgressReporter) -> Result<LineIndex> {
        progress.phase("Downloading single-page wiki");

        let url = &self.config.single_page_url;
        let (lines, failed_sources) = match self.fetcher.fetch_single_page(url).await {
            Ok(page) => (raw_lines(&page), Vec::new()),
            Err(e) => {
                warn!(url = %url, error = %e, "download failed, index is empty");
                (Vec::new(), vec![url.clone()])
            }
        };
        progress.document_fetched(url, 1, 1);

        Ok(LineIndex {
            lines,
            failed_sources,
            mode: IndexMode::SinglePage,
        })
    }
}

// ---------------------------------------------------------------------------
// Per-document processing
// ---------------------------------------------------------------------------

/// Turn one downloaded page into index lines according to its source kind.
pub fn annotate_document(source: &DocumentSource, page: &str, config: &IndexConfig) -> Vec<String> {
    match &source.kind {
        SourceKind::Wiki => {
            let slug = source.page_slug();
            annotate_lines(
                page.split('\n'),
                &source.icon,
                &config.site_prefix,
                &slug,
                HeadingGrammar::for_page(&slug),
            )
        }
        SourceKind::Base64 { page_url } => extract_sections(page, page_url, config.decode_base64),
        SourceKind::Mirror { link_url, .. } => annotate_lines(
            page.split('\n'),
            &source.icon,
            "",
            link_url,
            HeadingGrammar::Glyph,
        ),
    }
}

/// Non-blank lines of a raw page, unmodified.
fn raw_lines(page: &str) -> Vec<String> {
    page.split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use wikisift_shared::AppConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, documents: Vec<DocumentSource>) -> IndexConfig {
        let mut config = IndexConfig::from(&AppConfig::default());
        config.documents = documents;
        config.raw_docs_prefix = format!("{}/docs/", server.uri());
        config.site_prefix = "https://wiki.example/".into();
        config.single_page_url = format!("{}/single-page", server.uri());
        config.timeout_secs = 5;
        config
    }

    async fn serve(server: &MockServer, at: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[test]
    fn wiki_page_uses_slug_for_links_and_grammar() {
        let config = IndexConfig::from(&AppConfig::default());
        let src = DocumentSource::wiki("STORAGE.md", "🗄️", "storage");
        let lines = annotate_document(&src, "## Cloud\n* box\n", &config);
        assert_eq!(lines, vec!["[🗄️/ Cloud ](https://fmhy.net/storage#cloud) ► box"]);
    }

    #[test]
    fn mirror_links_to_absolute_page() {
        let config = IndexConfig::from(&AppConfig::default());
        let src = DocumentSource {
            file: "NSFWPiracy.md".into(),
            icon: "🌶".into(),
            section: "nsfw".into(),
            kind: SourceKind::Mirror {
                fetch_url: "https://mirror.example/raw".into(),
                link_url: "https://mirror.example/wiki".into(),
            },
        };
        let lines = annotate_document(&src, "# ► Art\n* gallery", &config);
        assert_eq!(lines, vec!["[🌶/ Art ](https://mirror.example/wiki#art) ► gallery"]);
    }

    #[test]
    fn base64_page_uses_fixed_pretext() {
        let mut config = IndexConfig::from(&AppConfig::default());
        config.decode_base64 = false;
        let src = DocumentSource {
            file: "base64.md".into(),
            icon: "🔑".into(),
            section: "base64".into(),
            kind: SourceKind::Base64 {
                page_url: "https://paste.example/b64".into(),
            },
        };
        let lines = annotate_document(&src, "one\n***\ntwo", &config);
        assert_eq!(
            lines,
            vec![
                "[🔑Base64](https://paste.example/b64) ► one",
                "[🔑Base64](https://paste.example/b64) ► two",
            ]
        );
    }

    #[tokio::test]
    async fn failed_document_is_skipped_and_order_is_kept() {
        let server = MockServer::start().await;
        serve(&server, "/docs/a.md", "# ► First\n* alpha").await;
        serve(&server, "/docs/c.md", "# ► Third\n* gamma").await;
        Mock::given(method("GET"))
            .and(path("/docs/b.md"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let config = config_for(
            &server,
            vec![
                DocumentSource::wiki("A.md", "1", "a"),
                DocumentSource::wiki("B.md", "2", "b"),
                DocumentSource::wiki("C.md", "3", "c"),
            ],
        );
        let builder = IndexBuilder::new(config).unwrap();
        let index = builder.build(&SilentProgress).await.unwrap();

        assert_eq!(
            index.lines,
            vec![
                "[1/ First ](https://wiki.example/a#first) ► alpha",
                "[3/ Third ](https://wiki.example/c#third) ► gamma",
            ]
        );
        assert_eq!(index.failed_sources, vec!["B.md"]);
        assert_eq!(index.mode, IndexMode::Annotated);
    }

    #[tokio::test]
    async fn all_documents_failing_yields_empty_index() {
        let server = MockServer::start().await;
        let config = config_for(
            &server,
            vec![
                DocumentSource::wiki("A.md", "1", "a"),
                DocumentSource::wiki("B.md", "2", "b"),
            ],
        );
        let builder = IndexBuilder::new(config).unwrap();

        let index = builder.build(&SilentProgress).await.unwrap();
        assert!(index.is_empty());
        assert_eq!(index.failed_sources, vec!["A.md", "B.md"]);
    }

    #[tokio::test]
    async fn single_page_failure_yields_empty_index() {
        let server = MockServer::start().await;
        let mut config = config_for(&server, Vec::new());
        config.mode = IndexMode::SinglePage;
        let url = config.single_page_url.clone();
        let builder = IndexBuilder::new(config).unwrap();

        let index = builder.build(&SilentProgress).await.unwrap();
        assert!(index.is_empty());
        assert_eq!(index.failed_sources, vec![url]);
    }

    #[tokio::test]
    async fn single_page_mode_keeps_headings() {
        let server = MockServer::start().await;
        serve(&server, "/single-page", "# ► Movies\r\n\r\n* Site A\r\n").await;

        let mut config = config_for(&server, Vec::new());
        config.mode = IndexMode::SinglePage;
        let builder = IndexBuilder::new(config).unwrap();
        let index = builder.build(&SilentProgress).await.unwrap();

        assert_eq!(index.lines, vec!["# ► Movies", "* Site A"]);
        assert_eq!(index.mode, IndexMode::SinglePage);
    }
}
