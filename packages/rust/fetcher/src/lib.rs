//! Raw markdown download for wiki documents.
//!
//! Every configured [`DocumentSource`] resolves to exactly one URL. Documents
//! are fetched one at a time with a single attempt each; callers decide what
//! a failure means (the index builder treats it as "no lines").

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use wikisift_shared::{DocumentSource, Result, SourceKind, WikiSiftError};

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Default timeout in seconds for a single document.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum response size we accept (32 MB; the single-page dump is the largest).
const MAX_RESPONSE_SIZE: u64 = 32 * 1024 * 1024;

/// User-Agent string for document requests.
const USER_AGENT: &str = concat!("wikisift/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
    /// Largest body accepted, whether or not the server announces a length.
    pub max_response_bytes: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_response_bytes: MAX_RESPONSE_SIZE,
        }
    }
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Plain-text HTTP downloader shared by all documents of one index build.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_response_bytes: u64,
}

impl Fetcher {
    /// Create a fetcher with the given options.
    pub fn new(opts: &FetchOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| WikiSiftError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_response_bytes: opts.max_response_bytes,
        })
    }

    /// Download the raw text of one configured document.
    ///
    /// Pages served by the paste service and the mirror use CRLF line
    /// endings; carriage returns are stripped for those.
    #[instrument(skip_all, fields(file = %source.file))]
    pub async fn fetch_document(
        &self,
        source: &DocumentSource,
        raw_docs_prefix: &str,
    ) -> Result<String> {
        let url = document_url(source, raw_docs_prefix)?;
        let body = self.fetch_text(url.as_str()).await?;

        Ok(match source.kind {
            SourceKind::Wiki => body,
            SourceKind::Base64 { .. } | SourceKind::Mirror { .. } => strip_carriage_returns(&body),
        })
    }

    /// Download the whole wiki as a single markdown document.
    #[instrument(skip(self))]
    pub async fn fetch_single_page(&self, url: &str) -> Result<String> {
        let url = parse_url(url)?;
        let body = self.fetch_text(url.as_str()).await?;
        Ok(strip_carriage_returns(&body))
    }

    /// GET a URL and return its body as text. Non-2xx statuses are errors.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!(url, "downloading");

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WikiSiftError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WikiSiftError::Network(format!("{url}: HTTP {status}")));
        }

        let limit = self.max_response_bytes;
        if let Some(len) = response.content_length() {
            if len > limit {
                return Err(too_large(url, len, limit));
            }
        }

        // Chunked responses carry no length; enforce the cap while reading.
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| WikiSiftError::Network(format!("{url}: failed to read body: {e}")))?
        {
            bytes.extend_from_slice(&chunk);
            let read = bytes.len() as u64;
            if read > limit {
                return Err(too_large(url, read, limit));
            }
        }

        let body = String::from_utf8_lossy(&bytes).into_owned();
        debug!(url, bytes = body.len(), "downloaded");
        Ok(body)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve the download URL of a document.
///
/// - wiki pages: `<raw_docs_prefix><lowercased file name>`
/// - base64 page: `<page_url>/raw`
/// - mirror: `fetch_url` as configured
pub fn document_url(source: &DocumentSource, raw_docs_prefix: &str) -> Result<Url> {
    match &source.kind {
        SourceKind::Wiki => parse_url(&format!("{raw_docs_prefix}{}", source.file.to_lowercase())),
        SourceKind::Base64 { page_url } => {
            parse_url(&format!("{}/raw", page_url.trim_end_matches('/')))
        }
        SourceKind::Mirror { fetch_url, .. } => parse_url(fetch_url),
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| WikiSiftError::validation(format!("invalid URL '{raw}': {e}")))
}

fn too_large(url: &str, len: u64, limit: u64) -> WikiSiftError {
    WikiSiftError::validation(format!(
        "{url}: response too large ({len} bytes, max {limit})"
    ))
}

fn strip_carriage_returns(text: &str) -> String {
    text.replace('\r', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Fetcher {
        Fetcher::new(&FetchOptions {
            timeout_secs: 5,
            ..FetchOptions::default()
        })
        .unwrap()
    }

    #[test]
    fn wiki_url_uses_lowercased_file_name() {
        let src = DocumentSource::wiki("VideoPiracyGuide.md", "📺", "video");
        let url = document_url(&src, "https://raw.example.com/docs/").unwrap();
        assert_eq!(url.as_str(), "https://raw.example.com/docs/videopiracyguide.md");
    }

    #[test]
    fn base64_url_appends_raw() {
        let src = DocumentSource {
            file: "base64.md".into(),
            icon: "🔑".into(),
            section: "base64".into(),
            kind: SourceKind::Base64 {
                page_url: "https://paste.example.com/FMHYBase64/".into(),
            },
        };
        let url = document_url(&src, "https://unused/").unwrap();
        assert_eq!(url.as_str(), "https://paste.example.com/FMHYBase64/raw");
    }

    #[test]
    fn invalid_prefix_is_a_validation_error() {
        let src = DocumentSource::wiki("AI.md", "🤖", "ai");
        let err = document_url(&src, "not a url/").unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn fetch_wiki_document_keeps_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/docs/ai.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# ► Chatbots\r\n* Site\r\n"))
            .mount(&server)
            .await;

        let src = DocumentSource::wiki("AI.md", "🤖", "ai");
        let body = fetcher()
            .fetch_document(&src, &format!("{}/docs/", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "# ► Chatbots\r\n* Site\r\n");
    }

    #[tokio::test]
    async fn fetch_mirror_strips_carriage_returns() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mirror/raw"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# ► A\r\n* b\r\n"))
            .mount(&server)
            .await;

        let src = DocumentSource {
            file: "NSFWPiracy.md".into(),
            icon: "🌶".into(),
            section: "nsfw".into(),
            kind: SourceKind::Mirror {
                fetch_url: format!("{}/mirror/raw", server.uri()),
                link_url: "https://mirror.example.com/wiki".into(),
            },
        };
        let body = fetcher().fetch_document(&src, "https://unused/").await.unwrap();
        assert_eq!(body, "# ► A\n* b\n");
    }

    #[tokio::test]
    async fn http_error_status_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/docs/missing.md"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let src = DocumentSource::wiki("Missing.md", "❓", "missing");
        let err = fetcher()
            .fetch_document(&src, &format!("{}/docs/", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, WikiSiftError::Network(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn single_page_strips_carriage_returns() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/single-page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Title\r\nline\r\n"))
            .mount(&server)
            .await;

        let body = fetcher()
            .fetch_single_page(&format!("{}/single-page", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "# Title\nline\n");
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/big.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(64)))
            .mount(&server)
            .await;

        let small = Fetcher::new(&FetchOptions {
            timeout_secs: 5,
            max_response_bytes: 16,
        })
        .unwrap();
        let err = small
            .fetch_text(&format!("{}/big.md", server.uri()))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("too large"));
    }

    #[tokio::test]
    async fn body_at_the_limit_is_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("y".repeat(16)))
            .mount(&server)
            .await;

        let small = Fetcher::new(&FetchOptions {
            timeout_secs: 5,
            max_response_bytes: 16,
        })
        .unwrap();
        let body = small.fetch_text(&format!("{}/ok.md", server.uri())).await.unwrap();
        assert_eq!(body.len(), 16);
    }
}
