//! Application configuration for wikisift.
//!
//! User config lives at `~/.wikisift/wikisift.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WikiSiftError};
use crate::types::{DocumentSource, IndexMode, SourceKind};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "wikisift.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".wikisift";

// ---------------------------------------------------------------------------
// Config structs (matching wikisift.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Search and display behaviour.
    #[serde(default)]
    pub search: SearchConfig,

    /// Remote locations.
    #[serde(default)]
    pub urls: UrlsConfig,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Documents to index, in display order.
    #[serde(default = "default_documents")]
    pub documents: Vec<DocumentSource>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            urls: UrlsConfig::default(),
            http: HttpConfig::default(),
            documents: default_documents(),
        }
    }
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Decode base64 payloads found in backtick spans.
    #[serde(default = "default_true")]
    pub decode_base64: bool,

    /// Print results inside a markdown code block instead of as rendered text.
    #[serde(default)]
    pub print_raw_markdown: bool,

    /// Seconds an index stays valid before the next access rebuilds it.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Indexing strategy.
    #[serde(default)]
    pub index_mode: IndexMode,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            decode_base64: true,
            print_raw_markdown: false,
            cache_ttl_secs: default_cache_ttl(),
            index_mode: IndexMode::default(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_cache_ttl() -> u64 {
    43_200
}

/// `[urls]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlsConfig {
    /// Prefix of the raw markdown host; the lowercased file name is appended.
    #[serde(default = "default_raw_docs_prefix")]
    pub raw_docs_prefix: String,

    /// Prefix of the rendered wiki site, used for backlinks.
    #[serde(default = "default_site_prefix")]
    pub site_prefix: String,

    /// Prefix of the legacy wiki; only used to normalise lines for matching.
    #[serde(default = "default_reddit_wiki_prefix")]
    pub reddit_wiki_prefix: String,

    /// The whole wiki as one raw markdown document.
    #[serde(default = "default_single_page_url")]
    pub single_page_url: String,
}

impl Default for UrlsConfig {
    fn default() -> Self {
        Self {
            raw_docs_prefix: default_raw_docs_prefix(),
            site_prefix: default_site_prefix(),
            reddit_wiki_prefix: default_reddit_wiki_prefix(),
            single_page_url: default_single_page_url(),
        }
    }
}

fn default_raw_docs_prefix() -> String {
    "https://raw.githubusercontent.com/fmhy/FMHYedit/main/docs/".into()
}
fn default_site_prefix() -> String {
    "https://fmhy.net/".into()
}
fn default_reddit_wiki_prefix() -> String {
    "https://www.reddit.com/r/FREEMEDIAHECKYEAH/wiki/".into()
}
fn default_single_page_url() -> String {
    "https://api.fmhy.net/single-page".into()
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// The built-in document list, in the order results are displayed.
pub fn default_documents() -> Vec<DocumentSource> {
    let mut docs: Vec<DocumentSource> = [
        ("VideoPiracyGuide.md", "📺", "video"),
        ("AI.md", "🤖", "ai"),
        ("Android-iOSGuide.md", "📱", "android"),
        ("AudioPiracyGuide.md", "🎵", "audio"),
        ("DownloadPiracyGuide.md", "💾", "download"),
        ("EDUPiracyGuide.md", "🧠", "edu"),
        ("GamingPiracyGuide.md", "🎮", "games"),
        ("AdblockVPNGuide.md", "📛", "adblock-vpn-privacy"),
        ("System-Tools.md", "💻", "system-tools"),
        ("File-Tools.md", "🗃️", "file-tools"),
        ("Internet-Tools.md", "🔗", "internet-tools"),
        ("Social-Media-Tools.md", "💬", "social-media"),
        ("Text-Tools.md", "📝", "text-tools"),
        ("Video-Tools.md", "📼", "video-tools"),
        ("MISCGuide.md", "📂", "misc"),
        ("ReadingPiracyGuide.md", "📗", "reading"),
        ("TorrentPiracyGuide.md", "🌀", "torrent"),
        ("img-tools.md", "📷", "img-tools"),
        ("gaming-tools.md", "👾", "gaming-tools"),
        ("LinuxGuide.md", "🐧🍏", "linux"),
        ("DEVTools.md", "🖥️", "dev-tools"),
        ("Non-English.md", "🌏", "non-eng"),
        ("STORAGE.md", "🗄️", "storage"),
    ]
    .into_iter()
    .map(|(file, icon, section)| DocumentSource::wiki(file, icon, section))
    .collect();

    docs.push(DocumentSource {
        file: "base64.md".into(),
        icon: "🔑".into(),
        section: "base64".into(),
        kind: SourceKind::Base64 {
            page_url: "https://rentry.co/FMHYBase64".into(),
        },
    });
    docs.push(DocumentSource {
        file: "NSFWPiracy.md".into(),
        icon: "🌶".into(),
        section: "nsfw".into(),
        kind: SourceKind::Mirror {
            fetch_url: "https://rentry.co/freemediafuckyeah/raw".into(),
            link_url: "https://saidit.net/s/freemediafuckyeah/wiki/index".into(),
        },
    });

    docs
}

// ---------------------------------------------------------------------------
// Index config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime indexing configuration, merged from the config file and CLI flags.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Documents to fetch, in order.
    pub documents: Vec<DocumentSource>,
    /// Raw markdown host prefix.
    pub raw_docs_prefix: String,
    /// Rendered site prefix used in backlinks.
    pub site_prefix: String,
    /// Whole-wiki raw endpoint for [`IndexMode::SinglePage`].
    pub single_page_url: String,
    /// Indexing strategy.
    pub mode: IndexMode,
    /// Decode base64 payloads in the base64 page.
    pub decode_base64: bool,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
}

impl From<&AppConfig> for IndexConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            documents: config.documents.clone(),
            raw_docs_prefix: config.urls.raw_docs_prefix.clone(),
            site_prefix: config.urls.site_prefix.clone(),
            single_page_url: config.urls.single_page_url.clone(),
            mode: config.search.index_mode,
            decode_base64: config.search.decode_base64,
            timeout_secs: config.http.timeout_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.wikisift/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| WikiSiftError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.wikisift/wikisift.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| WikiSiftError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        WikiSiftError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    if config.documents.is_empty() && config.search.index_mode == IndexMode::Annotated {
        return Err(WikiSiftError::config(format!(
            "{}: no [[documents]] configured",
            path.display()
        )));
    }

    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    init_config_at(&config_file_path()?)
}

/// Write the default config to `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<PathBuf> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| WikiSiftError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| WikiSiftError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| WikiSiftError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path.to_path_buf())
}
