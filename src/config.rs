//! Configuration for the harvest-and-acquire pipeline.
//!
//! Everything the pipeline waits on or bounds itself by (settle delay, page
//! count limits, per-item deadlines, poll interval, result cap) is a tunable
//! here rather than a constant, so the same engine serves small interactive
//! runs and larger batch runs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::browser::BrowserEngineConfig;

/// Rule for locating one field inside a result element.
///
/// All elements matching `selector` are queried within the result element;
/// when `marker` is set, the first element whose text contains the marker
/// wins. This mirrors text-content matching on sites whose class names are
/// build artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRule {
    pub selector: String,
    #[serde(default)]
    pub marker: Option<String>,
}

impl FieldRule {
    pub fn new(selector: &str, marker: Option<&str>) -> Self {
        Self {
            selector: selector.to_string(),
            marker: marker.map(|m| m.to_string()),
        }
    }
}

/// Extraction rules for one search result element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRules {
    /// Selector matching one result element on a rendered page.
    #[serde(default = "default_result_selector")]
    pub result: String,
    /// Link element carrying the document URL and title, within a result.
    #[serde(default = "default_link_selector")]
    pub link: String,
    /// View count field.
    #[serde(default = "default_views_rule")]
    pub views: FieldRule,
    /// Page count field.
    #[serde(default = "default_pages_rule")]
    pub pages: FieldRule,
    /// Upload date container; the date follows the last "le" in its text.
    #[serde(default = "default_date_rule")]
    pub upload_date: FieldRule,
}

fn default_result_selector() -> String {
    "article[class*='ListItem-module_wrapper']".to_string()
}

fn default_link_selector() -> String {
    "a[href*='/document/']".to_string()
}

fn default_views_rule() -> FieldRule {
    FieldRule::new("p", Some("vues"))
}

fn default_pages_rule() -> FieldRule {
    FieldRule::new("p", Some("pages"))
}

fn default_date_rule() -> FieldRule {
    FieldRule::new("div[class*='authorDateCategories']", None)
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            result: default_result_selector(),
            link: default_link_selector(),
            views: default_views_rule(),
            pages: default_pages_rule(),
            upload_date: default_date_rule(),
        }
    }
}

/// Search catalog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base search URL; query, filters and page number are appended.
    #[serde(default = "default_search_base_url")]
    pub base_url: String,
    /// Language codes embedded in the filter clause.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// File types embedded in the filter clause.
    #[serde(default = "default_file_types")]
    pub file_types: Vec<String>,
    /// Page-count range filter, e.g. "4-100".
    #[serde(default = "default_page_length")]
    pub page_length: String,
    /// Seconds to let a result page settle before querying it.
    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: u64,
    /// Extraction rules for result elements.
    #[serde(default)]
    pub rules: ExtractionRules,
}

fn default_search_base_url() -> String {
    "https://fr.scribd.com/search".to_string()
}

fn default_languages() -> Vec<String> {
    vec!["5".to_string()]
}

fn default_file_types() -> Vec<String> {
    vec!["pdf".to_string()]
}

fn default_page_length() -> String {
    "4-100".to_string()
}

fn default_settle_delay_secs() -> u64 {
    3
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_search_base_url(),
            languages: default_languages(),
            file_types: default_file_types(),
            page_length: default_page_length(),
            settle_delay_secs: default_settle_delay_secs(),
            rules: ExtractionRules::default(),
        }
    }
}

/// Ranking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankConfig {
    /// Maximum number of ranked records kept.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    50
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
        }
    }
}

/// Conversion/download site configuration and acquisition bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquireConfig {
    /// Converter page the document links are submitted to.
    #[serde(default = "default_converter_url")]
    pub converter_url: String,
    /// Input field receiving the document link.
    #[serde(default = "default_input_selector")]
    pub input_selector: String,
    /// Trigger element starting the conversion.
    #[serde(default = "default_trigger_selector")]
    pub trigger_selector: String,
    /// In-progress indicator that must clear before the file appears.
    #[serde(default = "default_busy_selector")]
    pub busy_selector: String,
    /// Seconds to wait for each UI affordance before the item fails.
    #[serde(default = "default_affordance_timeout_secs")]
    pub affordance_timeout_secs: u64,
    /// End-to-end wall-clock bound per item, in seconds.
    #[serde(default = "default_item_timeout_secs")]
    pub item_timeout_secs: u64,
    /// Seconds between destination directory checks.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Extension retrieved files are discovered by.
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
}

fn default_converter_url() -> String {
    "https://www.slidesdownloader.com/scribd".to_string()
}

fn default_input_selector() -> String {
    "#link".to_string()
}

fn default_trigger_selector() -> String {
    "button[type='submit']".to_string()
}

fn default_busy_selector() -> String {
    ".spinner".to_string()
}

fn default_affordance_timeout_secs() -> u64 {
    20
}

fn default_item_timeout_secs() -> u64 {
    300
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_file_extension() -> String {
    "pdf".to_string()
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            converter_url: default_converter_url(),
            input_selector: default_input_selector(),
            trigger_selector: default_trigger_selector(),
            busy_selector: default_busy_selector(),
            affordance_timeout_secs: default_affordance_timeout_secs(),
            item_timeout_secs: default_item_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            file_extension: default_file_extension(),
        }
    }
}

/// Top-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub rank: RankConfig,
    #[serde(default)]
    pub acquire: AcquireConfig,
    #[serde(default)]
    pub browser: BrowserEngineConfig,
    /// Root under which query-keyed download directories are created.
    #[serde(default = "default_download_root")]
    pub download_root: PathBuf,
}

fn default_download_root() -> PathBuf {
    PathBuf::from("downloads")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            rank: RankConfig::default(),
            acquire: AcquireConfig::default(),
            browser: BrowserEngineConfig::default(),
            download_root: default_download_root(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let raw = fs::read_to_string(p)
                    .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", p.display(), e))?;
                let settings = toml::from_str(&raw)
                    .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", p.display(), e))?;
                Ok(settings)
            }
            None => Ok(Self::default()),
        }
    }

    /// Download directory for a query, keyed by its sanitized name.
    pub fn download_dir(&self, query: &str) -> PathBuf {
        self.download_root
            .join(crate::acquire::files::sanitize_filename(query))
    }

    /// Export CSV path for a query.
    pub fn export_path(&self, query: &str) -> PathBuf {
        PathBuf::from(format!(
            "{}_links.csv",
            crate::acquire::files::sanitize_filename(query)
        ))
    }
}
