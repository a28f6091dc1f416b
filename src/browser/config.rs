//! Browser engine configuration types.

use serde::{Deserialize, Serialize};

/// Browser engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserEngineConfig {
    /// Run in headless mode (default: true).
    /// Set to false for debugging or if headless detection is an issue.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Page load timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,
}

fn default_headless() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}

impl Default for BrowserEngineConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            timeout: default_timeout(),
            chrome_args: Vec::new(),
        }
    }
}
