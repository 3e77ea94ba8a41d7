use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub send: SendSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerSettings {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    120
}

/// How grouped reminders are laid out
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// One row per client with overdue, upcoming and not-due buckets
    #[default]
    Unified,
    /// Separate overdue and upcoming tables ordered by earliest due date
    Split,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DisplaySettings {
    #[serde(default)]
    pub view: ViewMode,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "default_thousands_separator")]
    pub thousands_separator: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            view: ViewMode::default(),
            currency_symbol: default_currency_symbol(),
            thousands_separator: default_thousands_separator(),
        }
    }
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

fn default_thousands_separator() -> String {
    ".".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SendSettings {
    /// Maximum number of clients per send request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for SendSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

fn default_batch_size() -> usize {
    450
}
