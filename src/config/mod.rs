mod settings;

pub use settings::{Config, DisplaySettings, SendSettings, ServerSettings, ViewMode};

use crate::error::{ReminderError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.reminders/)
pub fn config_dir() -> Result<PathBuf> {
    // First try XDG-style directories
    if let Some(proj_dirs) = ProjectDirs::from("", "", "reminders") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    // Fallback to ~/.reminders/
    let home = dirs_home().ok_or_else(|| {
        ReminderError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".reminders"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Load config.toml (defaults if missing)
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| ReminderError::ConfigParse { path, source: e })
}

/// Create the config directory and write the template
pub fn init_config(config_dir: &Path) -> Result<PathBuf> {
    if config_dir.exists() {
        return Err(ReminderError::AlreadyInitialized(config_dir.to_path_buf()));
    }
    fs::create_dir_all(config_dir)?;
    let path = config_dir.join("config.toml");
    fs::write(&path, CONFIG_TEMPLATE)?;
    Ok(path)
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[server]
base_url = "http://localhost:5000"   # backend serving /procesar-excel and /enviar-correos
timeout_secs = 120

[display]
view = "unified"             # or "split" (overdue / upcoming by earliest due date)
currency_symbol = "$"
thousands_separator = "."

[send]
batch_size = 450             # max clients per send request
"#;
