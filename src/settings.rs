use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "roundview";
/// Directory overriding the platform config location
pub const CONFIG_DIR_ENV: &str = "ROUNDVIEW_CONFIG_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_theme")]
    pub theme: String,

    #[serde(default)]
    pub pdf_night_mode: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_theme() -> String {
    "dark".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            theme: default_theme(),
            pdf_night_mode: false,
            server_url: None,
            api_key: None,
            author_name: None,
            author_id: None,
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));
static ACTIVE_PATH: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Settings file inside a config directory
pub fn config_path_in(dir: &Path) -> PathBuf {
    dir.join(SETTINGS_FILENAME)
}

fn preferred_config_path() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
        return Some(config_path_in(Path::new(&dir)));
    }
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

fn active_path() -> Option<PathBuf> {
    ACTIVE_PATH
        .read()
        .ok()
        .and_then(|p| p.clone())
        .or_else(preferred_config_path)
}

pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };
    load_settings_from_path(&path);
}

/// Loads settings from `path` and keeps saving to it afterwards.
///
/// A missing file is created with defaults. A malformed file is reported
/// and leaves the current settings in place.
pub fn load_settings_from_path(path: &Path) {
    if let Ok(mut active) = ACTIVE_PATH.write() {
        *active = Some(path.to_path_buf());
    }

    if !path.exists() {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(mut global) = SETTINGS.write() {
            *global = Settings::default();
        }
        save_settings();
        return;
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");
                if settings.version < CURRENT_VERSION {
                    info!(
                        "Migrating settings from v{} to v{}",
                        settings.version, CURRENT_VERSION
                    );
                    settings.version = CURRENT_VERSION;
                }
                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings;
                }
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

pub fn save_settings() {
    let Some(path) = active_path() else {
        warn!("Could not determine config directory, cannot save settings");
        return;
    };

    if let Ok(settings) = SETTINGS.read() {
        save_settings_to_file(&settings, &path);
    }
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let body = match serde_yaml::to_string(settings) {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to serialize settings: {e}");
            return;
        }
    };
    let content = format!("{SETTINGS_HEADER}{body}");

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

const SETTINGS_HEADER: &str = r#"# roundview settings
#
# theme: "light" or "dark"
# pdf_night_mode: render pages with inverted lightness
# server_url, api_key, author_name, author_id: defaults for the command line
"#;

// Public API for accessing/modifying settings

pub fn snapshot() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

pub fn get_theme_name() -> String {
    SETTINGS
        .read()
        .map(|s| s.theme.clone())
        .unwrap_or_else(|_| default_theme())
}

pub fn set_theme_name(name: &str) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.theme = name.to_string();
    }
    save_settings();
}

pub fn is_night_mode() -> bool {
    SETTINGS.read().map(|s| s.pdf_night_mode).unwrap_or(false)
}

pub fn set_night_mode(enabled: bool) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.pdf_night_mode = enabled;
    }
    save_settings();
}

pub fn get_server_url() -> Option<String> {
    SETTINGS.read().ok().and_then(|s| s.server_url.clone())
}

pub fn get_api_key() -> Option<String> {
    SETTINGS.read().ok().and_then(|s| s.api_key.clone())
}

pub fn get_author() -> (Option<String>, Option<String>) {
    SETTINGS
        .read()
        .map(|s| (s.author_name.clone(), s.author_id.clone()))
        .unwrap_or_default()
}
