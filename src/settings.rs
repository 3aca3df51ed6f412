use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::pdf::CellSize;
use crate::viewer::{SwipePolicy, ViewerConfig, Zoom};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "leafview";

/// Document opened when none is given on the command line
pub const FALLBACK_DOCUMENT: &str = "document.pdf";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_document: Option<String>,

    #[serde(default = "default_initial_scale")]
    pub initial_scale: f32,

    #[serde(default)]
    pub fit_width_on_load: bool,

    #[serde(default = "default_swipe_threshold")]
    pub swipe_threshold: f32,

    #[serde(default = "default_vertical_tolerance")]
    pub vertical_tolerance: f32,

    #[serde(default = "default_fit_padding")]
    pub fit_padding: f32,

    /// Pixel size of one terminal cell, used to convert mouse positions
    #[serde(default = "default_cell_width")]
    pub cell_width_px: u16,

    #[serde(default = "default_cell_height")]
    pub cell_height_px: u16,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_initial_scale() -> f32 {
    Zoom::DEFAULT_SCALE
}

fn default_swipe_threshold() -> f32 {
    SwipePolicy::default().horizontal_threshold
}

fn default_vertical_tolerance() -> f32 {
    SwipePolicy::default().vertical_tolerance
}

fn default_fit_padding() -> f32 {
    Zoom::FIT_PADDING
}

fn default_cell_width() -> u16 {
    CellSize::default().width
}

fn default_cell_height() -> u16 {
    CellSize::default().height
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            default_document: None,
            initial_scale: default_initial_scale(),
            fit_width_on_load: false,
            swipe_threshold: default_swipe_threshold(),
            vertical_tolerance: default_vertical_tolerance(),
            fit_padding: default_fit_padding(),
            cell_width_px: default_cell_width(),
            cell_height_px: default_cell_height(),
        }
    }
}

impl Settings {
    /// Viewer tunables described by these settings
    pub fn viewer_config(&self) -> ViewerConfig {
        ViewerConfig {
            initial_scale: self.initial_scale,
            fit_width_on_load: self.fit_width_on_load,
            swipe: SwipePolicy {
                horizontal_threshold: non_negative_or_default(
                    "swipe_threshold",
                    self.swipe_threshold,
                    default_swipe_threshold(),
                ),
                vertical_tolerance: non_negative_or_default(
                    "vertical_tolerance",
                    self.vertical_tolerance,
                    default_vertical_tolerance(),
                ),
            },
            fit_padding: non_negative_or_default(
                "fit_padding",
                self.fit_padding,
                default_fit_padding(),
            ),
            cell_size: CellSize::new(self.cell_width_px.max(1), self.cell_height_px.max(1)),
        }
    }

    /// Document to open when none was given explicitly
    pub fn document_or_fallback(&self) -> &str {
        self.default_document.as_deref().unwrap_or(FALLBACK_DOCUMENT)
    }
}

fn non_negative_or_default(name: &str, value: f32, default: f32) -> f32 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        warn!("Invalid {name} {value} in settings, using default {default}");
        default
    }
}

pub fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from `path`, or from the user config directory.
///
/// A missing file is created with defaults. Unreadable or malformed files are
/// logged and defaults are used.
pub fn load_settings(path: Option<&Path>) -> Settings {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match preferred_config_path() {
            Some(path) => path,
            None => {
                warn!("Could not determine config directory, using default settings");
                return Settings::default();
            }
        },
    };

    if path.exists() {
        load_settings_from_path(&path).unwrap_or_default()
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        let settings = Settings::default();
        save_settings_to_file(&settings, &path);
        settings
    }
}

fn load_settings_from_path(path: &Path) -> Option<Settings> {
    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }
                Some(settings)
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
                None
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
            None
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = generate_settings_yaml(settings);

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::new();

    content.push_str(&format!("version: {}\n", settings.version));
    match &settings.default_document {
        Some(document) => match serde_yaml::to_string(document) {
            Ok(value) => content.push_str(&format!("default_document: {}\n", value.trim_end())),
            Err(e) => error!("Failed to serialize default_document {document:?}: {e}"),
        },
        None => content.push_str("# default_document: \"~/papers/paper.pdf\"\n"),
    }
    content.push('\n');

    content.push_str("# Zoom used until the user zooms or fits (1.0 = 100%)\n");
    content.push_str(&format!("initial_scale: {}\n", settings.initial_scale));
    content.push_str(&format!(
        "fit_width_on_load: {}\n",
        settings.fit_width_on_load
    ));
    content.push_str(&format!("fit_padding: {}\n", settings.fit_padding));
    content.push('\n');

    content.push_str("# Swipe page turning, in pixels\n");
    content.push_str(&format!("swipe_threshold: {}\n", settings.swipe_threshold));
    content.push_str(&format!(
        "vertical_tolerance: {}\n",
        settings.vertical_tolerance
    ));
    content.push('\n');

    content.push_str("# Terminal cell size used to convert mouse drags to pixels\n");
    content.push_str(&format!("cell_width_px: {}\n", settings.cell_width_px));
    content.push_str(&format!("cell_height_px: {}\n", settings.cell_height_px));

    content
}
