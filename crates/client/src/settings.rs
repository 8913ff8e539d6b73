use std::path::{Path, PathBuf};

use snafu::{ResultExt, Snafu};

use crate::controller::DEFAULT_ANIMATION_RESET_MS;

/// Default backend endpoint for local development.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Settings that persist across client restarts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub backend_url: String,
    pub animation_reset_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            animation_reset_ms: DEFAULT_ANIMATION_RESET_MS,
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("failed to create config directory at {path}"))]
    CreateConfigDirectory {
        stage: &'static str,
        path: String,
        source: std::io::Error,
    },
    #[snafu(display("failed to write settings file to {path}"))]
    WriteSettings {
        stage: &'static str,
        path: String,
        source: std::io::Error,
    },
}

/// Settings persistence layer using a simple `key=value` format.
pub struct SettingsStore {
    settings: ClientSettings,
    config_path: PathBuf,
}

impl SettingsStore {
    /// Returns the default config file path under the user's home directory.
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".plotline")
            .join("settings.conf")
    }

    /// Creates a store bound to the given config path, loading what exists.
    pub fn new(config_path: PathBuf) -> Self {
        let settings = Self::load_from_disk(&config_path);
        Self {
            settings,
            config_path,
        }
    }

    /// Loads settings from the default path.
    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Updates settings and persists them to disk.
    pub fn update(&mut self, settings: ClientSettings) -> Result<(), SettingsError> {
        self.persist(&settings)?;
        self.settings = settings;
        Ok(())
    }

    /// Loads settings from disk, falling back to defaults when missing.
    fn load_from_disk(path: &Path) -> ClientSettings {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => {
                tracing::info!("settings file not found at {:?}, using defaults", path);
                return ClientSettings::default();
            }
        };

        parse_settings(&content)
    }

    fn persist(&self, settings: &ClientSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).context(CreateConfigDirectorySnafu {
                stage: "persist-settings",
                path: parent.display().to_string(),
            })?;
        }

        std::fs::write(&self.config_path, format_settings(settings)).context(
            WriteSettingsSnafu {
                stage: "persist-settings",
                path: self.config_path.display().to_string(),
            },
        )?;

        tracing::info!("saved settings to {:?}", self.config_path);
        Ok(())
    }
}

/// Parses `key=value` lines; unknown keys and comments are ignored.
fn parse_settings(content: &str) -> ClientSettings {
    let mut settings = ClientSettings::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim();

            match key {
                "backend_url" => settings.backend_url = value.to_string(),
                "animation_reset_ms" => {
                    if let Ok(parsed) = value.parse() {
                        settings.animation_reset_ms = parsed;
                    }
                }
                _ => {}
            }
        }
    }

    settings
}

fn format_settings(settings: &ClientSettings) -> String {
    format!(
        "# Plotline client settings\n\
         backend_url={}\n\
         animation_reset_ms={}\n",
        settings.backend_url, settings.animation_reset_ms
    )
}
