use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Upper bound on the bytes a single read line may hold, terminator included.
pub const DEFAULT_LINE_MAX: usize = 1024;

/// Suffix appended to the target path while a rewrite is being staged.
pub const DEFAULT_TEMP_SUFFIX: &str = ".tmp";

/// Terminator written after every line the accessor produces.
///
/// Lines copied through from the source keep whatever terminator they had.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// `\r\n` on Windows, `\n` everywhere else.
    #[default]
    Platform,
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::Platform => {
                if cfg!(windows) {
                    b"\r\n"
                } else {
                    b"\n"
                }
            }
            LineEnding::Lf => b"\n",
            LineEnding::CrLf => b"\r\n",
        }
    }
}

/// Tunables for a `Session`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub line_ending: LineEnding,
    pub temp_suffix: String,
    /// Flush the staged copy to disk before it replaces the original.
    pub sync_before_rename: bool,
    pub line_max: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            line_ending: LineEnding::Platform,
            temp_suffix: DEFAULT_TEMP_SUFFIX.to_string(),
            sync_before_rename: false,
            line_max: DEFAULT_LINE_MAX,
        }
    }
}

impl Settings {
    /// Line cap actually used by the reader. Anything below 2 would leave no
    /// room for a single byte of content.
    pub fn effective_line_max(&self) -> usize {
        self.line_max.max(2)
    }

    pub fn temp_suffix(&self) -> &str {
        if self.temp_suffix.is_empty() {
            DEFAULT_TEMP_SUFFIX
        } else {
            &self.temp_suffix
        }
    }
}

/// The `ConfigProvider` trait is the interface for loading and saving
/// `Settings`, whatever backs them.
pub trait ConfigProvider {
    /// Reads the settings file.
    ///
    /// # Returns
    /// A `Result<Settings>`. A missing file yields `Settings::default()`;
    /// an unreadable or malformed one is an error.
    fn load_config(&self) -> Result<Settings>;

    /// Writes `settings` to the settings file, replacing its contents.
    ///
    /// # Arguments
    /// * `settings`: The settings to serialize as TOML.
    ///
    /// # Returns
    /// A `Result<()>` that fails if the file cannot be written.
    fn save_config(&self, settings: &Settings) -> Result<()>;

    /// Gets the location of the settings file.
    ///
    /// # Returns
    /// A `Result<PathBuf>` with the path `load_config` and `save_config` use.
    fn get_config_path(&self) -> Result<PathBuf>;
}

/// Loads and stores `Settings` as TOML.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new_at<P: AsRef<Path>>(config_path: P) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigProvider for ConfigManager {
    fn load_config(&self) -> Result<Settings> {
        if !self.config_path.exists() {
            return Ok(Settings::default());
        }

        let content =
            fs::read_to_string(&self.config_path).context("Failed to read settings file")?;

        toml::from_str(&content).context("Failed to parse settings file")
    }

    fn save_config(&self, settings: &Settings) -> Result<()> {
        let content = toml::to_string_pretty(settings).context("Failed to serialize settings")?;

        fs::write(&self.config_path, content).context("Failed to write settings file")?;

        Ok(())
    }

    fn get_config_path(&self) -> Result<PathBuf> {
        Ok(self.config_path.clone())
    }
}
