use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Default name of the CSV report, written to the current working directory.
pub const DEFAULT_OUTPUT_FILE: &str = "DrawingMetadataRetrieved.csv";

/// File name looked up next to the executable when no config path is given.
pub const CONFIG_FILE: &str = "config.json";

/// Top-level configuration for the drawing metadata retriever.
///
/// Controls where the report goes, how it is quoted, and how the
/// directory walk treats symlinks.
///
/// # Loading
///
/// ```rust,no_run
/// use drawing_metadata_retriever::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.output.file = "report.csv".into();
/// config.scan.follow_links = true;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// CSV report settings.
    pub output: OutputConfig,
    /// Directory walk settings.
    pub scan: ScanConfig,
}

/// Where and how the CSV report is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Report file path, relative to the current working directory unless absolute.
    pub file: String,
    /// If `true`, every CSV field is quoted. If `false`, only fields that need it.
    pub quote_all: bool,
}

/// Directory walk settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Follow symbolic links while walking the tree.
    pub follow_links: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: DEFAULT_OUTPUT_FILE.to_string(),
            quote_all: true,
        }
    }
}

impl Config {
    /// Default config location: `config.json` beside the running binary.
    pub fn config_path() -> Result<PathBuf> {
        let exe = std::env::current_exe().context("Cannot locate the running executable")?;
        exe.parent()
            .map(|dir| dir.join(CONFIG_FILE))
            .context("Executable path has no parent directory")
    }

    fn resolve(path: Option<&Path>) -> Result<PathBuf> {
        path.map_or_else(Self::config_path, |p| Ok(p.to_path_buf()))
    }

    /// Load config from `path`, or from [`Config::config_path`] when `None`.
    ///
    /// A missing file is not an error: the report defaults are used and a
    /// warning is logged. An unreadable or malformed file is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve(path)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!(
                    "No config file at {}, writing the report with defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read config file {}", path.display()))
            }
        }
    }

    /// Write this config as pretty JSON and return where it went.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = Self::resolve(path)?;
        let mut contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        contents.push('\n');
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        log::info!("Config saved to {}", path.display());
        Ok(path)
    }

    /// The report path as configured.
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.output.file)
    }
}
