/// Slideshow configuration
///
/// Stored as JSON in the user's config directory:
/// - Linux: ~/.config/image-slideshow/slideshow.json
/// - macOS: ~/Library/Application Support/image-slideshow/slideshow.json
/// - Windows: %APPDATA%\image-slideshow\slideshow.json
///
/// `IMAGE_SLIDESHOW_CONFIG` points at a different file.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::bitmap::Image;
use crate::error::ConfigError;
use crate::slideshow::{Preload, SlideshowOptions};
use crate::source::{FileImageSource, ImageSource, RemoteImageSource};

pub const CONFIG_ENV: &str = "IMAGE_SLIDESHOW_CONFIG";

/// One slideshow entry
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SourceEntry {
    Remote {
        url: String,
        #[serde(default)]
        token: Option<String>,
    },
    File {
        path: PathBuf,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub sources: Vec<SourceEntry>,
    /// Seconds between automatic page changes, 0 disables
    pub interval_secs: u64,
    pub circular: bool,
    pub preload: Preload,
    pub request_timeout_secs: Option<u64>,
    /// Image shown while loading and when a load fails
    pub placeholder_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            interval_secs: 0,
            circular: true,
            preload: Preload::Fixed(1),
            request_timeout_secs: Some(30),
            placeholder_path: None,
        }
    }
}

impl Config {
    /// Load from `IMAGE_SLIDESHOW_CONFIG` or the default location
    ///
    /// A missing file at the default location yields the defaults; a
    /// missing file named by the environment variable is an error.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(std::env::var_os(CONFIG_ENV), Self::default_path())
    }

    /// Resolve the config from an explicit override path and a default path
    pub fn load_from(override_path: Option<OsString>, default_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        if let Some(path) = override_path {
            return Self::from_path(Path::new(&path));
        }

        match default_path {
            Some(path) if path.exists() => Self::from_path(&path),
            _ => {
                info!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Default config file location, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("image-slideshow");
        path.push("slideshow.json");
        Some(path)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        info!(path = %path.display(), sources = config.sources.len(), "config loaded");
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn slideshow_options(&self) -> SlideshowOptions {
        SlideshowOptions {
            circular: self.circular,
            preload: self.preload,
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        (self.interval_secs > 0).then(|| Duration::from_secs(self.interval_secs))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Decode the configured placeholder, if any
    ///
    /// A placeholder that fails to load is logged and skipped.
    pub fn placeholder(&self) -> Option<Image> {
        let path = self.placeholder_path.as_ref()?;
        match Image::open(path) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load placeholder");
                None
            }
        }
    }

    /// Build the image sources; entries that are not valid are skipped
    pub fn build_sources(&self, placeholder: Option<Image>) -> Vec<Arc<dyn ImageSource>> {
        let mut sources: Vec<Arc<dyn ImageSource>> = Vec::with_capacity(self.sources.len());

        for entry in &self.sources {
            match entry {
                SourceEntry::Remote { url, token } => {
                    if let Some(source) = RemoteImageSource::parse(url, token.clone(), placeholder.clone()) {
                        sources.push(Arc::new(source));
                    }
                }
                SourceEntry::File { path } => match FileImageSource::new(path.clone(), placeholder.clone()) {
                    Some(source) => sources.push(Arc::new(source)),
                    None => warn!(path = %path.display(), "image path must be absolute"),
                },
            }
        }

        sources
    }
}
