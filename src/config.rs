//! Configuration file handling for reelsmith.
//!
//! Loads configuration from `~/.config/reelsmith/config.toml` or a custom path.
//! Credentials may also come from the environment (or a `.env` file).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the image-search access key.
pub const IMAGE_SEARCH_KEY_ENV: &str = "UNSPLASH_ACCESS_KEY";

/// Environment variable holding the Graph API access token.
pub const ACCESS_TOKEN_ENV: &str = "IG_ACCESS_TOKEN";

/// Environment variable holding the publishing account id.
pub const USER_ID_ENV: &str = "IG_USER_ID";

/// Configuration file structure for reelsmith.
/// Loaded from ~/.config/reelsmith/config.toml (or custom path via --config).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub image_search: ImageSearchConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub publish: PublishConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ImageSearchConfig {
    pub base_url: String,
    pub access_key: Option<String>,
    pub orientation: String,
    /// Used whenever the provider has nothing usable for a product.
    pub fallback_image_url: String,
}

impl Default for ImageSearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.unsplash.com".to_string(),
            access_key: None,
            orientation: "portrait".to_string(),
            fallback_image_url: "https://images.unsplash.com/photo-1496181133206-80ce9b88a853"
                .to_string(),
        }
    }
}

/// Layout, timing and encoder settings for a reel.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    pub ffmpeg_path: PathBuf,
    pub temp_dir: PathBuf,
    pub output_path: PathBuf,
    pub music_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub segment_secs: f64,
    pub outro_secs: f64,
    pub image_fade_secs: f64,
    pub text_fade_secs: f64,
    pub audio_fade_secs: f64,
    pub overlay_opacity: f32,
    pub oversize_scale: f64,
    pub caption_y_ratio: f64,
    pub font: String,
    pub font_file: Option<PathBuf>,
    pub accent_color: String,
    pub caption_font_size: u32,
    pub caption_stroke_width: u32,
    pub outro_font_size: u32,
    pub outro_stroke_width: u32,
    pub outro_line_spacing: u32,
    pub outro_text: String,
    pub video_codec: String,
    pub audio_codec: String,
    pub threads: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            temp_dir: PathBuf::from("temp"),
            output_path: PathBuf::from("output/reel.mp4"),
            music_path: PathBuf::from("assets/videoplayback.mp3"),
            width: 1080,
            height: 1920,
            fps: 30,
            segment_secs: 3.0,
            outro_secs: 3.0,
            image_fade_secs: 0.5,
            text_fade_secs: 0.5,
            audio_fade_secs: 1.0,
            overlay_opacity: 0.4,
            oversize_scale: 1.2,
            caption_y_ratio: 0.85,
            font: "Arial Bold".to_string(),
            font_file: None,
            accent_color: "#FF6B00".to_string(),
            caption_font_size: 90,
            caption_stroke_width: 5,
            outro_font_size: 80,
            outro_stroke_width: 2,
            outro_line_spacing: 20,
            outro_text: "Visit Us Today!\nPorur, Chennai\nOpen 9AM - 9PM".to_string(),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            threads: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PublishConfig {
    pub graph_base_url: String,
    pub api_version: String,
    pub user_id: Option<String>,
    pub access_token: Option<String>,
    pub caption: String,
    pub share_to_feed: bool,
    pub max_attempts: u32,
    pub attempt_delay_secs: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            graph_base_url: "https://graph.facebook.com".to_string(),
            api_version: "v17.0".to_string(),
            user_id: None,
            access_token: None,
            caption: "Chinna Porur Yejamaan".to_string(),
            share_to_feed: false,
            max_attempts: 5,
            attempt_delay_secs: 10,
        }
    }
}

impl PublishConfig {
    pub fn attempt_delay(&self) -> Duration {
        Duration::from_secs(self.attempt_delay_secs)
    }
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            Ok(config)
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    /// Override credentials with values from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(IMAGE_SEARCH_KEY_ENV) {
            self.image_search.access_key = Some(key);
        }
        if let Some(token) = non_empty(ACCESS_TOKEN_ENV) {
            self.publish.access_token = Some(token);
        }
        if let Some(user) = non_empty(USER_ID_ENV) {
            self.publish.user_id = Some(user);
        }
    }

    /// Render the effective configuration as TOML with secrets masked.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        let mut redacted = self.clone();
        let mask = |secret: &mut Option<String>| {
            if secret.is_some() {
                *secret = Some("********".to_string());
            }
        };
        mask(&mut redacted.image_search.access_key);
        mask(&mut redacted.publish.access_token);
        toml::to_string_pretty(&redacted)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("reelsmith").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/reelsmith/config.toml")
        })
}
