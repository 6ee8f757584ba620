// Centralized codec constants and layer configuration

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ====================
// Codec Parameters
// ====================
/// Smallest delta a packed byte can hold.
pub const DELTA_MIN: i32 = i8::MIN as i32;
/// Largest delta a packed byte can hold.
pub const DELTA_MAX: i32 = i8::MAX as i32;
/// Number of scale pairs tried before encoding gives up.
pub const MAX_SCALE_ATTEMPTS: usize = 16;

// ====================
// Layer Defaults
// ====================
/// Polylines with fewer points than this stay uncompressed.
pub const DEFAULT_MIN_COMPRESS_POINTS: usize = 2;
pub const DEFAULT_DECIMATION: usize = 1;
/// File looked up by [`LayerConfig::load_default`].
pub const DEFAULT_CONFIG_FILE: &str = "pointpack.toml";

/// On-disk encoding for saved layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
    Json,
    #[default]
    Binary,
}

fn default_compress() -> bool {
    true
}

fn default_min_compress_points() -> usize {
    DEFAULT_MIN_COMPRESS_POINTS
}

fn default_decimation() -> usize {
    DEFAULT_DECIMATION
}

fn default_gzip() -> bool {
    true
}

/// Settings for building and saving point layers, read from TOML.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Compress polylines when building a layer.
    #[serde(default = "default_compress")]
    pub compress: bool,
    #[serde(default = "default_min_compress_points")]
    pub min_compress_points: usize,
    /// Decimation applied when a layer is flattened for display.
    #[serde(default = "default_decimation")]
    pub default_decimation: usize,
    #[serde(default)]
    pub save_format: SaveFormat,
    #[serde(default = "default_gzip")]
    pub gzip: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            compress: default_compress(),
            min_compress_points: default_min_compress_points(),
            default_decimation: default_decimation(),
            save_format: SaveFormat::default(),
            gzip: default_gzip(),
        }
    }
}

impl LayerConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: LayerConfig = toml::from_str(content)?;
        if config.default_decimation == 0 {
            return Err("default_decimation must be at least 1".into());
        }
        Ok(config)
    }

    /// Load `pointpack.toml` from the working directory, falling back to
    /// defaults when the file does not exist.
    pub fn load_default() -> Result<Self, Box<dyn std::error::Error>> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::load_from_file(DEFAULT_CONFIG_FILE)
        } else {
            Ok(Self::default())
        }
    }
}
