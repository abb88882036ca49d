use crate::error::ReadError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_output_width() -> u32 { 100 }
fn default_output_height() -> u32 { 150 }
fn default_white_level() -> u8 { 180 }
fn default_lit_fraction() -> f64 { 0.30 }
fn default_true() -> bool { true }
fn default_extension() -> String { "png".to_string() }

/// Where and whether annotated segment images are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Output directory. Unset → next to the source image.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// File extension, also picks the encoder.
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        DiagnosticsConfig {
            enabled: true,
            dir: None,
            extension: default_extension(),
        }
    }
}

/// Tunables for one reading run.
///
/// All fields have defaults, so `{}` is a valid config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Rectified digit width in pixels.
    #[serde(default = "default_output_width")]
    pub output_width: u32,
    /// Rectified digit height in pixels.
    #[serde(default = "default_output_height")]
    pub output_height: u32,
    /// A pixel brighter than this (0–255) counts towards a lit segment.
    #[serde(default = "default_white_level")]
    pub white_level: u8,
    /// A segment is lit when its bright-pixel fraction exceeds this.
    #[serde(default = "default_lit_fraction")]
    pub lit_fraction: f64,
    /// Re-order each region's corners clockwise from top-left before warping.
    /// Off by default: corner order is the caller's job.
    #[serde(default)]
    pub normalize_corners: bool,
    /// Run rectify → analyze → resolve for all positions on the rayon pool.
    #[serde(default = "default_true")]
    pub parallel: bool,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            output_width: default_output_width(),
            output_height: default_output_height(),
            white_level: default_white_level(),
            lit_fraction: default_lit_fraction(),
            normalize_corners: false,
            parallel: true,
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

impl ReaderConfig {
    /// Check value ranges. Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.output_width < 2 || self.output_height < 2 {
            return Err(format!(
                "output size {}x{} is too small (minimum 2x2)",
                self.output_width, self.output_height
            ));
        }
        if !(0.0..=1.0).contains(&self.lit_fraction) {
            return Err(format!("lit_fraction {} is outside 0..=1", self.lit_fraction));
        }
        if self.diagnostics.extension.trim().is_empty() {
            return Err("diagnostics.extension is empty".to_string());
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<ReaderConfig, ReadError> {
    let invalid = |reason: String| ReadError::Config {
        path: path.to_path_buf(),
        reason,
    };
    let text = fs::read_to_string(path).map_err(|e| invalid(format!("cannot read: {e}")))?;
    let cfg: ReaderConfig =
        serde_json::from_str(&text).map_err(|e| invalid(format!("parse error: {e}")))?;
    cfg.validate().map_err(invalid)?;
    Ok(cfg)
}

pub fn save_config(path: &Path, config: &ReaderConfig) -> Result<(), ReadError> {
    let invalid = |reason: String| ReadError::Config {
        path: path.to_path_buf(),
        reason,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| invalid(format!("cannot create dirs: {e}")))?;
    }
    let text = serde_json::to_string_pretty(config)
        .map_err(|e| invalid(format!("serialise error: {e}")))?;
    fs::write(path, text).map_err(|e| invalid(format!("cannot write: {e}")))
}
