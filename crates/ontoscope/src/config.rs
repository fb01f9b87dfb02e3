//! Editor configuration.
//!
//! All types implement [`serde::Deserialize`] and fall back to defaults for
//! every missing field, so an empty TOML document is a valid configuration.
//!
//! # Example
//!
//! ```
//! # use ontoscope::config::EditorConfig;
//! let config = EditorConfig::from_toml_str(
//!     r#"
//!     language = "de"
//!
//!     [zoom]
//!     max = 4.0
//!
//!     [routing]
//!     gap = 30.0
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.language(), "de");
//! assert_eq!(config.zoom().max, 4.0);
//! assert_eq!(config.zoom().min, 0.2);
//! assert_eq!(config.routing().gap(), 30.0);
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::info;
use serde::Deserialize;
use thiserror::Error;

use ontoscope_core::{color::Color, geometry::Size};

use crate::viewport::ZoomOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level editor configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    zoom: ZoomOptions,
    paper: PaperConfig,
    routing: RoutingConfig,
    animation: AnimationConfig,
    style: StyleConfig,
    /// Preferred label language.
    language: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            zoom: ZoomOptions::default(),
            paper: PaperConfig::default(),
            routing: RoutingConfig::default(),
            animation: AnimationConfig::default(),
            style: StyleConfig::default(),
            language: "en".to_string(),
        }
    }
}

impl EditorConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn zoom(&self) -> &ZoomOptions {
        &self.zoom
    }

    pub fn paper(&self) -> &PaperConfig {
        &self.paper
    }

    pub fn routing(&self) -> &RoutingConfig {
        &self.routing
    }

    pub fn animation(&self) -> &AnimationConfig {
        &self.animation
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Checks value ranges the editor relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for a non-positive or inverted
    /// zoom range, a non-positive page size, a negative routing gap, or an
    /// unparsable background color.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let zoom = &self.zoom;
        if zoom.min <= 0.0 || zoom.min > zoom.max {
            return Err(ConfigError::Validation(format!(
                "zoom range {}..{} is invalid",
                zoom.min, zoom.max
            )));
        }
        if zoom.step <= 0.0 {
            return Err(ConfigError::Validation("zoom step must be positive".to_string()));
        }
        if self.paper.page_width <= 0.0 || self.paper.page_height <= 0.0 {
            return Err(ConfigError::Validation("page size must be positive".to_string()));
        }
        if self.routing.gap < 0.0 {
            return Err(ConfigError::Validation("routing gap must not be negative".to_string()));
        }
        self.style
            .background_color()
            .map_err(ConfigError::Validation)?;
        Ok(())
    }
}

/// Paper page grid and initial viewport size.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaperConfig {
    page_width: f32,
    page_height: f32,
    client_width: f32,
    client_height: f32,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            page_width: 1500.0,
            page_height: 800.0,
            client_width: 1000.0,
            client_height: 600.0,
        }
    }
}

impl PaperConfig {
    /// Size of one page of the grid the paper is quantized to.
    pub fn page_size(&self) -> Size {
        Size::new(self.page_width, self.page_height)
    }

    pub fn client_size(&self) -> Size {
        Size::new(self.client_width, self.client_height)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    gap: f32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self { gap: 20.0 }
    }
}

impl RoutingConfig {
    /// Distance between parallel links.
    pub fn gap(&self) -> f32 {
        self.gap
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    duration_ms: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self { duration_ms: 500.0 }
    }
}

impl AnimationConfig {
    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }
}

/// Visual styling configuration for exported diagrams.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StyleConfig {
    /// Background color string; exports are transparent without one.
    #[serde(default)]
    background_color: Option<String>,
}

impl StyleConfig {
    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        self.background_color
            .as_ref()
            .map(|color| Color::new(color))
            .transpose()
            .map_err(|err| format!("Invalid background color in config: {err}"))
    }
}

/// Loads and validates configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file doesn't exist, cannot be read, fails to
/// parse, or fails validation.
pub fn load_config(path: impl AsRef<Path>) -> Result<EditorConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }
    info!(path = path.display().to_string(); "Loading configuration");

    let content = fs::read_to_string(path)?;
    EditorConfig::from_toml_str(&content)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = EditorConfig::from_toml_str("").unwrap();

        assert_eq!(*config.zoom(), ZoomOptions::default());
        assert_eq!(config.paper().page_size(), Size::new(1500.0, 800.0));
        assert_eq!(config.routing().gap(), 20.0);
        assert_eq!(config.animation().duration_ms(), 500.0);
        assert_eq!(config.language(), "en");
        assert_eq!(config.style().background_color(), Ok(None));
    }

    #[test]
    fn test_background_color() {
        let config = EditorConfig::from_toml_str(
            r##"
            [style]
            background_color = "#ffffff"
            "##,
        )
        .unwrap();
        let color = config.style().background_color().unwrap().unwrap();
        assert_eq!(color.to_hex(), "#ffffff");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let inverted = EditorConfig::from_toml_str("[zoom]\nmin = 3.0\nmax = 2.0\n");
        assert!(matches!(inverted, Err(ConfigError::Validation(_))));

        let color = EditorConfig::from_toml_str("[style]\nbackground_color = \"nope\"\n");
        assert!(matches!(color, Err(ConfigError::Validation(_))));

        let page = EditorConfig::from_toml_str("[paper]\npage_width = 0.0\n");
        assert!(matches!(page, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let result = EditorConfig::from_toml_str("[zoom\nmin = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "language = \"fr\"\n[animation]\nduration_ms = 0.0").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.language(), "fr");
        assert_eq!(config.animation().duration_ms(), 0.0);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/definitely/not/here/ontoscope.toml");
        assert!(matches!(result, Err(ConfigError::MissingFile(_))));
    }
}
