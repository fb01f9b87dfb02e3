//! Diagram export.
//!
//! Export works from the model and the rendering state directly, not from
//! the render layers, so a diagram can be exported without being mounted.
//!
//! # Available Backends
//!
//! - [`svg`]: serialized SVG document via [`svg::to_svg`]
//! - `png`: raster data URL via `png::to_data_url` (feature `png`)
//!
//! # Error Handling
//!
//! Export operations return [`Error`], covering rendering failures and I/O
//! errors. [`Error`] converts into [`DiagramError::Export`] at the crate
//! boundary.
//!
//! [`DiagramError::Export`]: crate::DiagramError::Export

mod layer;

/// SVG export backend.
pub mod svg;

/// PNG rasterization of exported SVG.
#[cfg(feature = "png")]
pub mod png;

/// Errors that can occur during diagram export.
#[derive(Debug)]
pub enum Error {
    /// A rendering or conversion failure described by `message`.
    Render(String),
    /// An I/O error encountered while writing output.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Render(msg) => write!(f, "Render error: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(_) => None,
            Self::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ontoscope_core::geometry::GeometryError> for Error {
    fn from(err: ontoscope_core::geometry::GeometryError) -> Self {
        Self::Render(err.to_string())
    }
}
