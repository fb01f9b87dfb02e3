//! Error types for Ontoscope operations.
//!
//! [`DiagramError`] is the crate-level error. Each subsystem has its own
//! narrower error type which converts into it.

use std::io;

use thiserror::Error;

use ontoscope_core::geometry::GeometryError;

use crate::{
    config::ConfigError,
    history::HistoryError,
    model::{ElementId, LinkId},
    viewport::ViewportError,
};

/// The main error type for diagram operations.
#[derive(Debug, Error)]
pub enum DiagramError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Viewport error: {0}")]
    Viewport(#[from] ViewportError),

    /// A data update tried to change the type, source, or target of a link.
    #[error("link {link} data update changes its identity (type, source, target)")]
    LinkIdentityChanged { link: LinkId },

    /// A data update would give a link the key of another link.
    #[error("link {link} data collides with existing link {existing}")]
    DuplicateLink { link: LinkId, existing: LinkId },

    #[error("element {0} not found")]
    ElementNotFound(ElementId),

    #[error("link {0} not found")]
    LinkNotFound(LinkId),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error>),
}

impl From<crate::export::Error> for DiagramError {
    fn from(error: crate::export::Error) -> Self {
        Self::Export(Box::new(error))
    }
}
