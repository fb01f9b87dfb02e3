//! Ontoscope - an interactive ontology diagram engine.
//!
//! The engine keeps an editable diagram of RDF entities and the links
//! between them: a scene graph with change events, undoable commands, link
//! routing, incremental render layers, a zoomable and scrollable paper, and
//! SVG/PNG export. It renders nothing on its own; a host UI measures
//! elements, draws the layer states and forwards pointer input.
//!
//! # Example
//!
//! ```
//! use ontoscope::{
//!     DiagramView,
//!     config::EditorConfig,
//!     geometry::{Point, Size},
//!     model::{Iri, Link, LinkData},
//! };
//!
//! let mut view = DiagramView::new(&EditorConfig::default());
//! let model = view.model_mut();
//! let alice = model.create_element_at(Iri::new("http://ex.org/alice"), None, Point::new(0.0, 0.0));
//! let bob = model.create_element_at(Iri::new("http://ex.org/bob"), None, Point::new(300.0, 0.0));
//! let data = LinkData::new(
//!     Iri::new("http://ex.org/knows"),
//!     Iri::new("http://ex.org/alice"),
//!     Iri::new("http://ex.org/bob"),
//! );
//! model.create_link(Link::new(alice, bob, data));
//!
//! view.set_element_size(alice, Size::new(100.0, 40.0));
//! view.set_element_size(bob, Size::new(100.0, 40.0));
//!
//! let frame = view.tick(0.0).unwrap();
//! assert_eq!(frame.elements.unwrap().added.len(), 2);
//! assert_eq!(frame.links.unwrap().added.len(), 1);
//! ```

pub mod config;
pub mod export;
pub mod history;
pub mod model;
pub mod rendering;
pub mod router;
pub mod viewport;

mod error;
mod view;

pub use ontoscope_core::{color, events, geometry, identifier, scheduler};

pub use error::DiagramError;
pub use view::{DiagramView, FrameUpdate};
