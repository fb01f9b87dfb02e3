//! Derived presentation state and the incremental render layers.
//!
//! Nothing in this module is authoritative. [`RenderingState`] holds what the
//! host measured or what was computed from the model (sizes, label bounds,
//! routings, link templates). [`ElementLayer`] and [`LinkLayer`] turn model
//! and rendering events into redraw requests and materialize only the
//! requested entities when flushed.

mod element_layer;
mod invalidation;
mod link_layer;
mod state;
mod templates;

pub use element_layer::{ElementLayer, ElementState, PropertyProps, TemplateProps};
pub use invalidation::{DrainedRequests, LayerDiff, RedrawBatch, RedrawLevel};
pub use link_layer::{LinkLayer, LinkState, LinkStyle};
pub(crate) use link_layer::compute_state as compute_link_state;
pub use state::{RenderingEvent, RenderingState, Routings};
pub use templates::{
    ElementTemplateResolver, LinkMarkerStyle, LinkTemplate, LinkTemplateResolver,
    LinkTemplateSpec, ResolvedTypeStyle, Resolvers, TemplateKind, TypeStyle, TypeStyleResolver,
};

/// Flush order of a synchronous update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RenderingLayer {
    Element,
    ElementSize,
    PaperArea,
    Link,
    Editor,
}

impl RenderingLayer {
    pub const ALL: [RenderingLayer; 5] = [
        Self::Element,
        Self::ElementSize,
        Self::PaperArea,
        Self::Link,
        Self::Editor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Element => "element",
            Self::ElementSize => "element-size",
            Self::PaperArea => "paper-area",
            Self::Link => "link",
            Self::Editor => "editor",
        }
    }
}
