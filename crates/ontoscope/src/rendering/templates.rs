//! Template resolution hooks and their fallbacks.
//!
//! Hosts customize how elements and links look by installing resolvers.
//! Every resolver is optional, and every field a resolver leaves empty falls
//! back to a built-in default.

use std::fmt;

use ontoscope_core::color::{Color, DEFAULT_HUE_SEED, hue_from_types};

use crate::model::Iri;

/// Color and icon for a set of element types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeStyle {
    pub color: Option<Color>,
    pub icon: Option<String>,
}

/// Style with every fallback applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTypeStyle {
    pub color: Color,
    pub icon: Option<String>,
}

pub trait TypeStyleResolver {
    fn resolve(&self, types: &[Iri]) -> Option<TypeStyle>;
}

/// Which element template renders an element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    #[default]
    Standard,
    /// A host-provided template, by name.
    Custom(String),
}

pub trait ElementTemplateResolver {
    fn resolve(&self, types: &[Iri]) -> Option<TemplateKind>;
}

/// Arrowhead drawn at a link end.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkMarkerStyle {
    /// SVG path data.
    pub d: String,
    pub width: f32,
    pub height: f32,
    pub fill: Color,
}

impl Default for LinkMarkerStyle {
    fn default() -> Self {
        Self {
            d: "M0,0 L0,8 L9,4 z".to_string(),
            width: 9.0,
            height: 8.0,
            fill: Color::default(),
        }
    }
}

/// Partial link template returned by a [`LinkTemplateResolver`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkTemplateSpec {
    pub marker_source: Option<LinkMarkerStyle>,
    pub marker_target: Option<LinkMarkerStyle>,
    pub stroke: Option<Color>,
    pub stroke_width: Option<f32>,
}

pub trait LinkTemplateResolver {
    fn resolve(&self, link_type: Iri) -> Option<LinkTemplateSpec>;
}

/// Resolved template of one link type.
///
/// `marker_index` is unique for the lifetime of the rendering state and
/// suffixes the SVG marker ids.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkTemplate {
    pub type_id: Iri,
    pub marker_index: u32,
    pub marker_source: Option<LinkMarkerStyle>,
    pub marker_target: LinkMarkerStyle,
    pub stroke: Color,
    pub stroke_width: f32,
}

impl LinkTemplate {
    pub(crate) fn from_spec(type_id: Iri, marker_index: u32, spec: LinkTemplateSpec) -> Self {
        Self {
            type_id,
            marker_index,
            marker_source: spec.marker_source,
            marker_target: spec.marker_target.unwrap_or_default(),
            stroke: spec.stroke.unwrap_or_default(),
            stroke_width: spec.stroke_width.unwrap_or(1.0),
        }
    }

    pub fn source_marker_id(&self) -> Option<String> {
        self.marker_source
            .as_ref()
            .map(|_| format!("ontoscope-marker-source-{}", self.marker_index))
    }

    pub fn target_marker_id(&self) -> String {
        format!("ontoscope-marker-target-{}", self.marker_index)
    }
}

/// Installed resolvers.
#[derive(Default)]
pub struct Resolvers {
    pub type_style: Option<Box<dyn TypeStyleResolver>>,
    pub link_template: Option<Box<dyn LinkTemplateResolver>>,
    pub element_template: Option<Box<dyn ElementTemplateResolver>>,
}

impl Resolvers {
    pub fn resolve_type_style(&self, types: &[Iri]) -> ResolvedTypeStyle {
        let style = self
            .type_style
            .as_ref()
            .and_then(|resolver| resolver.resolve(types))
            .unwrap_or_default();
        let color = style.color.unwrap_or_else(|| {
            let names: Vec<String> = types.iter().map(ToString::to_string).collect();
            Color::from_hue(hue_from_types(&names, DEFAULT_HUE_SEED))
        });
        ResolvedTypeStyle {
            color,
            icon: style.icon,
        }
    }

    pub fn resolve_link_template(&self, link_type: Iri) -> LinkTemplateSpec {
        self.link_template
            .as_ref()
            .and_then(|resolver| resolver.resolve(link_type))
            .unwrap_or_default()
    }

    pub fn resolve_template_kind(&self, types: &[Iri]) -> TemplateKind {
        self.element_template
            .as_ref()
            .and_then(|resolver| resolver.resolve(types))
            .unwrap_or_default()
    }
}

impl fmt::Debug for Resolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolvers")
            .field("type_style", &self.type_style.is_some())
            .field("link_template", &self.link_template.is_some())
            .field("element_template", &self.element_template.is_some())
            .finish()
    }
}
