use std::{fs, path::Path};

use log::{debug, warn};
use svg::node::element as svg_element;

use ontoscope_core::{
    color::Color,
    geometry::{Bounds, Point},
};

use super::{
    Error,
    layer::{ExportLayer, LayeredOutput},
};
use crate::{
    model::{Element, Graph, Link},
    rendering::{LinkMarkerStyle, LinkState, RenderingState, TemplateProps, compute_link_state},
    router::{content_bounds, element_bounds},
};

const FONT_FAMILY: &str = "Helvetica, Arial, sans-serif";
const LABEL_FONT_SIZE: f32 = 14.0;
const TYPE_FONT_SIZE: f32 = 11.0;

/// Converts image URLs referenced by elements into `data:` URIs.
pub trait ImageLoader {
    fn load(&self, url: &str) -> Result<String, String>;
}

/// Export settings.
pub struct ExportOptions<'a> {
    /// Exported paper region; the bounding box of all content when `None`.
    pub content_box: Option<Bounds>,
    pub padding: f32,
    pub language: &'a str,
    /// Transparent when `None`.
    pub background: Option<Color>,
    /// Images keep their original URL when `None`.
    pub image_loader: Option<&'a dyn ImageLoader>,
}

impl Default for ExportOptions<'_> {
    fn default() -> Self {
        Self {
            content_box: None,
            padding: 20.0,
            language: "en",
            background: None,
            image_loader: None,
        }
    }
}

/// Serializes the diagram as a standalone SVG document.
///
/// Links whose link type is hidden, or whose endpoints are missing, are left
/// out. Elements are drawn with their measured size from `rendering`.
///
/// # Arguments
///
/// * `graph` - The diagram to export
/// * `rendering` - Measured sizes and link templates; templates missing from
///   it are computed and cached
/// * `options` - Exported region, padding, label language, background and
///   image embedding
///
/// # Examples
///
/// ```
/// use ontoscope::{
///     export::svg::{ExportOptions, to_svg},
///     geometry::{Point, Size},
///     model::{DiagramModel, Iri},
///     rendering::{RenderingState, Resolvers},
///     router::DefaultLinkRouter,
/// };
///
/// let mut model = DiagramModel::new();
/// let mut rendering = RenderingState::new(
///     &model.events(),
///     Box::new(DefaultLinkRouter::default()),
///     Resolvers::default(),
/// );
/// let alice = model.create_element_at(Iri::new("http://ex.org/alice"), None, Point::new(0.0, 0.0));
/// rendering.set_element_size(alice, Size::new(100.0, 40.0));
///
/// let svg = to_svg(model.graph(), &mut rendering, &ExportOptions::default()).unwrap();
/// assert!(svg.contains("viewBox=\"0 0 140 80\""));
/// ```
///
/// # Errors
///
/// Returns [`Error::Render`] if a link path cannot be computed.
pub fn to_svg(
    graph: &Graph,
    rendering: &mut RenderingState,
    options: &ExportOptions<'_>,
) -> Result<String, Error> {
    let content = options
        .content_box
        .unwrap_or_else(|| content_bounds(graph, &*rendering));
    let width = content.width() + 2.0 * options.padding;
    let height = content.height() + 2.0 * options.padding;

    let mut doc = svg::Document::new()
        .set("viewBox", format!("0 0 {} {}", width, height))
        .set("width", width)
        .set("height", height);

    let mut output = LayeredOutput::new();
    if let Some(background) = options.background {
        let rect = svg_element::Rectangle::new()
            .set("x", content.min_x() - options.padding)
            .set("y", content.min_y() - options.padding)
            .set("width", width)
            .set("height", height)
            .set("fill", &background);
        output.add_to_layer(ExportLayer::Background, Box::new(rect));
    }

    let mut markers = svg_element::Definitions::new();
    let mut marker_indices = Vec::new();
    for link in graph.links().filter(|link| is_exported(graph, link)) {
        let state = compute_link_state(graph, rendering, link, options.language, 0)?;
        if !marker_indices.contains(&state.template.marker_index) {
            marker_indices.push(state.template.marker_index);
            if let (Some(id), Some(style)) = (
                state.template.source_marker_id(),
                state.template.marker_source.as_ref(),
            ) {
                markers = markers.add(render_marker(&id, style, true));
            }
            markers = markers.add(render_marker(
                &state.template.target_marker_id(),
                &state.template.marker_target,
                false,
            ));
        }
        output.merge(render_link(&state));
    }

    for element in graph.elements() {
        let bounds = element_bounds(graph, rendering, element.id()).unwrap_or_default();
        let props = TemplateProps::compute(element, graph, rendering, options.language);
        output.merge(render_element(element, &props, bounds, options.image_loader));
    }

    let mut main_group = svg_element::Group::new().set(
        "transform",
        format!(
            "translate({}, {})",
            options.padding - content.min_x(),
            options.padding - content.min_y()
        ),
    );
    for node in output.render() {
        main_group = main_group.add(node);
    }

    doc = doc.add(markers).add(main_group);
    debug!(
        elements = graph.element_count(),
        links = graph.link_count(),
        width = width,
        height = height;
        "Exported diagram to SVG"
    );
    Ok(doc.to_string())
}

/// Writes an exported SVG document to `path`.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be written.
pub fn save_svg(path: impl AsRef<Path>, content: &str) -> Result<(), Error> {
    fs::write(path, content)?;
    Ok(())
}

fn is_exported(graph: &Graph, link: &Link) -> bool {
    graph.contains_element(link.source_id())
        && graph.contains_element(link.target_id())
        && graph
            .link_type(link.type_id())
            .is_none_or(|link_type| link_type.is_visible())
}

fn path_data(polyline: &[Point]) -> String {
    polyline
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let command = if i == 0 { 'M' } else { 'L' };
            format!("{command}{},{}", point.x(), point.y())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_marker(id: &str, style: &LinkMarkerStyle, at_source: bool) -> svg_element::Marker {
    svg_element::Marker::new()
        .set("id", id)
        .set("viewBox", format!("0 0 {} {}", style.width, style.height))
        .set("refX", style.width)
        .set("refY", style.height / 2.0)
        .set("markerWidth", style.width)
        .set("markerHeight", style.height)
        .set("markerUnits", "userSpaceOnUse")
        .set("orient", if at_source { "auto-start-reverse" } else { "auto" })
        .add(
            svg_element::Path::new()
                .set("d", style.d.as_str())
                .set("fill", &style.fill),
        )
}

fn render_link(state: &LinkState) -> LayeredOutput {
    let mut output = LayeredOutput::new();

    let mut path = svg_element::Path::new()
        .set("d", path_data(&state.polyline))
        .set("fill", "none")
        .set("stroke", &state.style.stroke)
        .set("stroke-width", state.style.stroke_width)
        .set("marker-end", format!("url(#{})", state.template.target_marker_id()));
    if let Some(id) = state.template.source_marker_id() {
        path = path.set("marker-start", format!("url(#{id})"));
    }
    if state.style.dashed {
        path = path.set("stroke-dasharray", "5,5");
    }
    output.add_to_layer(ExportLayer::Links, Box::new(path));

    if let Some(label) = &state.label {
        let text = svg_element::Text::new(label.as_str())
            .set("x", state.label_position.x())
            .set("y", state.label_position.y())
            .set("text-anchor", state.text_anchor.as_svg())
            .set("dominant-baseline", "middle")
            .set("font-family", FONT_FAMILY)
            .set("font-size", TYPE_FONT_SIZE);
        output.add_to_layer(ExportLayer::Labels, Box::new(text));
    }
    output
}

fn render_element(
    element: &Element,
    props: &TemplateProps,
    bounds: Bounds,
    image_loader: Option<&dyn ImageLoader>,
) -> LayeredOutput {
    let mut output = LayeredOutput::new();

    let rect = svg_element::Rectangle::new()
        .set("x", bounds.min_x())
        .set("y", bounds.min_y())
        .set("width", bounds.width())
        .set("height", bounds.height())
        .set("fill", "white")
        .set("stroke", &props.color)
        .set("stroke-width", 2)
        .set("data-element-id", element.id().to_string());
    output.add_to_layer(ExportLayer::Elements, Box::new(rect));

    if let Some(url) = &props.image {
        let href = embed_image(url, image_loader);
        let image = svg_element::Image::new()
            .set("href", href)
            .set("x", bounds.min_x())
            .set("y", bounds.min_y())
            .set("width", bounds.width())
            .set("height", bounds.height() / 2.0)
            .set("preserveAspectRatio", "xMidYMid meet");
        output.add_to_layer(ExportLayer::Elements, Box::new(image));
    }

    let center = bounds.center();
    let label = svg_element::Text::new(props.label.as_str())
        .set("x", center.x())
        .set("y", center.y())
        .set("text-anchor", "middle")
        .set("dominant-baseline", "middle")
        .set("font-family", FONT_FAMILY)
        .set("font-size", LABEL_FONT_SIZE);
    output.add_to_layer(ExportLayer::Elements, Box::new(label));

    if !props.type_labels.is_empty() {
        let types = svg_element::Text::new(props.type_labels.join(", "))
            .set("x", center.x())
            .set("y", center.y() + LABEL_FONT_SIZE)
            .set("text-anchor", "middle")
            .set("dominant-baseline", "middle")
            .set("font-family", FONT_FAMILY)
            .set("font-size", TYPE_FONT_SIZE)
            .set("fill", &props.color);
        output.add_to_layer(ExportLayer::Elements, Box::new(types));
    }
    output
}

/// Data URI for `url`, or `url` itself when it cannot be loaded.
fn embed_image(url: &str, loader: Option<&dyn ImageLoader>) -> String {
    let Some(loader) = loader else {
        return url.to_owned();
    };
    match loader.load(url) {
        Ok(data_uri) => data_uri,
        Err(err) => {
            warn!(url = url, err = err.as_str(); "Failed to embed image, keeping its URL");
            url.to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use ontoscope_core::geometry::Size;

    use super::*;
    use crate::{
        model::{DiagramModel, ElementData, Iri, LinkData, Literal},
        rendering::Resolvers,
        router::DefaultLinkRouter,
    };

    struct FakeLoader;

    impl ImageLoader for FakeLoader {
        fn load(&self, url: &str) -> Result<String, String> {
            if url.ends_with(".png") {
                Ok("data:image/png;base64,AAAA".to_string())
            } else {
                Err(format!("unsupported image {url}"))
            }
        }
    }

    fn diagram() -> (DiagramModel, RenderingState) {
        let mut model = DiagramModel::new();
        let rendering = RenderingState::new(
            &model.events(),
            Box::new(DefaultLinkRouter::default()),
            Resolvers::default(),
        );
        let alice = model.create_element_at(
            ElementData::new(Iri::new("http://ex.org/alice"))
                .with_label(Literal::plain("Alice"))
                .with_image("http://ex.org/alice.png"),
            None,
            Point::new(0.0, 0.0),
        );
        let bob = model.create_element_at(
            ElementData::new(Iri::new("http://ex.org/bob")).with_image("http://ex.org/bob.gif"),
            None,
            Point::new(200.0, 0.0),
        );
        let knows = Link::new(
            alice,
            bob,
            LinkData::new(
                Iri::new("http://ex.org/knows"),
                Iri::new("http://ex.org/alice"),
                Iri::new("http://ex.org/bob"),
            ),
        );
        model.create_link(knows);
        (model, rendering)
    }

    fn measure(model: &DiagramModel, rendering: &mut RenderingState) {
        let ids: Vec<_> = model.graph().elements().map(Element::id).collect();
        for id in ids {
            rendering.set_element_size(id, Size::new(100.0, 40.0));
        }
    }

    #[test]
    fn test_document_size_includes_padding() {
        let (model, mut rendering) = diagram();
        measure(&model, &mut rendering);

        let svg = to_svg(model.graph(), &mut rendering, &ExportOptions::default()).unwrap();

        assert!(svg.contains("viewBox=\"0 0 340 80\""));
        assert!(svg.contains("translate(20, 20)"));
        assert!(svg.contains("data-layer=\"links\""));
        assert!(svg.contains("data-layer=\"elements\""));
        assert!(svg.contains("Alice"));
        assert!(svg.contains("knows"));
        assert!(svg.contains("marker-end=\"url(#ontoscope-marker-target-"));
        assert!(svg.contains("M0,0 L0,8 L9,4 z"));
    }

    #[test]
    fn test_explicit_content_box() {
        let (model, mut rendering) = diagram();
        let options = ExportOptions {
            content_box: Some(Bounds::new_from_top_left(
                Point::new(-50.0, -50.0),
                Size::new(100.0, 100.0),
            )),
            padding: 0.0,
            background: Some(Color::new("#ffffff").unwrap()),
            ..ExportOptions::default()
        };

        let svg = to_svg(model.graph(), &mut rendering, &options).unwrap();

        assert!(svg.contains("viewBox=\"0 0 100 100\""));
        assert!(svg.contains("translate(50, 50)"));
        assert!(svg.contains("data-layer=\"background\""));
        assert!(svg.contains("fill=\"#ffffff\""));
    }

    #[test]
    fn test_images_are_embedded_or_kept() {
        let (model, mut rendering) = diagram();
        let loader = FakeLoader;
        let options = ExportOptions {
            image_loader: Some(&loader),
            ..ExportOptions::default()
        };

        let svg = to_svg(model.graph(), &mut rendering, &options).unwrap();

        assert!(svg.contains("data:image/png;base64,AAAA"));
        assert!(!svg.contains("http://ex.org/alice.png"));
        assert!(svg.contains("http://ex.org/bob.gif"));
    }

    #[test]
    fn test_hidden_link_types_are_skipped() {
        let (mut model, mut rendering) = diagram();
        model
            .link_type_mut(Iri::new("http://ex.org/knows"))
            .unwrap()
            .set_visibility(false, false);

        let svg = to_svg(model.graph(), &mut rendering, &ExportOptions::default()).unwrap();

        assert!(!svg.contains("data-layer=\"links\""));
        assert!(!svg.contains("<marker"));
    }

    #[test]
    fn test_layout_only_links_are_dashed() {
        let (mut model, mut rendering) = diagram();
        let link = model.graph().links().next().unwrap().id();
        model.link_mut(link).unwrap().set_layout_only(true);

        let svg = to_svg(model.graph(), &mut rendering, &ExportOptions::default()).unwrap();

        assert!(svg.contains("stroke-dasharray=\"5,5\""));
    }

    #[test]
    fn test_save_svg() {
        let (model, mut rendering) = diagram();
        let svg = to_svg(model.graph(), &mut rendering, &ExportOptions::default()).unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();

        save_svg(file.path(), &svg).unwrap();

        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), svg);
    }
}
