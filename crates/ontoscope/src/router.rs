//! Automatic routing of parallel links and self-loops.
//!
//! The router only adds waypoints where the user placed none:
//!
//! - Self-loops fan out as L-shaped paths above and to the left of their
//!   element, each further loop `gap` units farther out.
//! - Two or more links between the same pair of elements bend away from the
//!   center line, alternating sides, `gap` units apart.
//!
//! Every other link is left unrouted and drawn through its own vertices.
//! Routing is a pure function of element positions, element sizes, and link
//! vertices, so routing an unchanged graph twice gives equal results.

use std::{collections::HashMap, f32::consts::PI};

use ontoscope_core::geometry::{Bounds, Point, Size, content_fitting_box};

use crate::model::{ElementId, Graph, Link, LinkId};

/// Supplies measured element sizes.
pub trait SizeProvider {
    /// Measured size, or `None` if the element was never measured.
    fn element_size(&self, element: ElementId) -> Option<Size>;
}

impl SizeProvider for HashMap<ElementId, Size> {
    fn element_size(&self, element: ElementId) -> Option<Size> {
        self.get(&element).copied()
    }
}

/// Bounding box of an element; unmeasured elements have zero size.
pub fn element_bounds(graph: &Graph, sizes: &dyn SizeProvider, element: ElementId) -> Option<Bounds> {
    let position = graph.element(element)?.position();
    let size = sizes.element_size(element).unwrap_or_default();
    Some(Bounds::new_from_top_left(position, size))
}

/// Bounding box of all elements and link vertices in the graph.
pub fn content_bounds(graph: &Graph, sizes: &dyn SizeProvider) -> Bounds {
    content_fitting_box(
        graph
            .elements()
            .filter_map(|element| element_bounds(graph, sizes, element.id())),
        graph.links().flat_map(|link| link.vertices().iter().copied()),
    )
}

/// Horizontal alignment of a link label relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextAnchor {
    Start,
    #[default]
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_svg(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

/// Computed waypoints for one link.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedLink {
    pub link_id: LinkId,
    pub vertices: Vec<Point>,
    pub label_text_anchor: Option<TextAnchor>,
}

pub type RoutedLinks = HashMap<LinkId, RoutedLink>;

pub trait LinkRouter {
    fn route(&self, graph: &Graph, sizes: &dyn SizeProvider) -> RoutedLinks;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultLinkRouter {
    gap: f32,
}

impl DefaultLinkRouter {
    pub const DEFAULT_GAP: f32 = 20.0;

    pub fn new(gap: f32) -> Self {
        Self { gap }
    }

    pub fn gap(&self) -> f32 {
        self.gap
    }

    fn route_self_loops(
        &self,
        graph: &Graph,
        sizes: &dyn SizeProvider,
        element: ElementId,
        routings: &mut RoutedLinks,
    ) {
        let Some(bounds) = element_bounds(graph, sizes, element) else {
            return;
        };
        let (x, y) = (bounds.min_x(), bounds.min_y());
        let center = bounds.center();

        let loops = graph.links_of(element).filter(|link| link.is_self_loop());
        for (index, link) in loops.enumerate() {
            if routings.contains_key(&link.id()) || !link.vertices().is_empty() {
                continue;
            }
            let offset = self.gap * (index + 1) as f32;
            routings.insert(
                link.id(),
                RoutedLink {
                    link_id: link.id(),
                    vertices: vec![
                        Point::new(x - offset, center.y()),
                        Point::new(x - offset, y - offset),
                        Point::new(center.x(), y - offset),
                    ],
                    label_text_anchor: None,
                },
            );
        }
    }

    fn route_siblings(
        &self,
        graph: &Graph,
        sizes: &dyn SizeProvider,
        link: &Link,
        routings: &mut RoutedLinks,
    ) {
        let (source_id, target_id) = (link.source_id(), link.target_id());
        let siblings: Vec<LinkId> = graph
            .links_of(source_id)
            .filter(|sibling| sibling.touches(target_id) && !sibling.is_self_loop())
            .filter(|sibling| !routings.contains_key(&sibling.id()) && sibling.vertices().is_empty())
            .map(Link::id)
            .collect();
        if siblings.len() <= 1 {
            return;
        }

        let (Some(source), Some(target)) = (
            element_bounds(graph, sizes, source_id),
            element_bounds(graph, sizes, target_id),
        ) else {
            return;
        };
        let source_center = source.center();
        let target_center = target.center();
        let middle = source_center.midpoint(target_center);
        let direction = target_center.sub_point(source_center).normalize();

        let angle = direction.y().atan2(direction.x());
        let is_horizontal = angle.abs() < PI / 8.0 || angle.abs() > 7.0 * PI / 8.0;
        let is_top = direction.y() < 0.0;

        let count = siblings.len();
        let index_modifier = if count % 2 == 1 { 0 } else { 1 };
        for (position, sibling) in siblings.into_iter().enumerate() {
            let index = position + index_modifier;
            let mut offset = self.gap * (index as f32 / 2.0).ceil();
            if index_modifier == 1 {
                offset -= self.gap / 2.0;
            }
            let normal = if index % 2 == 1 {
                Point::new(-direction.y(), direction.x())
            } else {
                Point::new(direction.y(), -direction.x())
            };

            let first_outer = position + 2 == count;
            let second_outer = position + 1 == count;
            let anchor = if is_horizontal {
                TextAnchor::Middle
            } else if (is_top && second_outer) || (!is_top && first_outer) {
                TextAnchor::End
            } else if (is_top && first_outer) || (!is_top && second_outer) {
                TextAnchor::Start
            } else {
                TextAnchor::Middle
            };

            routings.insert(
                sibling,
                RoutedLink {
                    link_id: sibling,
                    vertices: vec![middle.add_point(normal.scale(offset))],
                    label_text_anchor: Some(anchor),
                },
            );
        }
    }
}

impl Default for DefaultLinkRouter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_GAP)
    }
}

impl LinkRouter for DefaultLinkRouter {
    fn route(&self, graph: &Graph, sizes: &dyn SizeProvider) -> RoutedLinks {
        let mut routings = RoutedLinks::new();
        for link in graph.links() {
            if routings.contains_key(&link.id()) {
                continue;
            }
            if link.is_self_loop() {
                self.route_self_loops(graph, sizes, link.source_id(), &mut routings);
            } else {
                self.route_siblings(graph, sizes, link, &mut routings);
            }
        }
        routings
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;
    use crate::model::{Element, ElementData, Iri, LinkData};

    struct Fixture {
        graph: Graph,
        sizes: HashMap<ElementId, Size>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                graph: Graph::new(),
                sizes: HashMap::new(),
            }
        }

        fn element(&mut self, iri: &str, x: f32, y: f32) -> ElementId {
            let element = Element::new(ElementData::new(Iri::new(iri))).at(Point::new(x, y));
            let id = element.id();
            self.graph.add_element(element);
            self.sizes.insert(id, Size::new(100.0, 40.0));
            id
        }

        fn link(&mut self, source: ElementId, target: ElementId, type_iri: &str) -> LinkId {
            let link = Link::new(
                source,
                target,
                LinkData::new(Iri::new(type_iri), Iri::new("ex:s"), Iri::new("ex:t")),
            );
            let id = link.id();
            self.graph.add_link(link);
            id
        }

        fn route(&self) -> RoutedLinks {
            DefaultLinkRouter::default().route(&self.graph, &self.sizes)
        }
    }

    /// Signed distance of `point` from the line through the element centers.
    fn signed_offset(fixture: &Fixture, a: ElementId, b: ElementId, point: Point) -> f32 {
        let ca = element_bounds(&fixture.graph, &fixture.sizes, a).unwrap().center();
        let cb = element_bounds(&fixture.graph, &fixture.sizes, b).unwrap().center();
        let direction = cb.sub_point(ca).normalize();
        direction.cross(point.sub_point(ca))
    }

    #[test]
    fn test_single_link_is_not_routed() {
        let mut fixture = Fixture::new();
        let a = fixture.element("ex:a", 0.0, 0.0);
        let b = fixture.element("ex:b", 300.0, 0.0);
        fixture.link(a, b, "ex:p");

        assert!(fixture.route().is_empty());
    }

    #[test]
    fn test_three_siblings_offsets_are_symmetric() {
        let mut fixture = Fixture::new();
        let a = fixture.element("ex:a", 0.0, 0.0);
        let b = fixture.element("ex:b", 300.0, 0.0);
        let links = [
            fixture.link(a, b, "ex:p"),
            fixture.link(a, b, "ex:q"),
            fixture.link(b, a, "ex:r"),
        ];

        let routings = fixture.route();
        let mut offsets: Vec<f32> = links
            .iter()
            .map(|id| signed_offset(&fixture, a, b, routings[id].vertices[0]))
            .collect();
        offsets.sort_by(f32::total_cmp);

        let gap = DefaultLinkRouter::DEFAULT_GAP;
        assert!(approx_eq!(f32, offsets[0], -gap, epsilon = 1e-4));
        assert!(approx_eq!(f32, offsets[1], 0.0, epsilon = 1e-4));
        assert!(approx_eq!(f32, offsets[2], gap, epsilon = 1e-4));
    }

    #[test]
    fn test_two_siblings_have_no_zero_offset() {
        let mut fixture = Fixture::new();
        let a = fixture.element("ex:a", 0.0, 0.0);
        let b = fixture.element("ex:b", 0.0, 300.0);
        let links = [fixture.link(a, b, "ex:p"), fixture.link(a, b, "ex:q")];

        let routings = fixture.route();
        let offsets: Vec<f32> = links
            .iter()
            .map(|id| signed_offset(&fixture, a, b, routings[id].vertices[0]))
            .collect();

        let half_gap = DefaultLinkRouter::DEFAULT_GAP / 2.0;
        assert!(approx_eq!(f32, offsets[0].abs(), half_gap, epsilon = 1e-4));
        assert!(approx_eq!(f32, offsets[0], -offsets[1], epsilon = 1e-4));
    }

    #[test]
    fn test_vertical_siblings_anchor_outer_labels() {
        let mut fixture = Fixture::new();
        let a = fixture.element("ex:a", 0.0, 0.0);
        let b = fixture.element("ex:b", 0.0, 300.0);
        let links = [
            fixture.link(a, b, "ex:p"),
            fixture.link(a, b, "ex:q"),
            fixture.link(a, b, "ex:r"),
        ];

        let routings = fixture.route();
        let anchors: Vec<_> = links
            .iter()
            .map(|id| routings[id].label_text_anchor)
            .collect();
        assert_eq!(
            anchors,
            vec![
                Some(TextAnchor::Middle),
                Some(TextAnchor::End),
                Some(TextAnchor::Start)
            ]
        );
    }

    #[test]
    fn test_horizontal_siblings_keep_middle_anchor() {
        let mut fixture = Fixture::new();
        let a = fixture.element("ex:a", 0.0, 0.0);
        let b = fixture.element("ex:b", 300.0, 0.0);
        fixture.link(a, b, "ex:p");
        fixture.link(a, b, "ex:q");

        let routings = fixture.route();
        assert!(routings
            .values()
            .all(|routed| routed.label_text_anchor == Some(TextAnchor::Middle)));
    }

    #[test]
    fn test_self_loops_fan_out() {
        let mut fixture = Fixture::new();
        let a = fixture.element("ex:a", 100.0, 100.0);
        let first = fixture.link(a, a, "ex:p");
        let second = fixture.link(a, a, "ex:q");

        let routings = fixture.route();
        let gap = DefaultLinkRouter::DEFAULT_GAP;
        assert_eq!(
            routings[&first].vertices,
            vec![
                Point::new(100.0 - gap, 120.0),
                Point::new(100.0 - gap, 100.0 - gap),
                Point::new(150.0, 100.0 - gap),
            ]
        );
        assert_eq!(routings[&second].vertices[0], Point::new(100.0 - 2.0 * gap, 120.0));
    }

    #[test]
    fn test_links_with_user_vertices_are_skipped() {
        let mut fixture = Fixture::new();
        let a = fixture.element("ex:a", 0.0, 0.0);
        let b = fixture.element("ex:b", 300.0, 0.0);
        let manual = fixture.link(a, b, "ex:p");
        fixture.link(a, b, "ex:q");
        fixture
            .graph
            .link_mut(manual)
            .unwrap()
            .set_vertices(vec![Point::new(150.0, 200.0)]);

        let routings = fixture.route();
        assert!(!routings.contains_key(&manual));
        assert!(routings.is_empty());
    }

    #[test]
    fn test_routing_is_deterministic() {
        let mut fixture = Fixture::new();
        let a = fixture.element("ex:a", 0.0, 0.0);
        let b = fixture.element("ex:b", 250.0, 170.0);
        for type_iri in ["ex:p", "ex:q", "ex:r", "ex:s"] {
            fixture.link(a, b, type_iri);
        }
        fixture.link(b, b, "ex:loop");

        assert_eq!(fixture.route(), fixture.route());
    }
}
