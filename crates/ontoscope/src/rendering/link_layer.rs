//! Link render layer.
//!
//! Links depend on more than their own state: endpoint positions and sizes,
//! routings, and their link type. Requests about those are recorded per
//! element or per link type and expanded to the affected links when the
//! layer is flushed.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use indexmap::IndexMap;
use log::trace;

use ontoscope_core::{
    color::Color,
    events::EventObserver,
    geometry::{GeometryError, Point, compute_polyline, point_along_polyline, polyline_length},
    scheduler::Debouncer,
};

use super::{
    invalidation::{LayerDiff, RedrawBatch, RedrawLevel},
    state::{RenderingEvent, RenderingState},
    templates::LinkTemplate,
};
use crate::{
    model::{
        CellsEvent, ElementChange, ElementEvent, ElementId, Graph, GraphEvents, Iri, Link,
        LinkChange, LinkEvent, LinkId, LinkTypeChange, LinkTypeEvent, choose_label,
    },
    router::{RoutedLink, TextAnchor, element_bounds},
};

#[derive(Debug, Clone, PartialEq)]
pub struct LinkStyle {
    pub stroke: Color,
    pub stroke_width: f32,
    /// Layout-only links are drawn dashed.
    pub dashed: bool,
}

/// Materialized state of one rendered link.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkState {
    pub link_id: LinkId,
    pub polyline: Vec<Point>,
    pub routing: Option<Rc<RoutedLink>>,
    pub template: Rc<LinkTemplate>,
    pub style: LinkStyle,
    /// `None` when the link type hides its label.
    pub label: Option<String>,
    pub label_position: Point,
    pub text_anchor: TextAnchor,
    pub template_revision: u64,
}

struct Requests {
    links: RedrawBatch<LinkId>,
    elements: RedrawBatch<ElementId>,
    link_types: RedrawBatch<Iri>,
}

impl Requests {
    fn new() -> Self {
        let debouncer = Debouncer::new();
        Self {
            links: RedrawBatch::new(debouncer.clone()),
            elements: RedrawBatch::new(debouncer.clone()),
            link_types: RedrawBatch::new(debouncer),
        }
    }
}

/// Tracks which links need re-rendering and materializes them on flush.
pub struct LinkLayer {
    group: Option<ElementId>,
    current: IndexMap<LinkId, Rc<LinkState>>,
    requests: Rc<RefCell<Requests>>,
    observer: EventObserver,
}

impl LinkLayer {
    pub fn new(events: &GraphEvents, rendering: &RenderingState, group: Option<ElementId>) -> Self {
        let requests = Rc::new(RefCell::new(Requests::new()));
        requests
            .borrow_mut()
            .links
            .request_all(RedrawLevel::RecomputeTemplate);

        let mut observer = EventObserver::new();
        let pending = Rc::clone(&requests);
        observer.listen(&events.link, move |event: &LinkEvent| {
            let level = match &event.change {
                LinkChange::Data { .. } | LinkChange::LayoutOnly { .. } | LinkChange::LinkState { .. } => {
                    RedrawLevel::RecomputeTemplate
                }
                LinkChange::Vertices { .. } => RedrawLevel::Render,
                LinkChange::RequestedRedraw { level } => *level,
            };
            pending.borrow_mut().links.request(event.source, level);
        });
        let pending = Rc::clone(&requests);
        observer.listen(&events.cells, move |event: &CellsEvent| {
            let mut pending = pending.borrow_mut();
            match event {
                CellsEvent::LinkAdded(id) => pending.links.request(*id, RedrawLevel::RecomputeTemplate),
                CellsEvent::LinkRemoved(link) => pending.links.request(link.id(), RedrawLevel::Render),
                CellsEvent::Reset => pending.links.request_all(RedrawLevel::RecomputeTemplate),
                CellsEvent::ElementAdded(_) | CellsEvent::ElementRemoved(_) => {}
            }
        });
        let pending = Rc::clone(&requests);
        observer.listen(&events.element, move |event: &ElementEvent| {
            if matches!(event.change, ElementChange::Position { .. }) {
                pending
                    .borrow_mut()
                    .elements
                    .request(event.source, RedrawLevel::Render);
            }
        });
        let pending = Rc::clone(&requests);
        observer.listen(&events.link_type, move |event: &LinkTypeEvent| {
            let level = match event.change {
                LinkTypeChange::Label { .. } | LinkTypeChange::Visibility { .. } => {
                    RedrawLevel::RecomputeTemplate
                }
                LinkTypeChange::IsNew { .. } => RedrawLevel::RedrawTemplate,
            };
            pending.borrow_mut().link_types.request(event.source, level);
        });
        let pending = Rc::clone(&requests);
        observer.listen(&rendering.events(), move |event: &RenderingEvent| {
            let mut pending = pending.borrow_mut();
            match event {
                RenderingEvent::ChangeElementSize { source, .. } => {
                    pending.elements.request(*source, RedrawLevel::Render);
                }
                RenderingEvent::UpdateRoutings { previous, current } => {
                    let changed = previous
                        .iter()
                        .filter(|(id, routed)| {
                            !current.get(*id).is_some_and(|next| Rc::ptr_eq(routed, next))
                        })
                        .map(|(id, _)| *id)
                        .chain(
                            current
                                .keys()
                                .filter(|id| !previous.contains_key(*id))
                                .copied(),
                        );
                    for link in changed {
                        pending.links.request(link, RedrawLevel::Render);
                    }
                }
                RenderingEvent::ChangeLinkLabelBounds { .. }
                | RenderingEvent::ChangeLinkTemplates
                | RenderingEvent::SyncUpdate { .. } => {}
            }
        });

        Self {
            group,
            current: IndexMap::new(),
            requests,
            observer,
        }
    }

    pub fn state(&self, link: LinkId) -> Option<&Rc<LinkState>> {
        self.current.get(&link)
    }

    pub fn states(&self) -> impl Iterator<Item = &Rc<LinkState>> {
        self.current.values()
    }

    pub fn request_redraw(&self, link: LinkId, level: RedrawLevel) {
        self.requests.borrow_mut().links.request(link, level);
    }

    pub fn is_scheduled(&self) -> bool {
        self.requests.borrow().links.is_scheduled()
    }

    fn is_visible(&self, graph: &Graph, link: &Link) -> bool {
        let in_group = |element: ElementId| {
            graph
                .element(element)
                .is_some_and(|element| element.group() == self.group)
        };
        let type_visible = graph
            .link_type(link.type_id())
            .is_none_or(|link_type| link_type.is_visible());
        type_visible && in_group(link.source_id()) && in_group(link.target_id())
    }

    /// Applies pending requests, expanding element and link type requests
    /// to the links they affect.
    pub fn flush(
        &mut self,
        graph: &Graph,
        rendering: &mut RenderingState,
        language: &str,
    ) -> Result<LayerDiff<LinkId>, GeometryError> {
        let (mut drained, elements, link_types) = {
            let mut requests = self.requests.borrow_mut();
            (
                requests.links.take(),
                requests.elements.take(),
                requests.link_types.take(),
            )
        };
        for (element, level) in elements.requests {
            for link in graph.links_of(element) {
                merge_request(&mut drained.requests, link.id(), level);
            }
        }
        if !link_types.requests.is_empty() {
            for link in graph.links() {
                if let Some(level) = link_types.requests.get(&link.type_id()) {
                    merge_request(&mut drained.requests, link.id(), *level);
                }
            }
        }

        let mut diff = LayerDiff::default();
        if drained.requests.is_empty() && drained.all.is_none() {
            return Ok(diff);
        }

        let mut next = IndexMap::with_capacity(self.current.len());
        for link in graph.links().filter(|link| self.is_visible(graph, link)) {
            let id = link.id();
            let state = match (self.current.get(&id), drained.level_for(&id)) {
                (Some(state), None) => Rc::clone(state),
                (Some(state), Some(level)) => {
                    diff.updated.push(id);
                    let revision = match level {
                        RedrawLevel::Render => state.template_revision,
                        _ => state.template_revision + 1,
                    };
                    if level == RedrawLevel::RecomputeTemplate {
                        Rc::new(compute_state(graph, rendering, link, language, revision)?)
                    } else {
                        Rc::new(relayout(graph, rendering, link, state, revision)?)
                    }
                }
                (None, _) => {
                    diff.added.push(id);
                    Rc::new(compute_state(graph, rendering, link, language, 0)?)
                }
            };
            next.insert(id, state);
        }
        diff.removed = self
            .current
            .keys()
            .filter(|id| !next.contains_key(*id))
            .copied()
            .collect();
        self.current = next;

        trace!(
            added = diff.added.len(),
            updated = diff.updated.len(),
            removed = diff.removed.len();
            "Link layer flushed"
        );
        Ok(diff)
    }

    pub fn flush_if_scheduled(
        &mut self,
        graph: &Graph,
        rendering: &mut RenderingState,
        language: &str,
    ) -> Result<Option<LayerDiff<LinkId>>, GeometryError> {
        if !self.is_scheduled() {
            return Ok(None);
        }
        self.flush(graph, rendering, language).map(Some)
    }

    pub fn stop_listening(&mut self) {
        self.observer.stop_listening();
    }
}

fn merge_request(
    requests: &mut HashMap<LinkId, RedrawLevel>,
    link: LinkId,
    level: RedrawLevel,
) {
    requests
        .entry(link)
        .and_modify(|existing| *existing = existing.merge(level))
        .or_insert(level);
}

struct Geometry {
    polyline: Vec<Point>,
    routing: Option<Rc<RoutedLink>>,
    label_position: Point,
    text_anchor: TextAnchor,
}

fn layout(graph: &Graph, rendering: &RenderingState, link: &Link) -> Result<Geometry, GeometryError> {
    let routing = rendering.routing(link.id());
    let vertices = routing
        .as_ref()
        .map_or(link.vertices(), |routed| routed.vertices.as_slice());
    let source = element_bounds(graph, rendering, link.source_id()).unwrap_or_default();
    let target = element_bounds(graph, rendering, link.target_id()).unwrap_or_default();
    let polyline = compute_polyline(source, target, vertices);
    let label_position = point_along_polyline(&polyline, polyline_length(&polyline) / 2.0)?;
    let text_anchor = routing
        .as_ref()
        .and_then(|routed| routed.label_text_anchor)
        .unwrap_or_default();
    Ok(Geometry {
        polyline,
        routing,
        label_position,
        text_anchor,
    })
}

fn relayout(
    graph: &Graph,
    rendering: &RenderingState,
    link: &Link,
    state: &LinkState,
    template_revision: u64,
) -> Result<LinkState, GeometryError> {
    let geometry = layout(graph, rendering, link)?;
    Ok(LinkState {
        polyline: geometry.polyline,
        routing: geometry.routing,
        label_position: geometry.label_position,
        text_anchor: geometry.text_anchor,
        template_revision,
        ..state.clone()
    })
}

pub(crate) fn compute_state(
    graph: &Graph,
    rendering: &mut RenderingState,
    link: &Link,
    language: &str,
    template_revision: u64,
) -> Result<LinkState, GeometryError> {
    let template = rendering.link_template(link.type_id());
    let geometry = layout(graph, rendering, link)?;
    let link_type = graph.link_type(link.type_id());
    let label = link_type
        .is_none_or(|link_type| link_type.show_label())
        .then(|| {
            link_type
                .and_then(|link_type| choose_label(link_type.label(), language))
                .map_or_else(|| link.type_id().local_name(), |label| label.text().to_owned())
        });
    let style = LinkStyle {
        stroke: template.stroke,
        stroke_width: template.stroke_width,
        dashed: link.is_layout_only(),
    };

    Ok(LinkState {
        link_id: link.id(),
        polyline: geometry.polyline,
        routing: geometry.routing,
        template,
        style,
        label,
        label_position: geometry.label_position,
        text_anchor: geometry.text_anchor,
        template_revision,
    })
}

#[cfg(test)]
mod tests {
    use ontoscope_core::geometry::Size;

    use super::*;
    use crate::{
        model::{Element, ElementData, LinkData},
        rendering::Resolvers,
        router::DefaultLinkRouter,
    };

    struct Fixture {
        graph: Graph,
        rendering: RenderingState,
        layer: LinkLayer,
    }

    impl Fixture {
        fn new() -> Self {
            let graph = Graph::new();
            let rendering = RenderingState::new(
                &graph.events(),
                Box::new(DefaultLinkRouter::default()),
                Resolvers::default(),
            );
            let layer = LinkLayer::new(&graph.events(), &rendering, None);
            Self {
                graph,
                rendering,
                layer,
            }
        }

        fn element(&mut self, iri: &str, x: f32) -> ElementId {
            let element = Element::new(ElementData::new(Iri::new(iri))).at(Point::new(x, 0.0));
            let id = element.id();
            self.graph.add_element(element);
            self.rendering.set_element_size(id, Size::new(100.0, 40.0));
            id
        }

        fn link(&mut self, source: ElementId, target: ElementId, type_iri: &str) -> LinkId {
            self.graph.get_or_create_link_type(Iri::new(type_iri));
            let link = Link::new(
                source,
                target,
                LinkData::new(Iri::new(type_iri), Iri::new("ex:s"), Iri::new("ex:t")),
            );
            let id = link.id();
            self.graph.add_link(link);
            id
        }

        fn flush(&mut self) -> LayerDiff<LinkId> {
            self.rendering.flush_routings(&self.graph);
            self.layer
                .flush(&self.graph, &mut self.rendering, "en")
                .unwrap()
        }
    }

    #[test]
    fn test_link_state_geometry() {
        let mut fixture = Fixture::new();
        let a = fixture.element("ex:a", 0.0);
        let b = fixture.element("ex:b", 300.0);
        let link = fixture.link(a, b, "http://ex.org/knows");

        let diff = fixture.flush();
        assert_eq!(diff.added, vec![link]);

        let state = fixture.layer.state(link).unwrap();
        assert_eq!(state.polyline, vec![Point::new(100.0, 20.0), Point::new(300.0, 20.0)]);
        assert_eq!(state.label_position, Point::new(200.0, 20.0));
        assert_eq!(state.label.as_deref(), Some("knows"));
        assert_eq!(state.text_anchor, TextAnchor::Middle);
        assert!(!state.style.dashed);
    }

    #[test]
    fn test_element_move_updates_incident_links_only() {
        let mut fixture = Fixture::new();
        let a = fixture.element("ex:a", 0.0);
        let b = fixture.element("ex:b", 300.0);
        let c = fixture.element("ex:c", 600.0);
        let ab = fixture.link(a, b, "ex:p");
        let bc = fixture.link(b, c, "ex:p");
        fixture.flush();
        let untouched = Rc::clone(fixture.layer.state(bc).unwrap());

        fixture
            .graph
            .element_mut(a)
            .unwrap()
            .set_position(Point::new(0.0, 200.0));
        let diff = fixture.flush();

        assert_eq!(diff.updated, vec![ab]);
        assert!(Rc::ptr_eq(&untouched, fixture.layer.state(bc).unwrap()));
        let moved = fixture.layer.state(ab).unwrap();
        assert_eq!(moved.template_revision, 0);
    }

    #[test]
    fn test_hidden_link_type_removes_links() {
        let mut fixture = Fixture::new();
        let a = fixture.element("ex:a", 0.0);
        let b = fixture.element("ex:b", 300.0);
        let link = fixture.link(a, b, "ex:p");
        fixture.flush();

        fixture
            .graph
            .link_type_mut(Iri::new("ex:p"))
            .unwrap()
            .set_visibility(false, false);
        let diff = fixture.flush();

        assert_eq!(diff.removed, vec![link]);
        assert!(fixture.layer.state(link).is_none());
    }

    #[test]
    fn test_hidden_label_and_dashed_style() {
        let mut fixture = Fixture::new();
        let a = fixture.element("ex:a", 0.0);
        let b = fixture.element("ex:b", 300.0);
        let link = fixture.link(a, b, "ex:p");
        fixture
            .graph
            .link_type_mut(Iri::new("ex:p"))
            .unwrap()
            .set_visibility(true, false);
        fixture.graph.link_mut(link).unwrap().set_layout_only(true);

        fixture.flush();
        let state = fixture.layer.state(link).unwrap();
        assert_eq!(state.label, None);
        assert!(state.style.dashed);
    }

    #[test]
    fn test_routed_siblings_use_routing() {
        let mut fixture = Fixture::new();
        let a = fixture.element("ex:a", 0.0);
        let b = fixture.element("ex:b", 300.0);
        let first = fixture.link(a, b, "ex:p");
        let second = fixture.link(a, b, "ex:q");

        fixture.flush();
        let first = fixture.layer.state(first).unwrap();
        let second = fixture.layer.state(second).unwrap();
        assert!(first.routing.is_some());
        assert_eq!(first.polyline.len(), 3);
        assert_ne!(first.polyline[1], second.polyline[1]);
    }

    #[test]
    fn test_removed_links_leave_layer() {
        let mut fixture = Fixture::new();
        let a = fixture.element("ex:a", 0.0);
        let b = fixture.element("ex:b", 300.0);
        let link = fixture.link(a, b, "ex:p");
        fixture.flush();

        fixture.graph.remove_element(b);
        let diff = fixture.flush();
        assert_eq!(diff.removed, vec![link]);
    }
}
