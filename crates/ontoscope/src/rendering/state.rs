//! Rendering state: measured sizes, label bounds, routings, link templates.

use std::{collections::HashMap, rc::Rc};

use log::{debug, trace};

use ontoscope_core::{
    events::{EventObserver, EventSource, Events},
    geometry::{Bounds, Size},
    scheduler::Debouncer,
};

use super::{
    RenderingLayer,
    templates::{LinkTemplate, ResolvedTypeStyle, Resolvers, TemplateKind},
};
use crate::{
    model::{CellsEvent, ElementChange, ElementEvent, ElementId, Graph, GraphEvents, Iri, LinkChange, LinkEvent, LinkId},
    router::{LinkRouter, RoutedLink, SizeProvider},
};

/// Current routing of every routed link.
pub type Routings = HashMap<LinkId, Rc<RoutedLink>>;

#[derive(Debug, Clone)]
pub enum RenderingEvent {
    ChangeElementSize {
        source: ElementId,
        previous: Option<Size>,
    },
    ChangeLinkLabelBounds {
        source: LinkId,
        previous: Option<Bounds>,
    },
    UpdateRoutings {
        previous: Rc<Routings>,
        current: Rc<Routings>,
    },
    ChangeLinkTemplates,
    SyncUpdate {
        layer: RenderingLayer,
    },
}

/// Non-undoable presentation state derived from the model.
///
/// The state never reads the graph from inside an event listener. Model
/// events only mark work as pending; [`RenderingState::flush_routings`]
/// performs it against the graph passed in by the frame scheduler.
pub struct RenderingState {
    sizes: HashMap<ElementId, Size>,
    label_bounds: HashMap<LinkId, Bounds>,
    routings: Rc<Routings>,
    link_templates: HashMap<Iri, Rc<LinkTemplate>>,
    next_marker_index: u32,
    router: Box<dyn LinkRouter>,
    resolvers: Resolvers,
    routing: Debouncer,
    prune: Debouncer,
    source: EventSource<RenderingEvent>,
    observer: EventObserver,
}

impl RenderingState {
    pub fn new(events: &GraphEvents, router: Box<dyn LinkRouter>, resolvers: Resolvers) -> Self {
        let routing = Debouncer::new();
        let prune = Debouncer::new();
        let mut observer = EventObserver::new();

        let (on_cells, on_prune) = (routing.clone(), prune.clone());
        observer.listen(&events.cells, move |event: &CellsEvent| {
            if matches!(
                event,
                CellsEvent::ElementRemoved(_) | CellsEvent::LinkRemoved(_) | CellsEvent::Reset
            ) {
                on_prune.schedule();
            }
            on_cells.schedule();
        });
        let on_element = routing.clone();
        observer.listen(&events.element, move |event: &ElementEvent| {
            if matches!(event.change, ElementChange::Position { .. }) {
                on_element.schedule();
            }
        });
        let on_link = routing.clone();
        observer.listen(&events.link, move |event: &LinkEvent| {
            if matches!(event.change, LinkChange::Vertices { .. }) {
                on_link.schedule();
            }
        });

        // The graph may already hold content.
        routing.schedule();

        Self {
            sizes: HashMap::new(),
            label_bounds: HashMap::new(),
            routings: Rc::new(Routings::new()),
            link_templates: HashMap::new(),
            next_marker_index: 0,
            router,
            resolvers,
            routing,
            prune,
            source: EventSource::new(),
            observer,
        }
    }

    pub fn events(&self) -> Events<RenderingEvent> {
        self.source.events()
    }

    pub fn element_size(&self, element: ElementId) -> Option<Size> {
        self.sizes.get(&element).copied()
    }

    /// Stores a measured size. Sizes affect link attachment, so a change
    /// schedules rerouting.
    pub fn set_element_size(&mut self, element: ElementId, size: Size) {
        let previous = self.sizes.insert(element, size);
        if previous == Some(size) {
            return;
        }
        trace!(element:% = element; "Element size changed");
        self.routing.schedule();
        self.source
            .trigger(&RenderingEvent::ChangeElementSize { source: element, previous });
    }

    pub fn link_label_bounds(&self, link: LinkId) -> Option<Bounds> {
        self.label_bounds.get(&link).copied()
    }

    pub fn set_link_label_bounds(&mut self, link: LinkId, bounds: Bounds) {
        let previous = self.label_bounds.insert(link, bounds);
        if previous == Some(bounds) {
            return;
        }
        self.source
            .trigger(&RenderingEvent::ChangeLinkLabelBounds { source: link, previous });
    }

    pub fn routings(&self) -> Rc<Routings> {
        Rc::clone(&self.routings)
    }

    pub fn routing(&self, link: LinkId) -> Option<Rc<RoutedLink>> {
        self.routings.get(&link).cloned()
    }

    pub fn is_routing_scheduled(&self) -> bool {
        self.routing.is_scheduled()
    }

    /// Recomputes every routing.
    ///
    /// Routes structurally equal to the previous ones keep their previous
    /// `Rc`, so consumers can skip them with `Rc::ptr_eq`. Returns whether
    /// any routing changed; nothing is emitted otherwise.
    pub fn update_routings(&mut self, graph: &Graph) -> bool {
        self.routing.take();
        let computed = self.router.route(graph, &*self);

        let mut current = Routings::with_capacity(computed.len());
        let mut changed = computed.len() != self.routings.len();
        for (link, routed) in computed {
            let reused = self
                .routings
                .get(&link)
                .filter(|previous| ***previous == routed)
                .cloned();
            changed |= reused.is_none();
            current.insert(link, reused.unwrap_or_else(|| Rc::new(routed)));
        }
        if !changed {
            return false;
        }

        debug!(routed = current.len(); "Routings updated");
        let current = Rc::new(current);
        let previous = std::mem::replace(&mut self.routings, Rc::clone(&current));
        self.source
            .trigger(&RenderingEvent::UpdateRoutings { previous, current });
        true
    }

    /// Drops side-table entries of removed cells and reroutes if scheduled.
    pub fn flush_routings(&mut self, graph: &Graph) -> bool {
        if self.prune.take() {
            self.prune_removed(graph);
        }
        if self.routing.is_scheduled() {
            self.update_routings(graph)
        } else {
            false
        }
    }

    fn prune_removed(&mut self, graph: &Graph) {
        let (sizes, bounds) = (self.sizes.len(), self.label_bounds.len());
        self.sizes.retain(|element, _| graph.contains_element(*element));
        self.label_bounds.retain(|link, _| graph.link(*link).is_some());
        trace!(
            sizes = sizes - self.sizes.len(),
            label_bounds = bounds - self.label_bounds.len();
            "Pruned rendering side tables"
        );
    }

    /// Template of a link type, resolved once per type.
    pub fn link_template(&mut self, type_id: Iri) -> Rc<LinkTemplate> {
        if let Some(template) = self.link_templates.get(&type_id) {
            return Rc::clone(template);
        }
        let spec = self.resolvers.resolve_link_template(type_id);
        let template = Rc::new(LinkTemplate::from_spec(type_id, self.next_marker_index, spec));
        self.next_marker_index += 1;
        self.link_templates.insert(type_id, Rc::clone(&template));
        debug!(link_type:% = type_id, marker = template.marker_index; "Link template created");
        self.source.trigger(&RenderingEvent::ChangeLinkTemplates);
        template
    }

    pub fn link_templates(&self) -> impl Iterator<Item = &Rc<LinkTemplate>> {
        self.link_templates.values()
    }

    pub fn resolve_type_style(&self, types: &[Iri]) -> ResolvedTypeStyle {
        self.resolvers.resolve_type_style(types)
    }

    pub fn element_template_kind(&self, types: &[Iri]) -> TemplateKind {
        self.resolvers.resolve_template_kind(types)
    }

    pub fn emit_sync_update(&self, layer: RenderingLayer) {
        self.source.trigger(&RenderingEvent::SyncUpdate { layer });
    }

    pub fn stop_listening(&mut self) {
        self.observer.stop_listening();
    }
}

impl SizeProvider for RenderingState {
    fn element_size(&self, element: ElementId) -> Option<Size> {
        self.sizes.get(&element).copied()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use ontoscope_core::geometry::Point;

    use super::*;
    use crate::{
        model::{Element, ElementData, Link, LinkData},
        rendering::templates::LinkTemplateSpec,
        router::DefaultLinkRouter,
    };

    fn rendering_for(graph: &Graph) -> RenderingState {
        RenderingState::new(
            &graph.events(),
            Box::new(DefaultLinkRouter::default()),
            Resolvers::default(),
        )
    }

    fn add_element(graph: &mut Graph, iri: &str, x: f32) -> ElementId {
        let element = Element::new(ElementData::new(Iri::new(iri))).at(Point::new(x, 0.0));
        let id = element.id();
        graph.add_element(element);
        id
    }

    fn add_link(graph: &mut Graph, source: ElementId, target: ElementId, type_iri: &str) -> LinkId {
        let link = Link::new(
            source,
            target,
            LinkData::new(Iri::new(type_iri), Iri::new("ex:s"), Iri::new("ex:t")),
        );
        let id = link.id();
        graph.add_link(link);
        id
    }

    fn record(rendering: &RenderingState) -> Rc<RefCell<Vec<RenderingEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        rendering
            .events()
            .on(move |event: &RenderingEvent| sink.borrow_mut().push(event.clone()));
        events
    }

    #[test]
    fn test_set_element_size_is_idempotent() {
        let mut graph = Graph::new();
        let a = add_element(&mut graph, "ex:a", 0.0);
        let mut rendering = rendering_for(&graph);
        let events = record(&rendering);

        rendering.set_element_size(a, Size::new(100.0, 40.0));
        rendering.set_element_size(a, Size::new(100.0, 40.0));

        assert_eq!(events.borrow().len(), 1);
        assert_eq!(rendering.element_size(a), Some(Size::new(100.0, 40.0)));
    }

    #[test]
    fn test_unmeasured_size_is_none() {
        let graph = Graph::new();
        let rendering = rendering_for(&graph);
        assert_eq!(rendering.element_size(ElementId::new("missing")), None);
    }

    #[test]
    fn test_unchanged_routes_keep_identity() {
        let mut graph = Graph::new();
        let a = add_element(&mut graph, "ex:a", 0.0);
        let b = add_element(&mut graph, "ex:b", 300.0);
        let first = add_link(&mut graph, a, b, "ex:p");
        add_link(&mut graph, a, b, "ex:q");
        let mut rendering = rendering_for(&graph);

        assert!(rendering.flush_routings(&graph));
        let before = rendering.routing(first).unwrap();

        graph.element_mut(b).unwrap().set_position(Point::new(300.0, 0.0));
        assert!(!rendering.is_routing_scheduled());
        rendering.set_element_size(a, Size::new(0.0, 0.0));
        assert!(!rendering.flush_routings(&graph));
        assert!(Rc::ptr_eq(&before, &rendering.routing(first).unwrap()));

        graph.element_mut(b).unwrap().set_position(Point::new(300.0, 200.0));
        assert!(rendering.is_routing_scheduled());
        assert!(rendering.flush_routings(&graph));
        assert!(!Rc::ptr_eq(&before, &rendering.routing(first).unwrap()));
    }

    #[test]
    fn test_update_routings_event_carries_both_maps() {
        let mut graph = Graph::new();
        let a = add_element(&mut graph, "ex:a", 0.0);
        let b = add_element(&mut graph, "ex:b", 300.0);
        add_link(&mut graph, a, b, "ex:p");
        add_link(&mut graph, a, b, "ex:q");
        let mut rendering = rendering_for(&graph);
        let events = record(&rendering);

        rendering.flush_routings(&graph);

        match &events.borrow()[..] {
            [RenderingEvent::UpdateRoutings { previous, current }] => {
                assert!(previous.is_empty());
                assert_eq!(current.len(), 2);
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn test_marker_indices_are_never_reused() {
        let graph = Graph::new();
        let mut rendering = rendering_for(&graph);
        let events = record(&rendering);

        let p = rendering.link_template(Iri::new("ex:p"));
        let q = rendering.link_template(Iri::new("ex:q"));
        let p_again = rendering.link_template(Iri::new("ex:p"));

        assert_eq!(p.marker_index, 0);
        assert_eq!(q.marker_index, 1);
        assert!(Rc::ptr_eq(&p, &p_again));
        assert_eq!(events.borrow().len(), 2);
    }

    #[test]
    fn test_link_template_resolver_is_applied() {
        struct Thick;
        impl crate::rendering::LinkTemplateResolver for Thick {
            fn resolve(&self, _link_type: Iri) -> Option<LinkTemplateSpec> {
                Some(LinkTemplateSpec {
                    stroke_width: Some(3.0),
                    ..LinkTemplateSpec::default()
                })
            }
        }
        let graph = Graph::new();
        let mut rendering = RenderingState::new(
            &graph.events(),
            Box::new(DefaultLinkRouter::default()),
            Resolvers {
                link_template: Some(Box::new(Thick)),
                ..Resolvers::default()
            },
        );

        assert_eq!(rendering.link_template(Iri::new("ex:p")).stroke_width, 3.0);
    }

    #[test]
    fn test_removed_cells_are_pruned() {
        let mut graph = Graph::new();
        let a = add_element(&mut graph, "ex:a", 0.0);
        let b = add_element(&mut graph, "ex:b", 300.0);
        let link = add_link(&mut graph, a, b, "ex:p");
        let mut rendering = rendering_for(&graph);
        rendering.set_element_size(a, Size::new(10.0, 10.0));
        rendering.set_link_label_bounds(
            link,
            Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(5.0, 5.0)),
        );

        graph.remove_element(a);
        rendering.flush_routings(&graph);

        assert_eq!(rendering.element_size(a), None);
        assert_eq!(rendering.link_label_bounds(link), None);
    }

    #[test]
    fn test_sync_update_events_follow_call_order() {
        let graph = Graph::new();
        let rendering = rendering_for(&graph);
        let events = record(&rendering);

        for layer in RenderingLayer::ALL {
            rendering.emit_sync_update(layer);
        }

        let layers: Vec<_> = events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                RenderingEvent::SyncUpdate { layer } => Some(*layer),
                _ => None,
            })
            .collect();
        assert_eq!(layers, RenderingLayer::ALL);
    }
}
