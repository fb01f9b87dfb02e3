//! Element render layer.

use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;
use log::trace;

use ontoscope_core::{
    color::Color,
    events::EventObserver,
    scheduler::Debouncer,
};

use super::{
    invalidation::{LayerDiff, RedrawBatch, RedrawLevel},
    state::RenderingState,
    templates::TemplateKind,
};
use crate::model::{
    CellsEvent, ClassChange, ClassEvent, Element, ElementChange, ElementEvent, ElementId, Graph,
    GraphEvents, PropertyEvent, choose_label,
};

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyProps {
    pub label: String,
    pub values: Vec<String>,
}

/// Everything an element template needs to render one element.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateProps {
    pub label: String,
    pub type_labels: Vec<String>,
    pub properties: Vec<PropertyProps>,
    pub color: Color,
    pub icon: Option<String>,
    pub image: Option<String>,
    pub is_expanded: bool,
    pub kind: TemplateKind,
}

impl TemplateProps {
    pub fn compute(element: &Element, graph: &Graph, rendering: &RenderingState, language: &str) -> Self {
        let data = element.data();
        let style = rendering.resolve_type_style(&data.types);
        let type_labels = data
            .types
            .iter()
            .map(|type_iri| {
                graph
                    .class(*type_iri)
                    .and_then(|class| choose_label(class.label(), language))
                    .map_or_else(|| type_iri.local_name(), |label| label.text().to_owned())
            })
            .collect();
        let properties = data
            .properties
            .iter()
            .map(|(property, values)| PropertyProps {
                label: graph
                    .property(*property)
                    .and_then(|cached| choose_label(cached.label(), language))
                    .map_or_else(|| property.local_name(), |label| label.text().to_owned()),
                values: values.iter().map(|value| value.text().to_owned()).collect(),
            })
            .collect();

        Self {
            label: data.display_label(language),
            type_labels,
            properties,
            color: style.color,
            icon: style.icon,
            image: data.image.clone(),
            is_expanded: element.is_expanded(),
            kind: rendering.element_template_kind(&data.types),
        }
    }
}

/// Materialized state of one rendered element.
///
/// A new `Rc` means the element must be re-rendered. A new
/// `template_revision` additionally means the template instance is stale.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementState {
    pub element_id: ElementId,
    pub props: Rc<TemplateProps>,
    pub template_revision: u64,
}

/// Tracks which elements need re-rendering and materializes them on flush.
///
/// The layer shows the elements of one group (`None` for the top level).
pub struct ElementLayer {
    group: Option<ElementId>,
    current: IndexMap<ElementId, Rc<ElementState>>,
    batch: Rc<RefCell<RedrawBatch<ElementId>>>,
    observer: EventObserver,
    transitions: u64,
}

impl ElementLayer {
    pub fn new(events: &GraphEvents, group: Option<ElementId>) -> Self {
        let batch = Rc::new(RefCell::new(RedrawBatch::new(Debouncer::new())));
        batch.borrow_mut().request_all(RedrawLevel::RecomputeTemplate);

        let mut observer = EventObserver::new();
        let requests = Rc::clone(&batch);
        observer.listen(&events.element, move |event: &ElementEvent| {
            let level = match &event.change {
                ElementChange::Data { .. }
                | ElementChange::Expanded { .. }
                | ElementChange::ElementState { .. } => RedrawLevel::RecomputeTemplate,
                ElementChange::Position { .. } => RedrawLevel::Render,
                ElementChange::RequestedRedraw { level } => *level,
                ElementChange::RequestedFocus => return,
            };
            requests.borrow_mut().request(event.source, level);
        });
        let requests = Rc::clone(&batch);
        observer.listen(&events.cells, move |event: &CellsEvent| {
            let mut batch = requests.borrow_mut();
            match event {
                CellsEvent::ElementAdded(id) => batch.request(*id, RedrawLevel::RecomputeTemplate),
                CellsEvent::ElementRemoved(element) => batch.request(element.id(), RedrawLevel::Render),
                CellsEvent::Reset => batch.request_all(RedrawLevel::RecomputeTemplate),
                CellsEvent::LinkAdded(_) | CellsEvent::LinkRemoved(_) => {}
            }
        });
        let requests = Rc::clone(&batch);
        observer.listen(&events.class, move |event: &ClassEvent| {
            if matches!(event.change, ClassChange::Label { .. }) {
                requests.borrow_mut().request_all(RedrawLevel::RecomputeTemplate);
            }
        });
        let requests = Rc::clone(&batch);
        observer.listen(&events.property, move |_: &PropertyEvent| {
            requests.borrow_mut().request_all(RedrawLevel::RecomputeTemplate);
        });

        Self {
            group,
            current: IndexMap::new(),
            batch,
            observer,
            transitions: 0,
        }
    }

    pub fn group(&self) -> Option<ElementId> {
        self.group
    }

    pub fn state(&self, element: ElementId) -> Option<&Rc<ElementState>> {
        self.current.get(&element)
    }

    pub fn states(&self) -> impl Iterator<Item = &Rc<ElementState>> {
        self.current.values()
    }

    pub fn request_redraw(&self, element: ElementId, level: RedrawLevel) {
        self.batch.borrow_mut().request(element, level);
    }

    pub fn request_redraw_all(&self, level: RedrawLevel) {
        self.batch.borrow_mut().request_all(level);
    }

    pub fn is_scheduled(&self) -> bool {
        self.batch.borrow().is_scheduled()
    }

    /// Number of per-entity state transitions applied over the layer's life.
    pub fn applied_transitions(&self) -> u64 {
        self.transitions
    }

    /// Applies pending requests.
    ///
    /// Template props are only recomputed for requested elements; untouched
    /// elements keep their state `Rc`.
    pub fn flush(&mut self, graph: &Graph, rendering: &RenderingState, language: &str) -> LayerDiff<ElementId> {
        let drained = self.batch.borrow_mut().take();
        let mut diff = LayerDiff::default();
        if drained.requests.is_empty() && drained.all.is_none() {
            return diff;
        }

        let mut next = IndexMap::with_capacity(self.current.len());
        for element in graph.elements().filter(|element| element.group() == self.group) {
            let id = element.id();
            let state = match (self.current.get(&id), drained.level_for(&id)) {
                (Some(state), None) => Rc::clone(state),
                (Some(state), Some(level)) => {
                    diff.updated.push(id);
                    Self::transition(state, element, level, graph, rendering, language)
                }
                (None, _) => {
                    diff.added.push(id);
                    Rc::new(ElementState {
                        element_id: id,
                        props: Rc::new(TemplateProps::compute(element, graph, rendering, language)),
                        template_revision: 0,
                    })
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
        self.transitions += diff.len() as u64;

        trace!(
            added = diff.added.len(),
            updated = diff.updated.len(),
            removed = diff.removed.len();
            "Element layer flushed"
        );
        diff
    }

    pub fn flush_if_scheduled(
        &mut self,
        graph: &Graph,
        rendering: &RenderingState,
        language: &str,
    ) -> Option<LayerDiff<ElementId>> {
        self.is_scheduled()
            .then(|| self.flush(graph, rendering, language))
    }

    fn transition(
        state: &Rc<ElementState>,
        element: &Element,
        level: RedrawLevel,
        graph: &Graph,
        rendering: &RenderingState,
        language: &str,
    ) -> Rc<ElementState> {
        match level {
            RedrawLevel::Render => Rc::clone(state),
            RedrawLevel::RedrawTemplate => Rc::new(ElementState {
                template_revision: state.template_revision + 1,
                ..(**state).clone()
            }),
            RedrawLevel::RecomputeTemplate => Rc::new(ElementState {
                element_id: state.element_id,
                props: Rc::new(TemplateProps::compute(element, graph, rendering, language)),
                template_revision: state.template_revision + 1,
            }),
        }
    }

    pub fn stop_listening(&mut self) {
        self.observer.stop_listening();
    }
}

#[cfg(test)]
mod tests {
    use ontoscope_core::geometry::Point;

    use super::*;
    use crate::{
        model::{ElementData, Iri, Literal},
        rendering::Resolvers,
        router::DefaultLinkRouter,
    };

    const PERSON: &str = "http://ex.org/Person";

    struct Fixture {
        graph: Graph,
        rendering: RenderingState,
        layer: ElementLayer,
    }

    impl Fixture {
        fn new() -> Self {
            let graph = Graph::new();
            let rendering = RenderingState::new(
                &graph.events(),
                Box::new(DefaultLinkRouter::default()),
                Resolvers::default(),
            );
            let layer = ElementLayer::new(&graph.events(), None);
            Self {
                graph,
                rendering,
                layer,
            }
        }

        fn add(&mut self, iri: &str) -> ElementId {
            let element = Element::new(
                ElementData::new(Iri::new(iri)).with_types([Iri::new(PERSON)]),
            );
            let id = element.id();
            self.graph.add_element(element);
            id
        }

        fn flush(&mut self) -> LayerDiff<ElementId> {
            self.layer.flush(&self.graph, &self.rendering, "en")
        }
    }

    #[test]
    fn test_new_elements_are_added() {
        let mut fixture = Fixture::new();
        let a = fixture.add("http://ex.org/alice");

        let diff = fixture.flush();
        assert_eq!(diff.added, vec![a]);
        let state = fixture.layer.state(a).unwrap();
        assert_eq!(state.props.label, "alice");
        assert_eq!(state.props.type_labels, vec!["Person".to_string()]);
    }

    #[test]
    fn test_repeated_render_requests_apply_once() {
        let mut fixture = Fixture::new();
        let a = fixture.add("http://ex.org/alice");
        fixture.flush();
        let before = fixture.layer.applied_transitions();

        for _ in 0..100 {
            fixture
                .graph
                .element_mut(a)
                .unwrap()
                .redraw(RedrawLevel::Render);
        }
        assert!(fixture.layer.is_scheduled());
        let diff = fixture.flush();

        assert_eq!(diff.updated, vec![a]);
        assert_eq!(fixture.layer.applied_transitions() - before, 1);
        assert!(!fixture.layer.is_scheduled());
    }

    #[test]
    fn test_levels_control_state_identity() {
        let mut fixture = Fixture::new();
        let a = fixture.add("http://ex.org/alice");
        fixture.flush();
        let initial = Rc::clone(fixture.layer.state(a).unwrap());

        fixture.graph.element_mut(a).unwrap().set_position(Point::new(5.0, 5.0));
        fixture.flush();
        let rendered = Rc::clone(fixture.layer.state(a).unwrap());
        assert!(Rc::ptr_eq(&initial, &rendered));

        fixture.layer.request_redraw(a, RedrawLevel::RedrawTemplate);
        fixture.flush();
        let redrawn = Rc::clone(fixture.layer.state(a).unwrap());
        assert!(!Rc::ptr_eq(&rendered, &redrawn));
        assert!(Rc::ptr_eq(&rendered.props, &redrawn.props));
        assert_eq!(redrawn.template_revision, 1);

        let data = ElementData::new(Iri::new("http://ex.org/alice")).with_label(Literal::plain("Alice"));
        fixture.graph.element_mut(a).unwrap().set_data(data);
        fixture.flush();
        let recomputed = fixture.layer.state(a).unwrap();
        assert_eq!(recomputed.props.label, "Alice");
        assert_eq!(recomputed.template_revision, 2);
    }

    #[test]
    fn test_untouched_elements_keep_state() {
        let mut fixture = Fixture::new();
        let a = fixture.add("http://ex.org/alice");
        let b = fixture.add("ex:bob");
        fixture.flush();
        let untouched = Rc::clone(fixture.layer.state(b).unwrap());

        fixture.graph.element_mut(a).unwrap().set_expanded(true);
        let diff = fixture.flush();

        assert_eq!(diff.updated, vec![a]);
        assert!(Rc::ptr_eq(&untouched, fixture.layer.state(b).unwrap()));
        assert!(fixture.layer.state(a).unwrap().props.is_expanded);
    }

    #[test]
    fn test_removed_and_grouped_elements() {
        let mut fixture = Fixture::new();
        let a = fixture.add("http://ex.org/alice");
        let group = fixture.add("ex:group");
        let nested = Element::new(ElementData::new(Iri::new("ex:nested"))).in_group(Some(group));
        let nested_id = nested.id();
        fixture.graph.add_element(nested);
        fixture.flush();
        assert!(fixture.layer.state(nested_id).is_none());

        fixture.graph.remove_element(a);
        let diff = fixture.flush();
        assert_eq!(diff.removed, vec![a]);
        assert!(fixture.layer.state(a).is_none());
    }

    #[test]
    fn test_class_label_change_recomputes_all() {
        let mut fixture = Fixture::new();
        let a = fixture.add("http://ex.org/alice");
        fixture.graph.get_or_create_class(Iri::new(PERSON));
        fixture.flush();

        fixture
            .graph
            .class_mut(Iri::new(PERSON))
            .unwrap()
            .set_label(vec![Literal::new("Persona", Some("en"))]);
        fixture.flush();

        assert_eq!(
            fixture.layer.state(a).unwrap().props.type_labels,
            vec!["Persona".to_string()]
        );
    }

    #[test]
    fn test_flush_without_requests_is_empty() {
        let mut fixture = Fixture::new();
        fixture.add("http://ex.org/alice");
        fixture.flush();

        assert!(!fixture.layer.is_scheduled());
        assert!(fixture.flush().is_empty());
    }
}
