//! Diagram nodes.

use log::debug;

use ontoscope_core::geometry::Point;

use super::{
    data::{ElementData, ElementId, LinkId, StateMap},
    events::{ElementChange, ElementEvent, LinkChange, LinkEvent},
    graph::Graph,
};
use crate::rendering::RedrawLevel;

/// A diagram node wrapping an opaque [`ElementData`] record.
///
/// `position` is the top-left corner of the element's box in paper
/// coordinates. The element's size is presentation state and lives in the
/// rendering state, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    id: ElementId,
    data: ElementData,
    position: Point,
    is_expanded: bool,
    group: Option<ElementId>,
    element_state: StateMap,
    temporary: bool,
    links: Vec<LinkId>,
}

impl Element {
    /// Creates an element with a generated id.
    pub fn new(data: ElementData) -> Self {
        Self::with_id(ElementId::generate(), data)
    }

    pub fn with_id(id: ElementId, data: ElementData) -> Self {
        Self {
            id,
            data,
            position: Point::default(),
            is_expanded: false,
            group: None,
            element_state: StateMap::new(),
            temporary: false,
            links: Vec::new(),
        }
    }

    pub fn at(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    pub fn in_group(mut self, group: Option<ElementId>) -> Self {
        self.group = group;
        self
    }

    pub fn expanded(mut self, is_expanded: bool) -> Self {
        self.is_expanded = is_expanded;
        self
    }

    pub fn with_state(mut self, element_state: StateMap) -> Self {
        self.element_state = element_state;
        self
    }

    /// Marks the element as a drag-preview ghost that is never persisted.
    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn data(&self) -> &ElementData {
        &self.data
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn is_expanded(&self) -> bool {
        self.is_expanded
    }

    pub fn group(&self) -> Option<ElementId> {
        self.group
    }

    pub fn element_state(&self) -> &StateMap {
        &self.element_state
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// Incident links in both directions, in attachment order.
    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    pub(super) fn attach_link(&mut self, link: LinkId) {
        if !self.links.contains(&link) {
            self.links.push(link);
        }
    }

    pub(super) fn detach_link(&mut self, link: LinkId) {
        self.links.retain(|id| *id != link);
    }

    pub(super) fn clear_links(&mut self) {
        self.links.clear();
    }
}

/// Mutable access to one element of a [`Graph`].
///
/// Every setter compares against the current value first; an unchanged value
/// is a no-op and emits nothing.
pub struct ElementMut<'a> {
    graph: &'a mut Graph,
    id: ElementId,
}

impl<'a> ElementMut<'a> {
    pub(super) fn new(graph: &'a mut Graph, id: ElementId) -> Self {
        Self { graph, id }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    fn element(&mut self) -> &mut Element {
        // The handle is only constructed for ids present in the graph and
        // holds the exclusive borrow, so the element cannot disappear.
        self.graph
            .elements
            .get_mut(&self.id)
            .unwrap_or_else(|| unreachable!("element handle outlived its element"))
    }

    fn emit(&self, change: ElementChange) {
        self.graph.sources.element.trigger(&ElementEvent {
            source: self.id,
            change,
        });
    }

    pub fn set_position(&mut self, position: Point) {
        let element = self.element();
        if element.position == position {
            return;
        }
        let previous = std::mem::replace(&mut element.position, position);
        self.emit(ElementChange::Position { previous });
    }

    pub fn set_expanded(&mut self, is_expanded: bool) {
        let element = self.element();
        if element.is_expanded == is_expanded {
            return;
        }
        element.is_expanded = is_expanded;
        self.emit(ElementChange::Expanded {
            previous: !is_expanded,
        });
    }

    pub fn set_element_state(&mut self, element_state: StateMap) {
        let element = self.element();
        if element.element_state == element_state {
            return;
        }
        let previous = std::mem::replace(&mut element.element_state, element_state);
        self.emit(ElementChange::ElementState { previous });
    }

    /// Replaces the element's data record.
    ///
    /// When the IRI changes, every incident link's `source_iri`/`target_iri`
    /// is rewritten to the new IRI. Link endpoint ids are left untouched.
    pub fn set_data(&mut self, data: ElementData) {
        let element = self.element();
        if element.data == data {
            return;
        }
        let new_iri = data.iri;
        let previous = std::mem::replace(&mut element.data, data);
        let links = element.links.clone();
        let renamed = previous.iri != new_iri;
        self.emit(ElementChange::Data { previous });

        if renamed {
            self.update_links_to_refer_by_new_iri(&links, new_iri);
        }
    }

    fn update_links_to_refer_by_new_iri(&mut self, links: &[LinkId], new_iri: super::Iri) {
        debug!(element:% = self.id, iri:% = new_iri, links = links.len(); "Rewriting link endpoints to renamed element");
        for link_id in links {
            let Some(link) = self.graph.links.get_mut(link_id) else {
                continue;
            };
            let previous = link.data().clone();
            let mut data = previous.clone();
            if link.source_id() == self.id {
                data.source_iri = new_iri;
            }
            if link.target_id() == self.id {
                data.target_iri = new_iri;
            }
            if data == previous {
                continue;
            }
            link.replace_data(data);
            self.graph.sources.link.trigger(&LinkEvent {
                source: *link_id,
                change: LinkChange::Data { previous },
            });
        }
    }

    /// Asks views to bring the element into focus.
    pub fn request_focus(&self) {
        self.emit(ElementChange::RequestedFocus);
    }

    /// Asks views to re-render the element at the given level.
    pub fn redraw(&self, level: RedrawLevel) {
        self.emit(ElementChange::RequestedRedraw { level });
    }
}
