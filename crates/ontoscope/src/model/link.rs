//! Typed directed edges between elements.

use log::warn;

use ontoscope_core::geometry::Point;

use super::{
    data::{ElementId, Iri, LinkData, LinkId, StateMap},
    events::{LinkChange, LinkEvent},
    graph::{Graph, LinkKey},
};
use crate::{error::DiagramError, rendering::RedrawLevel};

/// A typed edge between two elements.
///
/// The endpoint ids never change; re-create the link to reconnect it.
/// `type_id` mirrors `data.link_type_id` at all times.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    id: LinkId,
    source_id: ElementId,
    target_id: ElementId,
    type_id: Iri,
    data: LinkData,
    vertices: Vec<Point>,
    layout_only: bool,
    link_state: StateMap,
}

impl Link {
    /// Creates a link with a generated id.
    pub fn new(source_id: ElementId, target_id: ElementId, data: LinkData) -> Self {
        Self::with_id(LinkId::generate(), source_id, target_id, data)
    }

    pub fn with_id(id: LinkId, source_id: ElementId, target_id: ElementId, data: LinkData) -> Self {
        Self {
            id,
            source_id,
            target_id,
            type_id: data.link_type_id,
            data,
            vertices: Vec::new(),
            layout_only: false,
            link_state: StateMap::new(),
        }
    }

    pub fn with_vertices(mut self, vertices: Vec<Point>) -> Self {
        self.vertices = vertices;
        self
    }

    /// Marks the link as generated for layout purposes only (drawn dashed).
    pub fn layout_only(mut self, layout_only: bool) -> Self {
        self.layout_only = layout_only;
        self
    }

    pub fn with_state(mut self, link_state: StateMap) -> Self {
        self.link_state = link_state;
        self
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn source_id(&self) -> ElementId {
        self.source_id
    }

    pub fn target_id(&self) -> ElementId {
        self.target_id
    }

    pub fn type_id(&self) -> Iri {
        self.type_id
    }

    pub fn data(&self) -> &LinkData {
        &self.data
    }

    /// User-placed waypoints, in path order.
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn is_layout_only(&self) -> bool {
        self.layout_only
    }

    pub fn link_state(&self) -> &StateMap {
        &self.link_state
    }

    pub fn is_self_loop(&self) -> bool {
        self.source_id == self.target_id
    }

    /// Returns true if `element` is one of the link's endpoints.
    pub fn touches(&self, element: ElementId) -> bool {
        self.source_id == element || self.target_id == element
    }

    pub(super) fn key(&self) -> LinkKey {
        LinkKey {
            type_id: self.type_id,
            source_id: self.source_id,
            target_id: self.target_id,
            link_iri: self.data.link_iri,
        }
    }

    pub(super) fn replace_data(&mut self, data: LinkData) -> LinkData {
        self.type_id = data.link_type_id;
        std::mem::replace(&mut self.data, data)
    }
}

/// Mutable access to one link of a [`Graph`].
pub struct LinkMut<'a> {
    graph: &'a mut Graph,
    id: LinkId,
}

impl<'a> LinkMut<'a> {
    pub(super) fn new(graph: &'a mut Graph, id: LinkId) -> Self {
        Self { graph, id }
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    fn link(&mut self) -> &mut Link {
        self.graph
            .links
            .get_mut(&self.id)
            .unwrap_or_else(|| unreachable!("link handle outlived its link"))
    }

    fn emit(&self, change: LinkChange) {
        self.graph.sources.link.trigger(&LinkEvent {
            source: self.id,
            change,
        });
    }

    /// Replaces the link's data, keeping `type_id` and the de-duplication
    /// index in sync with it.
    ///
    /// # Errors
    ///
    /// [`DiagramError::DuplicateLink`] if the new data would give the link the
    /// `(type, source, target, link IRI)` key of another link. The link is
    /// left unchanged.
    pub fn set_data(&mut self, data: LinkData) -> Result<(), DiagramError> {
        let id = self.id;
        let link = self.link();
        if link.data == data {
            return Ok(());
        }
        let old_key = link.key();
        let new_key = LinkKey {
            type_id: data.link_type_id,
            link_iri: data.link_iri,
            ..old_key
        };
        if old_key != new_key {
            let owner = self.graph.find_link(
                new_key.type_id,
                new_key.source_id,
                new_key.target_id,
                new_key.link_iri,
            );
            if let Some(existing) = owner.filter(|existing| *existing != id) {
                warn!(link:% = id, existing:% = existing; "Link data collides with an existing link");
                return Err(DiagramError::DuplicateLink { link: id, existing });
            }
        }

        let previous = self.link().replace_data(data);
        if old_key != new_key {
            self.graph.reindex_link(id, old_key, new_key);
        }
        self.emit(LinkChange::Data { previous });
        Ok(())
    }

    pub fn set_layout_only(&mut self, layout_only: bool) {
        let link = self.link();
        if link.layout_only == layout_only {
            return;
        }
        link.layout_only = layout_only;
        self.emit(LinkChange::LayoutOnly {
            previous: !layout_only,
        });
    }

    pub fn set_vertices(&mut self, vertices: Vec<Point>) {
        let link = self.link();
        if link.vertices == vertices {
            return;
        }
        let previous = std::mem::replace(&mut link.vertices, vertices);
        self.emit(LinkChange::Vertices { previous });
    }

    pub fn set_link_state(&mut self, link_state: StateMap) {
        let link = self.link();
        if link.link_state == link_state {
            return;
        }
        let previous = std::mem::replace(&mut link.link_state, link_state);
        self.emit(LinkChange::LinkState { previous });
    }

    pub fn redraw(&self, level: RedrawLevel) {
        self.emit(LinkChange::RequestedRedraw { level });
    }
}
