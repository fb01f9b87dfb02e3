//! Scene graph and the model façade.
//!
//! [`Graph`] is the authoritative index of elements and links. [`DiagramModel`]
//! composes it with a [`History`] so that user-level operations are undoable.
//!
//! # Mutation paths
//!
//! - Undoable: [`DiagramModel`] operations such as [`DiagramModel::create_element`]
//!   or [`DiagramModel::remove_link`] run [`Command`]s through the history.
//! - Direct: [`DiagramModel::element_mut`] and friends hand out setter handles
//!   that bypass the history. Interactive gestures use them and register a
//!   single [`RestoreGeometry`] afterwards.
//!
//! [`RestoreGeometry`]: crate::history::RestoreGeometry

mod data;
mod element;
mod events;
mod graph;
mod link;
mod link_type;
mod rich;

pub use data::{
    ElementData, ElementId, Iri, LinkData, LinkId, Literal, PropertyMap, StateMap, choose_label,
};
pub use element::{Element, ElementMut};
pub use events::{
    CellsEvent, ClassChange, ClassEvent, ElementChange, ElementEvent, GraphEvents, LinkChange,
    LinkEvent, LinkTypeChange, LinkTypeEvent, PropertyEvent,
};
pub use graph::Graph;
pub use link::{Link, LinkMut};
pub use link_type::{LinkType, LinkTypeMut};
pub use rich::{RichClass, RichClassMut, RichProperty, RichPropertyMut};

use log::{debug, info, warn};

use ontoscope_core::{events::Events, geometry::Point};

use crate::{
    error::DiagramError,
    history::{Command, History, HistoryError, HistoryEvent},
};

/// Graph plus undo history.
#[derive(Default)]
pub struct DiagramModel {
    graph: Graph,
    history: History,
}

impl DiagramModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn events(&self) -> GraphEvents {
        self.graph.events()
    }

    pub fn history_events(&self) -> Events<HistoryEvent> {
        self.history.events()
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.graph.element(id)
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.graph.link(id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<ElementMut<'_>> {
        self.graph.element_mut(id)
    }

    pub fn link_mut(&mut self, id: LinkId) -> Option<LinkMut<'_>> {
        self.graph.link_mut(id)
    }

    pub fn link_type_mut(&mut self, id: Iri) -> Option<LinkTypeMut<'_>> {
        self.graph.link_type_mut(id)
    }

    pub fn class_mut(&mut self, id: Iri) -> Option<RichClassMut<'_>> {
        self.graph.class_mut(id)
    }

    pub fn property_mut(&mut self, id: Iri) -> Option<RichPropertyMut<'_>> {
        self.graph.property_mut(id)
    }

    /// Finds the element showing `iri` inside `group`.
    pub fn find_element(&self, iri: Iri, group: Option<ElementId>) -> Option<ElementId> {
        self.graph
            .elements()
            .find(|element| element.data().iri == iri && element.group() == group)
            .map(Element::id)
    }

    /// Returns the element for `(data.iri, group)`, creating it if absent.
    ///
    /// Creation is recorded as one undoable "Add element" step.
    pub fn create_element(
        &mut self,
        data: impl Into<ElementData>,
        group: Option<ElementId>,
    ) -> ElementId {
        self.create_element_at(data, group, Point::default())
    }

    /// Like [`DiagramModel::create_element`], placing a new element at `position`.
    ///
    /// An existing element keeps its position.
    ///
    /// # Arguments
    ///
    /// * `data` - Element data, or just the IRI of the entity to show
    /// * `group` - Containing group element, `None` for the top level
    /// * `position` - Top-left corner of a newly created element, in paper
    ///   coordinates
    ///
    /// # Examples
    ///
    /// ```
    /// use ontoscope::{geometry::Point, model::{DiagramModel, Iri}};
    ///
    /// let mut model = DiagramModel::new();
    /// let first = model.create_element_at(Iri::new("ex:a"), None, Point::new(10.0, 10.0));
    /// let again = model.create_element_at(Iri::new("ex:a"), None, Point::new(99.0, 99.0));
    ///
    /// assert_eq!(first, again);
    /// assert_eq!(model.element(first).unwrap().position(), Point::new(10.0, 10.0));
    /// ```
    pub fn create_element_at(
        &mut self,
        data: impl Into<ElementData>,
        group: Option<ElementId>,
        position: Point,
    ) -> ElementId {
        let data = data.into();
        if let Some(existing) = self.find_element(data.iri, group) {
            return existing;
        }
        let element = Element::new(data).in_group(group).at(position);
        let id = element.id();
        self.history
            .execute(&mut self.graph, Command::AddElement { element });
        id
    }

    /// Adds a drag-preview element outside the undo history.
    pub fn create_temporary_element(
        &mut self,
        data: impl Into<ElementData>,
        position: Point,
    ) -> ElementId {
        let element = Element::new(data.into()).at(position).temporary();
        let id = element.id();
        self.graph.add_element(element);
        id
    }

    /// Removes an element and its links as one undoable step.
    pub fn remove_element(&mut self, id: ElementId) -> Result<(), DiagramError> {
        if !self.graph.contains_element(id) {
            return Err(DiagramError::ElementNotFound(id));
        }
        self.history
            .execute(&mut self.graph, Command::RemoveElement { element_id: id });
        Ok(())
    }

    /// Adds a link or updates the equivalent existing one.
    ///
    /// If a link with the same `(type, source, target, link IRI)` exists, its
    /// data is replaced, `layout_only` is cleared, and its id is returned.
    /// Otherwise both endpoints must be present; a link with a missing
    /// endpoint is not added and `None` is returned.
    pub fn create_link(&mut self, link: Link) -> Option<LinkId> {
        let existing = self.graph.find_link(
            link.type_id(),
            link.source_id(),
            link.target_id(),
            link.data().link_iri,
        );
        if let Some(existing) = existing {
            if let Some(mut handle) = self.graph.link_mut(existing) {
                handle.set_layout_only(false);
                // Same key, so the update cannot collide.
                if let Err(err) = handle.set_data(link.data().clone()) {
                    warn!(link:% = existing, err:% = err; "Link data not updated");
                }
            }
            return Some(existing);
        }

        if !self.graph.contains_element(link.source_id())
            || !self.graph.contains_element(link.target_id())
        {
            debug!(link:% = link.id(); "Link endpoint not in diagram, link is not visible");
            return None;
        }

        self.graph.get_or_create_link_type(link.type_id());
        let id = link.id();
        self.history
            .execute(&mut self.graph, Command::AddLink { link });
        Some(id)
    }

    pub fn remove_link(&mut self, id: LinkId) -> Result<(), DiagramError> {
        if self.graph.link(id).is_none() {
            return Err(DiagramError::LinkNotFound(id));
        }
        self.history
            .execute(&mut self.graph, Command::RemoveLink { link_id: id });
        Ok(())
    }

    pub fn find_link(
        &self,
        type_id: Iri,
        source_id: ElementId,
        target_id: ElementId,
        link_iri: Option<Iri>,
    ) -> Option<LinkId> {
        self.graph.find_link(type_id, source_id, target_id, link_iri)
    }

    pub fn set_element_data(&mut self, id: ElementId, data: ElementData) -> Result<(), DiagramError> {
        if !self.graph.contains_element(id) {
            return Err(DiagramError::ElementNotFound(id));
        }
        self.history.execute(
            &mut self.graph,
            Command::SetElementData {
                element_id: id,
                data,
            },
        );
        Ok(())
    }

    /// Replaces a link's data as an undoable step.
    ///
    /// # Errors
    ///
    /// [`DiagramError::LinkIdentityChanged`] if the new data names a different
    /// link type, source IRI, or target IRI, and
    /// [`DiagramError::DuplicateLink`] if its link IRI matches another link
    /// between the same elements.
    pub fn set_link_data(&mut self, id: LinkId, data: LinkData) -> Result<(), DiagramError> {
        let link = self.graph.link(id).ok_or(DiagramError::LinkNotFound(id))?;
        if !link.data().same_identity(&data) {
            return Err(DiagramError::LinkIdentityChanged { link: id });
        }
        let owner = self.graph.find_link(
            data.link_type_id,
            link.source_id(),
            link.target_id(),
            data.link_iri,
        );
        if let Some(existing) = owner.filter(|existing| *existing != id) {
            return Err(DiagramError::DuplicateLink { link: id, existing });
        }
        self.history.execute(
            &mut self.graph,
            Command::SetLinkData { link_id: id, data },
        );
        Ok(())
    }

    pub fn set_element_expanded(&mut self, id: ElementId, expanded: bool) -> Result<(), DiagramError> {
        if !self.graph.contains_element(id) {
            return Err(DiagramError::ElementNotFound(id));
        }
        self.history.execute(
            &mut self.graph,
            Command::SetElementExpanded {
                element_id: id,
                expanded,
            },
        );
        Ok(())
    }

    pub fn set_link_vertices(&mut self, id: LinkId, vertices: Vec<Point>) -> Result<(), DiagramError> {
        if self.graph.link(id).is_none() {
            return Err(DiagramError::LinkNotFound(id));
        }
        self.history.execute(
            &mut self.graph,
            Command::SetLinkVertices {
                link_id: id,
                vertices,
            },
        );
        Ok(())
    }

    pub fn create_link_type(&mut self, id: Iri) -> &LinkType {
        self.graph.get_or_create_link_type(id)
    }

    pub fn create_class(&mut self, id: Iri) -> &RichClass {
        self.graph.get_or_create_class(id)
    }

    pub fn create_property(&mut self, id: Iri) -> &RichProperty {
        self.graph.get_or_create_property(id)
    }

    /// Removes every cell and forgets the undo history.
    pub fn reset(&mut self) {
        info!(elements = self.graph.element_count(), links = self.graph.link_count(); "Resetting diagram");
        self.graph.reset();
        self.history.reset();
    }

    pub fn execute(&mut self, command: Command) {
        self.history.execute(&mut self.graph, command);
    }

    pub fn register_to_undo(&mut self, undo: Command) {
        self.history.register_to_undo(undo);
    }

    pub fn start_batch(&mut self, title: impl Into<String>) {
        self.history.start_batch(title);
    }

    pub fn store_batch(&mut self) -> Result<(), HistoryError> {
        self.history.store_batch()
    }

    pub fn discard_batch(&mut self) -> Result<(), HistoryError> {
        self.history.discard_batch(&mut self.graph)
    }

    pub fn undo(&mut self) -> Result<bool, HistoryError> {
        self.history.undo(&mut self.graph)
    }

    pub fn redo(&mut self) -> Result<bool, HistoryError> {
        self.history.redo(&mut self.graph)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    fn model_with_pair() -> (DiagramModel, ElementId, ElementId) {
        let mut model = DiagramModel::new();
        let a = model.create_element(Iri::new("ex:a"), None);
        let b = model.create_element(Iri::new("ex:b"), None);
        (model, a, b)
    }

    fn knows(model: &DiagramModel, a: ElementId, b: ElementId) -> LinkData {
        LinkData::new(
            Iri::new("ex:knows"),
            model.element(a).unwrap().data().iri,
            model.element(b).unwrap().data().iri,
        )
    }

    #[test]
    fn test_create_element_deduplicates_per_group() {
        let (mut model, a, _) = model_with_pair();
        assert_eq!(model.create_element(Iri::new("ex:a"), None), a);

        let nested = model.create_element(Iri::new("ex:a"), Some(a));
        assert_ne!(nested, a);
        assert_eq!(model.graph().element_count(), 3);
    }

    #[test]
    fn test_create_link_deduplicates_and_updates_data() {
        let (mut model, a, b) = model_with_pair();
        let data = knows(&model, a, b);

        let first = model
            .create_link(Link::new(a, b, data.clone()).layout_only(true))
            .unwrap();
        let updated = data.with_property(Iri::new("ex:since"), vec![Literal::plain("2001")]);
        let second = model.create_link(Link::new(a, b, updated.clone())).unwrap();

        assert_eq!(first, second);
        assert_eq!(model.graph().link_count(), 1);
        let link = model.link(first).unwrap();
        assert_eq!(link.data(), &updated);
        assert!(!link.is_layout_only());
    }

    #[test]
    fn test_create_link_with_missing_endpoint() {
        let (mut model, a, _) = model_with_pair();
        let ghost = ElementId::new("ghost");
        let data = LinkData::new(Iri::new("ex:knows"), Iri::new("ex:a"), Iri::new("ex:ghost"));

        assert_eq!(model.create_link(Link::new(a, ghost, data)), None);
        assert_eq!(model.graph().link_count(), 0);
    }

    #[test]
    fn test_create_link_registers_link_type() {
        let (mut model, a, b) = model_with_pair();
        let data = knows(&model, a, b);
        model.create_link(Link::new(a, b, data));
        assert!(model.graph().link_type(Iri::new("ex:knows")).is_some());
    }

    #[test]
    fn test_set_link_data_rejects_identity_change() {
        let (mut model, a, b) = model_with_pair();
        let data = knows(&model, a, b);
        let link = model.create_link(Link::new(a, b, data.clone())).unwrap();

        let mut retyped = data.clone();
        retyped.link_type_id = Iri::new("ex:likes");
        assert!(matches!(
            model.set_link_data(link, retyped),
            Err(DiagramError::LinkIdentityChanged { .. })
        ));

        let annotated = data.with_property(Iri::new("ex:note"), vec![Literal::plain("hi")]);
        model.set_link_data(link, annotated.clone()).unwrap();
        assert_eq!(model.link(link).unwrap().data(), &annotated);
    }

    #[test]
    fn test_remove_element_is_undoable_with_links() {
        let (mut model, a, b) = model_with_pair();
        let data = knows(&model, a, b);
        let link = model.create_link(Link::new(a, b, data)).unwrap();

        model.remove_element(a).unwrap();
        assert!(model.link(link).is_none());

        model.undo().unwrap();
        assert!(model.element(a).is_some());
        assert_eq!(model.element(a).unwrap().links(), &[link]);
    }

    #[test]
    fn test_temporary_element_is_outside_history() {
        let mut model = DiagramModel::new();
        let id = model.create_temporary_element(Iri::new("ex:ghost"), Point::new(5.0, 5.0));
        assert!(model.element(id).unwrap().is_temporary());
        assert!(!model.history().can_undo());
    }

    #[test]
    fn test_rename_propagates_to_link_data() {
        let (mut model, a, b) = model_with_pair();
        let data = knows(&model, a, b);
        let link = model.create_link(Link::new(a, b, data)).unwrap();

        let renamed = ElementData::new(Iri::new("ex:renamed"));
        model.set_element_data(a, renamed).unwrap();

        let link = model.link(link).unwrap();
        assert_eq!(link.data().source_iri, Iri::new("ex:renamed"));
        assert_eq!(link.source_id(), a);
    }

    #[test]
    fn test_reset_clears_cells_and_history() {
        let (mut model, _, _) = model_with_pair();
        let resets = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&resets);
        model.events().cells.on(move |event: &CellsEvent| {
            if matches!(event, CellsEvent::Reset) {
                *counter.borrow_mut() += 1;
            }
        });

        model.reset();
        assert_eq!(model.graph().element_count(), 0);
        assert!(!model.history().can_undo());
        assert_eq!(*resets.borrow(), 1);
    }
}
