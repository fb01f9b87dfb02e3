//! The authoritative index of diagram cells.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, warn};

use super::{
    data::{ElementId, Iri, LinkId},
    element::{Element, ElementMut},
    events::{CellsEvent, GraphEventSources, GraphEvents},
    link::{Link, LinkMut},
    link_type::{LinkType, LinkTypeMut},
    rich::{RichClass, RichClassMut, RichProperty, RichPropertyMut},
};

/// De-duplication key of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct LinkKey {
    pub type_id: Iri,
    pub source_id: ElementId,
    pub target_id: ElementId,
    pub link_iri: Option<Iri>,
}

/// Elements, links, link types, and label caches of one diagram.
///
/// Iteration order is insertion order for every collection, which keeps
/// routing and rendering deterministic.
///
/// Invariants:
/// - no two links share the same `(type, source, target, link IRI)` key;
/// - every link's endpoints exist, and each endpoint lists the link among its
///   incident links.
pub struct Graph {
    pub(super) elements: IndexMap<ElementId, Element>,
    pub(super) links: IndexMap<LinkId, Link>,
    link_index: HashMap<LinkKey, LinkId>,
    pub(super) link_types: IndexMap<Iri, LinkType>,
    pub(super) classes: IndexMap<Iri, RichClass>,
    pub(super) properties: IndexMap<Iri, RichProperty>,
    pub(super) sources: GraphEventSources,
}

impl Graph {
    pub fn new() -> Self {
        Self {
            elements: IndexMap::new(),
            links: IndexMap::new(),
            link_index: HashMap::new(),
            link_types: IndexMap::new(),
            classes: IndexMap::new(),
            properties: IndexMap::new(),
            sources: GraphEventSources::default(),
        }
    }

    /// Subscription handles for all model event streams.
    pub fn events(&self) -> GraphEvents {
        self.sources.handles()
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn contains_element(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<ElementMut<'_>> {
        self.contains_element(id).then(|| ElementMut::new(self, id))
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn link_mut(&mut self, id: LinkId) -> Option<LinkMut<'_>> {
        self.links.contains_key(&id).then(|| LinkMut::new(self, id))
    }

    /// Links attached to an element, in attachment order.
    pub fn links_of(&self, element: ElementId) -> impl Iterator<Item = &Link> {
        self.elements
            .get(&element)
            .into_iter()
            .flat_map(|element| element.links().iter())
            .filter_map(|id| self.links.get(id))
    }

    pub fn find_link(
        &self,
        type_id: Iri,
        source_id: ElementId,
        target_id: ElementId,
        link_iri: Option<Iri>,
    ) -> Option<LinkId> {
        self.link_index
            .get(&LinkKey {
                type_id,
                source_id,
                target_id,
                link_iri,
            })
            .copied()
    }

    /// Adds an element. Its incident link list starts empty.
    ///
    /// Returns false if an element with the same id is already present.
    pub fn add_element(&mut self, mut element: Element) -> bool {
        let id = element.id();
        if self.elements.contains_key(&id) {
            warn!(element:% = id; "Element already present in graph");
            return false;
        }
        element.clear_links();
        self.elements.insert(id, element);
        self.sources.cells.trigger(&CellsEvent::ElementAdded(id));
        true
    }

    /// Removes an element together with every incident link.
    ///
    /// Returns the removed element and links, links in attachment order.
    pub fn remove_element(&mut self, id: ElementId) -> Option<(Element, Vec<Link>)> {
        let incident: Vec<LinkId> = self.elements.get(&id)?.links().to_vec();
        let links: Vec<Link> = incident
            .into_iter()
            .filter_map(|link_id| self.remove_link(link_id))
            .collect();

        let element = self.elements.shift_remove(&id)?;
        debug!(element:% = id, links = links.len(); "Removed element");
        self.sources
            .cells
            .trigger(&CellsEvent::ElementRemoved(element.clone()));
        Some((element, links))
    }

    /// Adds a link between two existing elements.
    ///
    /// Returns false if an endpoint is missing or the link duplicates an
    /// existing one.
    pub fn add_link(&mut self, link: Link) -> bool {
        let id = link.id();
        if self.links.contains_key(&id) {
            warn!(link:% = id; "Link already present in graph");
            return false;
        }
        if !self.contains_element(link.source_id()) || !self.contains_element(link.target_id()) {
            debug!(link:% = id; "Link endpoint is missing, link not added");
            return false;
        }
        let key = link.key();
        if let Some(existing) = self.link_index.get(&key) {
            warn!(link:% = id, existing:% = existing; "Duplicate link not added");
            return false;
        }

        let (source_id, target_id) = (link.source_id(), link.target_id());
        self.link_index.insert(key, id);
        self.links.insert(id, link);
        for endpoint in [source_id, target_id] {
            if let Some(element) = self.elements.get_mut(&endpoint) {
                element.attach_link(id);
            }
        }
        self.sources.cells.trigger(&CellsEvent::LinkAdded(id));
        true
    }

    pub fn remove_link(&mut self, id: LinkId) -> Option<Link> {
        let link = self.links.shift_remove(&id)?;
        let key = link.key();
        if self.link_index.get(&key) == Some(&id) {
            self.link_index.remove(&key);
        }
        for endpoint in [link.source_id(), link.target_id()] {
            if let Some(element) = self.elements.get_mut(&endpoint) {
                element.detach_link(id);
            }
        }
        self.sources
            .cells
            .trigger(&CellsEvent::LinkRemoved(link.clone()));
        Some(link)
    }

    /// Moves a link to a new key. The caller checks that `new_key` is free.
    pub(super) fn reindex_link(&mut self, id: LinkId, old_key: LinkKey, new_key: LinkKey) {
        if self.link_index.get(&old_key) == Some(&id) {
            self.link_index.remove(&old_key);
        }
        self.link_index.insert(new_key, id);
    }

    pub fn link_type(&self, id: Iri) -> Option<&LinkType> {
        self.link_types.get(&id)
    }

    pub fn link_types(&self) -> impl Iterator<Item = &LinkType> {
        self.link_types.values()
    }

    pub fn link_type_mut(&mut self, id: Iri) -> Option<LinkTypeMut<'_>> {
        self.link_types
            .contains_key(&id)
            .then(|| LinkTypeMut::new(self, id))
    }

    pub fn get_or_create_link_type(&mut self, id: Iri) -> &LinkType {
        self.link_types
            .entry(id)
            .or_insert_with(|| LinkType::new(id))
    }

    pub fn class(&self, id: Iri) -> Option<&RichClass> {
        self.classes.get(&id)
    }

    pub fn classes(&self) -> impl Iterator<Item = &RichClass> {
        self.classes.values()
    }

    pub fn class_mut(&mut self, id: Iri) -> Option<RichClassMut<'_>> {
        self.classes
            .contains_key(&id)
            .then(|| RichClassMut::new(self, id))
    }

    pub fn get_or_create_class(&mut self, id: Iri) -> &RichClass {
        self.classes
            .entry(id)
            .or_insert_with(|| RichClass::new(id))
    }

    pub fn property(&self, id: Iri) -> Option<&RichProperty> {
        self.properties.get(&id)
    }

    pub fn property_mut(&mut self, id: Iri) -> Option<RichPropertyMut<'_>> {
        self.properties
            .contains_key(&id)
            .then(|| RichPropertyMut::new(self, id))
    }

    pub fn get_or_create_property(&mut self, id: Iri) -> &RichProperty {
        self.properties
            .entry(id)
            .or_insert_with(|| RichProperty::new(id))
    }

    /// Removes every cell. Link types and label caches are kept.
    pub fn reset(&mut self) {
        self.elements.clear();
        self.links.clear();
        self.link_index.clear();
        self.sources.cells.trigger(&CellsEvent::Reset);
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
