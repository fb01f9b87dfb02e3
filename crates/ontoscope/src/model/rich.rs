//! Label caches for classes and properties.

use super::{
    data::{Iri, Literal},
    events::{ClassChange, ClassEvent, PropertyEvent},
    graph::Graph,
};

/// Cached label and instance count of an RDF class.
#[derive(Debug, Clone, PartialEq)]
pub struct RichClass {
    id: Iri,
    label: Vec<Literal>,
    count: Option<u64>,
}

impl RichClass {
    pub fn new(id: Iri) -> Self {
        Self {
            id,
            label: Vec::new(),
            count: None,
        }
    }

    pub fn id(&self) -> Iri {
        self.id
    }

    pub fn label(&self) -> &[Literal] {
        &self.label
    }

    pub fn count(&self) -> Option<u64> {
        self.count
    }
}

/// Cached label of an RDF property.
#[derive(Debug, Clone, PartialEq)]
pub struct RichProperty {
    id: Iri,
    label: Vec<Literal>,
}

impl RichProperty {
    pub fn new(id: Iri) -> Self {
        Self {
            id,
            label: Vec::new(),
        }
    }

    pub fn id(&self) -> Iri {
        self.id
    }

    pub fn label(&self) -> &[Literal] {
        &self.label
    }
}

pub struct RichClassMut<'a> {
    graph: &'a mut Graph,
    id: Iri,
}

impl<'a> RichClassMut<'a> {
    pub(super) fn new(graph: &'a mut Graph, id: Iri) -> Self {
        Self { graph, id }
    }

    fn class(&mut self) -> &mut RichClass {
        self.graph
            .classes
            .get_mut(&self.id)
            .unwrap_or_else(|| unreachable!("class handle outlived its class"))
    }

    fn emit(&self, change: ClassChange) {
        self.graph.sources.class.trigger(&ClassEvent {
            source: self.id,
            change,
        });
    }

    pub fn set_label(&mut self, label: Vec<Literal>) {
        let class = self.class();
        if class.label == label {
            return;
        }
        let previous = std::mem::replace(&mut class.label, label);
        self.emit(ClassChange::Label { previous });
    }

    pub fn set_count(&mut self, count: Option<u64>) {
        let class = self.class();
        if class.count == count {
            return;
        }
        let previous = std::mem::replace(&mut class.count, count);
        self.emit(ClassChange::Count { previous });
    }
}

pub struct RichPropertyMut<'a> {
    graph: &'a mut Graph,
    id: Iri,
}

impl<'a> RichPropertyMut<'a> {
    pub(super) fn new(graph: &'a mut Graph, id: Iri) -> Self {
        Self { graph, id }
    }

    pub fn set_label(&mut self, label: Vec<Literal>) {
        let Some(property) = self.graph.properties.get_mut(&self.id) else {
            return;
        };
        if property.label == label {
            return;
        }
        let previous_label = std::mem::replace(&mut property.label, label);
        self.graph.sources.property.trigger(&PropertyEvent {
            source: self.id,
            previous_label,
        });
    }
}
