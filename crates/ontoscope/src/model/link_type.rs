//! Link types shared by every link of the same type IRI.

use super::{
    data::{Iri, Literal},
    events::{LinkTypeChange, LinkTypeEvent},
    graph::Graph,
};

#[derive(Debug, Clone, PartialEq)]
pub struct LinkType {
    id: Iri,
    label: Vec<Literal>,
    visible: bool,
    show_label: bool,
    is_new: bool,
}

impl LinkType {
    pub fn new(id: Iri) -> Self {
        Self {
            id,
            label: Vec::new(),
            visible: true,
            show_label: true,
            is_new: false,
        }
    }

    pub fn id(&self) -> Iri {
        self.id
    }

    pub fn label(&self) -> &[Literal] {
        &self.label
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn show_label(&self) -> bool {
        self.show_label
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }
}

pub struct LinkTypeMut<'a> {
    graph: &'a mut Graph,
    id: Iri,
}

impl<'a> LinkTypeMut<'a> {
    pub(super) fn new(graph: &'a mut Graph, id: Iri) -> Self {
        Self { graph, id }
    }

    fn link_type(&mut self) -> &mut LinkType {
        self.graph
            .link_types
            .get_mut(&self.id)
            .unwrap_or_else(|| unreachable!("link type handle outlived its link type"))
    }

    fn emit(&self, change: LinkTypeChange) {
        self.graph.sources.link_type.trigger(&LinkTypeEvent {
            source: self.id,
            change,
        });
    }

    pub fn set_label(&mut self, label: Vec<Literal>) {
        let link_type = self.link_type();
        if link_type.label == label {
            return;
        }
        let previous = std::mem::replace(&mut link_type.label, label);
        self.emit(LinkTypeChange::Label { previous });
    }

    /// Changes visibility and label visibility together.
    ///
    /// A hidden type never shows its label, whatever `show_label` says.
    pub fn set_visibility(&mut self, visible: bool, show_label: bool) {
        let show_label = visible && show_label;
        let link_type = self.link_type();
        if link_type.visible == visible && link_type.show_label == show_label {
            return;
        }
        let previous_visible = std::mem::replace(&mut link_type.visible, visible);
        let previous_show_label = std::mem::replace(&mut link_type.show_label, show_label);
        self.emit(LinkTypeChange::Visibility {
            previous_visible,
            previous_show_label,
        });
    }

    pub fn set_is_new(&mut self, is_new: bool) {
        let link_type = self.link_type();
        if link_type.is_new == is_new {
            return;
        }
        link_type.is_new = is_new;
        self.emit(LinkTypeChange::IsNew { previous: !is_new });
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::model::LinkTypeEvent;

    #[test]
    fn test_visibility_changes_atomically() {
        let mut graph = Graph::new();
        let id = Iri::new("ex:knows");
        graph.get_or_create_link_type(id);

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        graph
            .events()
            .link_type
            .on(move |event: &LinkTypeEvent| sink.borrow_mut().push(event.change.clone()));

        let mut link_type = graph.link_type_mut(id).unwrap();
        link_type.set_visibility(false, true);
        link_type.set_visibility(false, false);

        assert_eq!(
            *events.borrow(),
            vec![LinkTypeChange::Visibility {
                previous_visible: true,
                previous_show_label: true,
            }]
        );
        let link_type = graph.link_type(id).unwrap();
        assert!(!link_type.is_visible());
        assert!(!link_type.show_label());
    }

    #[test]
    fn test_label_and_is_new() {
        let mut graph = Graph::new();
        let id = Iri::new("ex:knows");
        graph.get_or_create_link_type(id);

        let mut link_type = graph.link_type_mut(id).unwrap();
        link_type.set_label(vec![Literal::plain("knows")]);
        link_type.set_is_new(true);

        let link_type = graph.link_type(id).unwrap();
        assert_eq!(link_type.label(), &[Literal::plain("knows")]);
        assert!(link_type.is_new());
    }
}
