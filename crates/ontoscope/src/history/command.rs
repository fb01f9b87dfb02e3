//! Reversible model mutations.

use log::debug;

use ontoscope_core::geometry::Point;

use crate::model::{Element, ElementData, ElementId, Graph, Link, LinkData, LinkId};

/// An undoable mutation of the graph.
///
/// [`Command::invoke`] applies the mutation and returns the command that
/// exactly reverses it. Commands never fail: one that refers to a missing
/// cell does nothing and returns an empty compound.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddElement { element: Element },
    RemoveElement { element_id: ElementId },
    /// Re-adds a removed element together with the links removed with it.
    RestoreElement { element: Element, links: Vec<Link> },
    AddLink { link: Link },
    RemoveLink { link_id: LinkId },
    SetElementData { element_id: ElementId, data: ElementData },
    SetLinkData { link_id: LinkId, data: LinkData },
    SetElementExpanded { element_id: ElementId, expanded: bool },
    SetLinkVertices { link_id: LinkId, vertices: Vec<Point> },
    RestoreGeometry(RestoreGeometry),
    Compound { title: String, commands: Vec<Command> },
}

impl Command {
    /// A command that does nothing.
    pub fn noop() -> Self {
        Self::Compound {
            title: String::new(),
            commands: Vec::new(),
        }
    }

    pub fn compound(title: impl Into<String>, commands: Vec<Command>) -> Self {
        Self::Compound {
            title: title.into(),
            commands,
        }
    }

    pub fn is_noop(&self) -> bool {
        match self {
            Self::Compound { commands, .. } => commands.iter().all(Command::is_noop),
            Self::RestoreGeometry(geometry) => !geometry.has_changes(),
            _ => false,
        }
    }

    /// Human-readable name for undo/redo menus.
    pub fn title(&self) -> &str {
        match self {
            Self::AddElement { .. } => "Add element",
            Self::RemoveElement { .. } => "Remove element",
            Self::RestoreElement { .. } => "Restore element",
            Self::AddLink { .. } => "Add link",
            Self::RemoveLink { .. } => "Remove link",
            Self::SetElementData { .. } => "Change element data",
            Self::SetLinkData { .. } => "Change link data",
            Self::SetElementExpanded { expanded: true, .. } => "Expand element",
            Self::SetElementExpanded { expanded: false, .. } => "Collapse element",
            Self::SetLinkVertices { .. } => "Change link vertices",
            Self::RestoreGeometry(_) => RestoreGeometry::TITLE,
            Self::Compound { title, .. } => title,
        }
    }

    /// Applies the command and returns its inverse.
    pub fn invoke(self, graph: &mut Graph) -> Command {
        match self {
            Self::AddElement { element } => {
                let element_id = element.id();
                if graph.add_element(element) {
                    Self::RemoveElement { element_id }
                } else {
                    Self::noop()
                }
            }
            Self::RemoveElement { element_id } => match graph.remove_element(element_id) {
                Some((element, links)) => Self::RestoreElement { element, links },
                None => {
                    debug!(element:% = element_id; "Element to remove is missing");
                    Self::noop()
                }
            },
            Self::RestoreElement { element, links } => {
                let element_id = element.id();
                if !graph.add_element(element) {
                    return Self::noop();
                }
                for link in links {
                    graph.add_link(link);
                }
                Self::RemoveElement { element_id }
            }
            Self::AddLink { link } => {
                let link_id = link.id();
                if graph.add_link(link) {
                    Self::RemoveLink { link_id }
                } else {
                    Self::noop()
                }
            }
            Self::RemoveLink { link_id } => match graph.remove_link(link_id) {
                Some(link) => Self::AddLink { link },
                None => Self::noop(),
            },
            Self::SetElementData { element_id, data } => {
                let Some(previous) = graph.element(element_id).map(|e| e.data().clone()) else {
                    return Self::noop();
                };
                if let Some(mut element) = graph.element_mut(element_id) {
                    element.set_data(data);
                }
                Self::SetElementData {
                    element_id,
                    data: previous,
                }
            }
            Self::SetLinkData { link_id, data } => {
                let Some(previous) = graph.link(link_id).map(|link| link.data().clone()) else {
                    return Self::noop();
                };
                let Some(mut link) = graph.link_mut(link_id) else {
                    return Self::noop();
                };
                if let Err(err) = link.set_data(data) {
                    debug!(link:% = link_id, err:% = err; "Link data not changed");
                    return Self::noop();
                }
                Self::SetLinkData {
                    link_id,
                    data: previous,
                }
            }
            Self::SetElementExpanded {
                element_id,
                expanded,
            } => {
                let Some(previous) = graph.element(element_id).map(Element::is_expanded) else {
                    return Self::noop();
                };
                if let Some(mut element) = graph.element_mut(element_id) {
                    element.set_expanded(expanded);
                }
                Self::SetElementExpanded {
                    element_id,
                    expanded: previous,
                }
            }
            Self::SetLinkVertices { link_id, vertices } => {
                let Some(previous) = graph.link(link_id).map(|link| link.vertices().to_vec())
                else {
                    return Self::noop();
                };
                if let Some(mut link) = graph.link_mut(link_id) {
                    link.set_vertices(vertices);
                }
                Self::SetLinkVertices {
                    link_id,
                    vertices: previous,
                }
            }
            Self::RestoreGeometry(geometry) => Self::RestoreGeometry(geometry.restore(graph)),
            Self::Compound { title, commands } => {
                let mut inverses: Vec<Command> = commands
                    .into_iter()
                    .map(|command| command.invoke(graph))
                    .collect();
                inverses.reverse();
                Self::Compound {
                    title,
                    commands: inverses,
                }
            }
        }
    }
}

/// Snapshot of element positions and link vertices.
///
/// Moves during a drag gesture mutate the graph directly; the snapshot taken
/// before the gesture is registered afterwards as the undo command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoreGeometry {
    elements: Vec<(ElementId, Point)>,
    links: Vec<(LinkId, Vec<Point>)>,
}

impl RestoreGeometry {
    pub const TITLE: &'static str = "Move elements and links";

    /// Captures the geometry of every element and link.
    pub fn capture(graph: &Graph) -> Self {
        Self {
            elements: graph
                .elements()
                .map(|element| (element.id(), element.position()))
                .collect(),
            links: graph
                .links()
                .map(|link| (link.id(), link.vertices().to_vec()))
                .collect(),
        }
    }

    /// Captures the geometry of the given elements and of their incident links.
    pub fn capture_elements(graph: &Graph, elements: &[ElementId]) -> Self {
        let mut geometry = Self::default();
        for id in elements {
            let Some(element) = graph.element(*id) else {
                continue;
            };
            geometry.elements.push((*id, element.position()));
            for link in graph.links_of(*id) {
                if !geometry.links.iter().any(|(link_id, _)| *link_id == link.id()) {
                    geometry.links.push((link.id(), link.vertices().to_vec()));
                }
            }
        }
        geometry
    }

    /// Keeps only entries that differ from the current graph state.
    pub fn filter_out_unchanged(self, graph: &Graph) -> Self {
        Self {
            elements: self
                .elements
                .into_iter()
                .filter(|(id, position)| {
                    graph
                        .element(*id)
                        .is_some_and(|element| element.position() != *position)
                })
                .collect(),
            links: self
                .links
                .into_iter()
                .filter(|(id, vertices)| {
                    graph
                        .link(*id)
                        .is_some_and(|link| link.vertices() != vertices.as_slice())
                })
                .collect(),
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.elements.is_empty() || !self.links.is_empty()
    }

    pub fn element_positions(&self) -> &[(ElementId, Point)] {
        &self.elements
    }

    pub fn link_vertices(&self) -> &[(LinkId, Vec<Point>)] {
        &self.links
    }

    /// Applies the snapshot and returns a snapshot of the replaced geometry.
    fn restore(self, graph: &mut Graph) -> Self {
        let mut inverse = Self::default();
        for (id, position) in self.elements {
            let Some(previous) = graph.element(id).map(Element::position) else {
                continue;
            };
            inverse.elements.push((id, previous));
            if let Some(mut element) = graph.element_mut(id) {
                element.set_position(position);
            }
        }
        for (id, vertices) in self.links {
            let Some(previous) = graph.link(id).map(|link| link.vertices().to_vec()) else {
                continue;
            };
            inverse.links.push((id, previous));
            if let Some(mut link) = graph.link_mut(id) {
                link.set_vertices(vertices);
            }
        }
        inverse
    }
}
