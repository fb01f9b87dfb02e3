//! Change notifications emitted by the graph.
//!
//! Every event names its `source` and, for property changes, carries the
//! value the property had before the change.

use ontoscope_core::{
    events::{EventSource, Events},
    geometry::Point,
};

use super::{
    data::{ElementData, ElementId, Iri, LinkData, LinkId, Literal, StateMap},
    element::Element,
    link::Link,
};
use crate::rendering::RedrawLevel;

/// Structural changes of the graph.
#[derive(Debug, Clone, PartialEq)]
pub enum CellsEvent {
    ElementAdded(ElementId),
    ElementRemoved(Element),
    LinkAdded(LinkId),
    LinkRemoved(Link),
    /// Every cell was removed at once.
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementEvent {
    pub source: ElementId,
    pub change: ElementChange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementChange {
    Data { previous: ElementData },
    Position { previous: Point },
    Expanded { previous: bool },
    ElementState { previous: StateMap },
    RequestedFocus,
    RequestedRedraw { level: RedrawLevel },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkEvent {
    pub source: LinkId,
    pub change: LinkChange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkChange {
    Data { previous: LinkData },
    LayoutOnly { previous: bool },
    Vertices { previous: Vec<Point> },
    LinkState { previous: StateMap },
    RequestedRedraw { level: RedrawLevel },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkTypeEvent {
    pub source: Iri,
    pub change: LinkTypeChange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkTypeChange {
    Label { previous: Vec<Literal> },
    Visibility { previous_visible: bool, previous_show_label: bool },
    IsNew { previous: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassEvent {
    pub source: Iri,
    pub change: ClassChange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassChange {
    Label { previous: Vec<Literal> },
    Count { previous: Option<u64> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyEvent {
    pub source: Iri,
    pub previous_label: Vec<Literal>,
}

/// Owner side of every model event stream.
#[derive(Debug, Default)]
pub(crate) struct GraphEventSources {
    pub cells: EventSource<CellsEvent>,
    pub element: EventSource<ElementEvent>,
    pub link: EventSource<LinkEvent>,
    pub link_type: EventSource<LinkTypeEvent>,
    pub class: EventSource<ClassEvent>,
    pub property: EventSource<PropertyEvent>,
}

/// Subscription handles for every model event stream.
#[derive(Clone)]
pub struct GraphEvents {
    pub cells: Events<CellsEvent>,
    pub element: Events<ElementEvent>,
    pub link: Events<LinkEvent>,
    pub link_type: Events<LinkTypeEvent>,
    pub class: Events<ClassEvent>,
    pub property: Events<PropertyEvent>,
}

impl GraphEventSources {
    pub fn handles(&self) -> GraphEvents {
        GraphEvents {
            cells: self.cells.events(),
            element: self.element.events(),
            link: self.link.events(),
            link_type: self.link_type.events(),
            class: self.class.events(),
            property: self.property.events(),
        }
    }
}
