//! Viewport of the diagram: coordinate spaces, zoom, scrolling, animation and
//! pointer gestures.
//!
//! Three coordinate spaces are involved:
//!
//! - **paper**: diagram coordinates, the space element positions live in;
//! - **pane**: the scrollable surface, paper scaled and offset by the paper
//!   origin and padding;
//! - **client**: the visible viewport, pane shifted by the scroll offset.

mod animation;
mod paper_area;
mod transform;

pub use animation::{ViewportAnimation, ViewportState, ease_in_out};
pub use paper_area::{
    CellTarget, DropHandler, PaperArea, PaperAreaEvent, PointerButton, PointerInput, WheelInput,
    ZoomOptions,
};
pub use transform::PaperTransform;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewportError {
    #[error("popped drag and drop handler is not the one on top of the stack")]
    MismatchedDropHandler,

    #[error("drag and drop handler stack is empty")]
    EmptyDropHandlerStack,
}
