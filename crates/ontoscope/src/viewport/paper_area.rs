//! Paper area controller.
//!
//! # Pointer gestures
//!
//! A left-button press starts exactly one gesture, chosen by what is under
//! the pointer:
//!
//! - nothing: the viewport pans;
//! - an element: the element follows the pointer;
//! - a link: the first move inserts a vertex at the nearest segment, later
//!   moves drag that vertex;
//! - a link vertex: the vertex follows the pointer.
//!
//! Geometry edited during a gesture is recorded as a single undo step on
//! release. A release without movement is reported as a click.

use std::rc::Rc;

use log::{debug, trace};
use serde::Deserialize;

use ontoscope_core::{
    events::{EventSource, Events},
    geometry::{Bounds, Point, Size, compute_polyline, find_nearest_segment_index},
    scheduler::CancellationToken,
};

use super::{
    ViewportError,
    animation::{ViewportAnimation, ViewportState},
    transform::PaperTransform,
};
use crate::{
    history::{Command, HistoryError, RestoreGeometry},
    model::{DiagramModel, ElementId, Iri, LinkId},
    router::{SizeProvider, element_bounds},
};

/// Zoom limits and behavior.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ZoomOptions {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    /// Largest scale zoom-to-fit may pick.
    pub max_fit: f32,
    /// Margin kept around content by zoom-to-fit, in client pixels.
    pub fit_padding: f32,
    /// Wheel zooms only with ctrl held; otherwise it scrolls.
    pub require_ctrl: bool,
}

impl Default for ZoomOptions {
    fn default() -> Self {
        Self {
            min: 0.2,
            max: 2.0,
            step: 0.1,
            max_fit: 1.0,
            fit_padding: 20.0,
            require_ctrl: true,
        }
    }
}

/// Cell under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellTarget {
    Element(ElementId),
    Link(LinkId),
    LinkVertex { link: LinkId, index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Left,
    Middle,
    Right,
}

/// Pointer position in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerInput {
    pub client: Point,
    pub button: PointerButton,
}

impl PointerInput {
    pub fn left(client: Point) -> Self {
        Self {
            client,
            button: PointerButton::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelInput {
    pub client: Point,
    pub delta: Point,
    pub ctrl: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaperAreaEvent {
    PointerDown {
        target: Option<CellTarget>,
        point: Point,
    },
    PointerMove {
        target: Option<CellTarget>,
        point: Point,
    },
    PointerUp {
        target: Option<CellTarget>,
        point: Point,
        trigger_as_click: bool,
    },
    Scroll {
        scroll: Point,
    },
    Zoom {
        scale: f32,
    },
    ChangeAnimatingGraph {
        animating: bool,
    },
}

/// Handles items dropped onto the paper.
pub trait DropHandler {
    fn on_drop(&self, model: &mut DiagramModel, point: Point, iris: &[Iri]);
}

#[derive(Debug)]
enum Gesture {
    Panning {
        start_scroll: Point,
    },
    MovingElement {
        element: ElementId,
        offset: Point,
    },
    EditingLink {
        link: LinkId,
        vertex: Option<usize>,
    },
}

#[derive(Debug)]
struct PointerState {
    gesture: Gesture,
    target: Option<CellTarget>,
    start_client: Point,
    moved: bool,
    geometry: Option<RestoreGeometry>,
}

/// Scrollable, zoomable surface the diagram is drawn on.
pub struct PaperArea {
    transform: PaperTransform,
    scroll: Point,
    client_size: Size,
    page_size: Size,
    zoom: ZoomOptions,
    animation_duration_ms: f64,
    animation: Option<ViewportAnimation>,
    graph_animation_until: Option<f64>,
    pointer: Option<PointerState>,
    drop_handlers: Vec<Rc<dyn DropHandler>>,
    source: EventSource<PaperAreaEvent>,
}

impl PaperArea {
    pub fn new(zoom: ZoomOptions, page_size: Size, client_size: Size, animation_duration_ms: f64) -> Self {
        let mut area = Self {
            transform: PaperTransform::default(),
            scroll: Point::default(),
            client_size,
            page_size,
            zoom,
            animation_duration_ms,
            animation: None,
            graph_animation_until: None,
            pointer: None,
            drop_handlers: Vec::new(),
            source: EventSource::new(),
        };
        area.adjust_paper(Bounds::default());
        area
    }

    pub fn events(&self) -> Events<PaperAreaEvent> {
        self.source.events()
    }

    pub fn transform(&self) -> PaperTransform {
        self.transform
    }

    pub fn scale(&self) -> f32 {
        self.transform.scale
    }

    pub fn scroll(&self) -> Point {
        self.scroll
    }

    pub fn client_size(&self) -> Size {
        self.client_size
    }

    pub fn zoom_options(&self) -> ZoomOptions {
        self.zoom
    }

    pub fn set_client_size(&mut self, size: Size) {
        self.client_size = size;
    }

    pub fn paper_to_pane(&self, point: Point) -> Point {
        self.transform.paper_to_pane(point)
    }

    pub fn pane_to_paper(&self, point: Point) -> Point {
        self.transform.pane_to_paper(point)
    }

    pub fn client_to_pane(&self, point: Point) -> Point {
        point.add_point(self.scroll)
    }

    pub fn pane_to_client(&self, point: Point) -> Point {
        point.sub_point(self.scroll)
    }

    pub fn client_to_paper(&self, point: Point) -> Point {
        self.pane_to_paper(self.client_to_pane(point))
    }

    pub fn paper_to_client(&self, point: Point) -> Point {
        self.pane_to_client(self.paper_to_pane(point))
    }

    fn client_center(&self) -> Point {
        Point::new(self.client_size.width() / 2.0, self.client_size.height() / 2.0)
    }

    fn set_scroll(&mut self, scroll: Point) {
        let pane = self.transform.pane_size();
        let max_x = (pane.width() - self.client_size.width()).max(0.0);
        let max_y = (pane.height() - self.client_size.height()).max(0.0);
        let scroll = Point::new(scroll.x().clamp(0.0, max_x), scroll.y().clamp(0.0, max_y));
        if scroll == self.scroll {
            return;
        }
        self.scroll = scroll;
        self.source.trigger(&PaperAreaEvent::Scroll { scroll });
    }

    pub fn scroll_by(&mut self, delta: Point) {
        self.set_scroll(self.scroll.add_point(delta));
    }

    /// Resizes the paper to the page-grid-aligned box around `content`.
    ///
    /// The client size is used as padding on every side so content can be
    /// scrolled to any viewport edge. The scroll offset is compensated so
    /// the visible paper region stays put.
    pub fn adjust_paper(&mut self, content: Bounds) {
        let anchor = self.client_to_paper(Point::default());

        let (page_w, page_h) = (self.page_size.width(), self.page_size.height());
        let min_x = (content.min_x() / page_w).floor() * page_w;
        let min_y = (content.min_y() / page_h).floor() * page_h;
        let max_x = ((content.max_x() / page_w).ceil() * page_w).max(min_x + page_w);
        let max_y = ((content.max_y() / page_h).ceil() * page_h).max(min_y + page_h);

        let adjusted = PaperTransform {
            origin_x: -min_x,
            origin_y: -min_y,
            padding_x: self.client_size.width(),
            padding_y: self.client_size.height(),
            paper_width: max_x - min_x,
            paper_height: max_y - min_y,
            ..self.transform
        };
        if adjusted == self.transform {
            return;
        }
        trace!(width = adjusted.paper_width, height = adjusted.paper_height; "Paper adjusted");
        self.transform = adjusted;
        let scroll = self.transform.paper_to_pane(anchor);
        self.set_scroll(scroll);
    }

    /// Sets the scale, keeping the paper point under `pivot` in place.
    ///
    /// # Arguments
    ///
    /// * `scale` - Requested scale, clamped to the configured zoom range
    /// * `pivot` - Client point to keep fixed; the viewport center when `None`
    pub fn zoom_to(&mut self, scale: f32, pivot: Option<Point>) {
        let scale = scale.clamp(self.zoom.min, self.zoom.max);
        let pivot = pivot.unwrap_or_else(|| self.client_center());
        let paper_pivot = self.client_to_paper(pivot);
        if scale != self.transform.scale {
            self.transform.scale = scale;
            self.source.trigger(&PaperAreaEvent::Zoom { scale });
        }
        let scroll = self.paper_to_pane(paper_pivot).sub_point(pivot);
        self.set_scroll(scroll);
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.zoom_to(scale, None);
    }

    pub fn zoom_by(&mut self, delta: f32, pivot: Option<Point>) {
        self.zoom_to(self.transform.scale + delta, pivot);
    }

    pub fn zoom_in(&mut self, pivot: Option<Point>) {
        self.zoom_by(self.zoom.step, pivot);
    }

    pub fn zoom_out(&mut self, pivot: Option<Point>) {
        self.zoom_by(-self.zoom.step, pivot);
    }

    pub fn on_wheel(&mut self, input: WheelInput) {
        if self.zoom.require_ctrl && !input.ctrl {
            self.scroll_by(input.delta);
            return;
        }
        if input.delta.y() < 0.0 {
            self.zoom_in(Some(input.client));
        } else if input.delta.y() > 0.0 {
            self.zoom_out(Some(input.client));
        }
    }

    pub fn viewport_state(&self) -> ViewportState {
        ViewportState {
            center: self.client_to_paper(self.client_center()),
            scale: self.transform.scale,
        }
    }

    /// Shows `state`, either at once or as an eased animation.
    ///
    /// Any running viewport animation is cancelled first.
    pub fn set_viewport_state(&mut self, state: ViewportState, animate: bool) {
        if let Some(previous) = self.animation.take() {
            previous.cancel();
        }
        if !animate || self.animation_duration_ms <= 0.0 {
            self.apply_viewport_state(state);
            return;
        }
        debug!(scale = state.scale; "Starting viewport animation");
        self.animation = Some(ViewportAnimation::new(
            self.viewport_state(),
            state,
            self.animation_duration_ms,
            CancellationToken::new(),
        ));
    }

    fn apply_viewport_state(&mut self, state: ViewportState) {
        self.zoom_to(state.scale, None);
        let center = self.client_center();
        let scroll = self.paper_to_pane(state.center).sub_point(center);
        self.set_scroll(scroll);
    }

    pub fn is_animating_viewport(&self) -> bool {
        self.animation.is_some()
    }

    pub fn center_to(&mut self, paper_point: Point, animate: bool) {
        let scale = self.transform.scale;
        self.set_viewport_state(
            ViewportState {
                center: paper_point,
                scale,
            },
            animate,
        );
    }

    pub fn center_content(&mut self, content: Bounds, animate: bool) {
        self.center_to(content.center(), animate);
    }

    /// Scale and center so that `rect` fills the viewport.
    ///
    /// An axis along which `rect` has no extent does not constrain the
    /// scale; a single point is only centered.
    pub fn zoom_to_fit_rect(&mut self, rect: Bounds, animate: bool) {
        let available_w = (self.client_size.width() - 2.0 * self.zoom.fit_padding).max(1.0);
        let available_h = (self.client_size.height() - 2.0 * self.zoom.fit_padding).max(1.0);
        let fit = |available: f32, extent: f32| (extent > 0.0).then(|| available / extent);
        let scale = match (
            fit(available_w, rect.width()),
            fit(available_h, rect.height()),
        ) {
            (Some(x), Some(y)) => x.min(y),
            (Some(scale), None) | (None, Some(scale)) => scale,
            (None, None) => {
                self.center_to(rect.center(), animate);
                return;
            }
        };
        let scale = scale.clamp(self.zoom.min, self.zoom.max_fit.max(self.zoom.min));
        self.set_viewport_state(
            ViewportState {
                center: rect.center(),
                scale,
            },
            animate,
        );
    }

    pub fn zoom_to_fit(&mut self, content: Bounds, animate: bool) {
        self.zoom_to_fit_rect(content, animate);
    }

    /// Marks the graph as animating for `duration_ms`.
    pub fn begin_graph_animation(&mut self, now_ms: f64, duration_ms: f64) {
        let was_animating = self.graph_animation_until.is_some();
        let until = self.graph_animation_until.map_or(now_ms + duration_ms, |until| {
            until.max(now_ms + duration_ms)
        });
        self.graph_animation_until = Some(until);
        if !was_animating {
            self.source
                .trigger(&PaperAreaEvent::ChangeAnimatingGraph { animating: true });
        }
    }

    pub fn is_animating_graph(&self) -> bool {
        self.graph_animation_until.is_some()
    }

    /// Advances animations. Returns whether any animation is still running.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        if let Some(mut animation) = self.animation.take() {
            if !animation.is_cancelled() {
                let (state, finished) = animation.sample(now_ms);
                self.apply_viewport_state(state);
                if !finished {
                    self.animation = Some(animation);
                }
            }
        }
        if self.graph_animation_until.is_some_and(|until| now_ms >= until) {
            self.graph_animation_until = None;
            self.source
                .trigger(&PaperAreaEvent::ChangeAnimatingGraph { animating: false });
        }
        self.animation.is_some() || self.graph_animation_until.is_some()
    }

    pub fn is_gesture_active(&self) -> bool {
        self.pointer.is_some()
    }

    /// Starts a gesture. Non-left buttons are ignored.
    ///
    /// Gestures that edit geometry open a history batch that the matching
    /// [`PaperArea::pointer_up`] closes.
    pub fn pointer_down(&mut self, model: &mut DiagramModel, target: Option<CellTarget>, input: PointerInput) {
        if input.button != PointerButton::Left {
            return;
        }
        if self.pointer.is_some() {
            debug!("Pointer down during an active gesture ignored");
            return;
        }
        let point = self.client_to_paper(input.client);
        let gesture = match target {
            None => Gesture::Panning {
                start_scroll: self.scroll,
            },
            Some(CellTarget::Element(element)) => {
                let position = model
                    .element(element)
                    .map_or(point, |element| element.position());
                Gesture::MovingElement {
                    element,
                    offset: position.sub_point(point),
                }
            }
            Some(CellTarget::Link(link)) => Gesture::EditingLink { link, vertex: None },
            Some(CellTarget::LinkVertex { link, index }) => Gesture::EditingLink {
                link,
                vertex: Some(index),
            },
        };
        let geometry = if matches!(gesture, Gesture::Panning { .. }) {
            None
        } else {
            model.start_batch(RestoreGeometry::TITLE);
            Some(RestoreGeometry::capture(model.graph()))
        };
        self.pointer = Some(PointerState {
            gesture,
            target,
            start_client: input.client,
            moved: false,
            geometry,
        });
        self.source
            .trigger(&PaperAreaEvent::PointerDown { target, point });
    }

    pub fn pointer_move(&mut self, model: &mut DiagramModel, sizes: &dyn SizeProvider, input: PointerInput) {
        let point = self.client_to_paper(input.client);
        let Some(mut state) = self.pointer.take() else {
            return;
        };
        state.moved |= input.client != state.start_client;

        match &mut state.gesture {
            Gesture::Panning { start_scroll } => {
                let scroll = start_scroll.sub_point(input.client.sub_point(state.start_client));
                self.set_scroll(scroll);
            }
            Gesture::MovingElement { element, offset } => {
                if let Some(mut element) = model.element_mut(*element) {
                    element.set_position(point.add_point(*offset));
                }
            }
            Gesture::EditingLink { link, vertex } => {
                if let Some(index) = Self::edit_link_vertex(model, sizes, *link, *vertex, point) {
                    *vertex = Some(index);
                }
            }
        }

        let target = state.target;
        self.pointer = Some(state);
        self.source
            .trigger(&PaperAreaEvent::PointerMove { target, point });
    }

    /// Moves vertex `vertex` of `link` to `point`, inserting a new vertex at
    /// the nearest segment when `vertex` is `None`. Returns the vertex index.
    fn edit_link_vertex(
        model: &mut DiagramModel,
        sizes: &dyn SizeProvider,
        link: LinkId,
        vertex: Option<usize>,
        point: Point,
    ) -> Option<usize> {
        let graph = model.graph();
        let current = graph.link(link)?;
        let mut vertices = current.vertices().to_vec();
        let index = match vertex {
            Some(index) if index < vertices.len() => {
                vertices[index] = point;
                index
            }
            Some(_) => return None,
            None => {
                let source = element_bounds(graph, sizes, current.source_id()).unwrap_or_default();
                let target = element_bounds(graph, sizes, current.target_id()).unwrap_or_default();
                let polyline = compute_polyline(source, target, &vertices);
                let index = find_nearest_segment_index(&polyline, point).min(vertices.len());
                vertices.insert(index, point);
                trace!(link:% = link, index = index; "Inserted link vertex");
                index
            }
        };
        model.link_mut(link)?.set_vertices(vertices);
        Some(index)
    }

    /// Ends the gesture and records its geometry changes as one undo step.
    pub fn pointer_up(&mut self, model: &mut DiagramModel, input: PointerInput) -> Result<(), HistoryError> {
        let Some(state) = self.pointer.take() else {
            return Ok(());
        };
        let point = self.client_to_paper(input.client);
        let moved = state.moved || input.client != state.start_client;

        if let Some(geometry) = state.geometry {
            let restore = geometry.filter_out_unchanged(model.graph());
            if moved && restore.has_changes() {
                model.register_to_undo(Command::RestoreGeometry(restore));
            }
            model.store_batch()?;
        }

        self.source.trigger(&PaperAreaEvent::PointerUp {
            target: state.target,
            point,
            trigger_as_click: !moved,
        });
        Ok(())
    }

    pub fn push_drag_drop_handler(&mut self, handler: Rc<dyn DropHandler>) {
        self.drop_handlers.push(handler);
    }

    /// Removes `handler`, which must be the most recently pushed one.
    pub fn pop_drag_drop_handler(&mut self, handler: &Rc<dyn DropHandler>) -> Result<(), ViewportError> {
        let top = self
            .drop_handlers
            .last()
            .ok_or(ViewportError::EmptyDropHandlerStack)?;
        if !std::ptr::addr_eq(Rc::as_ptr(top), Rc::as_ptr(handler)) {
            return Err(ViewportError::MismatchedDropHandler);
        }
        self.drop_handlers.pop();
        Ok(())
    }

    pub fn drop_handler(&self) -> Option<Rc<dyn DropHandler>> {
        self.drop_handlers.last().cloned()
    }
}
