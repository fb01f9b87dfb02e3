//! Frame scheduler tying the model to its derived state.
//!
//! [`DiagramView`] owns a [`DiagramModel`] together with everything derived
//! from it. Model mutations only record redraw requests; the host calls
//! [`DiagramView::tick`] once per animation frame to apply them, and gets
//! back what changed in each render layer.

use log::{debug, trace, warn};

use ontoscope_core::{
    color::Color,
    geometry::{Bounds, Point, Size},
};

use crate::{
    config::EditorConfig,
    error::DiagramError,
    export::{self, svg::ImageLoader},
    model::{DiagramModel, ElementData, ElementId, Iri, LinkId},
    rendering::{
        ElementLayer, LayerDiff, LinkLayer, RedrawLevel, RenderingLayer, RenderingState, Resolvers,
    },
    router::{DefaultLinkRouter, content_bounds},
    viewport::{CellTarget, PaperArea, PointerInput, WheelInput},
};

/// Offset between consecutive elements created by one drop.
const DROP_STEP: f32 = 20.0;

/// Changes applied by one frame.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameUpdate {
    /// `None` when the element layer had nothing scheduled.
    pub elements: Option<LayerDiff<ElementId>>,
    /// `None` when the link layer had nothing scheduled.
    pub links: Option<LayerDiff<LinkId>>,
    /// A viewport or graph animation is still running.
    pub animating: bool,
}

impl FrameUpdate {
    pub fn is_empty(&self) -> bool {
        self.elements.as_ref().is_none_or(LayerDiff::is_empty)
            && self.links.as_ref().is_none_or(LayerDiff::is_empty)
    }
}

/// A mounted diagram: model, rendering state, render layers and viewport.
pub struct DiagramView {
    model: DiagramModel,
    rendering: RenderingState,
    element_layer: ElementLayer,
    link_layer: LinkLayer,
    paper_area: PaperArea,
    language: String,
    background: Option<Color>,
}

impl DiagramView {
    pub fn new(config: &EditorConfig) -> Self {
        Self::with_resolvers(config, Resolvers::default())
    }

    pub fn with_resolvers(config: &EditorConfig, resolvers: Resolvers) -> Self {
        let model = DiagramModel::new();
        let events = model.events();
        let router = DefaultLinkRouter::new(config.routing().gap());
        let rendering = RenderingState::new(&events, Box::new(router), resolvers);
        let element_layer = ElementLayer::new(&events, None);
        let link_layer = LinkLayer::new(&events, &rendering, None);
        let paper_area = PaperArea::new(
            *config.zoom(),
            config.paper().page_size(),
            config.paper().client_size(),
            config.animation().duration_ms(),
        );
        let background = config.style().background_color().unwrap_or_else(|err| {
            warn!(err:% = err; "Ignoring background color");
            None
        });

        Self {
            model,
            rendering,
            element_layer,
            link_layer,
            paper_area,
            language: config.language().to_owned(),
            background,
        }
    }

    pub fn model(&self) -> &DiagramModel {
        &self.model
    }

    /// Mutable model access. Changes become visible on the next frame.
    pub fn model_mut(&mut self) -> &mut DiagramModel {
        &mut self.model
    }

    pub fn rendering(&self) -> &RenderingState {
        &self.rendering
    }

    pub fn element_layer(&self) -> &ElementLayer {
        &self.element_layer
    }

    pub fn link_layer(&self) -> &LinkLayer {
        &self.link_layer
    }

    pub fn paper_area(&self) -> &PaperArea {
        &self.paper_area
    }

    pub fn paper_area_mut(&mut self) -> &mut PaperArea {
        &mut self.paper_area
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Switches the label language and re-renders every element and link.
    pub fn set_language(&mut self, language: impl Into<String>) {
        let language = language.into();
        if language == self.language {
            return;
        }
        self.language = language;
        self.element_layer
            .request_redraw_all(RedrawLevel::RecomputeTemplate);
        for link in self.model.graph().links() {
            self.link_layer
                .request_redraw(link.id(), RedrawLevel::RecomputeTemplate);
        }
    }

    /// Records a size measured by the host.
    pub fn set_element_size(&mut self, element: ElementId, size: Size) {
        self.rendering.set_element_size(element, size);
    }

    pub fn set_link_label_bounds(&mut self, link: LinkId, bounds: Bounds) {
        self.rendering.set_link_label_bounds(link, bounds);
    }

    /// Bounding box of the diagram content in paper coordinates.
    pub fn content_bbox(&self) -> Bounds {
        content_bounds(self.model.graph(), &self.rendering)
    }

    /// Advances animations and drains the scheduled work of every layer.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::Geometry`] if a link path cannot be computed.
    pub fn tick(&mut self, now_ms: f64) -> Result<FrameUpdate, DiagramError> {
        let animating = self.paper_area.tick(now_ms);
        let graph = self.model.graph();

        let elements = self
            .element_layer
            .flush_if_scheduled(graph, &self.rendering, &self.language);
        let content = content_bounds(graph, &self.rendering);
        self.paper_area.adjust_paper(content);
        self.rendering.flush_routings(graph);
        let links = self
            .link_layer
            .flush_if_scheduled(graph, &mut self.rendering, &self.language)?;

        let update = FrameUpdate {
            elements,
            links,
            animating,
        };
        if !update.is_empty() {
            trace!(now_ms = now_ms; "Frame applied");
        }
        Ok(update)
    }

    /// Flushes every layer immediately, in [`RenderingLayer::ALL`] order.
    ///
    /// Listeners receive one `SyncUpdate` event per layer, after that layer
    /// was flushed.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::Geometry`] if a link path cannot be computed.
    pub fn perform_sync_update(&mut self) -> Result<FrameUpdate, DiagramError> {
        let mut update = FrameUpdate {
            animating: self.paper_area.is_animating_viewport() || self.paper_area.is_animating_graph(),
            ..FrameUpdate::default()
        };
        let graph = self.model.graph();
        for layer in RenderingLayer::ALL {
            match layer {
                RenderingLayer::Element => {
                    update.elements =
                        Some(self.element_layer.flush(graph, &self.rendering, &self.language));
                }
                RenderingLayer::ElementSize => {}
                RenderingLayer::PaperArea => {
                    let content = content_bounds(graph, &self.rendering);
                    self.paper_area.adjust_paper(content);
                }
                RenderingLayer::Link => {
                    self.rendering.flush_routings(graph);
                    update.links = Some(self.link_layer.flush(
                        graph,
                        &mut self.rendering,
                        &self.language,
                    )?);
                }
                RenderingLayer::Editor => {}
            }
            self.rendering.emit_sync_update(layer);
        }
        Ok(update)
    }

    pub fn pointer_down(&mut self, target: Option<CellTarget>, input: PointerInput) {
        self.paper_area.pointer_down(&mut self.model, target, input);
    }

    /// Continues the active gesture.
    ///
    /// While a gesture is active the layers are flushed synchronously, so the
    /// next move sees up-to-date geometry.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::Geometry`] if a link path cannot be computed.
    pub fn pointer_move(&mut self, input: PointerInput) -> Result<(), DiagramError> {
        self.paper_area
            .pointer_move(&mut self.model, &self.rendering, input);
        if self.paper_area.is_gesture_active() {
            self.perform_sync_update()?;
        }
        Ok(())
    }

    /// Ends the active gesture, committing its history batch.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::History`] if the gesture's batch cannot be stored.
    pub fn pointer_up(&mut self, input: PointerInput) -> Result<(), DiagramError> {
        self.paper_area.pointer_up(&mut self.model, input)?;
        Ok(())
    }

    pub fn wheel(&mut self, input: WheelInput) {
        self.paper_area.on_wheel(input);
    }

    pub fn zoom_to_fit(&mut self, animate: bool) {
        let content = self.content_bbox();
        self.paper_area.zoom_to_fit(content, animate);
    }

    pub fn center_content(&mut self, animate: bool) {
        let content = self.content_bbox();
        self.paper_area.center_content(content, animate);
    }

    /// Handles items dropped at `client_point`.
    ///
    /// The top drag and drop handler receives the drop. Without one, an
    /// element is created for each IRI, stepping diagonally from the drop
    /// point, as one undoable step.
    ///
    /// Returns the elements created by the fallback.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::History`] if the batch cannot be stored.
    pub fn drop_items(
        &mut self,
        client_point: Point,
        iris: &[Iri],
    ) -> Result<Vec<ElementId>, DiagramError> {
        let point = self.paper_area.client_to_paper(client_point);
        if let Some(handler) = self.paper_area.drop_handler() {
            handler.on_drop(&mut self.model, point, iris);
            return Ok(Vec::new());
        }
        if iris.is_empty() {
            return Ok(Vec::new());
        }

        self.model.start_batch("Add elements");
        let created = iris
            .iter()
            .enumerate()
            .map(|(i, iri)| {
                let offset = DROP_STEP * i as f32;
                let position = point.add_point(Point::new(offset, offset));
                self.model
                    .create_element_at(ElementData::from(*iri), None, position)
            })
            .collect::<Vec<_>>();
        self.model.store_batch()?;
        debug!(count = created.len(); "Dropped items added as elements");
        Ok(created)
    }

    /// Exports the diagram as SVG on the configured background.
    ///
    /// # Arguments
    ///
    /// * `content_box` - Paper region to export; all content when `None`.
    /// * `image_loader` - Fetches element images for embedding. Without one,
    ///   images keep their URLs.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::Export`] if rendering fails.
    pub fn export_svg(
        &mut self,
        content_box: Option<Bounds>,
        image_loader: Option<&dyn ImageLoader>,
    ) -> Result<String, DiagramError> {
        let options = export::svg::ExportOptions {
            content_box,
            language: &self.language,
            background: self.background,
            image_loader,
            ..export::svg::ExportOptions::default()
        };
        Ok(export::svg::to_svg(self.model.graph(), &mut self.rendering, &options)?)
    }

    /// Exports the diagram as a PNG data URL.
    ///
    /// Takes the same arguments as [`DiagramView::export_svg`]; `scale`
    /// multiplies the output resolution.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::Export`] if rendering or rasterization fails.
    #[cfg(feature = "png")]
    pub fn export_png_data_url(
        &mut self,
        content_box: Option<Bounds>,
        image_loader: Option<&dyn ImageLoader>,
        scale: f32,
    ) -> Result<String, DiagramError> {
        let svg = self.export_svg(content_box, image_loader)?;
        Ok(export::png::to_data_url(&svg, scale)?)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{
        model::{Link, LinkData},
        rendering::RenderingEvent,
        viewport::DropHandler,
    };

    fn view() -> DiagramView {
        DiagramView::new(&EditorConfig::default())
    }

    fn add_pair(view: &mut DiagramView) -> (ElementId, ElementId, LinkId) {
        let model = view.model_mut();
        let alice = model.create_element_at(
            Iri::new("http://ex.org/alice"),
            None,
            Point::new(100.0, 100.0),
        );
        let bob = model.create_element_at(Iri::new("http://ex.org/bob"), None, Point::new(400.0, 100.0));
        let link = model
            .create_link(Link::new(
                alice,
                bob,
                LinkData::new(
                    Iri::new("http://ex.org/knows"),
                    Iri::new("http://ex.org/alice"),
                    Iri::new("http://ex.org/bob"),
                ),
            ))
            .unwrap();
        view.set_element_size(alice, Size::new(100.0, 40.0));
        view.set_element_size(bob, Size::new(100.0, 40.0));
        (alice, bob, link)
    }

    #[test]
    fn test_tick_materializes_new_cells() {
        let mut view = view();
        let (alice, bob, link) = add_pair(&mut view);

        let update = view.tick(0.0).unwrap();
        let elements = update.elements.unwrap();
        assert_eq!(elements.added, vec![alice, bob]);
        assert_eq!(update.links.unwrap().added, vec![link]);

        let idle = view.tick(16.0).unwrap();
        assert!(idle.elements.is_none());
        assert!(idle.links.is_none());
        assert!(idle.is_empty());
    }

    #[test]
    fn test_moving_element_updates_incident_link() {
        let mut view = view();
        let (alice, _, link) = add_pair(&mut view);
        view.tick(0.0).unwrap();
        let before = view.link_layer().state(link).unwrap().polyline.clone();

        view.model_mut()
            .element_mut(alice)
            .unwrap()
            .set_position(Point::new(100.0, 300.0));
        let update = view.tick(16.0).unwrap();

        assert_eq!(update.links.unwrap().updated, vec![link]);
        assert_ne!(view.link_layer().state(link).unwrap().polyline, before);
    }

    #[test]
    fn test_sync_update_notifies_layers_in_order() {
        let mut view = view();
        add_pair(&mut view);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        view.rendering().events().on(move |event: &RenderingEvent| {
            if let RenderingEvent::SyncUpdate { layer } = event {
                sink.borrow_mut().push(*layer);
            }
        });

        let update = view.perform_sync_update().unwrap();

        assert_eq!(update.elements.unwrap().added.len(), 2);
        assert_eq!(update.links.unwrap().added.len(), 1);
        assert_eq!(*seen.borrow(), RenderingLayer::ALL.to_vec());
    }

    #[test]
    fn test_drop_without_handler_is_one_undo_step() {
        let mut view = view();
        let iris = [Iri::new("http://ex.org/a"), Iri::new("http://ex.org/b")];

        let created = view.drop_items(Point::new(500.0, 300.0), &iris).unwrap();

        assert_eq!(created.len(), 2);
        let first = view.model().element(created[0]).unwrap().position();
        let second = view.model().element(created[1]).unwrap().position();
        assert_eq!(second, first.add_point(Point::new(DROP_STEP, DROP_STEP)));

        assert!(view.model_mut().undo().unwrap());
        assert_eq!(view.model().graph().element_count(), 0);
    }

    struct Recorder(RefCell<Vec<Iri>>);

    impl DropHandler for Recorder {
        fn on_drop(&self, _model: &mut DiagramModel, _point: Point, iris: &[Iri]) {
            self.0.borrow_mut().extend_from_slice(iris);
        }
    }

    #[test]
    fn test_drop_goes_to_top_handler() {
        let mut view = view();
        let recorder = Rc::new(Recorder(RefCell::new(Vec::new())));
        view.paper_area_mut()
            .push_drag_drop_handler(recorder.clone());

        let created = view
            .drop_items(Point::new(10.0, 10.0), &[Iri::new("http://ex.org/a")])
            .unwrap();

        assert!(created.is_empty());
        assert_eq!(*recorder.0.borrow(), vec![Iri::new("http://ex.org/a")]);
        assert_eq!(view.model().graph().element_count(), 0);
    }

    #[test]
    fn test_drag_flushes_synchronously() {
        let mut view = view();
        let (alice, _, link) = add_pair(&mut view);
        view.tick(0.0).unwrap();

        let start = view.paper_area().paper_to_client(Point::new(150.0, 120.0));
        view.pointer_down(Some(CellTarget::Element(alice)), PointerInput::left(start));
        view.pointer_move(PointerInput::left(start.add_point(Point::new(0.0, 200.0))))
            .unwrap();

        assert_eq!(
            view.model().element(alice).unwrap().position(),
            Point::new(100.0, 300.0)
        );
        let state = view.link_layer().state(link).unwrap();
        assert!(state.polyline[0].y() >= 300.0);
        assert!(!view.link_layer().is_scheduled());

        view.pointer_up(PointerInput::left(start.add_point(Point::new(0.0, 200.0))))
            .unwrap();
        assert!(view.model_mut().undo().unwrap());
        assert_eq!(
            view.model().element(alice).unwrap().position(),
            Point::new(100.0, 100.0)
        );
    }

    #[test]
    fn test_language_switch_recomputes_labels() {
        let mut view = view();
        add_pair(&mut view);
        view.tick(0.0).unwrap();

        view.set_language("de");
        let update = view.tick(16.0).unwrap();

        assert_eq!(update.elements.unwrap().updated.len(), 2);
        assert_eq!(update.links.unwrap().updated.len(), 1);
    }
}
