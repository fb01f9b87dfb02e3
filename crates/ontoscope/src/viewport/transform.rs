use ontoscope_core::geometry::{Point, Size};

/// Mapping between paper and pane coordinates.
///
/// `pane = (paper + origin) * scale + padding`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaperTransform {
    pub scale: f32,
    pub origin_x: f32,
    pub origin_y: f32,
    pub padding_x: f32,
    pub padding_y: f32,
    pub paper_width: f32,
    pub paper_height: f32,
}

impl PaperTransform {
    pub fn paper_to_pane(&self, point: Point) -> Point {
        Point::new(
            (point.x() + self.origin_x) * self.scale + self.padding_x,
            (point.y() + self.origin_y) * self.scale + self.padding_y,
        )
    }

    pub fn pane_to_paper(&self, point: Point) -> Point {
        Point::new(
            (point.x() - self.padding_x) / self.scale - self.origin_x,
            (point.y() - self.padding_y) / self.scale - self.origin_y,
        )
    }

    /// Size of the whole scrollable pane.
    pub fn pane_size(&self) -> Size {
        Size::new(
            self.paper_width * self.scale + 2.0 * self.padding_x,
            self.paper_height * self.scale + 2.0 * self.padding_y,
        )
    }
}

impl Default for PaperTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            origin_x: 0.0,
            origin_y: 0.0,
            padding_x: 0.0,
            padding_y: 0.0,
            paper_width: 0.0,
            paper_height: 0.0,
        }
    }
}
