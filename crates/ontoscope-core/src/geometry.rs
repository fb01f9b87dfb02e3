//! Geometric primitives and polyline algorithms for diagram editing.
//!
//! Everything in this module is a pure function of its inputs: no state, no
//! caches. The link router, the paper area, and the exporter all build on it.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in paper space, also used as a 2D vector
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - An axis-aligned rectangle stored as minimum and maximum coordinates
//! - [`Insets`] - Padding values for four sides
//! - [`compute_polyline`] - Link path between two rectangular shapes
//! - [`find_nearest_segment_index`] - Segment hit-testing for vertex insertion
//!
//! # Coordinate System
//!
//! Paper coordinates follow the SVG convention:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! Element positions denote the top-left corner of the element's box.

use thiserror::Error;

/// Errors raised by polyline operations on malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("cannot compute a point along an empty polyline")]
    EmptyPolyline,
}

/// A 2D point in paper coordinates.
///
/// Points double as 2D vectors: the vector helpers ([`Point::dot`],
/// [`Point::cross`], [`Point::normalize`]) treat the point as an offset from
/// the origin.
///
/// # Examples
///
/// ```
/// # use ontoscope_core::geometry::Point;
/// let a = Point::new(3.0, 4.0);
/// let b = Point::new(1.0, 1.0);
///
/// assert_eq!(a.sub_point(b), Point::new(2.0, 3.0));
/// assert_eq!(a.length(), 5.0);
/// assert_eq!(a.cross(b), -1.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Checks if both x and y coordinates are zero
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    pub fn add_point(self, other: Point) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub_point(self, other: Point) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    /// Multiplies both coordinates by the given factor
    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Euclidean length of the point treated as a vector.
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance between two points.
    pub fn distance(self, other: Point) -> f32 {
        self.sub_point(other).length()
    }

    /// Returns the unit vector pointing in the same direction.
    ///
    /// The zero vector has no direction and is returned unchanged.
    pub fn normalize(self) -> Self {
        if self.is_zero() {
            return self;
        }
        let length = self.length();
        Self::new(self.x / length, self.y / length)
    }

    /// Dot product of two vectors.
    pub fn dot(self, other: Point) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Z-component of the 3D cross product of two planar vectors.
    ///
    /// Positive when `other` is clockwise from `self` in paper coordinates
    /// (Y pointing down).
    pub fn cross(self, other: Point) -> f32 {
        self.x * other.y - self.y * other.x
    }

    /// Linear interpolation between `self` (at `t = 0`) and `other` (at `t = 1`).
    pub fn lerp(self, other: Point, t: f32) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

/// Width and height of a shape.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn width(self) -> f32 {
        self.width
    }

    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns true if both width and height are zero
    pub fn is_zero(self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }

    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }
}

/// An axis-aligned rectangle defined by its minimum and maximum coordinates.
///
/// # Examples
///
/// ```
/// # use ontoscope_core::geometry::{Bounds, Point, Size};
/// let node = Bounds::new_from_top_left(Point::new(10.0, 20.0), Size::new(100.0, 40.0));
///
/// assert_eq!(node.center(), Point::new(60.0, 40.0));
/// assert!(node.contains_point(Point::new(50.0, 30.0)));
/// assert!(!node.contains_point(Point::new(0.0, 0.0)));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates bounds from a top-left point and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// Creates bounds centered on a point
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let half = Point::new(size.width / 2.0, size.height / 2.0);
        Self::new_from_top_left(center.sub_point(half), size)
    }

    pub fn min_x(self) -> f32 {
        self.min_x
    }

    pub fn min_y(self) -> f32 {
        self.min_y
    }

    pub fn max_x(self) -> f32 {
        self.max_x
    }

    pub fn max_y(self) -> f32 {
        self.max_y
    }

    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns the top-left corner
    pub fn min_point(self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn to_size(self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// Returns true if the rectangle has zero width or zero height.
    pub fn is_empty(self) -> bool {
        self.width() == 0.0 || self.height() == 0.0
    }

    /// Checks whether a point lies strictly inside the rectangle.
    pub fn contains_point(self, point: Point) -> bool {
        point.x > self.min_x && point.x < self.max_x && point.y > self.min_y && point.y < self.max_y
    }

    /// Smallest bounds containing both rectangles.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn translate(&self, offset: Point) -> Self {
        Self {
            min_x: self.min_x + offset.x,
            min_y: self.min_y + offset.y,
            max_x: self.max_x + offset.x,
            max_y: self.max_y + offset.y,
        }
    }

    /// Grows the bounds outward by the given insets.
    pub fn add_padding(&self, insets: Insets) -> Self {
        Self {
            min_x: self.min_x - insets.left,
            min_y: self.min_y - insets.top,
            max_x: self.max_x + insets.right,
            max_y: self.max_y + insets.bottom,
        }
    }
}

/// Padding around a rectangle with per-side values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Insets {
    top: f32,
    right: f32,
    bottom: f32,
    left: f32,
}

impl Insets {
    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Creates uniform insets with the same value for all sides
    pub fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn horizontal_sum(self) -> f32 {
        self.left + self.right
    }

    pub fn vertical_sum(self) -> f32 {
        self.top + self.bottom
    }
}

/// Finds where a ray cast from the center of `rect` towards `ray_target`
/// leaves the rectangle.
///
/// The exit side is chosen by comparing the ray direction against the two
/// rectangle diagonals: when the direction lies between them on the
/// left/right sides the ray exits through a vertical edge, otherwise through
/// a horizontal edge. A target inside the rectangle, or a degenerate
/// rectangle, yields the center itself.
///
/// # Examples
///
/// ```
/// # use ontoscope_core::geometry::{intersect_ray_from_rectangle_center, Bounds, Point, Size};
/// let rect = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 50.0));
///
/// let exit = intersect_ray_from_rectangle_center(rect, Point::new(300.0, 25.0));
/// assert_eq!(exit, Point::new(100.0, 25.0));
/// ```
pub fn intersect_ray_from_rectangle_center(rect: Bounds, ray_target: Point) -> Point {
    let center = rect.center();
    if rect.is_empty() || rect.contains_point(ray_target) {
        return center;
    }

    let half_width = rect.width() / 2.0;
    let half_height = rect.height() / 2.0;
    let direction = ray_target.sub_point(center).normalize();
    if direction.is_zero() {
        return center;
    }

    // Mirror into the right half-plane so only two diagonals need testing.
    let right_direction = Point::new(direction.x.abs(), direction.y);
    let exits_through_side = Point::new(half_width, -half_height).cross(right_direction) > 0.0
        && Point::new(half_width, half_height).cross(right_direction) < 0.0;

    if exits_through_side {
        Point::new(
            center.x + half_width * direction.x.signum(),
            center.y + half_width * direction.y / direction.x.abs(),
        )
    } else {
        Point::new(
            center.x + half_height * direction.x / direction.y.abs(),
            center.y + half_height * direction.y.signum(),
        )
    }
}

/// Computes the rendered path of a link between two rectangular shapes.
///
/// The first and last points are attachment points on the source and target
/// rectangle boundaries, aimed at the nearest waypoint (or at the opposite
/// shape's center when there are no waypoints). The waypoints are kept as-is
/// in between.
///
/// # Arguments
///
/// * `source` - Bounds of the shape the link starts at
/// * `target` - Bounds of the shape the link ends at
/// * `vertices` - User-placed waypoints, in path order
///
/// # Examples
///
/// ```
/// use ontoscope_core::geometry::{Bounds, Point, Size, compute_polyline};
///
/// let source = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 40.0));
/// let target = Bounds::new_from_top_left(Point::new(300.0, 0.0), Size::new(100.0, 40.0));
///
/// let polyline = compute_polyline(source, target, &[]);
/// assert_eq!(polyline, vec![Point::new(100.0, 20.0), Point::new(300.0, 20.0)]);
/// ```
pub fn compute_polyline(source: Bounds, target: Bounds, vertices: &[Point]) -> Vec<Point> {
    let start_target = vertices.first().copied().unwrap_or_else(|| target.center());
    let end_target = vertices.last().copied().unwrap_or_else(|| source.center());

    let mut polyline = Vec::with_capacity(vertices.len() + 2);
    polyline.push(intersect_ray_from_rectangle_center(source, start_target));
    polyline.extend_from_slice(vertices);
    polyline.push(intersect_ray_from_rectangle_center(target, end_target));
    polyline
}

/// Total length of all segments of a polyline.
pub fn polyline_length(polyline: &[Point]) -> f32 {
    polyline
        .windows(2)
        .map(|segment| segment[0].distance(segment[1]))
        .sum()
}

/// Returns the point located `offset` units along the polyline from its start.
///
/// Offsets before the start clamp to the first point and offsets past the end
/// clamp to the last point.
///
/// # Examples
///
/// ```
/// use ontoscope_core::geometry::{Point, point_along_polyline};
///
/// let polyline = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
/// assert_eq!(point_along_polyline(&polyline, 15.0), Ok(Point::new(10.0, 5.0)));
/// assert_eq!(point_along_polyline(&polyline, 99.0), Ok(Point::new(10.0, 10.0)));
/// ```
///
/// # Errors
///
/// Returns [`GeometryError::EmptyPolyline`] when `polyline` has no points.
pub fn point_along_polyline(polyline: &[Point], offset: f32) -> Result<Point, GeometryError> {
    let Some(&first) = polyline.first() else {
        return Err(GeometryError::EmptyPolyline);
    };
    if offset <= 0.0 {
        return Ok(first);
    }

    let mut remaining = offset;
    for segment in polyline.windows(2) {
        let (start, end) = (segment[0], segment[1]);
        let segment_length = start.distance(end);
        if remaining <= segment_length && segment_length > 0.0 {
            return Ok(start.lerp(end, remaining / segment_length));
        }
        remaining -= segment_length;
    }

    Ok(polyline[polyline.len() - 1])
}

/// Finds the polyline segment closest to `location`.
///
/// Only segments onto which `location` projects orthogonally are considered;
/// among those the one with the smallest perpendicular distance wins. Returns
/// `0` when no segment qualifies. Segment `i` spans `polyline[i]` to
/// `polyline[i + 1]`.
///
/// # Arguments
///
/// * `polyline` - Link path, endpoints included
/// * `location` - Point in the same coordinate space, usually a pointer
///   position on the paper
pub fn find_nearest_segment_index(polyline: &[Point], location: Point) -> usize {
    let mut min_distance = f32::INFINITY;
    let mut found_index = 0;

    for (index, segment) in polyline.windows(2).enumerate() {
        let pivot = segment[0];
        let target = location.sub_point(pivot);
        let direction = segment[1].sub_point(pivot);
        let segment_length = direction.length();
        if segment_length == 0.0 {
            continue;
        }

        let projection = target.dot(direction) / segment_length;
        if !(0.0..=segment_length).contains(&projection) {
            continue;
        }

        let distance = target.cross(direction).abs() / segment_length;
        if distance < min_distance {
            min_distance = distance;
            found_index = index;
        }
    }

    found_index
}

/// Smallest bounds containing every point, or `None` for an empty input.
pub fn bounding_box(points: impl IntoIterator<Item = Point>) -> Option<Bounds> {
    points.into_iter().fold(None, |acc: Option<Bounds>, point| {
        let single = Bounds::new_from_top_left(point, Size::default());
        Some(match acc {
            Some(bounds) => bounds.merge(&single),
            None => single,
        })
    })
}

/// Bounding box of diagram content: element rectangles plus link waypoints.
///
/// Empty content yields a zero-sized box at the origin.
pub fn content_fitting_box(
    elements: impl IntoIterator<Item = Bounds>,
    vertices: impl IntoIterator<Item = Point>,
) -> Bounds {
    let element_box = elements
        .into_iter()
        .reduce(|acc, bounds| acc.merge(&bounds));
    let vertex_box = bounding_box(vertices);

    match (element_box, vertex_box) {
        (Some(elements), Some(vertices)) => elements.merge(&vertices),
        (Some(bounds), None) | (None, Some(bounds)) => bounds,
        (None, None) => Bounds::default(),
    }
}

/// Largest size with the aspect ratio of `source` that fits into `target`.
///
/// A `source` or `target` without area has no usable ratio; `target` is
/// returned as is.
///
/// # Examples
///
/// ```
/// use ontoscope_core::geometry::{Size, fit_rect_keeping_aspect_ratio};
///
/// let fitted = fit_rect_keeping_aspect_ratio(Size::new(40.0, 20.0), Size::new(100.0, 100.0));
/// assert_eq!(fitted, Size::new(100.0, 50.0));
/// ```
pub fn fit_rect_keeping_aspect_ratio(source: Size, target: Size) -> Size {
    let has_area = |size: Size| size.width > 0.0 && size.height > 0.0;
    if !has_area(source) || !has_area(target) {
        return target;
    }
    let source_ratio = source.width / source.height;
    let target_ratio = target.width / target.height;
    if source_ratio > target_ratio {
        Size::new(target.width, target.width / source_ratio)
    } else {
        Size::new(target.height * source_ratio, target.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f32, y: f32, width: f32, height: f32) -> Bounds {
        Bounds::new_from_top_left(Point::new(x, y), Size::new(width, height))
    }

    #[test]
    fn test_point_vector_ops() {
        let a = Point::new(2.0, 3.0);
        let b = Point::new(4.0, -1.0);

        assert_eq!(a.add_point(b), Point::new(6.0, 2.0));
        assert_eq!(a.sub_point(b), Point::new(-2.0, 4.0));
        assert_eq!(a.dot(b), 5.0);
        assert_eq!(a.cross(b), -14.0);
        assert_eq!(a.scale(2.0), Point::new(4.0, 6.0));
    }

    #[test]
    fn test_point_normalize_zero_vector() {
        assert_eq!(Point::default().normalize(), Point::default());
        assert_eq!(Point::new(0.0, -5.0).normalize(), Point::new(0.0, -1.0));
    }

    #[test]
    fn test_point_lerp() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 20.0);
        assert_eq!(a.lerp(b, 0.25), Point::new(2.5, 5.0));
    }

    #[test]
    fn test_bounds_from_center() {
        let bounds = Bounds::new_from_center(Point::new(50.0, 60.0), Size::new(20.0, 30.0));
        assert_eq!(bounds.min_x(), 40.0);
        assert_eq!(bounds.min_y(), 45.0);
        assert_eq!(bounds.max_x(), 60.0);
        assert_eq!(bounds.max_y(), 75.0);
    }

    #[test]
    fn test_bounds_contains_point_is_strict() {
        let bounds = rect(0.0, 0.0, 10.0, 10.0);
        assert!(bounds.contains_point(Point::new(5.0, 5.0)));
        assert!(!bounds.contains_point(Point::new(0.0, 5.0)));
        assert!(!bounds.contains_point(Point::new(10.0, 10.0)));
    }

    #[test]
    fn test_bounds_add_padding() {
        let padded = rect(10.0, 10.0, 20.0, 20.0).add_padding(Insets::uniform(5.0));
        assert_eq!(padded, rect(5.0, 5.0, 30.0, 30.0));
        assert_eq!(Insets::new(1.0, 2.0, 3.0, 4.0).horizontal_sum(), 6.0);
        assert_eq!(Insets::new(1.0, 2.0, 3.0, 4.0).vertical_sum(), 4.0);
    }

    #[test]
    fn test_intersect_ray_horizontal_exit() {
        let bounds = rect(0.0, 0.0, 100.0, 50.0);
        assert_eq!(
            intersect_ray_from_rectangle_center(bounds, Point::new(-100.0, 25.0)),
            Point::new(0.0, 25.0)
        );
    }

    #[test]
    fn test_intersect_ray_vertical_exit() {
        let bounds = rect(0.0, 0.0, 100.0, 50.0);
        assert_eq!(
            intersect_ray_from_rectangle_center(bounds, Point::new(50.0, 500.0)),
            Point::new(50.0, 50.0)
        );
        assert_eq!(
            intersect_ray_from_rectangle_center(bounds, Point::new(50.0, -500.0)),
            Point::new(50.0, 0.0)
        );
    }

    #[test]
    fn test_intersect_ray_target_inside_returns_center() {
        let bounds = rect(0.0, 0.0, 100.0, 50.0);
        assert_eq!(
            intersect_ray_from_rectangle_center(bounds, Point::new(10.0, 10.0)),
            bounds.center()
        );
    }

    #[test]
    fn test_intersect_ray_degenerate_rect() {
        let bounds = rect(10.0, 10.0, 0.0, 0.0);
        assert_eq!(
            intersect_ray_from_rectangle_center(bounds, Point::new(100.0, 100.0)),
            Point::new(10.0, 10.0)
        );
    }

    #[test]
    fn test_compute_polyline_without_vertices() {
        let source = rect(0.0, 0.0, 100.0, 50.0);
        let target = rect(300.0, 0.0, 100.0, 50.0);

        let polyline = compute_polyline(source, target, &[]);
        assert_eq!(polyline, vec![Point::new(100.0, 25.0), Point::new(300.0, 25.0)]);
    }

    #[test]
    fn test_compute_polyline_aims_at_vertices() {
        let source = rect(0.0, 0.0, 100.0, 50.0);
        let target = rect(300.0, 0.0, 100.0, 50.0);
        let vertex = Point::new(50.0, 200.0);

        let polyline = compute_polyline(source, target, &[vertex]);
        assert_eq!(polyline.len(), 3);
        assert_eq!(polyline[0], Point::new(50.0, 50.0));
        assert_eq!(polyline[1], vertex);
    }

    #[test]
    fn test_polyline_length() {
        let polyline = [
            Point::new(0.0, 0.0),
            Point::new(3.0, 4.0),
            Point::new(3.0, 10.0),
        ];
        assert_eq!(polyline_length(&polyline), 11.0);
        assert_eq!(polyline_length(&[]), 0.0);
    }

    #[test]
    fn test_point_along_polyline() {
        let polyline = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ];
        assert_eq!(point_along_polyline(&polyline, 5.0), Ok(Point::new(5.0, 0.0)));
        assert_eq!(point_along_polyline(&polyline, 15.0), Ok(Point::new(10.0, 5.0)));
        assert_eq!(point_along_polyline(&polyline, 99.0), Ok(Point::new(10.0, 10.0)));
        assert_eq!(point_along_polyline(&polyline, -1.0), Ok(Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_point_along_empty_polyline_fails() {
        assert_eq!(
            point_along_polyline(&[], 1.0),
            Err(GeometryError::EmptyPolyline)
        );
    }

    #[test]
    fn test_find_nearest_segment_index() {
        let polyline = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
        ];
        assert_eq!(find_nearest_segment_index(&polyline, Point::new(50.0, 5.0)), 0);
        assert_eq!(find_nearest_segment_index(&polyline, Point::new(95.0, 60.0)), 1);
    }

    #[test]
    fn test_find_nearest_segment_ignores_projections_outside() {
        // The point projects past the end of segment 0 but onto segment 1.
        let polyline = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 100.0),
        ];
        assert_eq!(find_nearest_segment_index(&polyline, Point::new(30.0, 50.0)), 1);
    }

    #[test]
    fn test_bounding_box() {
        assert_eq!(bounding_box(Vec::<Point>::new()), None);

        let bounds = bounding_box([Point::new(5.0, -1.0), Point::new(-2.0, 7.0)]);
        assert_eq!(bounds, Some(rect(-2.0, -1.0, 7.0, 8.0)));
    }

    #[test]
    fn test_content_fitting_box() {
        assert_eq!(content_fitting_box([], []), Bounds::default());

        let fitted = content_fitting_box(
            [rect(0.0, 0.0, 10.0, 10.0), rect(20.0, 20.0, 10.0, 10.0)],
            [Point::new(-5.0, 50.0)],
        );
        assert_eq!(fitted, rect(-5.0, 0.0, 35.0, 50.0));
    }

    #[test]
    fn test_fit_rect_keeping_aspect_ratio() {
        let wide = fit_rect_keeping_aspect_ratio(Size::new(200.0, 100.0), Size::new(100.0, 100.0));
        assert_eq!(wide, Size::new(100.0, 50.0));

        let tall = fit_rect_keeping_aspect_ratio(Size::new(100.0, 200.0), Size::new(100.0, 100.0));
        assert_eq!(tall, Size::new(50.0, 100.0));
    }

    #[test]
    fn test_fit_rect_without_area() {
        let target = Size::new(100.0, 80.0);

        assert_eq!(fit_rect_keeping_aspect_ratio(Size::new(0.0, 0.0), target), target);
        assert_eq!(fit_rect_keeping_aspect_ratio(Size::new(50.0, 0.0), target), target);
        assert_eq!(fit_rect_keeping_aspect_ratio(Size::new(0.0, 50.0), target), target);

        let fitted = fit_rect_keeping_aspect_ratio(Size::new(10.0, 10.0), Size::new(0.0, 80.0));
        assert!(fitted.width.is_finite() && fitted.height.is_finite());
    }
}
