//! Shape variants, hit testing and color packing.
//!
//! The shape catalog is a closed sum type: the wire grammar, the geometry
//! table and the paint routines all match exhaustively over the same four
//! variants, so adding a fifth is a compile-guided change rather than a
//! runtime surprise.

use serde::{Deserialize, Serialize};

/// A point in integer canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A packed 24-bit RGB color (`0xRRGGBB`).
///
/// The wire protocol transmits colors as a single decimal integer. Peers
/// written against AWT send `Color.getRGB()`, which carries an opaque
/// alpha in the high byte and therefore prints negative (red is
/// `-65536`); [`Color::from_packed`] masks that away so both spellings of
/// the same color compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(u32);

impl Color {
    pub const BLACK: Color = Color(0x000000);
    pub const RED: Color = Color(0xFF0000);
    pub const GREEN: Color = Color(0x00FF00);
    pub const BLUE: Color = Color(0x0000FF);

    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Build from a packed integer, ignoring any alpha byte.
    pub fn from_packed(packed: i32) -> Self {
        Self(packed as u32 & 0x00FF_FFFF)
    }

    pub fn packed(self) -> u32 {
        self.0
    }

    pub fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn b(self) -> u8 {
        self.0 as u8
    }
}

/// A drawable shape with a color.
///
/// `Ellipse` and `Rectangle` are normalized on construction so that
/// `(x1, y1)` is the upper-left and `(x2, y2)` the lower-right corner.
/// `Segment` keeps its endpoints in the order given. `Polyline` is an
/// ordered, connected point sequence; order defines the segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Ellipse {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        color: Color,
    },
    Rectangle {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        color: Color,
    },
    Segment {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        color: Color,
    },
    Polyline {
        points: Vec<Point>,
        color: Color,
    },
}

impl Shape {
    /// An ellipse inscribed in the box spanned by two corners.
    pub fn ellipse(x1: i32, y1: i32, x2: i32, y2: i32, color: Color) -> Self {
        let (x1, y1, x2, y2) = normalize_corners(x1, y1, x2, y2);
        Shape::Ellipse { x1, y1, x2, y2, color }
    }

    /// An axis-aligned rectangle spanned by two corners.
    pub fn rectangle(x1: i32, y1: i32, x2: i32, y2: i32, color: Color) -> Self {
        let (x1, y1, x2, y2) = normalize_corners(x1, y1, x2, y2);
        Shape::Rectangle { x1, y1, x2, y2, color }
    }

    /// A line segment from `(x1, y1)` to `(x2, y2)`.
    pub fn segment(x1: i32, y1: i32, x2: i32, y2: i32, color: Color) -> Self {
        Shape::Segment { x1, y1, x2, y2, color }
    }

    /// A connected polyline. Callers supply at least one point; the point
    /// list is fixed once the shape is handed to a [`crate::Sketch`].
    pub fn polyline(points: Vec<Point>, color: Color) -> Self {
        Shape::Polyline { points, color }
    }

    /// The wire keyword for this variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Ellipse { .. } => "Ellipse",
            Shape::Rectangle { .. } => "Rectangle",
            Shape::Segment { .. } => "Segment",
            Shape::Polyline { .. } => "Polyline",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Shape::Ellipse { color, .. }
            | Shape::Rectangle { color, .. }
            | Shape::Segment { color, .. }
            | Shape::Polyline { color, .. } => *color,
        }
    }

    pub fn set_color(&mut self, new: Color) {
        match self {
            Shape::Ellipse { color, .. }
            | Shape::Rectangle { color, .. }
            | Shape::Segment { color, .. }
            | Shape::Polyline { color, .. } => *color = new,
        }
    }

    /// Shift the whole shape by `(dx, dy)`.
    pub fn translate(&mut self, dx: i32, dy: i32) {
        match self {
            Shape::Ellipse { x1, y1, x2, y2, .. }
            | Shape::Rectangle { x1, y1, x2, y2, .. }
            | Shape::Segment { x1, y1, x2, y2, .. } => {
                *x1 += dx;
                *y1 += dy;
                *x2 += dx;
                *y2 += dy;
            }
            Shape::Polyline { points, .. } => {
                for p in points {
                    p.x += dx;
                    p.y += dy;
                }
            }
        }
    }

    /// Whether `(x, y)` hits this shape.
    ///
    /// Lines count as hit within a 3-pixel tolerance band so they stay
    /// clickable. A degenerate ellipse (zero-width or zero-height box)
    /// contains nothing.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        match *self {
            Shape::Ellipse { x1, y1, x2, y2, .. } => {
                let a = (x2 - x1) as f64 / 2.0;
                let b = (y2 - y1) as f64 / 2.0;
                if a == 0.0 || b == 0.0 {
                    return false;
                }
                let dx = x as f64 - (x1 as f64 + a);
                let dy = y as f64 - (y1 as f64 + b);
                (dx / a).powi(2) + (dy / b).powi(2) <= 1.0
            }
            Shape::Rectangle { x1, y1, x2, y2, .. } => {
                x1 <= x && x <= x2 && y1 <= y && y <= y2
            }
            Shape::Segment { x1, y1, x2, y2, .. } => {
                point_to_segment_distance(x, y, x1, y1, x2, y2) <= 3.0
            }
            Shape::Polyline { ref points, .. } => points.windows(2).any(|pair| {
                point_to_segment_distance(x, y, pair[0].x, pair[0].y, pair[1].x, pair[1].y) <= 3.0
            }),
        }
    }
}

/// Distance from `(x, y)` to the segment `(x1, y1)-(x2, y2)`.
///
/// Projects the point onto the carrying line, clamps the projection
/// parameter to the segment, and measures to the clamped point. A
/// zero-length segment degrades to point distance.
pub fn point_to_segment_distance(x: i32, y: i32, x1: i32, y1: i32, x2: i32, y2: i32) -> f64 {
    let (px, py) = (x as f64, y as f64);
    let (ax, ay) = (x1 as f64, y1 as f64);
    let (bx, by) = (x2 as f64, y2 as f64);

    let len2 = (bx - ax).powi(2) + (by - ay).powi(2);
    if len2 == 0.0 {
        return ((px - ax).powi(2) + (py - ay).powi(2)).sqrt();
    }

    let t = (((px - ax) * (bx - ax) + (py - ay) * (by - ay)) / len2).clamp(0.0, 1.0);
    let (cx, cy) = (ax + t * (bx - ax), ay + t * (by - ay));
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

fn normalize_corners(x1: i32, y1: i32, x2: i32, y2: i32) -> (i32, i32, i32, i32) {
    (x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_packing() {
        let red = Color::from_rgb(255, 0, 0);
        assert_eq!(red.packed(), 0xFF0000);
        assert_eq!(red.packed(), 16_711_680);
        assert_eq!((red.r(), red.g(), red.b()), (255, 0, 0));
    }

    #[test]
    fn test_color_from_packed_strips_alpha() {
        // AWT's Color.getRGB() for opaque red is 0xFFFF0000 == -65536.
        assert_eq!(Color::from_packed(-65536), Color::RED);
        assert_eq!(Color::from_packed(16_711_680), Color::RED);
    }

    #[test]
    fn test_corner_normalization() {
        let e = Shape::ellipse(50, 60, 10, 20, Color::BLUE);
        assert_eq!(
            e,
            Shape::Ellipse { x1: 10, y1: 20, x2: 50, y2: 60, color: Color::BLUE }
        );
        // Segments keep their direction.
        let s = Shape::segment(50, 60, 10, 20, Color::BLUE);
        assert_eq!(
            s,
            Shape::Segment { x1: 50, y1: 60, x2: 10, y2: 20, color: Color::BLUE }
        );
    }

    #[test]
    fn test_translate_all_variants() {
        let mut e = Shape::ellipse(0, 0, 10, 10, Color::BLACK);
        e.translate(5, -3);
        assert_eq!(e, Shape::ellipse(5, -3, 15, 7, Color::BLACK));

        let mut p = Shape::polyline(vec![Point::new(0, 0), Point::new(4, 4)], Color::BLACK);
        p.translate(1, 2);
        assert_eq!(
            p,
            Shape::polyline(vec![Point::new(1, 2), Point::new(5, 6)], Color::BLACK)
        );
    }

    #[test]
    fn test_ellipse_contains() {
        let e = Shape::ellipse(0, 0, 100, 50, Color::BLACK);
        assert!(e.contains(50, 25)); // center
        assert!(!e.contains(2, 2)); // inside the box but outside the ellipse
        assert!(!e.contains(200, 25));
    }

    #[test]
    fn test_degenerate_ellipse_contains_nothing() {
        let e = Shape::ellipse(10, 10, 10, 40, Color::BLACK);
        assert!(!e.contains(10, 20));
    }

    #[test]
    fn test_rectangle_contains_is_inclusive() {
        let r = Shape::rectangle(0, 0, 10, 10, Color::BLACK);
        assert!(r.contains(0, 0));
        assert!(r.contains(10, 10));
        assert!(r.contains(5, 5));
        assert!(!r.contains(11, 5));
    }

    #[test]
    fn test_segment_contains_tolerance() {
        let s = Shape::segment(0, 0, 100, 0, Color::BLACK);
        assert!(s.contains(50, 0));
        assert!(s.contains(50, 3));
        assert!(!s.contains(50, 4));
        // Beyond the endpoints the clamped distance takes over.
        assert!(!s.contains(110, 0));
    }

    #[test]
    fn test_zero_length_segment() {
        let s = Shape::segment(5, 5, 5, 5, Color::BLACK);
        assert!(s.contains(5, 5));
        assert!(s.contains(7, 5));
        assert!(!s.contains(9, 5));
    }

    #[test]
    fn test_polyline_contains_any_segment() {
        let p = Shape::polyline(
            vec![Point::new(0, 0), Point::new(10, 0), Point::new(10, 10)],
            Color::BLACK,
        );
        assert!(p.contains(5, 0));
        assert!(p.contains(10, 5));
        assert!(!p.contains(0, 10));
    }

    #[test]
    fn test_single_point_polyline_contains_nothing() {
        let p = Shape::polyline(vec![Point::new(3, 3)], Color::BLACK);
        assert!(!p.contains(3, 3));
    }

    #[test]
    fn test_recolor() {
        let mut s = Shape::segment(0, 0, 1, 1, Color::BLACK);
        s.set_color(Color::GREEN);
        assert_eq!(s.color(), Color::GREEN);
    }

    #[test]
    fn test_kind_keywords() {
        assert_eq!(Shape::ellipse(0, 0, 1, 1, Color::BLACK).kind(), "Ellipse");
        assert_eq!(Shape::rectangle(0, 0, 1, 1, Color::BLACK).kind(), "Rectangle");
        assert_eq!(Shape::segment(0, 0, 1, 1, Color::BLACK).kind(), "Segment");
        assert_eq!(
            Shape::polyline(vec![Point::new(0, 0)], Color::BLACK).kind(),
            "Polyline"
        );
    }
}
