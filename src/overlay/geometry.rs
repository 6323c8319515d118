//! Iris placement from a landmark ring.

use crate::landmarks::Landmark;

/// Enlargement applied to the measured iris radius so the texture covers the
/// visible iris plus a margin.
pub const PAINT_SCALE: f32 = 1.45;

/// Points in one iris ring
pub const IRIS_RING_POINTS: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn from_landmark(landmark: &Landmark, width: u32, height: u32) -> Self {
        let (x, y) = landmark.to_pixels(width, height);
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    pub fn intersect(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Rect::new(x, y, (right - x).max(0.0), (bottom - y).max(0.0))
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Pixel-space center and radius of one iris.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IrisGeometry {
    pub center: Point,
    pub radius: f32,
}

impl IrisGeometry {
    /// Measure an iris from its ring of normalized landmarks.
    ///
    /// The center is the mean of the ring scaled to `width` x `height`, the
    /// radius the mean pixel distance from each ring point to that center.
    /// Returns `None` for rings shorter than [`IRIS_RING_POINTS`].
    pub fn from_ring(ring: &[Landmark], width: u32, height: u32) -> Option<Self> {
        if ring.len() < IRIS_RING_POINTS {
            return None;
        }

        let count = ring.len() as f32;
        let (sum_x, sum_y) = ring
            .iter()
            .fold((0.0_f32, 0.0_f32), |(sx, sy), p| (sx + p.x, sy + p.y));
        let center = Point::new(sum_x / count * width as f32, sum_y / count * height as f32);

        let radius = ring
            .iter()
            .map(|p| Point::from_landmark(p, width, height).distance(center))
            .sum::<f32>()
            / count;

        Some(Self { center, radius })
    }

    pub fn paint_radius(&self) -> f32 {
        self.radius * PAINT_SCALE
    }

    pub fn paint_diameter(&self) -> f32 {
        self.paint_radius() * 2.0
    }

    /// Square the texture is stretched over, centered on the iris
    pub fn paint_rect(&self) -> Rect {
        let r = self.paint_radius();
        let d = self.paint_diameter();
        Rect::new(self.center.x - r, self.center.y - r, d, d)
    }
}
