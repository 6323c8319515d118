//! Clip regions and a clip-scoped drawing surface.
//!
//! A [`ClippedCanvas`] borrows the destination buffer for as long as its clip
//! is in effect. The clip lives in the canvas value, never in the buffer, so
//! dropping the canvas (on any exit path) restores unclipped access.

use super::geometry::{Point, Rect};
use image::{RgbImage, RgbaImage};

/// Closed polygon filled with the nonzero winding rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn contains(&self, p: Point) -> bool {
        if self.points.len() < 3 {
            return false;
        }

        let mut winding = 0i32;
        let n = self.points.len();
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            let cross = (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y);
            if a.y <= p.y {
                if b.y > p.y && cross > 0.0 {
                    winding += 1;
                }
            } else if b.y <= p.y && cross < 0.0 {
                winding -= 1;
            }
        }
        winding != 0
    }

    pub fn bounds(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::new(0.0, 0.0, 0.0, 0.0);
        };
        let (mut min, mut max) = (*first, *first);
        for p in &self.points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Rect::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Point,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Point, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn contains(&self, p: Point) -> bool {
        let dx = p.x - self.center.x;
        let dy = p.y - self.center.y;
        dx * dx + dy * dy <= self.radius * self.radius
    }

    pub fn bounds(&self) -> Rect {
        let d = self.radius * 2.0;
        Rect::new(self.center.x - self.radius, self.center.y - self.radius, d, d)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ClipShape {
    Polygon(Polygon),
    Circle(Circle),
}

impl ClipShape {
    fn contains(&self, p: Point) -> bool {
        match self {
            ClipShape::Polygon(polygon) => polygon.contains(p),
            ClipShape::Circle(circle) => circle.contains(p),
        }
    }

    fn bounds(&self) -> Rect {
        match self {
            ClipShape::Polygon(polygon) => polygon.bounds(),
            ClipShape::Circle(circle) => circle.bounds(),
        }
    }
}

/// Intersection of every shape clipped so far. Empty means unclipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipRegion {
    shapes: Vec<ClipShape>,
}

impl ClipRegion {
    pub fn contains(&self, p: Point) -> bool {
        self.shapes.iter().all(|shape| shape.contains(p))
    }

    /// Bounding box of the region, limited to `area`
    pub fn bounds_within(&self, area: Rect) -> Rect {
        self.shapes
            .iter()
            .fold(area, |acc, shape| acc.intersect(&shape.bounds()))
    }
}

/// Drawing surface over a borrowed RGB buffer with a compound clip.
pub struct ClippedCanvas<'a> {
    target: &'a mut RgbImage,
    region: ClipRegion,
}

impl<'a> ClippedCanvas<'a> {
    pub fn new(target: &'a mut RgbImage) -> Self {
        Self {
            target,
            region: ClipRegion::default(),
        }
    }

    pub fn clip_polygon(mut self, polygon: Polygon) -> Self {
        self.region.shapes.push(ClipShape::Polygon(polygon));
        self
    }

    pub fn clip_circle(mut self, circle: Circle) -> Self {
        self.region.shapes.push(ClipShape::Circle(circle));
        self
    }

    /// Draw `image` stretched over `dest`, blended with uniform `opacity`.
    ///
    /// Pixels are tested at their centers against the clip and `dest`;
    /// the source is sampled bilinearly with premultiplied alpha.
    /// Returns the number of destination pixels touched.
    pub fn draw_image(&mut self, image: &RgbaImage, dest: Rect, opacity: f32) -> usize {
        let (iw, ih) = image.dimensions();
        let opacity = opacity.clamp(0.0, 1.0);
        if iw == 0 || ih == 0 || dest.is_empty() || opacity == 0.0 {
            return 0;
        }

        let (tw, th) = self.target.dimensions();
        let area = Rect::new(0.0, 0.0, tw as f32, th as f32).intersect(&dest);
        let bounds = self.region.bounds_within(area);
        if bounds.is_empty() {
            return 0;
        }

        let x0 = bounds.x.floor().max(0.0) as u32;
        let y0 = bounds.y.floor().max(0.0) as u32;
        let x1 = (bounds.right().ceil() as u32).min(tw);
        let y1 = (bounds.bottom().ceil() as u32).min(th);

        let scale_x = iw as f32 / dest.width;
        let scale_y = ih as f32 / dest.height;
        let mut touched = 0;

        for py in y0..y1 {
            for px in x0..x1 {
                let p = Point::new(px as f32 + 0.5, py as f32 + 0.5);
                if !dest.contains(p) || !self.region.contains(p) {
                    continue;
                }

                let u = (p.x - dest.x) * scale_x;
                let v = (p.y - dest.y) * scale_y;
                let src = sample_premultiplied(image, u, v);
                let alpha = src[3] / 255.0 * opacity;
                if alpha <= 0.0 {
                    continue;
                }

                let pixel = self.target.get_pixel_mut(px, py);
                for c in 0..3 {
                    let blended = src[c] * opacity + pixel[c] as f32 * (1.0 - alpha);
                    pixel[c] = blended.round().clamp(0.0, 255.0) as u8;
                }
                touched += 1;
            }
        }

        touched
    }
}

/// Bilinear sample at texel-space `(u, v)` with clamp-to-edge.
/// Colour channels come back premultiplied by alpha.
fn sample_premultiplied(image: &RgbaImage, u: f32, v: f32) -> [f32; 4] {
    let (w, h) = image.dimensions();
    let x = (u - 0.5).clamp(0.0, (w - 1) as f32);
    let y = (v - 0.5).clamp(0.0, (h - 1) as f32);
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let premul = |px: u32, py: u32| {
        let p = image.get_pixel(px, py);
        let a = p[3] as f32 / 255.0;
        [p[0] as f32 * a, p[1] as f32 * a, p[2] as f32 * a, p[3] as f32]
    };
    let (p00, p10, p01, p11) = (premul(x0, y0), premul(x1, y0), premul(x0, y1), premul(x1, y1));

    let mut out = [0.0; 4];
    for c in 0..4 {
        let top = p00[c] + (p10[c] - p00[c]) * fx;
        let bottom = p01[c] + (p11[c] - p01[c]) * fx;
        out[c] = top + (bottom - top) * fy;
    }
    out
}
