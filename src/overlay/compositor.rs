use super::clip::{Circle, ClippedCanvas, Polygon};
use super::geometry::{IrisGeometry, Point};
use super::selection::TextureSelection;
use crate::catalog::TextureCatalog;
use crate::landmarks::{Eye, LandmarkFrame};
use image::{RgbImage, RgbaImage};
use std::sync::Arc;

/// Paint radii below this are treated as a collapsed iris and skipped.
pub const MIN_PAINT_RADIUS: f32 = 0.5;

/// What a compositing pass did beyond copying the raw frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayOutcome {
    /// No face in this frame; the raw frame passed through
    NoFace,
    /// The selected texture is not loaded
    TextureUnavailable,
    /// A face was found but neither eye had usable geometry
    NoUsableEye,
    /// The texture was painted over `eyes` eyes
    Drawn { eyes: u8 },
}

impl OverlayOutcome {
    pub fn is_drawn(self) -> bool {
        matches!(self, OverlayOutcome::Drawn { .. })
    }
}

/// Paints the selected iris texture over both eyes of a landmark frame.
///
/// Holds only the immutable texture catalog; every other input is passed per
/// call, so the output depends on nothing but the call's arguments.
#[derive(Clone)]
pub struct OverlayCompositor {
    catalog: Arc<TextureCatalog>,
}

impl OverlayCompositor {
    pub fn new(catalog: Arc<TextureCatalog>) -> Self {
        Self { catalog }
    }

    /// Copy the frame's raw image into `dest` and overlay the selected texture.
    ///
    /// `dest` is resized to the raw image when their dimensions differ.
    pub fn composite(
        &self,
        frame: &LandmarkFrame,
        selection: &TextureSelection,
        dest: &mut RgbImage,
    ) -> OverlayOutcome {
        let _span = tracing::debug_span!("composite").entered();

        let raw = frame.image();
        if dest.dimensions() == raw.dimensions() {
            dest.copy_from_slice(raw.as_raw());
        } else {
            *dest = raw.clone();
        }

        if !frame.has_face() {
            return OverlayOutcome::NoFace;
        }

        let Some(texture) = self.catalog.texture(&selection.texture_id) else {
            tracing::trace!("Texture {} not loaded", selection.texture_id);
            return OverlayOutcome::TextureUnavailable;
        };

        let opacity = selection.intensity.opacity();
        let mut eyes = 0;
        for eye in Eye::BOTH {
            if paint_eye(dest, frame, eye, texture, opacity) {
                eyes += 1;
            }
        }

        if eyes == 0 {
            OverlayOutcome::NoUsableEye
        } else {
            OverlayOutcome::Drawn { eyes }
        }
    }
}

/// Paint one eye. Returns false when the eye was skipped.
fn paint_eye(
    dest: &mut RgbImage,
    frame: &LandmarkFrame,
    eye: Eye,
    texture: &RgbaImage,
    opacity: f32,
) -> bool {
    let _span = tracing::debug_span!("eye", ?eye).entered();
    let (width, height) = dest.dimensions();

    let Some(iris) = frame
        .iris_ring(eye)
        .and_then(|ring| IrisGeometry::from_ring(ring, width, height))
    else {
        return false;
    };

    let paint_radius = iris.paint_radius();
    // Also rejects NaN from malformed landmarks
    if !(paint_radius >= MIN_PAINT_RADIUS) {
        return false;
    }

    let Some(outline) = frame.eyelid_outline(eye) else {
        return false;
    };
    let lid = Polygon::new(
        outline
            .iter()
            .map(|l| Point::from_landmark(l, width, height))
            .collect(),
    );

    let mut canvas = ClippedCanvas::new(dest)
        .clip_polygon(lid)
        .clip_circle(Circle::new(iris.center, paint_radius));
    let painted = canvas.draw_image(texture, iris.paint_rect(), opacity);
    tracing::trace!(
        "{:?} eye: center=({:.1}, {:.1}) radius={:.1} painted={}",
        eye,
        iris.center.x,
        iris.center.y,
        paint_radius,
        painted
    );

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TextureRecord;
    use crate::landmarks::{Landmark, FACE_MESH_LANDMARKS};
    use crate::overlay::selection::BlendIntensity;
    use image::{Rgb, Rgba};

    const W: u32 = 100;
    const H: u32 = 100;

    fn catalog() -> Arc<TextureCatalog> {
        let mut catalog = TextureCatalog::default();
        catalog.insert(
            TextureRecord::new("blue", "Blue", "blue.png"),
            RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 255])),
        );
        Arc::new(catalog)
    }

    /// Face with the left eye at (0.3, 0.5) and the right eye at (0.7, 0.5),
    /// each with a 5px ring and a wide-open 16-point lid.
    fn face() -> Vec<Landmark> {
        let mut points = vec![Landmark::new(0.5, 0.5); FACE_MESH_LANDMARKS];
        for (eye, cx) in [(Eye::Left, 0.3_f32), (Eye::Right, 0.7_f32)] {
            for (k, idx) in eye.iris_range().enumerate() {
                let angle = k as f32 * std::f32::consts::TAU / 5.0;
                points[idx] = Landmark::new(cx + 0.05 * angle.cos(), 0.5 + 0.05 * angle.sin());
            }
            for (k, &idx) in eye.boundary().iter().enumerate() {
                let angle = k as f32 * std::f32::consts::TAU / 16.0;
                points[idx] = Landmark::new(cx + 0.15 * angle.cos(), 0.5 + 0.1 * angle.sin());
            }
        }
        points
    }

    fn raw() -> Arc<RgbImage> {
        Arc::new(RgbImage::from_pixel(W, H, Rgb([200, 150, 100])))
    }

    fn selection(id: &str) -> TextureSelection {
        TextureSelection::new(id, BlendIntensity::Strong)
    }

    #[test]
    fn test_no_face_passes_raw_frame_through() {
        let compositor = OverlayCompositor::new(catalog());
        let frame = LandmarkFrame::without_face(raw());
        let mut dest = RgbImage::new(1, 1);
        let outcome = compositor.composite(&frame, &selection("blue"), &mut dest);
        assert_eq!(outcome, OverlayOutcome::NoFace);
        assert!(!outcome.is_drawn());
        assert_eq!(dest, *frame.image());
    }

    #[test]
    fn test_missing_texture_reports_no_overlay() {
        let compositor = OverlayCompositor::new(catalog());
        let frame = LandmarkFrame::new(raw(), face());
        let mut dest = RgbImage::new(W, H);
        let outcome = compositor.composite(&frame, &selection("green"), &mut dest);
        assert_eq!(outcome, OverlayOutcome::TextureUnavailable);
        assert_eq!(dest, *frame.image());
    }

    #[test]
    fn test_both_eyes_are_painted() {
        let compositor = OverlayCompositor::new(catalog());
        let frame = LandmarkFrame::new(raw(), face());
        let mut dest = RgbImage::new(W, H);
        let outcome = compositor.composite(&frame, &selection("blue"), &mut dest);
        assert_eq!(outcome, OverlayOutcome::Drawn { eyes: 2 });

        for cx in [30, 70] {
            let center = dest.get_pixel(cx, 50);
            assert!(center[2] > 150, "iris at x={cx} not tinted: {center:?}");
        }
        // Between the eyes is untouched
        assert_eq!(*dest.get_pixel(50, 50), Rgb([200, 150, 100]));
    }

    #[test]
    fn test_paint_stays_inside_paint_radius() {
        let compositor = OverlayCompositor::new(catalog());
        let frame = LandmarkFrame::new(raw(), face());
        let mut dest = RgbImage::new(W, H);
        compositor.composite(&frame, &selection("blue"), &mut dest);

        // 5px ring → paint radius 7.25px; 9px right of the left iris center
        // is inside the lid but outside the circle
        assert_eq!(*dest.get_pixel(39, 50), Rgb([200, 150, 100]));
    }

    #[test]
    fn test_closed_lid_clips_everything() {
        let compositor = OverlayCompositor::new(catalog());
        let mut points = face();
        for eye in Eye::BOTH {
            for &idx in eye.boundary() {
                points[idx].y = 0.5;
            }
        }
        let frame = LandmarkFrame::new(raw(), points);
        let mut dest = RgbImage::new(W, H);
        compositor.composite(&frame, &selection("blue"), &mut dest);
        assert_eq!(dest, *frame.image());
    }

    #[test]
    fn test_collapsed_iris_is_skipped() {
        let compositor = OverlayCompositor::new(catalog());
        let mut points = face();
        for eye in Eye::BOTH {
            for idx in eye.iris_range() {
                points[idx] = Landmark::new(0.3, 0.5);
            }
        }
        let frame = LandmarkFrame::new(raw(), points);
        let mut dest = RgbImage::new(W, H);
        let outcome = compositor.composite(&frame, &selection("blue"), &mut dest);
        assert_eq!(outcome, OverlayOutcome::NoUsableEye);
        assert_eq!(dest, *frame.image());
    }

    #[test]
    fn test_short_landmark_list_skips_missing_eye() {
        let compositor = OverlayCompositor::new(catalog());
        let mut points = face();
        points.truncate(475);
        let frame = LandmarkFrame::new(raw(), points);
        let mut dest = RgbImage::new(W, H);
        let outcome = compositor.composite(&frame, &selection("blue"), &mut dest);
        assert_eq!(outcome, OverlayOutcome::Drawn { eyes: 1 });
    }

    #[test]
    fn test_frame_is_not_mutated() {
        let compositor = OverlayCompositor::new(catalog());
        let frame = LandmarkFrame::new(raw(), face());
        let before = frame.clone();
        let mut dest = RgbImage::new(W, H);
        compositor.composite(&frame, &selection("blue"), &mut dest);
        assert_eq!(frame.image(), before.image());
        assert_eq!(frame.landmarks(), before.landmarks());
    }
}
