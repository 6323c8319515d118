//! Overlay placement on a realistic 640x480 frame.

use crate::catalog::{TextureCatalog, TextureRecord};
use crate::landmarks::{Eye, Landmark, LandmarkFrame, FACE_MESH_LANDMARKS};
use crate::overlay::{
    BlendIntensity, IrisGeometry, OverlayCompositor, OverlayOutcome, TextureSelection, PAINT_SCALE,
};
use approx::assert_relative_eq;
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use std::f32::consts::TAU;
use std::sync::Arc;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;
const ASPECT: f32 = HEIGHT as f32 / WIDTH as f32;

/// Normalized iris radius; 9.6px on a 480px tall frame
const IRIS_R: f32 = 0.02;

const GRAY: Rgb<u8> = Rgb([100, 100, 100]);

fn catalog() -> Arc<TextureCatalog> {
    let mut catalog = TextureCatalog::default();
    catalog.insert(
        TextureRecord::new("ruby", "Ruby", "ruby.png"),
        RgbaImage::from_pixel(16, 16, Rgba([255, 0, 0, 255])),
    );
    Arc::new(catalog)
}

/// A face whose irises are circles of `IRIS_R` in pixel space. Horizontal
/// offsets are scaled by the frame aspect so the ring stays round.
fn face(lid_half_height: f32) -> Vec<Landmark> {
    let mut points = vec![Landmark::new(0.5, 0.5); FACE_MESH_LANDMARKS];
    for (eye, cx) in [(Eye::Left, 0.30_f32), (Eye::Right, 0.70_f32)] {
        for (k, idx) in eye.iris_range().enumerate() {
            let a = k as f32 * TAU / 5.0;
            points[idx] = Landmark::new(cx + IRIS_R * ASPECT * a.cos(), 0.5 + IRIS_R * a.sin());
        }
        for (k, &idx) in eye.boundary().iter().enumerate() {
            let a = k as f32 * TAU / 16.0;
            points[idx] = Landmark::new(cx + 0.1 * a.cos(), 0.5 + lid_half_height * a.sin());
        }
    }
    points
}

fn frame(lid_half_height: f32) -> LandmarkFrame {
    let raw = Arc::new(RgbImage::from_pixel(WIDTH, HEIGHT, GRAY));
    LandmarkFrame::new(raw, face(lid_half_height))
}

fn composite(frame: &LandmarkFrame, intensity: BlendIntensity) -> (OverlayOutcome, RgbImage) {
    let compositor = OverlayCompositor::new(catalog());
    let mut dest = RgbImage::new(0, 0);
    let outcome = compositor.composite(frame, &TextureSelection::new("ruby", intensity), &mut dest);
    (outcome, dest)
}

fn is_painted(pixel: &Rgb<u8>) -> bool {
    pixel[0] > 150 && pixel[2] < 80
}

#[test]
fn test_left_iris_measures_from_pentagon() {
    let frame = frame(0.1);
    let ring = frame.iris_ring(Eye::Left).unwrap();
    let iris = IrisGeometry::from_ring(ring, WIDTH, HEIGHT).unwrap();

    assert_relative_eq!(iris.center.x, 192.0, epsilon = 1e-3);
    assert_relative_eq!(iris.center.y, 240.0, epsilon = 1e-3);
    assert_relative_eq!(iris.radius, IRIS_R * HEIGHT as f32, epsilon = 1e-3);
    assert_relative_eq!(
        iris.paint_radius(),
        PAINT_SCALE * IRIS_R * HEIGHT as f32,
        epsilon = 1e-3
    );
}

#[test]
fn test_texture_covers_scaled_iris_circle() {
    // Paint radius 1.45 * 9.6 = 13.92px around (192, 240)
    let (outcome, out) = composite(&frame(0.1), BlendIntensity::Strong);
    assert_eq!(outcome, OverlayOutcome::Drawn { eyes: 2 });

    assert!(is_painted(out.get_pixel(192, 240)));
    assert!(is_painted(out.get_pixel(205, 240)));
    assert!(is_painted(out.get_pixel(192, 228)));
    assert_eq!(*out.get_pixel(207, 240), GRAY);
    assert_eq!(*out.get_pixel(176, 240), GRAY);

    // Right eye at (448, 240)
    assert!(is_painted(out.get_pixel(448, 240)));
    assert_eq!(*out.get_pixel(320, 240), GRAY);
}

#[test]
fn test_eyelid_hides_covered_iris() {
    // Lid half height 0.015 * 480 = 7.2px, well inside the paint circle
    let (outcome, out) = composite(&frame(0.015), BlendIntensity::Strong);
    assert!(outcome.is_drawn());

    assert!(is_painted(out.get_pixel(192, 244)));
    assert_eq!(*out.get_pixel(192, 250), GRAY);
    assert_eq!(*out.get_pixel(192, 230), GRAY);
}

#[test]
fn test_intensity_sets_blend_strength() {
    let (_, light) = composite(&frame(0.1), BlendIntensity::Light);
    let (_, strong) = composite(&frame(0.1), BlendIntensity::Strong);

    // 0.2 * 255 + 0.8 * 100 = 131, 0.7 * 255 + 0.3 * 100 = 208.5
    let light_red = i32::from(light.get_pixel(192, 240)[0]);
    let strong_red = i32::from(strong.get_pixel(192, 240)[0]);
    assert!((light_red - 131).abs() <= 2, "light red {light_red}");
    assert!((strong_red - 208).abs() <= 2, "strong red {strong_red}");
}

#[test]
fn test_same_inputs_give_identical_output() {
    let frame = frame(0.1);
    let (_, first) = composite(&frame, BlendIntensity::Medium);
    let (_, second) = composite(&frame, BlendIntensity::Medium);
    assert_eq!(first, second);
}

#[test]
fn test_no_face_leaves_frame_untouched() {
    let raw = Arc::new(RgbImage::from_pixel(WIDTH, HEIGHT, GRAY));
    let (outcome, out) = composite(&LandmarkFrame::without_face(Arc::clone(&raw)), BlendIntensity::Strong);
    assert_eq!(outcome, OverlayOutcome::NoFace);
    assert_eq!(out, *raw);
}
