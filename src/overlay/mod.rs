pub mod clip;
mod compositor;
pub mod geometry;
mod selection;

#[cfg(test)]
mod scenario_tests;

pub use compositor::{OverlayCompositor, OverlayOutcome, MIN_PAINT_RADIUS};
pub use geometry::{IrisGeometry, Point, Rect, PAINT_SCALE};
pub use selection::{BlendIntensity, SelectionCell, TextureSelection};
