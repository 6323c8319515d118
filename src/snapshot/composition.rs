use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, ImageResult, RgbImage, RgbaImage};
use std::io::Cursor;

/// Upscale factor of the still relative to the camera frame
pub const CAPTURE_SCALE: u32 = 2;

/// Logo width on the still; height follows the logo's aspect ratio
pub const LOGO_WIDTH: u32 = 300;

/// Gap between the top edge of the still and the logo
pub const LOGO_TOP_MARGIN: u32 = 20;

/// Build the capture still: the camera frame mirrored (selfie orientation),
/// upscaled by [`CAPTURE_SCALE`], with the logo centered along the top.
pub fn compose_still(frame: &RgbImage, logo: &RgbaImage) -> RgbaImage {
    let _span = tracing::debug_span!("compose_still").entered();

    let (width, height) = frame.dimensions();
    let mirrored = imageops::flip_horizontal(frame);
    let scaled = imageops::resize(
        &mirrored,
        width * CAPTURE_SCALE,
        height * CAPTURE_SCALE,
        FilterType::Triangle,
    );
    let mut still = DynamicImage::ImageRgb8(scaled).into_rgba8();

    if let Some(logo_height) = logo_height(logo) {
        let logo = imageops::resize(logo, LOGO_WIDTH, logo_height, FilterType::Triangle);
        let x = i64::from(still.width()) / 2 - i64::from(LOGO_WIDTH) / 2;
        imageops::overlay(&mut still, &logo, x, i64::from(LOGO_TOP_MARGIN));
    }

    still
}

/// Rendered logo height, or `None` for an empty logo image
fn logo_height(logo: &RgbaImage) -> Option<u32> {
    let (w, h) = logo.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let scaled = (f64::from(h) / f64::from(w) * f64::from(LOGO_WIDTH)).round();
    Some((scaled as u32).max(1))
}

pub fn encode_png(image: &RgbaImage) -> ImageResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
