use crate::error::ScanError;
use image::GrayImage;
use imageproc::filter::filter3x3;

/// Apply edge-enhancing sharpening
///
/// Kernel: center weight 9, all eight neighbors -1. Weights sum to 1, so flat
/// regions are unchanged while edges gain contrast - text strokes come out
/// crisper for the final binarization.
pub fn apply(image: &GrayImage) -> Result<GrayImage, ScanError> {
    let kernel: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 9.0, -1.0, -1.0, -1.0, -1.0];
    Ok(filter3x3(image, &kernel))
}
