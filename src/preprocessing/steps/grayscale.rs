use crate::error::ScanError;
use image::{DynamicImage, GrayImage};

/// Convert image to grayscale
/// This is the foundation for the other preprocessing steps
pub fn apply(image: &DynamicImage) -> Result<GrayImage, ScanError> {
    Ok(image.to_luma8())
}
