use crate::error::ScanError;
use image::{imageops::FilterType, DynamicImage, GenericImageView};

/// Upscale factor - label text is often small, so double both dimensions
const SCALE: u32 = 2;

/// Upscale the image by 200% using cubic interpolation
pub fn apply(image: &DynamicImage) -> Result<DynamicImage, ScanError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ScanError::Preprocessing(
            "image has zero-sized dimensions".to_string(),
        ));
    }

    Ok(image.resize_exact(width * SCALE, height * SCALE, FilterType::CatmullRom))
}
