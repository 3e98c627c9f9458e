use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::filter::gaussian_blur_f32;

/// Gaussian sigma for the adaptive threshold's local mean (11x11 neighborhood)
const ADAPTIVE_SIGMA: f32 = 2.0;
/// Constant subtracted from the local mean before comparison
const ADAPTIVE_OFFSET: f32 = 2.0;

/// Binarize with Otsu's global threshold
///
/// Picks the single cutoff that best separates foreground from background.
pub fn otsu(image: &GrayImage) -> GrayImage {
    let level = otsu_level(image);
    binarize(image, |pixel, _, _| pixel > level)
}

/// Binarize with a Gaussian-weighted adaptive threshold
///
/// Each pixel is compared against its Gaussian-blurred neighborhood minus a
/// small offset, which tolerates uneven lighting across the label. Produced
/// only as a diagnostic variant.
pub fn adaptive_gaussian(image: &GrayImage) -> GrayImage {
    let local_mean = gaussian_blur_f32(image, ADAPTIVE_SIGMA);
    binarize(image, |pixel, x, y| {
        pixel as f32 > local_mean.get_pixel(x, y).0[0] as f32 - ADAPTIVE_OFFSET
    })
}

fn binarize<F>(image: &GrayImage, is_foreground: F) -> GrayImage
where
    F: Fn(u8, u32, u32) -> bool,
{
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if is_foreground(image.get_pixel(x, y).0[0], x, y) {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}
