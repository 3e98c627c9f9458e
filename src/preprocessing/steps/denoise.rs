use crate::error::ScanError;
use image::{GrayImage, Luma};

/// Patch radius for similarity comparison (3x3 patches)
const PATCH_RADIUS: i64 = 1;
/// Search window radius (7x7 window around each pixel)
const SEARCH_RADIUS: i64 = 3;
/// Filter strength - larger values smooth more aggressively
const FILTER_STRENGTH: f32 = 10.0;

/// Non-local-means denoising over a bounded search window.
///
/// Each pixel is replaced by a weighted average of the pixels in its search
/// window, where a neighbor's weight decays exponentially with the mean
/// squared difference between the two pixels' surrounding patches. Preserves
/// edges better than plain blurring, which matters for small label text.
pub fn apply(image: &GrayImage) -> Result<GrayImage, ScanError> {
    let (width, height) = image.dimensions();
    let h2 = FILTER_STRENGTH * FILTER_STRENGTH;

    let mut out = GrayImage::new(width, height);
    for y in 0..height as i64 {
        for x in 0..width as i64 {
            let mut weight_sum = 0.0f32;
            let mut value_sum = 0.0f32;

            for dy in -SEARCH_RADIUS..=SEARCH_RADIUS {
                for dx in -SEARCH_RADIUS..=SEARCH_RADIUS {
                    let nx = x + dx;
                    let ny = y + dy;
                    if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                        continue;
                    }

                    let dist = patch_distance(image, (x, y), (nx, ny));
                    let weight = (-dist / h2).exp();
                    weight_sum += weight;
                    value_sum += weight * image.get_pixel(nx as u32, ny as u32).0[0] as f32;
                }
            }

            let value = (value_sum / weight_sum).round().clamp(0.0, 255.0) as u8;
            out.put_pixel(x as u32, y as u32, Luma([value]));
        }
    }

    Ok(out)
}

/// Mean squared difference between the patches centered on `a` and `b`
fn patch_distance(img: &GrayImage, a: (i64, i64), b: (i64, i64)) -> f32 {
    let mut sum = 0.0f32;
    let mut count = 0u32;

    for dy in -PATCH_RADIUS..=PATCH_RADIUS {
        for dx in -PATCH_RADIUS..=PATCH_RADIUS {
            let pa = sample(img, a.0 + dx, a.1 + dy) as f32;
            let pb = sample(img, b.0 + dx, b.1 + dy) as f32;
            sum += (pa - pb) * (pa - pb);
            count += 1;
        }
    }

    sum / count as f32
}

/// Read a pixel with coordinates clamped to the image bounds
fn sample(img: &GrayImage, x: i64, y: i64) -> u8 {
    let cx = x.clamp(0, img.width() as i64 - 1) as u32;
    let cy = y.clamp(0, img.height() as i64 - 1) as u32;
    img.get_pixel(cx, cy).0[0]
}
