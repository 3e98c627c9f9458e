use crate::error::ScanError;
use image::{DynamicImage, GrayImage};
use std::path::Path;
use std::time::Instant;

use super::steps;

/// Result of preprocessing
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// The decoded input image, untouched
    pub original: DynamicImage,
    /// Binarized, upscaled image optimized for OCR
    pub enhanced: GrayImage,
    /// True when a step failed and `enhanced` is just the original image.
    /// A degraded result still flows through the pipeline; callers surface
    /// the flag so quality loss is not silent.
    pub degraded: bool,
}

/// Preprocess a decoded image for OCR.
///
/// Steps, in order: 200% cubic upscale, grayscale, non-local-means denoise,
/// two diagnostic threshold variants (adaptive Gaussian and Otsu), then a
/// 3x3 sharpen followed by Otsu binarization. The sharpened+Otsu variant is
/// the one that feeds OCR; the others exist for inspection only.
///
/// When `diagnostics` is set, every intermediate is written there as PNG.
/// Write failures are logged and ignored.
pub fn preprocess(image: &DynamicImage, diagnostics: Option<&Path>) -> Preprocessed {
    let start = Instant::now();

    match enhance(image, diagnostics) {
        Ok(enhanced) => {
            tracing::debug!(
                "Preprocessing completed in {}ms ({}x{} -> {}x{})",
                start.elapsed().as_millis(),
                image.width(),
                image.height(),
                enhanced.width(),
                enhanced.height()
            );
            Preprocessed {
                original: image.clone(),
                enhanced,
                degraded: false,
            }
        }
        Err(e) => {
            tracing::warn!(
                "Preprocessing failed, falling back to the original image: {}",
                e
            );
            Preprocessed {
                original: image.clone(),
                enhanced: image.to_luma8(),
                degraded: true,
            }
        }
    }
}

fn enhance(image: &DynamicImage, diagnostics: Option<&Path>) -> Result<GrayImage, ScanError> {
    let upscaled = steps::resize::apply(image)?;
    let gray = steps::grayscale::apply(&upscaled)?;
    save_diagnostic(diagnostics, "gray", &gray);

    let denoised = steps::denoise::apply(&gray)?;
    save_diagnostic(diagnostics, "denoised", &denoised);

    // Diagnostic threshold variants; not used downstream
    if diagnostics.is_some() {
        let thresh_adaptive = steps::threshold::adaptive_gaussian(&denoised);
        save_diagnostic(diagnostics, "thresh_adaptive", &thresh_adaptive);
        let thresh_otsu = steps::threshold::otsu(&denoised);
        save_diagnostic(diagnostics, "thresh_otsu", &thresh_otsu);
    }

    // Sharpen then binarize - empirically the variant that reads best for
    // label text
    let sharpened = steps::sharpen::apply(&denoised)?;
    let enhanced = steps::threshold::otsu(&sharpened);
    save_diagnostic(diagnostics, "thresh_sharp", &enhanced);

    Ok(enhanced)
}

fn save_diagnostic(dir: Option<&Path>, name: &str, image: &GrayImage) {
    let Some(dir) = dir else {
        return;
    };

    if let Err(e) = std::fs::create_dir_all(dir) {
        tracing::warn!("Failed to create diagnostics directory {:?}: {}", dir, e);
        return;
    }

    let path = dir.join(format!("{}.png", name));
    if let Err(e) = image.save(&path) {
        tracing::warn!("Failed to write diagnostic image {:?}: {}", path, e);
    }
}
