//! Text extraction and annotation
//!
//! Runs OCR over the enhanced image, falls back once to automatic page
//! segmentation when the first pass comes back sparse, and draws boxes over
//! confidently recognized tokens on a copy of the original image.

use crate::error::ScanError;
use crate::ocr::{Recognizer, Segmentation, Token};
use crate::preprocessing::Preprocessed;
use image::{imageops::FilterType, DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::sync::Arc;

/// Minimum trimmed length before the fallback segmentation pass kicks in
const SPARSE_TEXT_THRESHOLD: usize = 10;
/// Tokens at or below this confidence are not annotated
const CONFIDENCE_FLOOR: i32 = 60;
/// Annotation rectangle color
const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Extraction output: annotated image plus raw text.
///
/// `text` may be empty or whitespace-only; downstream treats that as
/// "no text found", not an error.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub annotated: RgbImage,
    pub text: String,
}

pub struct TextExtractor {
    recognizer: Arc<dyn Recognizer>,
}

impl TextExtractor {
    pub fn new(recognizer: Arc<dyn Recognizer>) -> Self {
        Self { recognizer }
    }

    /// Extract text and annotate recognized tokens.
    ///
    /// Never fails: internal errors become a fallback text value describing
    /// the problem, paired with the unannotated original image.
    pub fn extract(&self, preprocessed: &Preprocessed) -> Extraction {
        match self.try_extract(preprocessed) {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::error!("Text extraction failed: {}", e);
                Extraction {
                    annotated: preprocessed.original.to_rgb8(),
                    text: format!("Error extracting text: {}", e),
                }
            }
        }
    }

    fn try_extract(&self, preprocessed: &Preprocessed) -> Result<Extraction, ScanError> {
        let enhanced = DynamicImage::ImageLuma8(preprocessed.enhanced.clone());

        let mut text = self
            .recognizer
            .recognize_text(&enhanced, Segmentation::SingleBlock)?;

        // One-shot fallback: sparse output usually means the single-block
        // assumption did not hold for this label
        if text.trim().chars().count() < SPARSE_TEXT_THRESHOLD {
            tracing::info!("Initial OCR yielded minimal text, retrying with automatic segmentation");
            text = self.recognizer.recognize_text(&enhanced, Segmentation::Auto)?;
        }

        // Token boxes always come from the single-block pass, even when the
        // final text came from the fallback
        let tokens = self
            .recognizer
            .recognize_tokens(&enhanced, Segmentation::SingleBlock)?;

        // Box coordinates are relative to the OCR input, so draw on a copy of
        // the original resized to match it
        let mut annotated = preprocessed
            .original
            .resize_exact(enhanced.width(), enhanced.height(), FilterType::CatmullRom)
            .to_rgb8();
        draw_token_boxes(&mut annotated, &tokens);

        tracing::info!(
            "Extracted {} characters, annotated {} of {} tokens",
            text.len(),
            tokens.iter().filter(|t| t.conf > CONFIDENCE_FLOOR).count(),
            tokens.len()
        );

        Ok(Extraction { annotated, text })
    }
}

/// Draw a 2px hollow rectangle over every token above the confidence floor
fn draw_token_boxes(canvas: &mut RgbImage, tokens: &[Token]) {
    for token in tokens {
        if token.conf <= CONFIDENCE_FLOOR || token.width == 0 || token.height == 0 {
            continue;
        }

        let outer = Rect::at(token.left, token.top).of_size(token.width, token.height);
        draw_hollow_rect_mut(canvas, outer, BOX_COLOR);

        if token.width > 2 && token.height > 2 {
            let inner =
                Rect::at(token.left + 1, token.top + 1).of_size(token.width - 2, token.height - 2);
            draw_hollow_rect_mut(canvas, inner, BOX_COLOR);
        }
    }
}
