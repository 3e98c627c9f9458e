//! OCR capability boundary
//!
//! The pipeline talks to the OCR engine through the [`Recognizer`] trait so
//! tests can substitute deterministic fakes for the native Tesseract binary.

pub mod tesseract;

use crate::error::ScanError;
use image::DynamicImage;

/// How the engine should assume text is laid out on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segmentation {
    /// A single uniform block of text (PSM 6) - the default for labels
    SingleBlock,
    /// Fully automatic page segmentation (PSM 3) - fallback for sparse output
    Auto,
}

impl Segmentation {
    /// Tesseract page segmentation mode value
    pub fn psm(&self) -> &'static str {
        match self {
            Segmentation::SingleBlock => "6",
            Segmentation::Auto => "3",
        }
    }
}

/// One recognized word with its bounding box.
///
/// `conf` is an integer percentage; the extractor only annotates tokens with
/// confidence strictly greater than 60.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
    pub conf: i32,
}

/// Trait that OCR engines must implement
pub trait Recognizer: Send + Sync {
    /// Extract the full text of an image using the given segmentation mode
    fn recognize_text(&self, image: &DynamicImage, mode: Segmentation)
        -> Result<String, ScanError>;

    /// Extract per-word tokens with bounding boxes and confidence
    fn recognize_tokens(
        &self,
        image: &DynamicImage,
        mode: Segmentation,
    ) -> Result<Vec<Token>, ScanError>;
}

/// Parse Tesseract TSV output into word tokens.
///
/// Word rows are level 5; other levels (page/block/paragraph/line) and the
/// header row are skipped. Confidence arrives as a float in newer Tesseract
/// versions and is rounded to the integer percentage the pipeline uses.
pub fn parse_tsv(tsv: &str) -> Vec<Token> {
    tsv.lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split('\t').collect();
            if cols.len() < 12 || cols[0] != "5" {
                return None;
            }
            let conf: f32 = cols[10].parse().ok()?;
            Some(Token {
                text: cols[11].to_string(),
                left: cols[6].parse().ok()?,
                top: cols[7].parse().ok()?,
                width: cols[8].parse().ok()?,
                height: cols[9].parse().ok()?,
                conf: conf.round() as i32,
            })
        })
        .collect()
}
