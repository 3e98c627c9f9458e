//! Tesseract recognizer
//!
//! Uses the tesseract-static crate for static linking (no system
//! dependencies). Downloads tessdata (training data) automatically on first
//! use. Segmentation mode is applied per call through the
//! `tessedit_pageseg_mode` variable, so one recognizer serves both the
//! single-block and fully-automatic passes.

use crate::config::Config;
use crate::error::ScanError;
use crate::ocr::{parse_tsv, Recognizer, Segmentation, Token};
use image::DynamicImage;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tesseract_static::tesseract::Tesseract;

/// Tesseract-backed OCR recognizer
pub struct TesseractRecognizer {
    /// Path to tessdata directory
    tessdata_path: String,
    /// Language for OCR
    language: String,
}

impl TesseractRecognizer {
    /// Create a new recognizer, downloading tessdata if needed
    pub fn new(config: &Config) -> Result<Self, ScanError> {
        let language = config.language.clone();

        let tessdata_path = match &config.tessdata_path {
            Some(path) => path.clone(),
            None => ensure_tessdata_available(&language)?,
        };

        // Validate that tessdata is accessible by doing a test initialization
        let test_tess = Tesseract::new(Some(&tessdata_path), Some(&language)).map_err(|e| {
            ScanError::Initialization(format!("Failed to initialize Tesseract: {}", e))
        })?;
        drop(test_tess);

        tracing::info!(
            "Tesseract recognizer initialized (tessdata: {}, language: {})",
            tessdata_path,
            language
        );

        Ok(Self {
            tessdata_path,
            language,
        })
    }

    /// Run recognition on an image with the given segmentation mode
    fn recognize(&self, img: &DynamicImage, mode: Segmentation) -> Result<Tesseract, ScanError> {
        // Convert to BMP in memory (BMP is always supported by leptonica)
        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        let mut bmp_data = Vec::new();
        {
            let mut cursor = std::io::Cursor::new(&mut bmp_data);
            rgb_img
                .write_to(&mut cursor, image::ImageFormat::Bmp)
                .map_err(|e| ScanError::Recognition(format!("Failed to convert to BMP: {}", e)))?;
        }

        tracing::debug!(
            "Recognizing image: {}x{}, psm {}, BMP size: {} bytes",
            width,
            height,
            mode.psm(),
            bmp_data.len()
        );

        let tess = Tesseract::new(Some(&self.tessdata_path), Some(&self.language))
            .map_err(|e| ScanError::Recognition(format!("Failed to create Tesseract: {}", e)))?
            .set_variable("tessedit_pageseg_mode", mode.psm())
            .map_err(|e| {
                ScanError::Recognition(format!("Failed to set segmentation mode: {}", e))
            })?
            .set_image_from_mem(&bmp_data)
            .map_err(|e| {
                ScanError::Recognition(format!(
                    "Failed to set image ({}x{}, {} bytes): {}",
                    width,
                    height,
                    bmp_data.len(),
                    e
                ))
            })?
            .recognize()
            .map_err(|e| ScanError::Recognition(format!("Failed to recognize text: {}", e)))?;

        Ok(tess)
    }
}

impl Recognizer for TesseractRecognizer {
    fn recognize_text(
        &self,
        image: &DynamicImage,
        mode: Segmentation,
    ) -> Result<String, ScanError> {
        let mut tess = self.recognize(image, mode)?;
        let text = tess
            .get_text()
            .map_err(|e| ScanError::Recognition(format!("Failed to get text: {}", e)))?;
        Ok(text)
    }

    fn recognize_tokens(
        &self,
        image: &DynamicImage,
        mode: Segmentation,
    ) -> Result<Vec<Token>, ScanError> {
        let mut tess = self.recognize(image, mode)?;
        let tsv = tess
            .get_tsv_text(0)
            .map_err(|e| ScanError::Recognition(format!("Failed to get token data: {}", e)))?;
        Ok(parse_tsv(&tsv))
    }
}

// ============================================================================
// Tessdata download helpers
// ============================================================================

/// Ensure tessdata is available, downloading if needed
fn ensure_tessdata_available(language: &str) -> Result<String, ScanError> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("medscan")
        .join("tessdata");

    std::fs::create_dir_all(&cache_dir).map_err(|e| {
        ScanError::Initialization(format!("Failed to create tessdata directory: {}", e))
    })?;

    let traineddata_file = format!("{}.traineddata", language);
    let traineddata_path = cache_dir.join(&traineddata_file);

    if !traineddata_path.exists() {
        let url = tessdata_url(language);
        tracing::info!(
            "Downloading tessdata for '{}' (this may take a moment)...",
            language
        );
        download_file(&url, &traineddata_path)?;
        tracing::info!("Downloaded tessdata to {:?}", traineddata_path);
    } else {
        tracing::info!("Using cached tessdata from {:?}", cache_dir);
    }

    // Tesseract expects the directory, not the file
    cache_dir
        .to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| ScanError::Initialization("Invalid tessdata path".to_string()))
}

/// Get tessdata download URL for a language
fn tessdata_url(language: &str) -> String {
    // tessdata_fast keeps the download small
    format!(
        "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
        language
    )
}

/// Download a file from URL to path using ureq
fn download_file(url: &str, path: &Path) -> Result<(), ScanError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| ScanError::Initialization(format!("Failed to download tessdata: {}", e)))?;

    let mut file = File::create(path).map_err(|e| {
        ScanError::Initialization(format!("Failed to create tessdata file: {}", e))
    })?;

    let buffer = response.into_body().read_to_vec().map_err(|e| {
        ScanError::Initialization(format!("Failed to read tessdata response: {}", e))
    })?;

    file.write_all(&buffer).map_err(|e| {
        ScanError::Initialization(format!("Failed to write tessdata file: {}", e))
    })?;

    Ok(())
}
