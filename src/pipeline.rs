//! Request-scoped scan pipeline
//!
//! Strictly linear: decode, preprocess, extract, identify, retrieve,
//! summarize. Every entity is derived from its predecessor plus provider
//! responses; nothing persists across requests. Scratch artifacts are keyed
//! by a per-request id so concurrent requests never collide.

use crate::error::ScanError;
use crate::extract::TextExtractor;
use crate::identify;
use crate::ocr::Recognizer;
use crate::preprocessing;
use crate::search::InfoRetriever;
use crate::summarize::Summarizer;
use image::RgbImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Everything a presentation adapter needs to render one scan
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub extracted_text: String,
    /// PNG-encoded annotated image
    pub annotated_png: Vec<u8>,
    pub medicine_name: String,
    /// Present only when OCR produced non-empty text
    pub summary: Option<String>,
    pub preprocessing_degraded: bool,
}

pub struct ScanPipeline {
    extractor: TextExtractor,
    retriever: InfoRetriever,
    summarizer: Summarizer,
    scratch_dir: Option<PathBuf>,
}

impl ScanPipeline {
    pub fn new(
        recognizer: Arc<dyn Recognizer>,
        retriever: InfoRetriever,
        summarizer: Summarizer,
        scratch_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            extractor: TextExtractor::new(recognizer),
            retriever,
            summarizer,
            scratch_dir,
        }
    }

    pub fn search_configured(&self) -> bool {
        self.retriever.is_configured()
    }

    pub fn summarizer_configured(&self) -> bool {
        self.summarizer.is_configured()
    }

    /// Run the full pipeline on raw image bytes.
    ///
    /// Only an undecodable image fails the request; every later stage
    /// degrades to user-visible text instead of erroring.
    pub async fn process(&self, data: &[u8], request_id: &str) -> Result<ScanReport, ScanError> {
        let start = Instant::now();

        let image = image::load_from_memory(data)
            .map_err(|e| ScanError::InvalidImage(e.to_string()))?;
        if image.width() == 0 || image.height() == 0 {
            return Err(ScanError::InvalidImage("image is empty".to_string()));
        }

        let diagnostics = self
            .scratch_dir
            .as_ref()
            .map(|dir| dir.join(request_id));

        let preprocessed = preprocessing::preprocess(&image, diagnostics.as_deref());
        let extraction = self.extractor.extract(&preprocessed);
        let medicine_name = identify::identify(&extraction.text);

        let summary = if extraction.text.trim().is_empty() {
            tracing::info!(request_id, "No text found, skipping search and summarization");
            None
        } else {
            let digest = if medicine_name.is_empty() {
                String::new()
            } else {
                self.retriever.digest(&medicine_name).await
            };
            Some(self.summarizer.summarize(&extraction.text, &digest).await)
        };

        let annotated_png = encode_png(&extraction.annotated)?;

        tracing::info!(
            request_id,
            "Scan completed in {}ms (name: {:?}, text length: {}, degraded: {})",
            start.elapsed().as_millis(),
            medicine_name,
            extraction.text.len(),
            preprocessed.degraded
        );

        Ok(ScanReport {
            extracted_text: extraction.text,
            annotated_png,
            medicine_name,
            summary,
            preprocessing_degraded: preprocessed.degraded,
        })
    }
}

fn encode_png(image: &RgbImage) -> Result<Vec<u8>, ScanError> {
    let mut data = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut data);
    image
        .write_to(&mut cursor, image::ImageFormat::Png)
        .map_err(|e| ScanError::Internal(format!("Failed to encode annotated image: {}", e)))?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::ocr::{Segmentation, Token};
    use crate::search::{SearchHit, SearchProvider};
    use crate::summarize::{ChatModel, ChatRequest};
    use async_trait::async_trait;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::sync::Mutex;

    struct FakeRecognizer {
        text: String,
    }

    impl Recognizer for FakeRecognizer {
        fn recognize_text(
            &self,
            _image: &DynamicImage,
            _mode: Segmentation,
        ) -> Result<String, ScanError> {
            Ok(self.text.clone())
        }

        fn recognize_tokens(
            &self,
            _image: &DynamicImage,
            _mode: Segmentation,
        ) -> Result<Vec<Token>, ScanError> {
            Ok(vec![])
        }
    }

    struct FakeSearch {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SearchProvider for FakeSearch {
        async fn search(&self, query: &str, _limit: u8) -> Result<Vec<SearchHit>, ProviderError> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(vec![SearchHit {
                title: Some("Paracetamol".to_string()),
                display_link: Some("nhs.uk".to_string()),
                snippet: Some("Pain relief.".to_string()),
            }])
        }
    }

    struct FakeModel {
        prompts: Mutex<Vec<ChatRequest>>,
    }

    #[async_trait]
    impl ChatModel for FakeModel {
        async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(request);
            Ok("1. Medicine Name: Paracetamol\n...\n6. Important Note: consult a healthcare professional."
                .to_string())
        }
    }

    fn png_bytes() -> Vec<u8> {
        let img = RgbImage::from_pixel(24, 16, Rgb([220, 220, 220]));
        let mut data = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut data), image::ImageFormat::Png)
            .unwrap();
        data
    }

    fn pipeline_with_fakes(
        text: &str,
        search: Arc<FakeSearch>,
        model: Arc<FakeModel>,
    ) -> ScanPipeline {
        ScanPipeline::new(
            Arc::new(FakeRecognizer {
                text: text.to_string(),
            }),
            InfoRetriever::new(search),
            Summarizer::new(model, "test-model".to_string()),
            None,
        )
    }

    #[tokio::test]
    async fn test_end_to_end_label_scan() {
        let search = Arc::new(FakeSearch {
            queries: Mutex::new(Vec::new()),
        });
        let model = Arc::new(FakeModel {
            prompts: Mutex::new(Vec::new()),
        });
        let pipeline =
            pipeline_with_fakes("PARACETAMOL\n500mg Tablets", search.clone(), model.clone());

        let report = pipeline.process(&png_bytes(), "req-1").await.unwrap();

        assert_eq!(report.medicine_name, "PARACETAMOL");
        assert_eq!(
            *search.queries.lock().unwrap(),
            vec!["PARACETAMOL medicine usage information dosage".to_string()]
        );

        let prompts = model.prompts.lock().unwrap();
        let user_message = &prompts[0].messages[1].content;
        assert!(user_message.contains("PARACETAMOL\n500mg Tablets"));
        assert!(user_message.contains("Search Results for PARACETAMOL:"));

        let summary = report.summary.unwrap();
        assert!(!summary.is_empty());
        assert!(summary.contains("Important Note"));
        assert!(!report.annotated_png.is_empty());
        assert!(!report.preprocessing_degraded);
    }

    #[tokio::test]
    async fn test_empty_text_skips_search_and_summary() {
        let search = Arc::new(FakeSearch {
            queries: Mutex::new(Vec::new()),
        });
        let model = Arc::new(FakeModel {
            prompts: Mutex::new(Vec::new()),
        });
        let pipeline = pipeline_with_fakes("  \n ", search.clone(), model.clone());

        let report = pipeline.process(&png_bytes(), "req-2").await.unwrap();

        assert!(report.summary.is_none());
        assert_eq!(report.medicine_name, "");
        assert!(search.queries.lock().unwrap().is_empty());
        assert!(model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_bytes_fail_with_invalid_image() {
        let search = Arc::new(FakeSearch {
            queries: Mutex::new(Vec::new()),
        });
        let model = Arc::new(FakeModel {
            prompts: Mutex::new(Vec::new()),
        });
        let pipeline = pipeline_with_fakes("irrelevant", search, model);

        let result = pipeline.process(b"not an image", "req-3").await;

        assert!(matches!(result, Err(ScanError::InvalidImage(_))));
    }

    #[tokio::test]
    async fn test_annotated_png_decodes_to_enhanced_dimensions() {
        let search = Arc::new(FakeSearch {
            queries: Mutex::new(Vec::new()),
        });
        let model = Arc::new(FakeModel {
            prompts: Mutex::new(Vec::new()),
        });
        let pipeline = pipeline_with_fakes("PARACETAMOL tablets", search, model);

        let report = pipeline.process(&png_bytes(), "req-4").await.unwrap();

        let annotated = image::load_from_memory(&report.annotated_png).unwrap();
        // Input was 24x16; preprocessing doubles both dimensions
        assert_eq!(annotated.width(), 48);
        assert_eq!(annotated.height(), 32);
    }
}
