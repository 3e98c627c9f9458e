//! LLM summarization
//!
//! One chat completion per request, asking for a fixed six-section answer
//! about the identified medicine. Missing credentials, an unidentifiable
//! name and transport failures all degrade to fixed user-visible strings;
//! this module never propagates an error.

use crate::error::ProviderError;
use crate::identify;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Low randomness, favoring factual phrasing
const TEMPERATURE: f32 = 0.3;
/// Upper bound on generated tokens
const MAX_TOKENS: u32 = 1500;

const NO_NAME_MESSAGE: &str =
    "Could not identify a medicine name in the image. Please try again with a clearer image.";
const NO_KEY_MESSAGE: &str = "Unable to generate response. API key missing.";

const SYSTEM_PROMPT: &str = "\
You are a helpful medical information assistant. \
Your task is to provide clear, factual information about medications based on reliable sources.
Structure your response in these sections:
1. Medicine Name: The identified medication
2. Primary Uses: What conditions this medicine typically treats
3. Dosage Information: General dosing guidelines (noting that specific dosage should be prescribed by a doctor)
4. Common Side Effects: The most frequently reported side effects
5. Precautions: Important warnings or contraindications
6. Important Note: Always remind users to consult healthcare professionals and follow their prescribed dosage.

Be factual and avoid speculating. If information is unclear or missing, acknowledge this rather than guessing.
IMPORTANT: Never provide medical advice - only factual information about the medicine.";

const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Trait for chat-completion providers
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError>;
}

/// Groq chat-completion client (OpenAI-compatible wire format)
pub struct GroqChat {
    http: reqwest::Client,
    api_key: String,
}

impl GroqChat {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self { http, api_key }
    }
}

#[async_trait]
impl ChatModel for GroqChat {
    async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError> {
        #[derive(Deserialize)]
        struct Completion {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: Message,
        }
        #[derive(Deserialize)]
        struct Message {
            content: String,
        }

        let response = self
            .http
            .post(GROQ_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let completion: Completion = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::Payload("completion contained no choices".to_string()))
    }
}

/// Turns OCR text plus a search digest into a structured answer
pub struct Summarizer {
    model: Option<Arc<dyn ChatModel>>,
    model_name: String,
}

impl Summarizer {
    pub fn new(model: Arc<dyn ChatModel>, model_name: String) -> Self {
        Self {
            model: Some(model),
            model_name,
        }
    }

    /// Summarizer without a configured model; every request degrades to the
    /// API-key-missing message
    pub fn disabled() -> Self {
        Self {
            model: None,
            model_name: String::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_some()
    }

    /// Generate the structured answer.
    ///
    /// Re-derives the medicine name from the raw text; an empty name
    /// short-circuits without calling the model. Always returns user-visible
    /// text, including on provider failure.
    pub async fn summarize(&self, text: &str, digest: &str) -> String {
        let name = identify::identify(text);
        if name.is_empty() {
            return NO_NAME_MESSAGE.to_string();
        }

        let Some(model) = &self.model else {
            return NO_KEY_MESSAGE.to_string();
        };

        let request = ChatRequest {
            model: self.model_name.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(user_prompt(text, &name, digest)),
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        match model.complete(request).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!("Summarization failed: {}", e);
                format!("Unable to generate response: {}", e)
            }
        }
    }
}

fn user_prompt(text: &str, name: &str, digest: &str) -> String {
    format!(
        "I need information about a medication.\n\
         Here is text extracted from a medicine package/label:\n\n\
         {}\n\n\
         I identified this as potentially being: {}\n\n\
         Here is additional information from search results:\n\n\
         {}\n\n\
         Please provide structured information about this medication.",
        text, name, digest
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeModel {
        answer: String,
        calls: AtomicUsize,
        last_request: Mutex<Option<ChatRequest>>,
    }

    impl FakeModel {
        fn answering(answer: &str) -> Self {
            Self {
                answer: answer.to_string(),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ChatModel for FakeModel {
        async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request);
            Ok(self.answer.clone())
        }
    }

    struct BrokenModel;

    #[async_trait]
    impl ChatModel for BrokenModel {
        async fn complete(&self, _request: ChatRequest) -> Result<String, ProviderError> {
            Err(ProviderError::Transport("dns failure".to_string()))
        }
    }

    #[tokio::test]
    async fn test_empty_name_short_circuits_without_model_call() {
        let model = Arc::new(FakeModel::answering("never"));
        let summarizer = Summarizer::new(model.clone(), "test-model".to_string());

        let answer = summarizer.summarize("", "digest").await;

        assert_eq!(answer, NO_NAME_MESSAGE);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_key_returns_fixed_message() {
        let summarizer = Summarizer::disabled();

        let answer = summarizer
            .summarize("PARACETAMOL\n500mg Tablets", "digest")
            .await;

        assert_eq!(answer, NO_KEY_MESSAGE);
    }

    #[tokio::test]
    async fn test_prompt_embeds_text_name_and_digest() {
        let model = Arc::new(FakeModel::answering("the answer"));
        let summarizer = Summarizer::new(model.clone(), "test-model".to_string());

        let text = "PARACETAMOL\n500mg Tablets";
        let digest = "Search Results for PARACETAMOL:\n\nTitle: something\n";
        let answer = summarizer.summarize(text, digest).await;

        assert_eq!(answer, "the answer");

        let request = model.last_request.lock().unwrap().take().unwrap();
        assert_eq!(request.model, "test-model");
        assert_eq!(request.temperature, 0.3);
        assert_eq!(request.max_tokens, 1500);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert!(request.messages[0].content.contains("consult healthcare professionals"));
        assert_eq!(request.messages[1].role, "user");
        assert!(request.messages[1].content.contains(text));
        assert!(request.messages[1].content.contains("PARACETAMOL"));
        assert!(request.messages[1].content.contains(digest));
    }

    #[tokio::test]
    async fn test_model_failure_becomes_user_visible_message() {
        let summarizer = Summarizer::new(Arc::new(BrokenModel), "test-model".to_string());

        let answer = summarizer
            .summarize("ASPIRIN tablets", "digest")
            .await;

        assert!(answer.starts_with("Unable to generate response:"));
        assert!(answer.contains("dns failure"));
    }
}
