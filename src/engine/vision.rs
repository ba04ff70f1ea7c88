//! Vision-LLM engine: both engine traits backed by an `edgequake-llm` provider.
//!
//! Language scoring and transcription are two independent chat calls over the
//! same encoded image:
//!
//! 1. **Recognition** — [`crate::prompts::DETECTION_SYSTEM_PROMPT`] asks for a
//!    JSON object with the script and per-language confidences. The raw answer
//!    is kept as the `vision_language_scoring` stage.
//! 2. **Extraction** — [`crate::prompts::EXTRACTION_SYSTEM_PROMPT`] names the
//!    chosen language; the answer goes through
//!    [`super::postprocess::clean_text`].
//!
//! Only image inputs are supported; PDFs must go through the remote engine.
//! Each call is bounded by `api_timeout_secs` and never retried.

use super::encode::encode_image;
use super::postprocess::{clean_text, extract_json};
use super::{InputFile, Recognition, RecognitionEngine, TextExtractor};
use crate::config::ExtractionConfig;
use crate::error::EngineError;
use crate::output::{LanguageCandidate, Stage};
use crate::prompts::{extraction_prompt, DETECTION_SYSTEM_PROMPT, EXTRACTION_SYSTEM_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::debug;

const ENGINE_NAME: &str = "vision";

/// Name of the stage carrying the model's raw scoring answer.
pub const SCORING_STAGE: &str = "vision_language_scoring";

/// Vision-model engine.
pub struct VisionEngine {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
    max_image_pixels: u32,
    api_timeout_secs: u64,
    detection_prompt: String,
    extraction_prompt: String,
}

impl VisionEngine {
    /// Build an engine around `provider`, taking tuning knobs from `config`.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ExtractionConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_image_pixels: config.max_image_pixels,
            api_timeout_secs: config.api_timeout_secs,
            detection_prompt: config
                .detection_prompt
                .clone()
                .unwrap_or_else(|| DETECTION_SYSTEM_PROMPT.to_string()),
            extraction_prompt: config
                .extraction_prompt
                .clone()
                .unwrap_or_else(|| EXTRACTION_SYSTEM_PROMPT.to_string()),
        }
    }

    fn encode(&self, file: &InputFile) -> Result<ImageData, EngineError> {
        if !file.kind().is_image() {
            return Err(EngineError::Unsupported {
                engine: ENGINE_NAME.to_string(),
                what: format!("{} input '{}'", file.kind().mime_type(), file.name()),
            });
        }
        encode_image(file.bytes(), self.max_image_pixels)
            .map_err(|e| EngineError::Failed(format!("image decoding failed: {e}")))
    }

    /// One bounded chat call; returns the answer text.
    async fn ask(&self, system_prompt: &str, image: ImageData) -> Result<String, EngineError> {
        let start = Instant::now();
        let messages = vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user_with_images("", vec![image]),
        ];
        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let response = timeout(
            Duration::from_secs(self.api_timeout_secs),
            self.provider.chat(&messages, Some(&options)),
        )
        .await
        .map_err(|_| EngineError::Timeout {
            secs: self.api_timeout_secs,
        })?
        .map_err(|e| EngineError::Failed(e.to_string()))?;

        debug!(
            "Vision call: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

#[async_trait]
impl RecognitionEngine for VisionEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    async fn recognize(&self, file: &InputFile) -> Result<Recognition, EngineError> {
        let image = self.encode(file)?;
        let answer = self.ask(&self.detection_prompt, image).await?;
        parse_scoring(&answer)
    }
}

#[async_trait]
impl TextExtractor for VisionEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    async fn extract_text(&self, file: &InputFile, language: &str) -> Result<String, EngineError> {
        let image = self.encode(file)?;
        let prompt = extraction_prompt(&self.extraction_prompt, language);
        let answer = self.ask(&prompt, image).await?;
        Ok(clean_text(&answer))
    }
}

#[derive(Debug, Deserialize)]
struct ScoringAnswer {
    #[serde(default)]
    script: String,
    #[serde(default)]
    languages: Vec<LanguageCandidate>,
}

/// Turn the model's scoring answer into raw recognition signals.
///
/// Candidates keep the model's order; missing codes survive so the
/// reconciler can reject them as invalid input.
fn parse_scoring(answer: &str) -> Result<Recognition, EngineError> {
    let json = extract_json(answer).ok_or_else(|| {
        EngineError::MalformedResponse(format!("no JSON object in answer: {:.120}", answer))
    })?;
    let raw: serde_json::Value =
        serde_json::from_str(json).map_err(|e| EngineError::MalformedResponse(e.to_string()))?;
    let parsed: ScoringAnswer = serde_json::from_value(raw.clone())
        .map_err(|e| EngineError::MalformedResponse(e.to_string()))?;

    let candidates = parsed
        .languages
        .into_iter()
        .map(|c| LanguageCandidate::new(c.code.trim().to_ascii_lowercase(), c.confidence_score))
        .collect();

    let script = if parsed.script.trim().is_empty() {
        "Unknown".to_string()
    } else {
        parsed.script.trim().to_string()
    };

    Ok(Recognition {
        detected_script: script,
        candidates,
        stages: vec![Stage::new(SCORING_STAGE, raw)],
    })
}
