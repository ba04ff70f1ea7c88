//! Configuration for detection and extraction.
//!
//! All behaviour is controlled through [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`]. The orchestrator itself has no tunable policy
//! (tier bounds and the suggestion cap are fixed); the knobs here select and
//! tune the engines and the batch runner.

use crate::engine::{RecognitionEngine, TextExtractor};
use crate::error::OcrLangError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Environment variable naming the toolkit API base URL.
pub const REMOTE_URL_ENV: &str = "OCRLANG_REMOTE_URL";

/// Which built-in engine backs recognition and extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Remote when a base URL is configured (config or `OCRLANG_REMOTE_URL`),
    /// otherwise vision. (default)
    #[default]
    Auto,
    /// Vision LLM via `edgequake-llm`. Images only.
    Vision,
    /// The toolkit's HTTP API. Images and PDFs.
    Remote,
}

/// Configuration for detection and extraction.
///
/// # Example
/// ```rust
/// use ocr_langdetect::{EngineKind, ExtractionConfig};
///
/// let config = ExtractionConfig::builder()
///     .engine(EngineKind::Remote)
///     .remote_url("http://localhost:8080/api")
///     .concurrency(8)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Built-in engine selection. Ignored for any side supplied via
    /// `recognizer` / `extractor`.
    pub engine: EngineKind,

    /// Pre-constructed recognition engine. Takes precedence over `engine`.
    pub recognizer: Option<Arc<dyn RecognitionEngine>>,

    /// Pre-constructed extraction engine. Takes precedence over `engine`.
    pub extractor: Option<Arc<dyn TextExtractor>>,

    /// Vision model identifier, e.g. "gpt-4.1-mini". If None, uses provider default.
    pub model: Option<String>,

    /// Vision provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed vision provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for vision calls. Default: 0.0.
    ///
    /// Transcription and scoring should be as deterministic as the model allows.
    pub temperature: f32,

    /// Maximum tokens per vision answer. Default: 4096.
    pub max_tokens: usize,

    /// Longest image side, in pixels, sent to the vision model. Default: 2000.
    pub max_image_pixels: u32,

    /// Override for the language-scoring system prompt.
    pub detection_prompt: Option<String>,

    /// Override for the transcription system prompt (`{language}` placeholder).
    pub extraction_prompt: Option<String>,

    /// Toolkit API base URL for the remote engine.
    pub remote_url: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-engine-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Files processed at once by the batch runner. Default: 4.
    pub concurrency: usize,

    /// Detection results cached by file fingerprint; 0 disables. Default: 64.
    pub cache_capacity: usize,

    /// Optional progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            recognizer: None,
            extractor: None,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.0,
            max_tokens: 4096,
            max_image_pixels: 2000,
            detection_prompt: None,
            extraction_prompt: None,
            remote_url: None,
            download_timeout_secs: 120,
            api_timeout_secs: 60,
            concurrency: 4,
            cache_capacity: 64,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("engine", &self.engine)
            .field("recognizer", &self.recognizer.as_ref().map(|r| r.name().to_string()))
            .field("extractor", &self.extractor.as_ref().map(|e| e.name().to_string()))
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_image_pixels", &self.max_image_pixels)
            .field("remote_url", &self.remote_url)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("concurrency", &self.concurrency)
            .field("cache_capacity", &self.cache_capacity)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Resolve `Auto` into a concrete engine kind.
    pub fn effective_engine(&self) -> EngineKind {
        match self.engine {
            EngineKind::Auto if self.resolved_remote_url().is_some() => EngineKind::Remote,
            EngineKind::Auto => EngineKind::Vision,
            other => other,
        }
    }

    /// Remote base URL from config, falling back to `OCRLANG_REMOTE_URL`.
    pub fn resolved_remote_url(&self) -> Option<String> {
        self.remote_url
            .clone()
            .or_else(|| std::env::var(REMOTE_URL_ENV).ok())
            .filter(|u| !u.trim().is_empty())
    }
}

/// Builder for [`ExtractionConfig`].
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl fmt::Debug for ExtractionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ExtractionConfigBuilder {
    pub fn engine(mut self, kind: EngineKind) -> Self {
        self.config.engine = kind;
        self
    }

    pub fn recognizer(mut self, engine: Arc<dyn RecognitionEngine>) -> Self {
        self.config.recognizer = Some(engine);
        self
    }

    pub fn extractor(mut self, engine: Arc<dyn TextExtractor>) -> Self {
        self.config.extractor = Some(engine);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_image_pixels(mut self, px: u32) -> Self {
        self.config.max_image_pixels = px.max(100);
        self
    }

    pub fn detection_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.detection_prompt = Some(prompt.into());
        self
    }

    pub fn extraction_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.extraction_prompt = Some(prompt.into());
        self
    }

    pub fn remote_url(mut self, url: impl Into<String>) -> Self {
        self.config.remote_url = Some(url.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn cache_capacity(mut self, n: usize) -> Self {
        self.config.cache_capacity = n;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, OcrLangError> {
        let c = &self.config;
        if c.api_timeout_secs == 0 {
            return Err(OcrLangError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(OcrLangError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(OcrLangError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if let Some(ref url) = c.remote_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(OcrLangError::InvalidConfig(format!(
                    "Remote URL must be http(s), got '{url}'"
                )));
            }
        }
        if let Some(ref prompt) = c.extraction_prompt {
            if !prompt.contains("{language}") {
                return Err(OcrLangError::InvalidConfig(
                    "Extraction prompt must contain the {language} placeholder".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ExtractionConfig::default();
        assert_eq!(c.engine, EngineKind::Auto);
        assert_eq!(c.api_timeout_secs, 60);
        assert_eq!(c.concurrency, 4);
        assert_eq!(c.cache_capacity, 64);
    }

    #[test]
    fn builder_clamps() {
        let c = ExtractionConfig::builder()
            .temperature(5.0)
            .max_image_pixels(10)
            .concurrency(0)
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.max_image_pixels, 100);
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = ExtractionConfig::builder().api_timeout_secs(0).build().unwrap_err();
        assert!(matches!(err, OcrLangError::InvalidConfig(_)));
    }

    #[test]
    fn remote_url_must_be_http() {
        assert!(ExtractionConfig::builder()
            .remote_url("ftp://example.com")
            .build()
            .is_err());
    }

    #[test]
    fn extraction_prompt_needs_placeholder() {
        assert!(ExtractionConfig::builder()
            .extraction_prompt("Transcribe the text.")
            .build()
            .is_err());
        assert!(ExtractionConfig::builder()
            .extraction_prompt("Transcribe the {language} text.")
            .build()
            .is_ok());
    }

    #[test]
    fn explicit_engine_is_kept() {
        let c = ExtractionConfig::builder()
            .engine(EngineKind::Vision)
            .remote_url("http://localhost:1")
            .build()
            .unwrap();
        assert_eq!(c.effective_engine(), EngineKind::Vision);

        let c = ExtractionConfig::builder()
            .remote_url("http://localhost:1")
            .build()
            .unwrap();
        assert_eq!(c.effective_engine(), EngineKind::Remote);
    }
}
