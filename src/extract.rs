//! Extraction orchestrator and its one-shot entry points.
//!
//! ## State machine (per call, nothing retained between calls)
//!
//! ```text
//!  Start ──preferred?──yes──────────────────────────▶ DirectExtract ──ok──▶ Completed
//!    │                                                    ▲    │
//!    no                                                   │    └─err─▶ Failed (ExtractionEngineError)
//!    ▼                                                    │
//!  AutoDetect ──recognize + reconcile──primary?──yes──────┘
//!    │                                   │
//!    └─err─▶ Failed (engine / invalid)   no──▶ Failed (NoLanguageDetected)
//! ```
//!
//! `Completed` attaches alternative-language suggestions only when detection
//! ran and its tier is Medium or below. That is the only place a tier gates
//! behaviour; everywhere else it is a label.
//!
//! Nothing is retried. When the automatic choice is wrong the caller issues a
//! new `extract` with an explicit language, typically one of the suggestions.

use crate::cache::DetectionCache;
use crate::config::{EngineKind, ExtractionConfig};
use crate::engine::input::{self, InputFile};
use crate::engine::{RecognitionEngine, RemoteEngine, TextExtractor, VisionEngine};
use crate::error::OcrLangError;
use crate::output::{DetectionResult, ExtractionResult};
use crate::progress::ProgressCallback;
use crate::reconcile::reconcile;
use crate::stream::{extract_stream, BatchItem};
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Drives detection and extraction against a pair of engines.
///
/// Cheap to share behind an `Arc`; every call is independent.
pub struct Extractor {
    recognizer: Arc<dyn RecognitionEngine>,
    extractor: Arc<dyn TextExtractor>,
    cache: DetectionCache,
    progress: Option<ProgressCallback>,
}

impl Extractor {
    /// Orchestrate over explicit engines, without caching.
    pub fn new(recognizer: Arc<dyn RecognitionEngine>, extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            recognizer,
            extractor,
            cache: DetectionCache::new(0),
            progress: None,
        }
    }

    /// Cache up to `capacity` detection results by file fingerprint.
    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = DetectionCache::new(capacity);
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Build an extractor from configuration, resolving engines.
    ///
    /// Pre-built engines in the config win; otherwise the configured
    /// [`EngineKind`] is instantiated once and backs both sides.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, OcrLangError> {
        let (recognizer, extractor) = match (&config.recognizer, &config.extractor) {
            (Some(r), Some(e)) => (Arc::clone(r), Arc::clone(e)),
            (r, e) => {
                let (builtin_r, builtin_e) = builtin_engines(config)?;
                (
                    r.as_ref().map(Arc::clone).unwrap_or(builtin_r),
                    e.as_ref().map(Arc::clone).unwrap_or(builtin_e),
                )
            }
        };

        let mut this = Self::new(recognizer, extractor).with_cache(config.cache_capacity);
        if let Some(ref cb) = config.progress_callback {
            this = this.with_progress(Arc::clone(cb));
        }
        Ok(this)
    }

    /// Run recognition on `file` and reconcile the signals.
    ///
    /// # Errors
    /// - [`OcrLangError::ExtractionEngine`] when the recognition engine fails
    ///   (message verbatim)
    /// - [`OcrLangError::InvalidInput`] when the engine returned malformed
    ///   candidates
    pub async fn detect(&self, file: &InputFile) -> Result<DetectionResult, OcrLangError> {
        if let Some(ref cb) = self.progress {
            cb.on_detection_start(file.name());
        }

        let fingerprint = self.cache.is_enabled().then(|| file.fingerprint());
        if let Some(hit) = fingerprint.as_deref().and_then(|fp| self.cache.get(fp)) {
            debug!("Detection cache hit for {}", file.name());
            self.notify_detection(file, &hit);
            return Ok(hit);
        }
        let start = Instant::now();

        let recognition = self
            .recognizer
            .recognize(file)
            .await
            .map_err(|e| OcrLangError::engine(self.recognizer.name(), e))?;

        let result = reconcile(
            &recognition.candidates,
            &recognition.detected_script,
            &recognition.stages,
        )?;

        info!(
            "Detected {} for {} (script {}, confidence {:.1}, tier {:?}) in {}ms",
            result
                .primary_language
                .as_ref()
                .map_or("nothing", |c| c.code.as_str()),
            file.name(),
            result.detected_script,
            result.confidence,
            result.confidence_tier,
            start.elapsed().as_millis()
        );

        if let Some(fp) = fingerprint {
            self.cache.insert(fp, result.clone());
        }
        self.notify_detection(file, &result);
        Ok(result)
    }

    /// Extract text from `file`, detecting the language first unless
    /// `preferred_language` is given.
    ///
    /// Never fails: every error is reported as `success == false`.
    pub async fn extract(
        &self,
        file: &InputFile,
        preferred_language: Option<&str>,
    ) -> ExtractionResult {
        let preferred = preferred_language.map(str::trim).filter(|l| !l.is_empty());

        // ── Start / AutoDetect ───────────────────────────────────────────
        let (language, detection) = match preferred {
            Some(lang) => {
                debug!("Using caller language '{}' for {}", lang, file.name());
                (lang.to_string(), None)
            }
            None => match self.detect(file).await {
                Ok(detection) => {
                    let primary = detection.primary_language.as_ref().map(|c| c.code.clone());
                    match primary {
                        Some(code) => (code, Some(detection)),
                        None => {
                            return self.fail(
                                file,
                                OcrLangError::NoLanguageDetected,
                                Some(detection),
                            )
                        }
                    }
                }
                Err(e) => return self.fail(file, e, None),
            },
        };

        // ── DirectExtract ────────────────────────────────────────────────
        if let Some(ref cb) = self.progress {
            cb.on_extraction_start(file.name(), &language);
        }
        let start = Instant::now();

        let text = match self.extractor.extract_text(file, &language).await {
            Ok(text) => text,
            Err(e) => {
                let err = OcrLangError::engine(self.extractor.name(), e);
                return self.fail(file, err, detection);
            }
        };

        // ── Completed ────────────────────────────────────────────────────
        info!(
            "Extracted {} chars of '{}' from {} in {}ms",
            text.chars().count(),
            language,
            file.name(),
            start.elapsed().as_millis()
        );
        if let Some(ref cb) = self.progress {
            cb.on_extraction_complete(file.name(), &language, text.chars().count());
        }
        ExtractionResult::completed(text, language, detection)
    }

    fn fail(
        &self,
        file: &InputFile,
        error: OcrLangError,
        detection: Option<DetectionResult>,
    ) -> ExtractionResult {
        warn!("Extraction failed for {}: {}", file.name(), error);
        if let Some(ref cb) = self.progress {
            cb.on_extraction_failed(file.name(), &error.to_string());
        }
        ExtractionResult::failed(&error, detection)
    }

    fn notify_detection(&self, file: &InputFile, result: &DetectionResult) {
        if let Some(ref cb) = self.progress {
            cb.on_detection_complete(
                file.name(),
                result.primary_language.as_ref().map(|c| c.code.as_str()),
                result.confidence_tier,
            );
        }
    }
}

// ── One-shot entry points ────────────────────────────────────────────────

/// Detect the language of a file path or URL.
///
/// # Example
/// ```rust,no_run
/// use ocr_langdetect::{detect, ExtractionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractionConfig::default();
/// let detection = detect("scan.png", &config).await?;
/// println!("{:?} ({:?})", detection.primary_language, detection.confidence_tier);
/// # Ok(())
/// # }
/// ```
pub async fn detect(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<DetectionResult, OcrLangError> {
    let extractor = Extractor::from_config(config)?;
    let file = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    extractor.detect(&file).await
}

/// Extract text from a file path or URL.
///
/// Input and configuration errors are folded into the result like every
/// other failure, so callers branch on `success` only.
pub async fn extract(
    input_str: impl AsRef<str>,
    preferred_language: Option<&str>,
    config: &ExtractionConfig,
) -> ExtractionResult {
    let input_str = input_str.as_ref();
    info!("Starting extraction: {}", input_str);

    let extractor = match Extractor::from_config(config) {
        Ok(e) => e,
        Err(e) => return ExtractionResult::failed(&e, None),
    };
    match input::resolve_input(input_str, config.download_timeout_secs).await {
        Ok(file) => extractor.extract(&file, preferred_language).await,
        Err(e) => {
            warn!("Could not read {}: {}", input_str, e);
            ExtractionResult::failed(&e, None)
        }
    }
}

/// Extract text from an in-memory file.
///
/// # Example
/// ```rust,no_run
/// use ocr_langdetect::{extract_from_bytes, ExtractionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("receipt.jpg")?;
/// let result = extract_from_bytes("receipt.jpg", bytes, Some("es"), &ExtractionConfig::default()).await;
/// if result.success {
///     println!("{}", result.text.unwrap_or_default());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn extract_from_bytes(
    name: impl Into<String>,
    bytes: Vec<u8>,
    preferred_language: Option<&str>,
    config: &ExtractionConfig,
) -> ExtractionResult {
    let extractor = match Extractor::from_config(config) {
        Ok(e) => e,
        Err(e) => return ExtractionResult::failed(&e, None),
    };
    match InputFile::from_bytes(name, bytes) {
        Ok(file) => extractor.extract(&file, preferred_language).await,
        Err(e) => ExtractionResult::failed(&e, None),
    }
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input_str: impl AsRef<str>,
    preferred_language: Option<&str>,
    config: &ExtractionConfig,
) -> ExtractionResult {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(extract(input_str, preferred_language, config)),
        Err(e) => ExtractionResult::failed(
            &OcrLangError::Internal(format!("Failed to create tokio runtime: {e}")),
            None,
        ),
    }
}

/// Extract text from many inputs with bounded concurrency.
///
/// Results come back in input order. One failed file never affects the
/// others. All files share one [`Extractor`], so repeated inputs hit the
/// detection cache.
///
/// # Errors
/// Only configuration errors (no engine could be built) are fatal.
pub async fn extract_batch(
    inputs: Vec<String>,
    preferred_language: Option<String>,
    config: &ExtractionConfig,
) -> Result<Vec<BatchItem>, OcrLangError> {
    let total = inputs.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut items: Vec<BatchItem> = extract_stream(inputs, preferred_language, config)?
        .collect()
        .await;
    items.sort_by_key(|item| item.index);

    let succeeded = items.iter().filter(|i| i.result.success).count();
    info!("Batch complete: {}/{} files extracted", succeeded, total);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, succeeded);
    }
    Ok(items)
}

// ── Engine resolution ────────────────────────────────────────────────────

type EnginePair = (Arc<dyn RecognitionEngine>, Arc<dyn TextExtractor>);

fn builtin_engines(config: &ExtractionConfig) -> Result<EnginePair, OcrLangError> {
    match config.effective_engine() {
        EngineKind::Remote => {
            let url = config
                .resolved_remote_url()
                .ok_or_else(|| OcrLangError::ProviderNotConfigured {
                    engine: "remote".to_string(),
                    hint: format!(
                        "Set --remote-url or {} to the toolkit API base URL.",
                        crate::config::REMOTE_URL_ENV
                    ),
                })?;
            let engine = Arc::new(
                RemoteEngine::new(url, config.api_timeout_secs)
                    .map_err(|e| OcrLangError::engine("remote", e))?,
            );
            let recognizer: Arc<dyn RecognitionEngine> = engine.clone();
            let extractor: Arc<dyn TextExtractor> = engine;
            Ok((recognizer, extractor))
        }
        EngineKind::Vision | EngineKind::Auto => {
            let provider = resolve_provider(config)?;
            let engine = Arc::new(VisionEngine::new(provider, config));
            let recognizer: Arc<dyn RecognitionEngine> = engine.clone();
            let extractor: Arc<dyn TextExtractor> = engine;
            Ok((recognizer, extractor))
        }
    }
}

/// Instantiate a named provider with the given model.
fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, OcrLangError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        OcrLangError::ProviderNotConfigured {
            engine: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the vision provider, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`)
/// 2. **Named provider + model** (`config.provider_name`)
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`)
/// 4. **OpenAI key present** (`OPENAI_API_KEY`)
/// 5. **Full auto-detection** (`ProviderFactory::from_env`)
fn resolve_provider(config: &ExtractionConfig) -> Result<Arc<dyn LLMProvider>, OcrLangError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or("gpt-4.1-mini");
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_vision_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or("gpt-4.1-mini");
            return create_vision_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| OcrLangError::ProviderNotConfigured {
            engine: "vision".to_string(),
            hint: format!(
                "No vision provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or use --remote-url.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
