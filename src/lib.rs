//! # ocr-langdetect
//!
//! Detect the language of a scanned document or image, then extract its text
//! with OCR in that language.
//!
//! ## Why this crate?
//!
//! OCR engines need to be told which language to read. Guessing wrong gives
//! garbage, and asking the user every time is tedious. This crate runs a
//! recognition pass first, reconciles its per-stage signals into a ranked
//! list of candidate languages with a confidence tier, and extracts text in
//! the winner. When confidence is mediocre it hands back the runner-up
//! languages, so a caller can offer a one-click retry instead of a silent
//! wrong answer.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file / URL / bytes
//!  │
//!  ├─ 1. Input      resolve local file or download from URL, sniff format
//!  ├─ 2. Recognize  engine returns script + candidates + stage outcomes
//!  ├─ 3. Reconcile  dedupe, rank, classify into High / Medium / Low / Very Low
//!  ├─ 4. Extract    engine transcribes the file in the chosen language
//!  └─ 5. Output     ExtractionResult (success or structured failure)
//! ```
//!
//! Pass a preferred language to skip steps 2–3 entirely.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocr_langdetect::{extract, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     // Engine auto-selected: OCRLANG_REMOTE_URL if set, otherwise a vision
//!     // LLM from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = ExtractionConfig::default();
//!     let result = extract("receipt.jpg", None, &config).await;
//!     if result.success {
//!         println!("{}", result.text.unwrap_or_default());
//!         if !result.suggestions.is_empty() {
//!             eprintln!("not sure; also try: {}", result.suggestions.join(", "));
//!         }
//!     } else {
//!         eprintln!("{}", result.error_detail.unwrap_or_default());
//!     }
//! }
//! ```
//!
//! ## Confidence Tiers
//!
//! | Tier | Score | Suggestions attached |
//! |------|-------|----------------------|
//! | High     | ≥ 80    | no  |
//! | Medium   | 50–79.x | yes |
//! | Low      | 30–49.x | yes |
//! | Very Low | < 30    | yes |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocrlang` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! ocr-langdetect = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cache;
pub mod catalog;
pub mod confidence;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod output;
pub mod progress;
pub mod prompts;
pub mod reconcile;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use catalog::name_of;
pub use confidence::{classify, describe, Tier, TierDescriptor};
pub use config::{EngineKind, ExtractionConfig, ExtractionConfigBuilder};
pub use engine::{
    FileKind, InputFile, Recognition, RecognitionEngine, RemoteEngine, TextExtractor, VisionEngine,
};
pub use error::{EngineError, ErrorKind, OcrLangError};
pub use extract::{detect, extract, extract_batch, extract_from_bytes, extract_sync, Extractor};
pub use output::{DetectionResult, ExtractedText, ExtractionResult, LanguageCandidate, Stage};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use reconcile::{reconcile, MAX_SUGGESTIONS};
pub use stream::{
    detect_stream, extract_stream, BatchItem, DetectionItem, DetectionStream, ExtractionStream,
};
