//! Value types produced by detection and extraction.
//!
//! Everything here is created once per request and handed to the caller;
//! nothing is retained by the library. Field names serialise in camelCase so
//! the JSON matches what the toolkit front end consumes.

use crate::confidence::{classify, Tier};
use crate::error::{ErrorKind, OcrLangError};
use serde::{Deserialize, Serialize};

/// One language hypothesis for an input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageCandidate {
    /// Language code. Empty when the upstream payload omitted it; the
    /// reconciler rejects such candidates.
    #[serde(default)]
    pub code: String,
    /// Confidence score, nominally 0–100.
    #[serde(default, alias = "confidence", alias = "score")]
    pub confidence_score: f64,
    #[serde(default)]
    pub is_likely: bool,
    #[serde(default)]
    pub is_high_confidence: bool,
}

impl LanguageCandidate {
    /// Build a candidate, deriving the likelihood flags from the score.
    pub fn new(code: impl Into<String>, confidence_score: f64) -> Self {
        let tier = classify(confidence_score);
        Self {
            code: code.into(),
            confidence_score,
            is_likely: tier >= Tier::Medium,
            is_high_confidence: tier == Tier::High,
        }
    }
}

/// One recognition pass and its opaque outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub name: String,
    #[serde(default)]
    pub outcome: serde_json::Value,
}

impl Stage {
    pub fn new(name: impl Into<String>, outcome: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            outcome,
        }
    }
}

/// The reconciled judgment for one input.
///
/// Built only by [`crate::reconcile::reconcile`]; `primary_language` is
/// always `candidates[0]` and `confidence` its score (0 when empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub detected_script: String,
    pub primary_language: Option<LanguageCandidate>,
    pub candidates: Vec<LanguageCandidate>,
    pub confidence: f64,
    pub confidence_tier: Tier,
    pub suggestions: Vec<String>,
    pub stages: Vec<Stage>,
}

/// The outcome of one extraction call.
///
/// Failures are values: `success == false` with `error_detail` and
/// `error_kind` set, never an `Err` across the public surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection: Option<DetectionResult>,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl ExtractionResult {
    /// A completed extraction. Suggestions are attached only when detection
    /// ran and its tier is Medium or below.
    pub(crate) fn completed(
        text: String,
        language: String,
        detection: Option<DetectionResult>,
    ) -> Self {
        let (language_confidence, suggestions) = match &detection {
            Some(d) if d.confidence_tier.warrants_suggestions() => {
                (Some(d.confidence), d.suggestions.clone())
            }
            Some(d) => (Some(d.confidence), Vec::new()),
            None => (None, Vec::new()),
        };
        Self {
            success: true,
            text: Some(text),
            language: Some(language),
            language_confidence,
            detection,
            suggestions,
            error_detail: None,
            error_kind: None,
        }
    }

    /// A failed extraction. Any detection that did complete is kept for
    /// context, but text and language stay absent.
    pub(crate) fn failed(error: &OcrLangError, detection: Option<DetectionResult>) -> Self {
        Self {
            success: false,
            text: None,
            language: None,
            language_confidence: None,
            detection,
            suggestions: Vec::new(),
            error_detail: Some(error.to_string()),
            error_kind: Some(error.kind()),
        }
    }

    /// Convert into a `Result`, for callers that prefer `?`.
    pub fn into_result(self) -> Result<ExtractedText, OcrLangError> {
        match (self.success, self.text, self.language) {
            (true, Some(text), Some(language)) => Ok(ExtractedText { text, language }),
            _ => Err(match self.error_kind {
                Some(ErrorKind::NoLanguageDetected) => OcrLangError::NoLanguageDetected,
                Some(ErrorKind::InvalidInput) => OcrLangError::InvalidInput {
                    message: self.error_detail.unwrap_or_default(),
                },
                _ => OcrLangError::ExtractionEngine {
                    engine: "unknown".into(),
                    message: self.error_detail.unwrap_or_default(),
                },
            }),
        }
    }
}

/// Text and language of a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub language: String,
}
