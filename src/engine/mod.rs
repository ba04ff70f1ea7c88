//! External engine seams and their built-in adapters.
//!
//! The orchestrator talks to exactly two black boxes:
//!
//! ```text
//!                 ┌──────────────────────┐
//!  InputFile ───▶ │ RecognitionEngine    │ ──▶ Recognition { script, candidates, stages }
//!                 └──────────────────────┘
//!                 ┌──────────────────────┐
//!  InputFile ───▶ │ TextExtractor        │ ──▶ String
//!  + language     └──────────────────────┘
//! ```
//!
//! 1. [`input`]   — canonicalise a path, URL or byte buffer into an [`InputFile`]
//! 2. [`encode`]  — decode, bound and base64-wrap images for the vision model
//! 3. [`vision`]  — both traits backed by a vision LLM (`edgequake-llm`)
//! 4. [`remote`]  — both traits backed by the toolkit's HTTP API
//! 5. [`postprocess`] — deterministic cleanup of model output
//!
//! Adapters never retry. They enforce their own call timeout and report every
//! failure as an [`EngineError`].

pub mod encode;
pub mod input;
pub mod postprocess;
pub mod remote;
pub mod vision;

use crate::error::EngineError;
use crate::output::{LanguageCandidate, Stage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use input::{FileKind, InputFile};
pub use remote::RemoteEngine;
pub use vision::VisionEngine;

/// Raw signals from one recognition run, before reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recognition {
    /// Writing system label, e.g. "Latin", "Cyrillic", "Han".
    #[serde(default, alias = "script")]
    pub detected_script: String,
    /// Per-language scores, in the order the stages produced them.
    #[serde(default)]
    pub candidates: Vec<LanguageCandidate>,
    /// Stage outcomes, earliest first.
    #[serde(default)]
    pub stages: Vec<Stage>,
}

/// Produces per-stage language signals for a file.
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Short identifier used in logs and error messages.
    fn name(&self) -> &str;

    async fn recognize(&self, file: &InputFile) -> Result<Recognition, EngineError>;
}

/// Extracts text from a file in a given language.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    fn name(&self) -> &str;

    async fn extract_text(&self, file: &InputFile, language: &str) -> Result<String, EngineError>;
}
