//! Detection reconciler: merge per-stage language signals into one ranking.
//!
//! Recognition stages report independently and may disagree (a
//! character-frequency pass can favour a different language than the OCR
//! engine's own confidence). Reconciliation fixes a single resolution order so
//! identical raw inputs always produce identical [`DetectionResult`]s:
//!
//! ```text
//! candidates ──▶ dedupe by code ──▶ stable sort (score desc) ──▶ primary + ≤4 suggestions
//!                (higher wins,        (ties: input order)          tier = classify(primary)
//!                 ties: earlier)
//! ```

use crate::catalog;
use crate::confidence::{classify, Tier};
use crate::error::OcrLangError;
use crate::output::{DetectionResult, LanguageCandidate, Stage};
use std::collections::HashMap;
use tracing::debug;

/// Upper bound on alternative languages offered to the caller.
pub const MAX_SUGGESTIONS: usize = 4;

/// Score used for ranking and reporting. NaN is treated as no evidence.
fn sanitise(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score
    }
}

/// Reconcile raw candidates into a [`DetectionResult`].
///
/// Codes are normalised (trimmed, lower-cased, `_` → `-`) before
/// deduplication, and the normalised form is what the result carries.
/// `script` and `stages` are carried through unchanged.
///
/// # Errors
/// [`OcrLangError::InvalidInput`] when a candidate has an empty code.
/// Scores are never rejected; NaN counts as 0 and out-of-range values are
/// clamped by the classifier.
pub fn reconcile(
    candidates: &[LanguageCandidate],
    script: &str,
    stages: &[Stage],
) -> Result<DetectionResult, OcrLangError> {
    // (input position, candidate) for each surviving code
    let mut kept: Vec<(usize, LanguageCandidate)> = Vec::with_capacity(candidates.len());
    let mut slot_by_code: HashMap<String, usize> = HashMap::new();

    for (position, candidate) in candidates.iter().enumerate() {
        let code = catalog::normalise(&candidate.code);
        if code.is_empty() {
            return Err(OcrLangError::invalid_input(format!(
                "language candidate at position {position} has no code"
            )));
        }
        let score = sanitise(candidate.confidence_score);
        match slot_by_code.get(&code) {
            Some(&slot) => {
                if score > kept[slot].1.confidence_score {
                    kept[slot] = (position, normalised(candidate, code, score));
                }
            }
            None => {
                slot_by_code.insert(code.clone(), kept.len());
                kept.push((position, normalised(candidate, code, score)));
            }
        }
    }

    kept.sort_by(|(pa, a), (pb, b)| {
        b.confidence_score
            .total_cmp(&a.confidence_score)
            .then(pa.cmp(pb))
    });

    let ranked: Vec<LanguageCandidate> = kept.into_iter().map(|(_, c)| c).collect();

    let (primary_language, confidence, confidence_tier) = match ranked.first() {
        Some(primary) => (
            Some(primary.clone()),
            primary.confidence_score,
            classify(primary.confidence_score),
        ),
        None => (None, 0.0, Tier::VeryLow),
    };

    let suggestions: Vec<String> = ranked
        .iter()
        .skip(1)
        .take(MAX_SUGGESTIONS)
        .map(|c| c.code.clone())
        .collect();

    debug!(
        "Reconciled {} raw candidates into {} (primary: {:?}, tier: {:?})",
        candidates.len(),
        ranked.len(),
        primary_language.as_ref().map(|c| c.code.as_str()),
        confidence_tier
    );

    Ok(DetectionResult {
        detected_script: script.to_string(),
        primary_language,
        candidates: ranked,
        confidence,
        confidence_tier,
        suggestions,
        stages: stages.to_vec(),
    })
}

fn normalised(candidate: &LanguageCandidate, code: String, score: f64) -> LanguageCandidate {
    LanguageCandidate {
        code,
        confidence_score: score,
        ..candidate.clone()
    }
}
