//! Confidence classifier: the single place numeric scores become tiers.
//!
//! Every threshold comparison in the crate goes through [`classify`], so the
//! four tiers partition `[0, 100]` everywhere they are used.

use serde::{Deserialize, Serialize};

/// Coarse confidence bucket derived from a 0–100 score.
///
/// | Tier | Lower bound (inclusive) |
/// |------|------|
/// | `High` | 80 |
/// | `Medium` | 50 |
/// | `Low` | 30 |
/// | `VeryLow` | 0 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tier {
    VeryLow,
    Low,
    Medium,
    High,
}

impl Tier {
    /// All tiers, highest first.
    pub const ALL: [Tier; 4] = [Tier::High, Tier::Medium, Tier::Low, Tier::VeryLow];

    /// Inclusive lower bound of the tier's score range.
    pub fn lower_bound(self) -> f64 {
        match self {
            Tier::High => 80.0,
            Tier::Medium => 50.0,
            Tier::Low => 30.0,
            Tier::VeryLow => 0.0,
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Tier::High => "High",
            Tier::Medium => "Medium",
            Tier::Low => "Low",
            Tier::VeryLow => "Very Low",
        }
    }

    /// Whether an automatic choice at this tier should come with
    /// alternative-language suggestions.
    pub fn warrants_suggestions(self) -> bool {
        self <= Tier::Medium
    }
}

/// Presentation metadata for a tier. Carries no decision logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierDescriptor {
    pub label: &'static str,
    pub color_hint: &'static str,
}

/// Map a score to its tier.
///
/// Scores below 0 (and NaN) are `VeryLow`; scores above 100 are `High`.
pub fn classify(score: f64) -> Tier {
    if score >= Tier::High.lower_bound() {
        Tier::High
    } else if score >= Tier::Medium.lower_bound() {
        Tier::Medium
    } else if score >= Tier::Low.lower_bound() {
        Tier::Low
    } else {
        Tier::VeryLow
    }
}

/// Label and colour hint for rendering a tier.
pub fn describe(tier: Tier) -> TierDescriptor {
    let color_hint = match tier {
        Tier::High => "green",
        Tier::Medium => "yellow",
        Tier::Low => "orange",
        Tier::VeryLow => "red",
    };
    TierDescriptor {
        label: tier.label(),
        color_hint,
    }
}
