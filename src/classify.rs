//! Threshold classification of metric values.
//!
//! Lower bounds are closed: a value sitting exactly on a threshold belongs to the
//! higher tier. NaN fails every comparison and lands in the lowest tier.

use serde::Serialize;

use crate::i18n::Messages;

const VISUAL_HIGH: f64 = 0.7;
const VISUAL_MEDIUM: f64 = 0.4;

const STATUS_EXCELLENT: f64 = 0.8;
const STATUS_GOOD: f64 = 0.6;
const STATUS_FAIR: f64 = 0.4;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualTier {
    High,
    Medium,
    Low,
}

impl VisualTier {
    pub fn css_class(self) -> &'static str {
        match self {
            Self::High => "metric-high",
            Self::Medium => "metric-medium",
            Self::Low => "metric-low",
        }
    }

    pub fn label(self, messages: &Messages) -> &'static str {
        match self {
            Self::High => messages.tier_high,
            Self::Medium => messages.tier_medium,
            Self::Low => messages.tier_low,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTier {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl StatusTier {
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Excellent => "status-excellent",
            Self::Good => "status-good",
            Self::Fair => "status-fair",
            Self::Poor => "status-poor",
        }
    }

    pub fn label(self, messages: &Messages) -> &'static str {
        match self {
            Self::Excellent => messages.status_excellent,
            Self::Good => messages.status_good,
            Self::Fair => messages.status_fair,
            Self::Poor => messages.status_poor,
        }
    }
}

pub fn visual_tier(value: f64) -> VisualTier {
    if value >= VISUAL_HIGH {
        VisualTier::High
    } else if value >= VISUAL_MEDIUM {
        VisualTier::Medium
    } else {
        VisualTier::Low
    }
}

/// Row status for a query; only ever fed the query's F-measure.
pub fn status_tier(value: f64) -> StatusTier {
    if value >= STATUS_EXCELLENT {
        StatusTier::Excellent
    } else if value >= STATUS_GOOD {
        StatusTier::Good
    } else if value >= STATUS_FAIR {
        StatusTier::Fair
    } else {
        StatusTier::Poor
    }
}
