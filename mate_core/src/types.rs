//! Core domain types for the Mate caffeine tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Consumption events recorded in the ledger
//! - Threshold states derived from intake and residual caffeine
//! - Summaries handed to the presentation layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Share of the daily maximum above which intake counts as approaching it.
pub const APPROACHING_RATIO: f64 = 0.8;

// ============================================================================
// Ledger Types
// ============================================================================

/// A single recorded drink
///
/// Created by [`crate::Ledger::add_event`] and never modified afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionEvent {
    pub occurred_at: DateTime<Utc>,
    pub dose_mg: f64,
}

impl ConsumptionEvent {
    pub fn new(occurred_at: DateTime<Utc>, dose_mg: f64) -> Self {
        Self {
            occurred_at,
            dose_mg,
        }
    }
}

// ============================================================================
// Derived Types
// ============================================================================

/// How close the user is to the recommended daily maximum
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdState {
    Normal,
    Approaching,
    Exceeded,
}

impl ThresholdState {
    /// Classify today's raw intake and the current residual against the maximum
    ///
    /// Either quantity alone is enough to move the state up. There is no
    /// hysteresis: values hovering at the 80% line may flip on every refresh.
    pub fn classify(total_today_mg: f64, residual_mg: f64, max_daily_mg: f64) -> Self {
        if total_today_mg > max_daily_mg || residual_mg > max_daily_mg {
            ThresholdState::Exceeded
        } else if total_today_mg > max_daily_mg * APPROACHING_RATIO
            || residual_mg > max_daily_mg * APPROACHING_RATIO
        {
            ThresholdState::Approaching
        } else {
            ThresholdState::Normal
        }
    }

    /// Warning line shown to the user, if any
    pub fn warning(&self) -> Option<&'static str> {
        match self {
            ThresholdState::Normal => None,
            ThresholdState::Approaching => Some("Caution: you are approaching the limit."),
            ThresholdState::Exceeded => Some("WARNING: recommended daily maximum exceeded!"),
        }
    }
}

/// Every derived quantity of the ledger, evaluated for one instant
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IntakeSummary {
    pub evaluated_at: DateTime<Utc>,
    pub event_count_today: usize,
    pub total_today_mg: f64,
    pub remaining_allowance_mg: f64,
    pub residual_mg: f64,
    pub state: ThresholdState,
}
