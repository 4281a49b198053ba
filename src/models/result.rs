//! Completion result wrapper

use crate::utils::error::{helpers::validation_error, GuardError, GuardResult};
use serde::{Deserialize, Serialize};

/// A completion response paired with its monetary cost and whether it passed
/// validation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLlmResult<R>")]
pub struct LlmResult<R = serde_json::Value> {
    response: R,
    total_cost: f64,
    validated: bool,
}

impl<R> LlmResult<R> {
    /// Rejects negative or non-finite costs
    pub fn new(response: R, total_cost: f64, validated: bool) -> GuardResult<Self> {
        if !total_cost.is_finite() || total_cost < 0.0 {
            return Err(validation_error(format!(
                "Total cost must be a non-negative amount, got {}",
                total_cost
            )));
        }
        Ok(Self {
            response,
            total_cost,
            validated,
        })
    }

    pub fn response(&self) -> &R {
        &self.response
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn validated(&self) -> bool {
        self.validated
    }

    /// Same result, flagged as having passed validation
    pub fn mark_validated(self) -> Self {
        Self {
            validated: true,
            ..self
        }
    }

    pub fn into_response(self) -> R {
        self.response
    }
}

/// Wire form, checked through `LlmResult::new` on the way in
#[derive(Deserialize)]
struct RawLlmResult<R> {
    response: R,
    total_cost: f64,
    validated: bool,
}

impl<R> TryFrom<RawLlmResult<R>> for LlmResult<R> {
    type Error = GuardError;

    fn try_from(raw: RawLlmResult<R>) -> GuardResult<Self> {
        Self::new(raw.response, raw.total_cost, raw.validated)
    }
}
