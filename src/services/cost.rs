//! Completion cost computation

use crate::config::ModelCatalog;
use crate::models::Usage;
use tracing::debug;

/// Monetary cost of one completion from its token usage.
///
/// Models without catalog prices cost nothing rather than failing the call.
pub fn completion_cost(catalog: &ModelCatalog, model: &str, usage: &Usage) -> f64 {
    match catalog.get(model) {
        Some(info) => {
            f64::from(usage.prompt_tokens) * info.input_cost_per_token
                + f64::from(usage.completion_tokens) * info.output_cost_per_token
        }
        None => {
            debug!("No pricing for model {}, cost recorded as 0", model);
            0.0
        }
    }
}
