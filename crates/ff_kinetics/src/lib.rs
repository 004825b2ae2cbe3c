mod loop_structure;
mod partial_sum;
mod nucleation;
mod prng;
mod rate_model;
mod stochastic_simulation;

pub use loop_structure::*;
pub use partial_sum::PartialSumIndex;
pub use nucleation::{pnuc, NucleationTable};
pub use prng::MinimalStandardRng;
pub use rate_model::*;
pub use stochastic_simulation::*;

use std::fmt;

/// Errors that indicate the simulation engine's own bookkeeping has
/// become inconsistent, as opposed to a malformed input. These should
/// never occur; callers that hit one should treat the run as invalid.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    InternalInvariantViolated(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InternalInvariantViolated(msg) => {
                write!(f, "internal invariant violated: {msg}")
            }
        }
    }
}

impl std::error::Error for EngineError {}
