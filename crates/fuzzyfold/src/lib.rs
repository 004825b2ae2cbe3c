//! # fuzzyfold
//!
//! The main entry point for the fuzzyfold nucleic acid folding package, with
//! interfaces to multiple crates that are organized as a workspace. At this
//! level, you can also find argument parsers for the binaries shipped with the
//! fuzzyfold package.
//!
//! This crate re-exports the main functionality from its submodules.


/// Exposing fuzzyfold::structure. A collection of practical data structures
/// for RNA structure representations. 
pub mod structure {
    pub use ::ff_structure::*;
}

/// Exposing fuzzyfold::energy. Handling of nucleotide sequences, nearest
/// neighbor loop decompositions and free energy evaluation models.
pub mod energy {
    pub use ::ff_energy::*;
}

/// Exposing fuzzyfold::kinetics. The main stochastic simulation framework,
/// introducing rate models, loop structures and the partial-sum-tree driven
/// stochastic simulator.
pub mod kinetics {
    pub use ::ff_kinetics::*;
}

/// Various flavors of handling sequence/structure input.
pub mod input_parsers;

/// Exposing the currently supported parameters of fuzzyfold's energy models.
pub mod energy_parsers;

/// Exposing the currently supported parameters of fuzzyfold's rate models and simulation parameters.
pub mod kinetics_parsers;

/// Map a binary's top-level error back to the process exit code: 2 for
/// malformed sequence/structure input, 3 for a bad parameter file, 4 for
/// the simulation engine's own bookkeeping going inconsistent, 1 for
/// anything else (including a clap usage error, handled separately by
/// each binary before this function is ever consulted).
pub fn exit_code_for_error(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<ff_structure::StructureError>().is_some() {
        return 2;
    }
    if err.downcast_ref::<ff_energy::SequenceError>().is_some() {
        return 2;
    }
    if err.downcast_ref::<ff_energy::ParamError>().is_some() {
        return 3;
    }
    if err.downcast_ref::<ff_kinetics::EngineError>().is_some() {
        return 4;
    }
    1
}

