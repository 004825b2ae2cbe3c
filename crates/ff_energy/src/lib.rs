/// Shipping parameter files with the crate.
pub mod parameters;

/// Parameter file parsing & corresponding energy tables.
pub mod nn_parsing;

/// Various nearest neighbor model implementations. 
mod nn_models;

/// Base, NucleotideVec, PairTypeRNA, ....
mod nucleotides;

/// Everything for loop decomosition! 
mod loop_decomposition;

/// The energy model trait.
mod energy_model;

pub use nucleotides::*;
pub use loop_decomposition::*;
pub use energy_model::*;
pub use nn_models::*;



