/// The `NearestNeighborLoop` type and its splice primitives (`split_loop`,
/// `join_loop`).
mod nearest_neighbor_loop;

/// The `LoopDecomposition` trait and its implementation for `PairTable`.
mod loop_decomposition_trait;

pub use nearest_neighbor_loop::*;
pub use loop_decomposition_trait::*;
