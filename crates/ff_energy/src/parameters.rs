//! Shipping parameter files with the crate.

/// The bundled default parameter file, synthesized in the structural shape
/// of a Turner-2004-style `.par` file (block form). Values are plausible
/// but not a transcription of any published parameter set; callers who need
/// authoritative thermodynamics should supply their own file via
/// [`crate::NearestNeighborTables::from_parameter_file`].
pub const DEFAULT_PARAMETER_FILE: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/params/rna_turner2004.par"));
