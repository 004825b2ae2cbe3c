//! Errors for ff_structure.
//!
//! NOTE: We communicate errors based on usize indexing, because errors
//! typically occur when we have to cast between u16 <-> usize anyway.

use std::fmt;

#[derive(Debug)]
pub enum StructureError {
    InvalidToken(String, String, usize),
    UnmatchedOpen(usize),
    UnmatchedClose(usize),
}

impl fmt::Display for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureError::UnmatchedOpen(i) => {
                write!(f, "Unmatched '(' at position {}", i)
            }
            StructureError::UnmatchedClose(i) => {
                write!(f, "Unmatched ')' at position {}", i)
            }
            StructureError::InvalidToken(tok, src, i) => {
                write!(f, "Invalid {} in {} at position {}", tok, src, i)
            }
        }
    }
}

impl std::error::Error for StructureError {}
