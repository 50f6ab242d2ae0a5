//! Renaming-invariant parameter naming for neural architectures.
//!
//! Parameters of a sequentially connected architecture are given "hashed names"
//! derived from their module descriptors and the hashed names of their predecessors,
//! so that two architectures sampled from a NAS search space with different raw
//! parameter names can still be aligned for weight transfer.
//!
//! ```
//! use archhash::arch::ArchSnapshot;
//! use archhash::canonical::project;
//! use archhash::hashing::hashed_names;
//!
//! # fn main() -> archhash::Result<()> {
//! let arch = ArchSnapshot::new()
//!     .module("layer1", "Linear(10,10)")
//!     .module("layer2", "Linear(10,10)")
//!     .parameter("layer1.weight")
//!     .parameter("layer1.bias")
//!     .parameter("layer2.weight");
//! let (graph, hashed) = hashed_names(&arch)?;
//! assert!(hashed.get("layer1.bias").unwrap().as_str().ends_with("_1"));
//!
//! let canonical = project(&graph, &hashed)?;
//! assert_eq!(canonical.len(), 2);
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs)]

#[macro_use]
extern crate trackable;

use trackable::error::TrackableError;

macro_rules! track_io {
    ($expr:expr) => {
        $expr.map_err(|e| {
            track!(trackable::error::ErrorKindExt::cause(
                crate::ErrorKind::Other,
                e
            ))
        })
    };
    ($expr:expr; $($value:expr),+) => {
        $expr.map_err(|e| {
            track!(
                trackable::error::ErrorKindExt::cause(crate::ErrorKind::Other, e);
                $($value),+
            )
        })
    };
}

macro_rules! track_invalid {
    ($expr:expr) => {
        $expr.map_err(|e| {
            track!(trackable::error::ErrorKindExt::cause(
                crate::ErrorKind::InvalidInput,
                e
            ))
        })
    };
    ($expr:expr; $($value:expr),+) => {
        $expr.map_err(|e| {
            track!(
                trackable::error::ErrorKindExt::cause(crate::ErrorKind::InvalidInput, e);
                $($value),+
            )
        })
    };
}

pub mod arch;
pub mod canonical;
pub mod graph;
pub mod hashing;
pub mod name;
mod record;
pub mod store;
pub mod transfer;

/// Possible error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input (JSON snapshot, binary encoding, checksum mismatch).
    InvalidInput,

    /// A predecessor had no hashed name when one was required.
    ///
    /// The parameter graph is not a sequential chain (e.g., it contains a cycle).
    MissingPredecessorHash,

    /// Other errors (e.g., I/O failures).
    Other,
}
impl trackable::error::ErrorKind for ErrorKind {}

/// This crate specific `Error` type.
pub type Error = TrackableError<ErrorKind>;

/// This crate specific `Result` type.
pub type Result<T> = std::result::Result<T, Error>;
