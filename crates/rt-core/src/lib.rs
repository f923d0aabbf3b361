//! Provides the foundation shared by the `memprobe-rt-*` crates, which model the engine-side
//! objects that the probes in `memprobe-harness` observe.
//!
//! This crate contains the error classification used by every engine error, the bounds-check
//! error shared by linear memories and buffers, limits matching, and the generation-tagged
//! identity used to tell a live buffer apart from a stale one.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]
#![deny(unreachable_pub)]
#![forbid(unsafe_code)]
#![deny(clippy::cast_possible_truncation)]
#![deny(clippy::exhaustive_enums)]
#![deny(clippy::exhaustive_structs)]
#![deny(clippy::std_instead_of_core)]

#[cfg(feature = "std")]
extern crate std;

pub mod class;
pub mod identity;
pub mod limit;

pub use class::{Classify, ErrorClass};
pub use identity::{Generation, SourceId, Tag};

/// Error type used when a linear memory address or buffer offset was out of bounds.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[allow(clippy::exhaustive_structs)]
pub struct BoundsCheckError;

impl core::fmt::Display for BoundsCheckError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("out-of-bounds address")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BoundsCheckError {}

impl Classify for BoundsCheckError {
    fn class(&self) -> ErrorClass {
        ErrorClass::RangeError
    }
}

/// Result type used for functions that need to indicate if an address or offset is out of
/// bounds.
pub type BoundsCheck<T> = core::result::Result<T, BoundsCheckError>;
