//! Regression probes for detachable buffers and WebAssembly memory growth.
//!
//! A [`Probe`] is a small, stateless check: it sets up a buffer or a module instance, performs
//! an operation that changes or invalidates buffer state, and compares what it observes against
//! expected literals using the functions in the [`assert`] module. Probes declare the
//! [`Directive`]s they need, and only see the engine features those directives enable through
//! their [`Context`].

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]
#![deny(unreachable_pub)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]
#![deny(clippy::exhaustive_enums)]
#![deny(clippy::cast_possible_truncation)]

pub mod assert;
mod context;
mod debug;
mod error;
mod options;
mod probe;
pub mod probes;
mod report;

pub use assert::AssertionError;
pub use context::Context;
pub use debug::Debug;
pub use error::{DirectiveError, ProbeError};
pub use options::{Directive, Options, UnknownDirectiveError};
pub use probe::{find, run, Probe, PROBES};
pub use report::{run_all, Report};
