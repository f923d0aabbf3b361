//! A minimal WebAssembly host API, shaped after the [JavaScript interface] for WebAssembly.
//!
//! Binary modules are decoded and validated with [`wasmparser`], then lowered into a small
//! instruction set that is interpreted directly. The interesting part is not the interpreter, but
//! the host-side [`Memory`] object: it exposes exactly one live [`ArrayBuffer`] at a time, and
//! every growth of the underlying linear memory, whether requested by the host or by a
//! `memory.grow` instruction, detaches that buffer and starts a new [`Generation`].
//!
//! [JavaScript interface]: https://webassembly.github.io/spec/js-api/
//! [`ArrayBuffer`]: memprobe_rt_buffer::ArrayBuffer
//! [`Generation`]: memprobe_rt_core::Generation

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]
#![deny(unreachable_pub)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]
#![deny(clippy::exhaustive_enums)]
#![deny(clippy::cast_possible_truncation)]

mod code;
mod error;
mod instance;
mod memory;
mod module;
mod realm;

pub use error::{Error, Result};
pub use instance::{Extern, Func, Imports, Instance};
pub use memory::{Memory, MemoryDescriptor};
pub use module::{ExportDescriptor, ExportKind, ImportDescriptor, Module};
pub use realm::Realm;

#[doc(no_inline)]
pub use memprobe_rt_buffer::ArrayBuffer;
#[doc(no_inline)]
pub use memprobe_rt_core::{Classify, ErrorClass};
