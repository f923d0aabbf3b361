//! Byte buffers that can be detached, modelled after ECMAScript [`ArrayBuffer`] objects.
//!
//! An [`ArrayBuffer`] either owns its bytes, or is a view of a linear memory handed out by a
//! memory object. Either kind can be *detached*, after which it reports a byte length of `0` and
//! every data access fails with an [`ErrorClass::TypeError`].
//!
//! Handles are cheap to clone, and clones refer to the same buffer. Identity is decided by the
//! buffer's [`Tag`], see [`ArrayBuffer::same()`].
//!
//! [`ArrayBuffer`]: https://tc39.es/ecma262/#sec-arraybuffer-objects

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]
#![deny(unreachable_pub)]
#![forbid(unsafe_code)]
#![deny(clippy::cast_possible_truncation)]
#![deny(clippy::exhaustive_enums)]
#![deny(clippy::alloc_instead_of_core)]
#![deny(clippy::std_instead_of_core)]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

mod buffer;
mod error;

pub use buffer::{ArrayBuffer, DetachKey, MAX_BYTE_LENGTH};
pub use error::BufferError;

#[doc(no_inline)]
pub use memprobe_rt_core::{ErrorClass, Tag};
