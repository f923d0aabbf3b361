//! Implementation of WebAssembly linear memory for `memprobe`.
//!
//! Unlike a plain byte vector, a linear memory can report every successful [`grow`] to a
//! [`GrowCallback`], even one that adds no pages. Host objects wrapping the memory rely on this
//! to invalidate the buffers they previously handed out.
//!
//! [`grow`]: Memory::grow()

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

#[cfg(feature = "alloc")]
extern crate alloc;

mod error;
mod helpers;

#[cfg(feature = "alloc")]
mod heap;
#[cfg(feature = "alloc")]
mod rc;

pub use error::{AccessError, AllocationError};
pub use helpers::*;

#[cfg(feature = "alloc")]
pub use heap::{GrowCallback, GrowEvent, HeapMemory};

#[doc(no_inline)]
pub use memprobe_rt_core::{BoundsCheck, BoundsCheckError};

/// The size, in bytes, of a WebAssembly linear memory [page].
///
/// [page]: https://webassembly.github.io/spec/core/exec/runtime.html#page-size
pub const PAGE_SIZE: u32 = 65536;

/// The maximum number of [pages] a 32-bit linear memory can have.
///
/// [pages]: PAGE_SIZE
pub const MAX_PAGE_COUNT: u32 = 65536;

/// Value returned by [`Memory::grow()`] on failure, which is `-1` when interpreted as an `i32`.
pub const GROW_FAILED: u32 = u32::MAX;

/// Converts a number of [pages] into a length in bytes.
///
/// [pages]: PAGE_SIZE
pub const fn pages_to_bytes(pages: u32) -> u64 {
    pages as u64 * PAGE_SIZE as u64
}

macro_rules! unaligned_integer_accesses {
    {
        $($int:ty : $load:ident / $store:ident;)*
    } => {$(
        fn $load<M: Memory + ?Sized>(mem: &M, addr: u32) -> BoundsCheck<$int> {
            let mut dst = [0u8; core::mem::size_of::<$int>()];
            mem.copy_to_slice(addr, &mut dst)?;
            Ok(<$int>::from_le_bytes(dst))
        }

        fn $store<M: Memory + ?Sized>(mem: &M, addr: u32, value: $int) -> BoundsCheck<()> {
            mem.copy_from_slice(addr, &value.to_le_bytes())
        }
    )*};
}

unaligned_integer_accesses! {
    i32 : unaligned_i32_load / unaligned_i32_store;
}

/// Trait for implementations of [WebAssembly linear memory].
///
/// [WebAssembly linear memory]: https://webassembly.github.io/spec/core/syntax/modules.html#memories
pub trait Memory {
    /// Returns the size of the linear memory, in terms of the [`PAGE_SIZE`].
    fn size(&self) -> u32;

    /// Gets the maximum number of pages that this linear memory can have.
    fn maximum(&self) -> u32;

    /// Increases the size of the linear memory by the specified number of [pages], and returns
    /// the old number of pages.
    ///
    /// A `delta` of `0` is still a successful growth.
    ///
    /// # Errors
    ///
    /// If the size of the memory could not be increased, then [`GROW_FAILED`] is returned.
    ///
    /// [pages]: PAGE_SIZE
    fn grow(&self, delta: u32) -> u32;

    /// Copies bytes from linear memory starting at the specified address into the given slice.
    ///
    /// # Errors
    ///
    /// Returns an error if the range of addresses `addr..(addr + dst.len())` is not in bounds.
    fn copy_to_slice(&self, addr: u32, dst: &mut [u8]) -> BoundsCheck<()>;

    /// Copies bytes from the given slice into linear memory starting at the specified address.
    ///
    /// # Errors
    ///
    /// Returns an error if the range of addresses `addr..(addr + src.len())` is not in bounds.
    fn copy_from_slice(&self, addr: u32, src: &[u8]) -> BoundsCheck<()>;

    /// Loads the value of the byte stored at the given address.
    fn i8_load(&self, addr: u32) -> BoundsCheck<i8> {
        let mut dst = 0u8;
        self.copy_to_slice(addr, core::slice::from_mut(&mut dst))?;
        Ok(dst as i8)
    }

    /// Loads a 32-bit integer from the given address.
    fn i32_load(&self, addr: u32) -> BoundsCheck<i32> {
        unaligned_i32_load(self, addr)
    }

    /// Writes into the byte at the given address.
    fn i8_store(&self, addr: u32, value: i8) -> BoundsCheck<()> {
        self.copy_from_slice(addr, &[value as u8])
    }

    /// Stores a potentially unaligned 32-bit integer into the given address.
    fn i32_store(&self, addr: u32, value: i32) -> BoundsCheck<()> {
        unaligned_i32_store(self, addr, value)
    }
}
