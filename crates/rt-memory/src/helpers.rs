//! Helper functions implementing the memory instructions.
//!
//! These take and return the `i32` operands an interpreter works with, and translate
//! [`BoundsCheckError`]s into [`AccessError`]s naming the memory and address involved.

use crate::{AccessError, BoundsCheck, BoundsCheckError, Memory};

/// This implements the [`memory.size`] instruction.
///
/// [`memory.size`]: https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-memory
pub fn size<M: Memory + ?Sized>(mem: &M) -> i32 {
    mem.size() as i32
}

/// This implements the [`memory.grow`] instruction, returning `-1` on failure.
///
/// For more information, see the documentation for the [`Memory::grow()`] method.
///
/// [`memory.grow`]: https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-memory
pub fn grow<M: Memory + ?Sized>(mem: &M, delta: i32) -> i32 {
    mem.grow(delta as u32) as i32
}

/// Calculates the [*effective address*] of a memory instruction.
///
/// [*effective address*]: https://webassembly.github.io/spec/core/syntax/instructions.html#memory-instructions
#[inline]
fn effective_address(offset: u32, address: u32) -> BoundsCheck<u32> {
    address.checked_add(offset).ok_or(BoundsCheckError)
}

macro_rules! access_helpers {
    {
        $(
            $(#[$meta:meta])*
            $load:ident / $store:ident : $int:ty => $mem_load:ident / $mem_store:ident;
        )*
    } => {$(
        $(#[$meta])*
        pub fn $load<M: Memory + ?Sized>(
            mem: &M,
            memory: u32,
            offset: u32,
            addr: i32,
        ) -> Result<$int, AccessError> {
            let addr = addr as u32;
            effective_address(offset, addr)
                .and_then(|effective| mem.$mem_load(effective))
                .map_err(|BoundsCheckError| AccessError::new(memory, offset, addr))
        }

        $(#[$meta])*
        pub fn $store<M: Memory + ?Sized>(
            mem: &M,
            memory: u32,
            offset: u32,
            addr: i32,
            value: $int,
        ) -> Result<(), AccessError> {
            let addr = addr as u32;
            effective_address(offset, addr)
                .and_then(|effective| mem.$mem_store(effective, value))
                .map_err(|BoundsCheckError| AccessError::new(memory, offset, addr))
        }
    )*};
}

access_helpers! {
    /// Implements the `i32.load8_u` and `i32.store8` instructions, sign handling is left to the
    /// caller.
    i8_load / i8_store : i8 => i8_load / i8_store;
    /// Implements the [`i32.load` and `i32.store`] instructions.
    ///
    /// [`i32.load` and `i32.store`]: https://webassembly.github.io/spec/core/syntax/instructions.html#syntax-instr-memory
    i32_load / i32_store : i32 => i32_load / i32_store;
}
