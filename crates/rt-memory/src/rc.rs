//! Implements the [`Memory`] trait for [`Rc`].

use crate::{BoundsCheck, Memory};
use alloc::rc::Rc;

impl<M: Memory + ?Sized> Memory for Rc<M> {
    fn size(&self) -> u32 {
        M::size(self)
    }

    fn maximum(&self) -> u32 {
        M::maximum(self)
    }

    fn grow(&self, delta: u32) -> u32 {
        M::grow(self, delta)
    }

    fn copy_to_slice(&self, addr: u32, dst: &mut [u8]) -> BoundsCheck<()> {
        M::copy_to_slice(self, addr, dst)
    }

    fn copy_from_slice(&self, addr: u32, src: &[u8]) -> BoundsCheck<()> {
        M::copy_from_slice(self, addr, src)
    }

    fn i8_load(&self, addr: u32) -> BoundsCheck<i8> {
        M::i8_load(self, addr)
    }

    fn i32_load(&self, addr: u32) -> BoundsCheck<i32> {
        M::i32_load(self, addr)
    }

    fn i8_store(&self, addr: u32, value: i8) -> BoundsCheck<()> {
        M::i8_store(self, addr, value)
    }

    fn i32_store(&self, addr: u32, value: i32) -> BoundsCheck<()> {
        M::i32_store(self, addr, value)
    }
}
