use crate::{AllocationError, BoundsCheck, BoundsCheckError, Memory, MAX_PAGE_COUNT};
use alloc::{rc::Rc, vec::Vec};
use core::cell::RefCell;

/// Describes a successful call to [`Memory::grow()`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct GrowEvent {
    old_size: u32,
    new_size: u32,
}

impl GrowEvent {
    /// The number of pages before the memory grew.
    pub fn old_size(&self) -> u32 {
        self.old_size
    }

    /// The number of pages after the memory grew.
    ///
    /// This is equal to the [`old_size()`] if the memory grew by `0` pages.
    ///
    /// [`old_size()`]: GrowEvent::old_size()
    pub fn new_size(&self) -> u32 {
        self.new_size
    }
}

/// Trait for receiving notifications whenever a [`HeapMemory`] grows.
///
/// The callback is invoked after every successful growth, including growth by `0` pages, and
/// after the new size is visible through [`Memory::size()`]. It is not invoked when growth fails.
///
/// One callback may be shared by many memories, so it is passed the memory that grew.
pub trait GrowCallback {
    /// Called after the `memory` grew.
    fn memory_grown(&self, memory: &HeapMemory, event: &GrowEvent);
}

impl<F: Fn(&HeapMemory, &GrowEvent)> GrowCallback for F {
    fn memory_grown(&self, memory: &HeapMemory, event: &GrowEvent) {
        self(memory, event)
    }
}

/// A [`Memory`] implementation backed by a heap allocation.
pub struct HeapMemory {
    /// The contents of the linear memory.
    ///
    /// The length is always a multiple of the [`crate::PAGE_SIZE`].
    bytes: RefCell<Vec<u8>>,
    /// The maximum number of pages this linear memory can have.
    limit: u32,
    callback: RefCell<Option<Rc<dyn GrowCallback>>>,
}

impl Default for HeapMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapMemory {
    /// Allocates an empty linear memory.
    pub const fn new() -> Self {
        Self {
            bytes: RefCell::new(Vec::new()),
            limit: MAX_PAGE_COUNT,
            callback: RefCell::new(None),
        }
    }

    /// Allocates an empty linear memory with a maximum number of allowed pages.
    ///
    /// # Errors
    ///
    /// Returns an error if the `limit` is greater than the [`MAX_PAGE_COUNT`].
    pub fn with_maximum(limit: u32) -> Result<Self, AllocationError> {
        if limit <= MAX_PAGE_COUNT {
            let mut mem = Self::new();
            mem.limit = limit;
            Ok(mem)
        } else {
            Err(AllocationError { size: limit })
        }
    }

    /// Allocates a linear memory, with a minimum and maximum number of pages.
    ///
    /// # Errors
    ///
    /// Returns an error if the `minimum` number of pages could not be allocated, or if the
    /// `maximum` is greater than the [`MAX_PAGE_COUNT`].
    pub fn with_limits(minimum: u32, maximum: u32) -> Result<Self, AllocationError> {
        let mem = Self::with_maximum(maximum)?;
        mem.try_grow(minimum)?;
        Ok(mem)
    }

    /// Returns the size of the linear memory, in bytes.
    pub fn len(&self) -> usize {
        self.bytes.borrow().len()
    }

    /// Returns `true` if the memory has a size of `0`.
    pub fn is_empty(&self) -> bool {
        self.bytes.borrow().is_empty()
    }

    /// Registers the callback invoked on every successful growth, returning the previous one.
    pub fn set_grow_callback(
        &self,
        callback: Rc<dyn GrowCallback>,
    ) -> Option<Rc<dyn GrowCallback>> {
        self.callback.replace(Some(callback))
    }

    /// Attempts to increase the size of the linear memory by the given number of pages,
    /// returning the old number of pages.
    ///
    /// # Errors
    ///
    /// Returns an error if the new size exceeds the maximum, or if the pages could not be
    /// allocated. The memory is left unchanged in that case, and the grow callback is not
    /// invoked.
    pub fn try_grow(&self, delta: u32) -> Result<u32, AllocationError> {
        let error = || AllocationError { size: delta };

        let old_size = self.size();
        let new_size = match old_size.checked_add(delta) {
            Some(sum) if sum <= self.limit => sum,
            _ => return Err(error()), // Size exceeded or overflow occurred
        };

        let new_len = usize::try_from(crate::pages_to_bytes(new_size)).map_err(|_| error())?;

        {
            let mut bytes = self.bytes.borrow_mut();
            let additional = new_len - bytes.len();
            bytes.try_reserve_exact(additional).map_err(|_| error())?;
            bytes.resize(new_len, 0);
        }

        log::trace!("linear memory grew from {old_size} to {new_size} pages");

        // Cloned so the callback is free to inspect or replace itself.
        let callback = self.callback.borrow().clone();
        if let Some(callback) = callback {
            callback.memory_grown(self, &GrowEvent { old_size, new_size });
        }

        Ok(old_size)
    }
}

fn slice_into(memory: &[u8], address: u32, length: usize) -> BoundsCheck<core::ops::Range<usize>> {
    let start = usize::try_from(address).map_err(|_| BoundsCheckError)?;
    let end = start.checked_add(length).ok_or(BoundsCheckError)?;
    if end <= memory.len() {
        Ok(start..end)
    } else {
        Err(BoundsCheckError)
    }
}

impl Memory for HeapMemory {
    fn maximum(&self) -> u32 {
        self.limit
    }

    fn size(&self) -> u32 {
        // `len()` never exceeds `MAX_PAGE_COUNT * PAGE_SIZE`.
        #[allow(clippy::cast_possible_truncation)]
        {
            (self.len() / (crate::PAGE_SIZE as usize)) as u32
        }
    }

    fn grow(&self, delta: u32) -> u32 {
        self.try_grow(delta).unwrap_or(crate::GROW_FAILED)
    }

    fn copy_to_slice(&self, addr: u32, dst: &mut [u8]) -> BoundsCheck<()> {
        let bytes = self.bytes.borrow();
        let range = slice_into(&bytes, addr, dst.len())?;
        dst.copy_from_slice(&bytes[range]);
        Ok(())
    }

    fn copy_from_slice(&self, addr: u32, src: &[u8]) -> BoundsCheck<()> {
        let mut bytes = self.bytes.borrow_mut();
        let range = slice_into(&bytes, addr, src.len())?;
        bytes[range].copy_from_slice(src);
        Ok(())
    }
}

impl core::fmt::Debug for HeapMemory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HeapMemory")
            .field("size", &self.size())
            .field("maximum", &self.maximum())
            .field("has_grow_callback", &self.callback.borrow().is_some())
            .finish()
    }
}
