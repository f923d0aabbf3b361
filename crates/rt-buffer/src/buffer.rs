use crate::BufferError;
use alloc::{rc::Rc, vec::Vec};
use core::cell::RefCell;
use memprobe_rt_core::{SourceId, Tag};
use memprobe_rt_memory::{HeapMemory, Memory};

/// The largest byte length an [`ArrayBuffer`] can have.
pub const MAX_BYTE_LENGTH: u64 =
    memprobe_rt_memory::pages_to_bytes(memprobe_rt_memory::MAX_PAGE_COUNT);

/// A key required to [`detach()`] a buffer.
///
/// Buffers handed out by a memory object carry that object's key, so only the memory object can
/// detach them.
///
/// [`detach()`]: ArrayBuffer::detach()
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct DetachKey(SourceId);

impl DetachKey {
    /// Creates a new key, distinct from every other key.
    pub fn new() -> Self {
        Self(SourceId::fresh())
    }
}

impl Default for DetachKey {
    fn default() -> Self {
        Self::new()
    }
}

enum Contents {
    Owned(Vec<u8>),
    /// A view of the first `len` bytes of a linear memory.
    Memory {
        memory: Rc<HeapMemory>,
        len: usize,
    },
    Detached,
}

struct Inner {
    tag: Tag,
    key: Option<DetachKey>,
    contents: RefCell<Contents>,
}

/// A handle to a detachable byte buffer.
///
/// Cloning the handle does not copy the buffer.
#[derive(Clone)]
pub struct ArrayBuffer(Rc<Inner>);

fn allocate_zeroed(length: usize) -> Result<Vec<u8>, BufferError> {
    let error = || BufferError::TooLarge {
        length: length as u64,
    };

    if length as u64 > MAX_BYTE_LENGTH {
        return Err(error());
    }

    let mut bytes = Vec::new();
    bytes.try_reserve_exact(length).map_err(|_| error())?;
    bytes.resize(length, 0);
    Ok(bytes)
}

/// Resolves a relative index the way `ArrayBuffer.prototype.slice` does.
///
/// Negative indices count back from the `length`, and the result is clamped to `0..=length`.
fn resolve_relative_index(index: Option<i64>, default: usize, length: usize) -> usize {
    match index {
        None => default,
        Some(index) if index < 0 => {
            let back = usize::try_from(index.unsigned_abs()).unwrap_or(usize::MAX);
            length.saturating_sub(back)
        }
        Some(index) => usize::try_from(index).map_or(length, |index| index.min(length)),
    }
}

fn check_range(offset: usize, length: usize, byte_length: usize) -> Result<(), BufferError> {
    match offset.checked_add(length) {
        Some(end) if end <= byte_length => Ok(()),
        _ => Err(BufferError::OutOfBounds {
            offset,
            length,
            byte_length,
        }),
    }
}

impl ArrayBuffer {
    fn with_contents(tag: Tag, key: Option<DetachKey>, contents: Contents) -> Self {
        Self(Rc::new(Inner {
            tag,
            key,
            contents: RefCell::new(contents),
        }))
    }

    /// Allocates a zero-filled buffer of the given byte length.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::TooLarge`] if the length exceeds the [`MAX_BYTE_LENGTH`] or could
    /// not be allocated.
    pub fn new(byte_length: usize) -> Result<Self, BufferError> {
        let bytes = allocate_zeroed(byte_length)?;
        Ok(Self::with_contents(Tag::unique(), None, Contents::Owned(bytes)))
    }

    /// Creates a buffer that takes ownership of the given bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::TooLarge`] if the length exceeds the [`MAX_BYTE_LENGTH`].
    pub fn from_vec(bytes: Vec<u8>) -> Result<Self, BufferError> {
        if bytes.len() as u64 > MAX_BYTE_LENGTH {
            return Err(BufferError::TooLarge {
                length: bytes.len() as u64,
            });
        }

        Ok(Self::with_contents(Tag::unique(), None, Contents::Owned(bytes)))
    }

    /// Creates a buffer viewing the current contents of a linear memory.
    ///
    /// The byte length is fixed to the size of the memory at the time of the call. The buffer can
    /// only be detached with the given `key`.
    pub fn for_memory(memory: Rc<HeapMemory>, tag: Tag, key: DetachKey) -> Self {
        let len = memory.len();
        Self::with_contents(tag, Some(key), Contents::Memory { memory, len })
    }

    /// Gets the identity of this buffer.
    pub fn tag(&self) -> Tag {
        self.0.tag
    }

    /// Returns `true` if both handles refer to the same buffer.
    ///
    /// This compares [`Tag`]s, so a buffer handed out by a memory object is never the same as
    /// one it handed out after growing.
    pub fn same(&self, other: &Self) -> bool {
        self.0.tag == other.0.tag
    }

    /// Returns `true` if the buffer was detached.
    pub fn is_detached(&self) -> bool {
        matches!(*self.0.contents.borrow(), Contents::Detached)
    }

    /// Returns `true` if this buffer is a view of linear memory.
    pub fn is_memory_backed(&self) -> bool {
        self.0.key.is_some()
    }

    /// Gets the length of the buffer, in bytes.
    ///
    /// Returns `0` if the buffer was detached.
    pub fn byte_length(&self) -> usize {
        match &*self.0.contents.borrow() {
            Contents::Owned(bytes) => bytes.len(),
            Contents::Memory { len, .. } => *len,
            Contents::Detached => 0,
        }
    }

    /// Detaches the buffer, releasing its contents.
    ///
    /// Detaching a buffer that is already detached does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::DetachKeyMismatch`] if the `key` is not this buffer's detach key.
    pub fn detach(&self, key: Option<&DetachKey>) -> Result<(), BufferError> {
        if self.0.key.as_ref() != key {
            return Err(BufferError::DetachKeyMismatch);
        }

        let previous = self.0.contents.replace(Contents::Detached);
        if !matches!(previous, Contents::Detached) {
            log::debug!("detached buffer {}", self.0.tag);
        }

        Ok(())
    }

    /// Copies bytes starting at the given offset into `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Detached`] if the buffer was detached, or
    /// [`BufferError::OutOfBounds`] if the range does not fit in the buffer.
    pub fn read(&self, offset: usize, dst: &mut [u8]) -> Result<(), BufferError> {
        match &*self.0.contents.borrow() {
            Contents::Detached => Err(BufferError::Detached),
            Contents::Owned(bytes) => {
                check_range(offset, dst.len(), bytes.len())?;
                dst.copy_from_slice(&bytes[offset..offset + dst.len()]);
                Ok(())
            }
            Contents::Memory { memory, len } => {
                check_range(offset, dst.len(), *len)?;
                copy_out_of_memory(memory, offset, dst, *len)
            }
        }
    }

    /// Copies the bytes in `src` into the buffer starting at the given offset.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Detached`] if the buffer was detached, or
    /// [`BufferError::OutOfBounds`] if the range does not fit in the buffer.
    pub fn write(&self, offset: usize, src: &[u8]) -> Result<(), BufferError> {
        match &mut *self.0.contents.borrow_mut() {
            Contents::Detached => Err(BufferError::Detached),
            Contents::Owned(bytes) => {
                check_range(offset, src.len(), bytes.len())?;
                bytes[offset..offset + src.len()].copy_from_slice(src);
                Ok(())
            }
            Contents::Memory { memory, len } => {
                check_range(offset, src.len(), *len)?;
                let out_of_bounds = BufferError::OutOfBounds {
                    offset,
                    length: src.len(),
                    byte_length: *len,
                };

                let address = u32::try_from(offset).map_err(|_| out_of_bounds)?;
                memory
                    .copy_from_slice(address, src)
                    .map_err(|_| out_of_bounds)
            }
        }
    }

    /// Copies the entire contents of the buffer into a new vector.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Detached`] if the buffer was detached.
    pub fn to_vec(&self) -> Result<Vec<u8>, BufferError> {
        let mut bytes = allocate_zeroed(self.byte_length())?;
        self.read(0, &mut bytes)?;
        Ok(bytes)
    }

    /// Copies the bytes from `start` up to `end` into a new buffer.
    ///
    /// This follows [`ArrayBuffer.prototype.slice`]: negative indices count back from the end,
    /// both indices are clamped to the byte length, `start` defaults to `0`, and `end` defaults
    /// to the byte length. If `end` is before `start`, the new buffer is empty.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Detached`] if the buffer was detached. This is checked before any
    /// of the indices are resolved.
    ///
    /// [`ArrayBuffer.prototype.slice`]: https://tc39.es/ecma262/#sec-arraybuffer.prototype.slice
    pub fn slice(&self, start: Option<i64>, end: Option<i64>) -> Result<Self, BufferError> {
        if self.is_detached() {
            return Err(BufferError::Detached);
        }

        let length = self.byte_length();
        let first = resolve_relative_index(start, 0, length);
        let last = resolve_relative_index(end, length, length);
        let new_length = last.saturating_sub(first);

        let mut bytes = allocate_zeroed(new_length)?;
        self.read(first, &mut bytes)?;
        Self::from_vec(bytes)
    }

    /// Moves the contents of this buffer into a new buffer, then detaches this buffer.
    ///
    /// If a `new_length` is given, the contents are truncated or zero-extended to it.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Detached`] if the buffer was already detached,
    /// [`BufferError::NotTransferable`] if the buffer is a view of linear memory, or
    /// [`BufferError::TooLarge`] if the new length could not be allocated.
    pub fn transfer(&self, new_length: Option<usize>) -> Result<Self, BufferError> {
        if self.is_memory_backed() {
            return Err(BufferError::NotTransferable);
        }

        let mut contents = self.0.contents.borrow_mut();
        let mut bytes = match core::mem::replace(&mut *contents, Contents::Detached) {
            Contents::Owned(bytes) => bytes,
            other => {
                *contents = other;
                return Err(BufferError::Detached);
            }
        };

        if let Some(new_length) = new_length {
            if new_length > bytes.len() {
                let additional = new_length - bytes.len();
                if let Err(error) = check_allocation(&mut bytes, new_length, additional) {
                    *contents = Contents::Owned(bytes);
                    return Err(error);
                }
            }

            bytes.resize(new_length, 0);
        }

        log::debug!("transferred contents of buffer {}", self.0.tag);
        Self::from_vec(bytes)
    }
}

fn check_allocation(
    bytes: &mut Vec<u8>,
    new_length: usize,
    additional: usize,
) -> Result<(), BufferError> {
    let error = BufferError::TooLarge {
        length: new_length as u64,
    };

    if new_length as u64 > MAX_BYTE_LENGTH {
        return Err(error);
    }

    bytes.try_reserve_exact(additional).map_err(|_| error)
}

fn copy_out_of_memory(
    memory: &HeapMemory,
    offset: usize,
    dst: &mut [u8],
    byte_length: usize,
) -> Result<(), BufferError> {
    let out_of_bounds = BufferError::OutOfBounds {
        offset,
        length: dst.len(),
        byte_length,
    };

    let address = u32::try_from(offset).map_err(|_| out_of_bounds)?;
    memory
        .copy_to_slice(address, dst)
        .map_err(|_| out_of_bounds)
}

impl PartialEq for ArrayBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for ArrayBuffer {}

impl core::fmt::Debug for ArrayBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ArrayBuffer")
            .field("tag", &self.0.tag)
            .field("byte_length", &self.byte_length())
            .field("detached", &self.is_detached())
            .field("memory_backed", &self.is_memory_backed())
            .finish()
    }
}
