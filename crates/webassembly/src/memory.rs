use crate::{Error, Realm};
use memprobe_rt_buffer::{ArrayBuffer, DetachKey};
use memprobe_rt_core::{Generation, SourceId, Tag};
use memprobe_rt_memory::{HeapMemory, Memory as _, MAX_PAGE_COUNT};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Describes the limits of a new [`Memory`], in pages.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MemoryDescriptor {
    /// The initial number of pages.
    pub initial: u32,
    /// The maximum number of pages. If [`None`], the memory can grow up to the
    /// [`MAX_PAGE_COUNT`].
    pub maximum: Option<u32>,
}

impl MemoryDescriptor {
    fn validate(&self) -> anyhow::Result<u32> {
        anyhow::ensure!(
            self.initial <= MAX_PAGE_COUNT,
            "initial page count {} is greater than the maximum of {MAX_PAGE_COUNT}",
            self.initial
        );

        let maximum = self.maximum.unwrap_or(MAX_PAGE_COUNT);
        anyhow::ensure!(
            maximum <= MAX_PAGE_COUNT,
            "maximum page count {maximum} is greater than {MAX_PAGE_COUNT}"
        );
        anyhow::ensure!(
            self.initial <= maximum,
            "initial page count {} is greater than the maximum of {maximum}",
            self.initial
        );

        Ok(maximum)
    }
}

pub(crate) struct MemoryInner {
    memory: Rc<HeapMemory>,
    source: SourceId,
    key: DetachKey,
    generation: Cell<Generation>,
    /// The buffer most recently handed out by [`Memory::buffer()`].
    buffer: RefCell<Option<ArrayBuffer>>,
}

impl MemoryInner {
    /// Detaches the cached buffer and starts a new generation.
    ///
    /// Called by the realm's memory cache whenever the underlying linear memory grows.
    pub(crate) fn reset_buffer(&self) {
        let previous = self.generation.get();
        if let Some(buffer) = self.buffer.take() {
            if let Err(error) = buffer.detach(Some(&self.key)) {
                log::error!("could not detach buffer {}: {error}", buffer.tag());
            }
        }

        self.generation.set(previous.next());
        log::debug!(
            "memory {} advanced from generation {previous} to {}",
            self.source,
            previous.next()
        );
    }

    pub(crate) fn heap(&self) -> &Rc<HeapMemory> {
        &self.memory
    }
}

/// A host object wrapping a WebAssembly linear memory, corresponding to
/// [`WebAssembly.Memory`].
///
/// At most one [`ArrayBuffer`] viewing the memory is live at a time. Every successful growth of
/// the memory, including growth by `0` pages, detaches that buffer, so a subsequent call to
/// [`Memory::buffer()`] returns a different buffer.
///
/// Cloning a [`Memory`] returns a handle to the same object.
///
/// [`WebAssembly.Memory`]: https://webassembly.github.io/spec/js-api/#memories
#[derive(Clone)]
pub struct Memory(pub(crate) Rc<MemoryInner>);

impl Memory {
    pub(crate) fn wrap(memory: Rc<HeapMemory>) -> Self {
        let source = SourceId::fresh();
        log::trace!("created memory object {source} for {memory:?}");
        Self(Rc::new(MemoryInner {
            memory,
            source,
            key: DetachKey::new(),
            generation: Cell::new(Generation::INITIAL),
            buffer: RefCell::new(None),
        }))
    }

    /// Allocates a new linear memory in the given `realm`.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorClass::RangeError`] if the initial size is greater than the maximum,
    /// either exceeds the [`MAX_PAGE_COUNT`], or if the memory could not be allocated.
    ///
    /// [`ErrorClass::RangeError`]: crate::ErrorClass::RangeError
    pub fn new(realm: &Realm, descriptor: MemoryDescriptor) -> crate::Result<Self> {
        let maximum = descriptor.validate().map_err(Error::range)?;
        let memory = HeapMemory::with_limits(descriptor.initial, maximum).map_err(Error::range)?;
        Ok(realm.memory_object(Rc::new(memory)))
    }

    /// Gets the current size of the memory, in pages.
    pub fn size(&self) -> u32 {
        self.0.memory.size()
    }

    /// Gets the maximum number of pages the memory can grow to.
    pub fn maximum(&self) -> u32 {
        self.0.memory.maximum()
    }

    /// Gets the current generation, which advances every time the memory grows.
    pub fn generation(&self) -> Generation {
        self.0.generation.get()
    }

    /// Gets the buffer viewing the entire contents of the memory.
    ///
    /// Repeated calls return the same buffer until the memory grows.
    pub fn buffer(&self) -> ArrayBuffer {
        let mut cached = self.0.buffer.borrow_mut();
        cached
            .get_or_insert_with(|| {
                let tag = Tag::new(self.0.source, self.0.generation.get());
                log::trace!("creating buffer {tag}");
                ArrayBuffer::for_memory(self.0.memory.clone(), tag, self.0.key)
            })
            .clone()
    }

    /// Increases the size of the memory by `delta` pages, returning the old size.
    ///
    /// This goes through the same path as a `memory.grow` instruction, so the current buffer is
    /// detached even if `delta` is `0`.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorClass::RangeError`] if the new size would exceed the [`maximum()`]. The
    /// current buffer remains attached in that case.
    ///
    /// [`ErrorClass::RangeError`]: crate::ErrorClass::RangeError
    /// [`maximum()`]: Memory::maximum()
    pub fn grow(&self, delta: u32) -> crate::Result<u32> {
        self.0.memory.try_grow(delta).map_err(|error| {
            Error::range(anyhow::Error::new(error).context(format!(
                "could not grow memory of {} pages by {delta}",
                self.size()
            )))
        })
    }

    /// Returns `true` if both handles refer to the same memory object.
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn heap(&self) -> &Rc<HeapMemory> {
        self.0.heap()
    }
}

impl PartialEq for Memory {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Memory {}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("source", &self.0.source)
            .field("generation", &self.0.generation.get())
            .field("size", &self.size())
            .field("maximum", &self.maximum())
            .finish()
    }
}
