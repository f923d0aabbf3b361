use crate::memory::{Memory, MemoryInner};
use memprobe_rt_memory::{GrowCallback, GrowEvent, HeapMemory};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Maps each linear memory to the one memory object wrapping it.
#[derive(Default)]
struct MemoryCache {
    entries: RefCell<Vec<(Weak<HeapMemory>, Weak<MemoryInner>)>>,
}

impl MemoryCache {
    fn lookup(&self, memory: *const HeapMemory) -> Option<Rc<MemoryInner>> {
        let mut entries = self.entries.borrow_mut();
        entries.retain(|(heap, inner)| heap.strong_count() > 0 && inner.strong_count() > 0);
        entries
            .iter()
            .find(|(heap, _)| std::ptr::eq(heap.as_ptr(), memory))
            .and_then(|(_, inner)| inner.upgrade())
    }
}

impl GrowCallback for MemoryCache {
    fn memory_grown(&self, memory: &HeapMemory, event: &GrowEvent) {
        match self.lookup(memory) {
            Some(inner) => {
                log::trace!(
                    "memory grew from {} to {} pages",
                    event.old_size(),
                    event.new_size()
                );
                inner.reset_buffer();
            }
            None => log::trace!("grown memory has no memory object"),
        }
    }
}

/// The environment that memory objects and instances are created in.
///
/// A realm ensures that a linear memory is only ever wrapped by one [`Memory`] object, so the
/// same memory exported twice, or imported and then exported again, is the same object. It also
/// keeps every memory object in sync with its linear memory, detaching the object's buffer
/// whenever the memory grows.
///
/// Cloning a [`Realm`] returns a handle to the same realm.
#[derive(Clone, Default)]
pub struct Realm {
    cache: Rc<MemoryCache>,
}

impl Realm {
    /// Creates a new realm.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the memory object wrapping the given linear memory, creating one if necessary.
    pub(crate) fn memory_object(&self, memory: Rc<HeapMemory>) -> Memory {
        if let Some(inner) = self.cache.lookup(Rc::as_ptr(&memory)) {
            return Memory(inner);
        }

        let object = Memory::wrap(memory.clone());
        self.cache
            .entries
            .borrow_mut()
            .push((Rc::downgrade(&memory), Rc::downgrade(&object.0)));

        let callback: Rc<dyn GrowCallback> = self.cache.clone();
        if let Some(previous) = memory.set_grow_callback(callback) {
            let ours = Rc::as_ptr(&self.cache).cast::<()>();
            if !std::ptr::eq(Rc::as_ptr(&previous).cast::<()>(), ours) {
                log::warn!("replaced grow callback of {memory:?} from another realm");
            }
        }

        object
    }

    /// Returns `true` if both handles refer to the same realm.
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cache, &other.cache)
    }
}

impl std::fmt::Debug for Realm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Realm")
            .field("memories", &self.cache.entries.borrow().len())
            .finish()
    }
}
