//! Generation-tagged identities for engine objects.
//!
//! A buffer handed out by a growable memory is only valid until the next growth. Rather than
//! relying on pointer equality, every buffer carries a [`Tag`] made of the [`SourceId`] of the
//! object that produced it and the [`Generation`] that object was in. Two handles are the same
//! object exactly when their tags are equal.

use core::sync::atomic::{AtomicU64, Ordering};

/// Identifies the object that produced a buffer.
///
/// Every call to [`SourceId::fresh()`] returns a value that was never returned before in the
/// current process.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SourceId(u64);

impl SourceId {
    /// Allocates a new unique source identifier.
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Gets the raw value of the identifier.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for SourceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Counts how many times an object has invalidated the buffers it previously handed out.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Generation(u32);

impl Generation {
    /// The generation of a newly created object.
    pub const INITIAL: Self = Self(0);

    /// Gets the generation that follows `self`.
    ///
    /// Wraps around after [`u32::MAX`] invalidations.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Gets the raw generation counter.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for Generation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// The identity of a buffer handle.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Tag {
    source: SourceId,
    generation: Generation,
}

impl Tag {
    /// Creates a tag for a buffer produced by `source` while it was in the given `generation`.
    pub const fn new(source: SourceId, generation: Generation) -> Self {
        Self { source, generation }
    }

    /// Creates a tag for an object that is its own source, such as a freshly allocated buffer.
    pub fn unique() -> Self {
        Self::new(SourceId::fresh(), Generation::INITIAL)
    }

    /// Gets the object that produced the buffer.
    pub const fn source(&self) -> SourceId {
        self.source
    }

    /// Gets the generation of the source at the time the buffer was produced.
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Returns `true` if a buffer with this tag was superseded by one tagged `current`.
    ///
    /// This is the case when both come from the same source, but `current` is of a later
    /// generation.
    pub fn is_superseded_by(&self, current: &Tag) -> bool {
        self.source == current.source && self.generation != current.generation
    }
}

impl core::fmt::Display for Tag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}@{}", self.source, self.generation)
    }
}
