//! Provides the [`Classify`] trait, which maps engine errors onto the error constructors a
//! script would observe.

/// The class of error an engine operation raises.
///
/// A probe asserting that an operation fails compares against one of these, rather than against
/// a concrete Rust error type.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum ErrorClass {
    /// An operation was applied to a value of the wrong kind or state, such as reading from a
    /// detached buffer.
    TypeError,
    /// A length, index, or page count was outside of the allowed range.
    RangeError,
    /// A WebAssembly module failed to decode or validate.
    CompileError,
    /// A WebAssembly module could not be instantiated with the given imports.
    LinkError,
    /// A WebAssembly function trapped.
    RuntimeError,
}

impl ErrorClass {
    /// Gets the name of the error constructor.
    pub const fn name(self) -> &'static str {
        match self {
            Self::TypeError => "TypeError",
            Self::RangeError => "RangeError",
            Self::CompileError => "CompileError",
            Self::LinkError => "LinkError",
            Self::RuntimeError => "RuntimeError",
        }
    }
}

impl core::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Trait for errors that can be classified by the [`ErrorClass`] a script would observe.
pub trait Classify: core::fmt::Debug + core::fmt::Display {
    /// Gets the class of this error.
    fn class(&self) -> ErrorClass;
}

impl<C: Classify + ?Sized> Classify for &C {
    fn class(&self) -> ErrorClass {
        C::class(self)
    }
}
