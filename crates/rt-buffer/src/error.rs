use memprobe_rt_core::{Classify, ErrorClass};

/// Error type used when an operation on an [`ArrayBuffer`] fails.
///
/// [`ArrayBuffer`]: crate::ArrayBuffer
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum BufferError {
    /// The buffer was detached.
    Detached,
    /// The range `offset..(offset + length)` exceeded the buffer's byte length.
    #[non_exhaustive]
    OutOfBounds {
        /// The start of the range that was accessed.
        offset: usize,
        /// The number of bytes that were accessed.
        length: usize,
        /// The byte length of the buffer at the time of the access.
        byte_length: usize,
    },
    /// An attempt was made to detach the buffer with a key other than its detach key.
    DetachKeyMismatch,
    /// A buffer larger than the [`MAX_BYTE_LENGTH`] was requested, or its contents could not be
    /// allocated.
    ///
    /// [`MAX_BYTE_LENGTH`]: crate::MAX_BYTE_LENGTH
    #[non_exhaustive]
    TooLarge {
        /// The requested byte length.
        length: u64,
    },
    /// The contents of a buffer backed by linear memory cannot be moved elsewhere.
    NotTransferable,
}

impl core::fmt::Display for BufferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Detached => f.write_str("ArrayBuffer is detached"),
            Self::OutOfBounds {
                offset,
                length,
                byte_length,
            } => write!(
                f,
                "range of {length} bytes at offset {offset} is outside of a buffer of {byte_length} bytes"
            ),
            Self::DetachKeyMismatch => f.write_str("detach key does not match"),
            Self::TooLarge { length } => write!(f, "cannot allocate a buffer of {length} bytes"),
            Self::NotTransferable => {
                f.write_str("ArrayBuffer is backed by linear memory and cannot be transferred")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BufferError {}

impl Classify for BufferError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::Detached | Self::DetachKeyMismatch | Self::NotTransferable => {
                ErrorClass::TypeError
            }
            Self::OutOfBounds { .. } | Self::TooLarge { .. } => ErrorClass::RangeError,
        }
    }
}
