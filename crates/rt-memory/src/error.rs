use memprobe_rt_core::{Classify, ErrorClass};

/// Error type used when the requested number of [pages] for a linear memory could not be
/// allocated.
///
/// [pages]: crate::PAGE_SIZE
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct AllocationError {
    pub(crate) size: u32,
}

impl AllocationError {
    /// The number of [pages] that was requested.
    ///
    /// [pages]: crate::PAGE_SIZE
    pub fn size(&self) -> u32 {
        self.size
    }
}

impl core::fmt::Display for AllocationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "couldn't allocate {} pages", self.size)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AllocationError {}

impl Classify for AllocationError {
    fn class(&self) -> ErrorClass {
        ErrorClass::RangeError
    }
}

/// Error type used when an attempt to read or write from a linear [`Memory`] fails.
///
/// [`Memory`]: crate::Memory
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct AccessError {
    memory: u32,
    address: u32,
    offset: u32,
}

impl AccessError {
    pub(crate) const fn new(memory: u32, offset: u32, address: u32) -> Self {
        Self {
            memory,
            offset,
            address,
        }
    }

    /// The index of the linear memory that was accessed.
    pub fn memory(&self) -> u32 {
        self.memory
    }
}

impl core::fmt::Display for AccessError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "invalid access of linear memory #{} at address {:#X}",
            self.memory, self.address
        )?;

        if self.offset > 0 {
            write!(f, " + {:#X}", self.offset)?;

            if let Some(effective_address) = self.address.checked_add(self.offset) {
                write!(f, " = {effective_address:#X}")?;
            }
        }

        Ok(())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AccessError {}

impl Classify for AccessError {
    fn class(&self) -> ErrorClass {
        ErrorClass::RuntimeError
    }
}
