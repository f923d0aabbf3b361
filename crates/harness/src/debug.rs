use memprobe_rt_buffer::{ArrayBuffer, BufferError};

/// The debugging built-in, available to probes run with [`Directive::DebugBuiltin`].
///
/// [`Directive::DebugBuiltin`]: crate::Directive::DebugBuiltin
pub struct Debug {
    _private: (),
}

impl Debug {
    pub(crate) const fn new() -> Self {
        Self { _private: () }
    }

    /// Detaches a buffer, as if its contents were transferred elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::DetachKeyMismatch`] if the buffer can only be detached by its
    /// owner, such as a buffer viewing linear memory.
    pub fn typed_array_detach_buffer(&self, buffer: &ArrayBuffer) -> Result<(), BufferError> {
        log::debug!("detaching buffer {} through the debug built-in", buffer.tag());
        buffer.detach(None)
    }
}

impl std::fmt::Debug for Debug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debug").finish_non_exhaustive()
    }
}
