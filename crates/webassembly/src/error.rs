use memprobe_rt_core::{Classify, ErrorClass};

/// Error type used by every fallible operation in this crate.
///
/// Pairs the [`ErrorClass`] a script would observe with the underlying cause.
pub struct Error {
    class: ErrorClass,
    cause: anyhow::Error,
}

/// Result type used by every fallible operation in this crate.
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    pub(crate) fn new(class: ErrorClass, cause: impl Into<anyhow::Error>) -> Self {
        Self {
            class,
            cause: cause.into(),
        }
    }

    pub(crate) fn compile(cause: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorClass::CompileError, cause)
    }

    pub(crate) fn link(cause: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorClass::LinkError, cause)
    }

    pub(crate) fn range(cause: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorClass::RangeError, cause)
    }

    pub(crate) fn type_error(cause: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorClass::TypeError, cause)
    }

    pub(crate) fn runtime(cause: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorClass::RuntimeError, cause)
    }
}

impl Classify for Error {
    fn class(&self) -> ErrorClass {
        self.class
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Error")
            .field("class", &self.class)
            .field("cause", &self.cause)
            .finish()
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:#}", self.class, self.cause)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.source()
    }
}
