use crate::{AssertionError, Directive};
use memprobe_rt_buffer::BufferError;
use memprobe_rt_core::Classify as _;

/// Error returned when a probe accesses a feature whose [`Directive`] is not enabled.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DirectiveError {
    directive: Directive,
}

impl DirectiveError {
    pub(crate) const fn new(directive: Directive) -> Self {
        Self { directive }
    }

    /// The directive that is not enabled.
    pub fn directive(&self) -> Directive {
        self.directive
    }
}

impl std::fmt::Display for DirectiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "the {} directive is not enabled", self.directive)
    }
}

impl std::error::Error for DirectiveError {}

/// Describes why a probe failed.
#[derive(Debug)]
#[non_exhaustive]
pub enum ProbeError {
    /// An assertion failed.
    Assertion(AssertionError),
    /// The probe was run without the directives it requires.
    MissingDirectives(Vec<Directive>),
    /// A directive was not enabled when the probe tried to use the feature it guards.
    Directive(DirectiveError),
    /// An operation failed unexpectedly.
    Unexpected(anyhow::Error),
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Assertion(error) => {
                let location = error.location();
                write!(
                    f,
                    "{error} ({}:{}:{})",
                    location.file(),
                    location.line(),
                    location.column()
                )
            }
            Self::MissingDirectives(missing) => {
                f.write_str("missing required directives: ")?;
                for (i, directive) in missing.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{directive}")?;
                }
                Ok(())
            }
            Self::Directive(error) => std::fmt::Display::fmt(error, f),
            Self::Unexpected(error) => write!(f, "unexpected error: {error:#}"),
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Assertion(error) => Some(error),
            Self::Directive(error) => Some(error),
            Self::MissingDirectives(_) | Self::Unexpected(_) => None,
        }
    }
}

impl From<AssertionError> for ProbeError {
    fn from(error: AssertionError) -> Self {
        Self::Assertion(error)
    }
}

impl From<DirectiveError> for ProbeError {
    fn from(error: DirectiveError) -> Self {
        Self::Directive(error)
    }
}

impl From<memprobe_webassembly::Error> for ProbeError {
    fn from(error: memprobe_webassembly::Error) -> Self {
        Self::Unexpected(anyhow::Error::new(error))
    }
}

impl From<BufferError> for ProbeError {
    fn from(error: BufferError) -> Self {
        let class = error.class();
        Self::Unexpected(anyhow::Error::new(error).context(class))
    }
}

impl From<anyhow::Error> for ProbeError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unexpected(error)
    }
}
