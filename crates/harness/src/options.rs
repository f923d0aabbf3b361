/// A directive enabling an engine feature before a probe runs.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum Directive {
    /// Exposes the [`Debug`] built-in, which can detach buffers.
    ///
    /// [`Debug`]: crate::Debug
    DebugBuiltin,
    /// Exposes the WebAssembly host API.
    WebAssembly,
    /// Backs buffers with direct allocations. Recorded, but has no effect on behavior.
    DirectByteBuffer,
}

impl Directive {
    /// Every directive, in a stable order.
    pub const ALL: [Self; 3] = [Self::DebugBuiltin, Self::WebAssembly, Self::DirectByteBuffer];

    /// Gets the name used to refer to the directive on the command line.
    pub const fn name(self) -> &'static str {
        match self {
            Self::DebugBuiltin => "debug-builtin",
            Self::WebAssembly => "webassembly",
            Self::DirectByteBuffer => "direct-byte-buffer",
        }
    }
}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing the name of a [`Directive`] that does not exist.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnknownDirectiveError {
    name: Box<str>,
}

impl std::fmt::Display for UnknownDirectiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown directive {:?}, expected one of ", self.name)?;
        for (i, directive) in Directive::ALL.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{directive}")?;
        }
        Ok(())
    }
}

impl std::error::Error for UnknownDirectiveError {}

impl std::str::FromStr for Directive {
    type Err = UnknownDirectiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|directive| directive.name() == s)
            .ok_or_else(|| UnknownDirectiveError { name: s.into() })
    }
}

/// The set of [`Directive`]s enabled for a probe.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct Options {
    debug_builtin: bool,
    webassembly: bool,
    direct_byte_buffer: bool,
}

impl Options {
    /// Gets options with no directives enabled.
    pub const fn new() -> Self {
        Self {
            debug_builtin: false,
            webassembly: false,
            direct_byte_buffer: false,
        }
    }

    /// Sets whether the [`Directive::DebugBuiltin`] is enabled.
    pub fn debug_builtin(&mut self, enabled: bool) -> &mut Self {
        self.debug_builtin = enabled;
        self
    }

    /// Sets whether the [`Directive::WebAssembly`] is enabled.
    pub fn webassembly(&mut self, enabled: bool) -> &mut Self {
        self.webassembly = enabled;
        self
    }

    /// Sets whether the [`Directive::DirectByteBuffer`] is enabled.
    pub fn direct_byte_buffer(&mut self, enabled: bool) -> &mut Self {
        self.direct_byte_buffer = enabled;
        self
    }

    /// Enables a directive.
    pub fn enable(&mut self, directive: Directive) -> &mut Self {
        *self.flag(directive) = true;
        self
    }

    fn flag(&mut self, directive: Directive) -> &mut bool {
        match directive {
            Directive::DebugBuiltin => &mut self.debug_builtin,
            Directive::WebAssembly => &mut self.webassembly,
            Directive::DirectByteBuffer => &mut self.direct_byte_buffer,
        }
    }

    /// Returns `true` if the directive is enabled.
    pub fn is_enabled(&self, directive: Directive) -> bool {
        match directive {
            Directive::DebugBuiltin => self.debug_builtin,
            Directive::WebAssembly => self.webassembly,
            Directive::DirectByteBuffer => self.direct_byte_buffer,
        }
    }

    /// Iterates over the enabled directives.
    pub fn enabled(&self) -> impl Iterator<Item = Directive> + '_ {
        Directive::ALL
            .into_iter()
            .filter(|directive| self.is_enabled(*directive))
    }

    /// Gets the directives that are enabled in `required` but not in `self`.
    pub fn missing(&self, required: &Self) -> Vec<Directive> {
        required
            .enabled()
            .filter(|directive| !self.is_enabled(*directive))
            .collect()
    }
}

impl FromIterator<Directive> for Options {
    fn from_iter<I: IntoIterator<Item = Directive>>(iter: I) -> Self {
        let mut options = Self::new();
        for directive in iter {
            options.enable(directive);
        }
        options
    }
}

impl std::str::FromStr for Options {
    type Err = UnknownDirectiveError;

    /// Parses a comma-separated list of directive names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::parse::<Directive>)
            .collect()
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.enabled()).finish()
    }
}

impl std::fmt::Display for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, directive) in self.enabled().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{directive}")?;
        }
        Ok(())
    }
}
