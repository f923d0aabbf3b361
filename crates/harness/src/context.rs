use crate::{Debug, Directive, DirectiveError, Options};
use memprobe_webassembly::Realm;

/// The environment a probe runs in.
///
/// Features guarded by a [`Directive`] are only reachable when that directive is enabled.
#[derive(Debug)]
pub struct Context {
    options: Options,
    debug: Option<Debug>,
    realm: Option<Realm>,
}

impl Context {
    /// Creates a context with the given directives enabled.
    pub fn new(options: Options) -> Self {
        Self {
            options,
            debug: options
                .is_enabled(Directive::DebugBuiltin)
                .then(Debug::new),
            realm: options
                .is_enabled(Directive::WebAssembly)
                .then(Realm::new),
        }
    }

    /// Gets the enabled directives.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Gets the debugging built-in.
    ///
    /// # Errors
    ///
    /// Fails if [`Directive::DebugBuiltin`] is not enabled.
    pub fn debug(&self) -> Result<&Debug, DirectiveError> {
        self.debug
            .as_ref()
            .ok_or(DirectiveError::new(Directive::DebugBuiltin))
    }

    /// Gets the realm used to create WebAssembly objects.
    ///
    /// # Errors
    ///
    /// Fails if [`Directive::WebAssembly`] is not enabled.
    pub fn webassembly(&self) -> Result<&Realm, DirectiveError> {
        self.realm
            .as_ref()
            .ok_or(DirectiveError::new(Directive::WebAssembly))
    }
}
