use crate::probes::{DetachedSliceProbe, MemoryGrowProbe};
use crate::{Context, Options, ProbeError};

/// A self-contained regression check.
///
/// Probes are stateless, so one probe may be run many times, on any thread. Each run gets its
/// own [`Context`].
pub trait Probe: Send + Sync {
    /// A unique name identifying the probe.
    fn name(&self) -> &'static str;

    /// A one-line summary of what the probe checks.
    fn description(&self) -> &'static str;

    /// The directives that must be enabled for the probe to run.
    fn required_options(&self) -> Options;

    /// The directives enabled when none are explicitly specified.
    ///
    /// Defaults to the [`required_options()`].
    ///
    /// [`required_options()`]: Probe::required_options()
    fn default_options(&self) -> Options {
        self.required_options()
    }

    /// Runs the probe.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first failed assertion, or any unexpected error.
    fn run(&self, cx: &Context) -> Result<(), ProbeError>;
}

impl std::fmt::Debug for dyn Probe + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Probe")
            .field("name", &self.name())
            .field("required_options", &self.required_options())
            .finish_non_exhaustive()
    }
}

/// Every known probe.
pub static PROBES: &[&dyn Probe] = &[&DetachedSliceProbe, &MemoryGrowProbe];

/// Finds the probe with the given `name` in the list of [`PROBES`].
pub fn find(name: &str) -> Option<&'static dyn Probe> {
    PROBES.iter().copied().find(|probe| probe.name() == name)
}

/// Runs a single `probe` with the given directives, or its [default options] if none are given.
///
/// # Errors
///
/// Fails with [`ProbeError::MissingDirectives`] without running the probe if any of its
/// [required options] are not enabled.
///
/// [default options]: Probe::default_options()
/// [required options]: Probe::required_options()
pub fn run(probe: &dyn Probe, options: Option<Options>) -> Result<(), ProbeError> {
    let options = options.unwrap_or_else(|| probe.default_options());
    let missing = options.missing(&probe.required_options());
    if !missing.is_empty() {
        log::warn!("not running {}, missing {missing:?}", probe.name());
        return Err(ProbeError::MissingDirectives(missing));
    }

    log::info!("running {} with {options}", probe.name());
    let result = probe.run(&Context::new(options));
    match &result {
        Ok(()) => log::info!("{} passed", probe.name()),
        Err(error) => log::error!("{} failed: {error}", probe.name()),
    }
    result
}
