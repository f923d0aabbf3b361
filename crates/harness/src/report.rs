use crate::{Options, Probe, ProbeError};

/// The outcome of running a set of probes.
#[derive(Debug, Default)]
pub struct Report {
    results: Vec<(&'static str, Result<(), ProbeError>)>,
}

impl Report {
    /// Iterates over the name and outcome of each probe, in the order they were recorded.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&'static str, &Result<(), ProbeError>)> {
        self.results.iter().map(|(name, result)| (*name, result))
    }

    /// The number of probes that passed.
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|(_, result)| result.is_ok()).count()
    }

    /// The number of probes that failed.
    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    /// Returns `true` if every probe passed.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

impl FromIterator<(&'static str, Result<(), ProbeError>)> for Report {
    fn from_iter<I: IntoIterator<Item = (&'static str, Result<(), ProbeError>)>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (name, result) in self.iter() {
            match result {
                Ok(()) => writeln!(f, "ok   {name}")?,
                Err(error) => writeln!(f, "FAIL {name}: {error}")?,
            }
        }

        write!(f, "{} passed, {} failed", self.passed(), self.failed())
    }
}

/// Runs each probe in turn, with the given directives or each probe's [default options].
///
/// [default options]: Probe::default_options()
pub fn run_all<'a, I>(probes: I, options: Option<Options>) -> Report
where
    I: IntoIterator<Item = &'a dyn Probe>,
{
    probes
        .into_iter()
        .map(|probe| (probe.name(), crate::run(probe, options)))
        .collect()
}
