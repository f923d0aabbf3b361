//! The `memprobe` command line interface.

use memprobe_harness::{Directive, Options, Probe, Report};

#[derive(clap::Parser, Debug)]
#[command(version, about, long_about = None)]
struct Arguments {
    /// Specifies the maximum number of threads to use when running probes.
    ///
    /// If set to zero, then the number of threads used is dependent on the `RAYON_NUM_THREADS`
    /// environment variable, or the number of logical CPUs.
    #[arg(long, default_value_t = 0)]
    #[cfg(feature = "rayon")]
    threads: usize,
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Lists the available probes.
    List,
    /// Runs probes, exiting with an error if any of them fail.
    Run {
        /// The names of the probes to run. If not specified, every probe is run.
        #[arg(short, long = "probe")]
        probes: Vec<String>,
        /// The directives to enable, such as `webassembly` or `debug-builtin`.
        ///
        /// If not specified, each probe runs with the directives it requires.
        #[arg(short, long = "option")]
        options: Vec<Directive>,
    },
    /// Checks that growing the memory of a module resets the buffer of its memory object.
    ///
    /// The module must export a memory named `memory` and a function named `grow`, which takes
    /// either no parameters or the number of pages to grow by.
    Grow {
        /// Path to the WebAssembly module.
        ///
        /// This can be either in the binary format (`.wasm`) or the text format (`.wat`).
        #[arg(short, long)]
        module: std::path::PathBuf,
        /// The number of pages `grow` is expected to add.
        #[arg(short, long, default_value_t = 0)]
        delta: u32,
        /// The number of pages the memory is expected to have before growing.
        #[arg(short, long, default_value_t = 1)]
        initial: u32,
    },
}

fn select_probes(names: &[String]) -> anyhow::Result<Vec<&'static dyn Probe>> {
    if names.is_empty() {
        return Ok(memprobe_harness::PROBES.to_vec());
    }

    names
        .iter()
        .map(|name| {
            memprobe_harness::find(name).ok_or_else(|| anyhow::anyhow!("unknown probe {name:?}"))
        })
        .collect()
}

#[cfg(feature = "rayon")]
fn run_probes(probes: &[&'static dyn Probe], options: Option<Options>) -> Report {
    use rayon::prelude::*;

    probes
        .par_iter()
        .map(|probe| (probe.name(), memprobe_harness::run(*probe, options)))
        .collect::<Vec<(&'static str, Result<(), memprobe_harness::ProbeError>)>>()
        .into_iter()
        .collect()
}

#[cfg(not(feature = "rayon"))]
fn run_probes(probes: &[&'static dyn Probe], options: Option<Options>) -> Report {
    memprobe_harness::run_all(probes.iter().copied(), options)
}

fn run(names: &[String], directives: Vec<Directive>) -> anyhow::Result<()> {
    let probes = select_probes(names)?;
    let options = if directives.is_empty() {
        None
    } else {
        Some(directives.into_iter().collect::<Options>())
    };

    log::debug!("running {} probes with {options:?}", probes.len());
    let report = run_probes(&probes, options);
    println!("{report}");

    if report.is_success() {
        Ok(())
    } else {
        anyhow::bail!("{} of {} probes failed", report.failed(), probes.len())
    }
}

fn grow(
    module: &std::path::Path,
    scenario: memprobe_harness::probes::GrowthScenario,
) -> anyhow::Result<()> {
    use anyhow::Context;

    let wasm = wat::parse_file(module).with_context(|| format!("could not parse {module:?}"))?;

    let realm = memprobe_webassembly::Realm::new();
    let compiled = memprobe_webassembly::Module::new(&wasm)
        .with_context(|| format!("could not compile {module:?}"))?;
    let instance = memprobe_webassembly::Instance::new(
        &realm,
        &compiled,
        &memprobe_webassembly::Imports::new(),
    )
    .with_context(|| format!("could not instantiate {module:?}"))?;

    memprobe_harness::probes::check_growth(&instance, scenario)
        .with_context(|| format!("growing {module:?} by {} pages", scenario.delta))?;

    Ok(())
}

pub fn main() -> anyhow::Result<()> {
    env_logger::init();

    let arguments = <Arguments as clap::Parser>::parse();

    #[cfg(feature = "rayon")]
    {
        use anyhow::Context;

        rayon::ThreadPoolBuilder::new()
            .num_threads(arguments.threads)
            .build_global()
            .context("unable to create global thread pool")?;
    }

    match arguments.command {
        Command::List => {
            for probe in memprobe_harness::PROBES {
                println!(
                    "{:<28} {} (requires {})",
                    probe.name(),
                    probe.description(),
                    probe.required_options()
                );
            }

            Ok(())
        }
        Command::Run { probes, options } => run(&probes, options),
        Command::Grow {
            module,
            delta,
            initial,
        } => {
            let scenario = memprobe_harness::probes::GrowthScenario {
                initial_pages: initial,
                delta,
            };

            grow(&module, scenario)?;
            println!("ok   {} grew by {delta} pages", module.display());
            Ok(())
        }
    }
}
