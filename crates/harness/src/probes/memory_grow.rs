use crate::assert::{assert_same, assert_true};
use crate::{Context, Options, Probe, ProbeError};
use anyhow::Context as _;
use memprobe_webassembly::{Instance, Module};

const PAGE_SIZE: usize = 65536;

// (module
//   (memory $mem (export "memory") 1 2)
//   (func $grow (export "grow")
//     i32.const 1
//     memory.grow
//     drop))
const GROW_ONE_PAGE: [u8; 54] = [
    0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00, 0x01, 0x04, 0x01, 0x60, 0x00, 0x00, 0x03,
    0x02, 0x01, 0x00, 0x05, 0x04, 0x01, 0x01, 0x01, 0x02, 0x07, 0x11, 0x02, 0x06, 0x6D, 0x65,
    0x6D, 0x6F, 0x72, 0x79, 0x02, 0x00, 0x04, 0x67, 0x72, 0x6F, 0x77, 0x00, 0x00, 0x0A, 0x09,
    0x01, 0x07, 0x00, 0x41, 0x01, 0x40, 0x00, 0x1A, 0x0B,
];

// Same as above, with `i32.const 0`.
const GROW_ZERO_PAGES: [u8; 54] = [
    0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00, 0x01, 0x04, 0x01, 0x60, 0x00, 0x00, 0x03,
    0x02, 0x01, 0x00, 0x05, 0x04, 0x01, 0x01, 0x01, 0x02, 0x07, 0x11, 0x02, 0x06, 0x6D, 0x65,
    0x6D, 0x6F, 0x72, 0x79, 0x02, 0x00, 0x04, 0x67, 0x72, 0x6F, 0x77, 0x00, 0x00, 0x0A, 0x09,
    0x01, 0x07, 0x00, 0x41, 0x00, 0x40, 0x00, 0x1A, 0x0B,
];

/// Describes the expected effect of calling an instance's exported `grow` function.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GrowthScenario {
    /// The number of pages the exported `memory` has before growing.
    pub initial_pages: u32,
    /// The number of pages `grow` adds.
    ///
    /// If `grow` takes a parameter, this is passed as its argument.
    pub delta: u32,
}

fn pages_to_bytes(pages: u32) -> anyhow::Result<usize> {
    usize::try_from(pages)
        .ok()
        .and_then(|pages| pages.checked_mul(PAGE_SIZE))
        .with_context(|| format!("{pages} pages do not fit in the address space"))
}

/// Checks that growing the `memory` exported by an `instance` through its exported `grow`
/// function invalidates the buffer obtained before growing, and that the new buffer has the
/// expected length.
///
/// # Errors
///
/// Fails if the `instance` does not export both `memory` and `grow`, or if an assertion fails.
pub fn check_growth(instance: &Instance, scenario: GrowthScenario) -> Result<(), ProbeError> {
    let memory = instance
        .get_memory("memory")
        .context("instance does not export a memory named \"memory\"")?;
    let grow = instance
        .get_func("grow")
        .context("instance does not export a function named \"grow\"")?;

    let arguments = match grow.param_count() {
        0 => Vec::new(),
        1 => {
            let delta = i32::try_from(scenario.delta).context("delta is too large")?;
            vec![delta]
        }
        count => {
            return Err(ProbeError::Unexpected(anyhow::anyhow!(
                "expected grow to take 0 or 1 parameters, but it takes {count}"
            )))
        }
    };

    let expected_length = scenario
        .initial_pages
        .checked_add(scenario.delta)
        .context("page count overflowed")?;

    let original = memory.buffer();
    assert_same(pages_to_bytes(scenario.initial_pages)?, original.byte_length())?;
    assert_true(
        original.same(&memory.buffer()),
        "buffer is the same before growing",
    )?;

    let results = grow.call(&arguments)?;
    log::debug!("grow returned {results:?}");

    assert_same(0, original.byte_length())?;
    assert_true(
        !original.same(&memory.buffer()),
        "buffer is different after growing",
    )?;
    assert_same(pages_to_bytes(expected_length)?, memory.buffer().byte_length())?;
    Ok(())
}

fn run_scenario(cx: &Context, wasm: &[u8], delta: u32) -> Result<(), ProbeError> {
    let module = Module::new(wasm)?;
    let instance = Instance::new(cx.webassembly()?, &module, &Default::default())?;
    check_growth(
        &instance,
        GrowthScenario {
            initial_pages: 1,
            delta,
        },
    )
}

/// Checks that growing a WebAssembly memory from inside a module resets the buffer of its
/// memory object, even when growing by `0` pages.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryGrowProbe;

impl Probe for MemoryGrowProbe {
    fn name(&self) -> &'static str {
        "memory-grow-buffer-reset"
    }

    fn description(&self) -> &'static str {
        "WebAssembly.Memory buffer is reset after memory.grow, even by 0 pages"
    }

    fn required_options(&self) -> Options {
        *Options::new().webassembly(true)
    }

    fn run(&self, cx: &Context) -> Result<(), ProbeError> {
        run_scenario(cx, &GROW_ONE_PAGE, 1)?;
        run_scenario(cx, &GROW_ZERO_PAGES, 0)
    }
}
