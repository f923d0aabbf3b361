//! Tests for [`memprobe_harness`].

use memprobe_harness::assert::{assert_same, assert_throws, assert_true};
use memprobe_harness::probes::{check_growth, DetachedSliceProbe, GrowthScenario, MemoryGrowProbe};
use memprobe_harness::{Context, Directive, Options, ProbeError, PROBES};
use memprobe_rt_buffer::{ArrayBuffer, BufferError};
use memprobe_rt_core::ErrorClass;
use memprobe_webassembly::{Imports, Instance, Module, Realm};

fn instantiate(wat: &str) -> Instance {
    let module = Module::new(&wat::parse_str(wat).unwrap()).unwrap();
    Instance::new(&Realm::new(), &module, &Imports::new()).unwrap()
}

#[test]
fn assert_throws_checks_the_class() {
    let buffer = ArrayBuffer::new(8).unwrap();
    buffer.detach(None).unwrap();

    assert_eq!(
        assert_throws(|| buffer.slice(None, None), ErrorClass::TypeError),
        Ok(())
    );

    let live = ArrayBuffer::new(8).unwrap();
    let wrong_class = assert_throws(|| live.read(6, &mut [0; 4]), ErrorClass::TypeError);
    insta::assert_snapshot!(wrong_class.unwrap_err(), @"expected TypeError, but RangeError was thrown: range of 4 bytes at offset 6 is outside of a buffer of 8 bytes");

    let nothing_thrown = assert_throws(|| live.slice(Some(2), Some(6)), ErrorClass::TypeError)
        .unwrap_err()
        .to_string();
    assert!(nothing_thrown.starts_with("expected TypeError, but nothing was thrown"));
}

#[test]
fn assertion_failures_record_the_caller() {
    let error = assert_same(65536, 0).unwrap_err();
    insta::assert_snapshot!(error, @"expected 65536, but got 0");
    assert!(error.location().file().ends_with("main.rs"));
    assert_eq!(error.location().line(), line!() - 3);

    assert_eq!(assert_true(true, "unused"), Ok(()));
    insta::assert_snapshot!(
        assert_true(false, "buffer is the same").unwrap_err(),
        @"assertion failed: buffer is the same"
    );
}

#[test]
fn directives_are_parsed_by_name() {
    for directive in Directive::ALL {
        assert_eq!(directive.name().parse::<Directive>(), Ok(directive));
    }

    insta::assert_snapshot!(
        "debug".parse::<Directive>().unwrap_err(),
        @r###"unknown directive "debug", expected one of debug-builtin, webassembly, direct-byte-buffer"###
    );

    let options = "webassembly, debug-builtin".parse::<Options>().unwrap();
    assert!(options.is_enabled(Directive::WebAssembly));
    assert!(options.is_enabled(Directive::DebugBuiltin));
    assert!(!options.is_enabled(Directive::DirectByteBuffer));
    assert_eq!(options.to_string(), "debug-builtin,webassembly");
    assert_eq!("".parse::<Options>(), Ok(Options::new()));
}

#[test]
fn missing_directives() {
    let required = *Options::new().debug_builtin(true).webassembly(true);
    let enabled = *Options::new().webassembly(true);
    assert_eq!(enabled.missing(&required), vec![Directive::DebugBuiltin]);
    assert!(required.missing(&enabled).is_empty());
}

#[test]
fn context_guards_features() {
    let cx = Context::new(Options::new());
    insta::assert_snapshot!(cx.debug().unwrap_err(), @"the debug-builtin directive is not enabled");
    assert!(cx.webassembly().is_err());

    let cx = Context::new(Directive::ALL.into_iter().collect());
    assert!(cx.debug().is_ok());
    assert!(cx.webassembly().is_ok());
}

#[test]
fn debug_builtin_cannot_detach_memory_buffers() {
    let cx = Context::new(*Options::new().debug_builtin(true));
    let instance = instantiate(r#"(module (memory (export "memory") 1))"#);
    let buffer = instance.get_memory("memory").unwrap().buffer();

    assert_eq!(
        cx.debug().unwrap().typed_array_detach_buffer(&buffer),
        Err(BufferError::DetachKeyMismatch)
    );
    assert!(!buffer.is_detached());
}

#[test]
fn probes_pass() {
    assert!(memprobe_harness::run(&DetachedSliceProbe, None).is_ok());
    assert!(memprobe_harness::run(&MemoryGrowProbe, None).is_ok());

    let only_debug = *Options::new().debug_builtin(true);
    assert!(memprobe_harness::run(&DetachedSliceProbe, Some(only_debug)).is_ok());
}

#[test]
fn probes_require_directives() {
    let error = memprobe_harness::run(&MemoryGrowProbe, Some(Options::new())).unwrap_err();
    assert!(matches!(
        &error,
        ProbeError::MissingDirectives(missing) if missing == &[Directive::WebAssembly]
    ));
    insta::assert_snapshot!(error, @"missing required directives: webassembly");
}

#[test]
fn probes_are_registered() {
    let names = PROBES.iter().map(|probe| probe.name()).collect::<Vec<_>>();
    assert_eq!(names, ["detached-buffer-slice", "memory-grow-buffer-reset"]);

    assert!(memprobe_harness::find("memory-grow-buffer-reset").is_some());
    assert!(memprobe_harness::find("no-such-probe").is_none());
}

#[test]
fn report() {
    let report = memprobe_harness::run_all(PROBES.iter().copied(), None);
    assert!(report.is_success());
    insta::assert_snapshot!(report, @r###"
    ok   detached-buffer-slice
    ok   memory-grow-buffer-reset
    2 passed, 0 failed
    "###);

    let report = memprobe_harness::run_all(PROBES.iter().copied(), Some(Options::new()));
    assert!(!report.is_success());
    assert_eq!(report.failed(), 2);
    insta::assert_snapshot!(report, @r###"
    FAIL detached-buffer-slice: missing required directives: debug-builtin
    FAIL memory-grow-buffer-reset: missing required directives: webassembly
    0 passed, 2 failed
    "###);
}

const GROW_BY_PARAMETER: &str = r#"(module
    (memory (export "memory") 2 8)
    (func (export "grow") (param i32) (result i32)
        (memory.grow (local.get 0))))
"#;

#[test]
fn growth_with_parameter() {
    let instance = instantiate(GROW_BY_PARAMETER);
    let scenario = GrowthScenario {
        initial_pages: 2,
        delta: 3,
    };

    assert!(check_growth(&instance, scenario).is_ok());
}

#[test]
fn growth_mismatch_is_reported() {
    let instance = instantiate(
        r#"(module
            (memory (export "memory") 1 2)
            (func (export "grow") (drop (memory.grow (i32.const 0)))))
        "#,
    );

    let scenario = GrowthScenario {
        initial_pages: 1,
        delta: 1,
    };

    match check_growth(&instance, scenario) {
        Err(ProbeError::Assertion(error)) => {
            insta::assert_snapshot!(error, @"expected 131072, but got 65536")
        }
        other => panic!("expected assertion failure, got {other:?}"),
    }
}

#[test]
fn growth_failure_is_reported() {
    let instance = instantiate(GROW_BY_PARAMETER);
    let scenario = GrowthScenario {
        initial_pages: 2,
        delta: 7,
    };

    // The buffer is not reset when `memory.grow` fails.
    match check_growth(&instance, scenario) {
        Err(ProbeError::Assertion(error)) => {
            insta::assert_snapshot!(error, @"expected 0, but got 131072")
        }
        other => panic!("expected assertion failure, got {other:?}"),
    }
}

#[test]
fn growth_requires_exports() {
    let instance = instantiate(r#"(module (memory (export "mem") 1))"#);
    let error = check_growth(
        &instance,
        GrowthScenario {
            initial_pages: 1,
            delta: 0,
        },
    )
    .unwrap_err();

    insta::assert_snapshot!(error, @r###"unexpected error: instance does not export a memory named "memory""###);
}
