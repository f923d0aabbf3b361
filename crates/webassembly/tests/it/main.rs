//! Tests for [`memprobe_webassembly`].

use memprobe_webassembly::{
    Classify as _, ErrorClass, Imports, Instance, Memory, MemoryDescriptor, Module, Realm,
};

const PAGE: usize = 65536;

const GROWABLE: &str = r#"(module
    (memory (export "memory") 1 2)
    (func (export "grow") (param i32) (result i32)
        local.get 0
        memory.grow)
    (func (export "size") (result i32)
        memory.size)
    (func (export "load") (param i32) (result i32)
        (i32.load (local.get 0)))
    (func (export "store") (param i32 i32)
        (i32.store (local.get 0) (local.get 1)))
    (func (export "load8_u") (param i32) (result i32)
        (i32.load8_u offset=1 (local.get 0)))
    (func (export "store8") (param i32 i32)
        (i32.store8 offset=1 (local.get 0) (local.get 1))))
"#;

fn instantiate(
    realm: &Realm,
    wat: &str,
    imports: &Imports,
) -> memprobe_webassembly::Result<Instance> {
    let wasm = wat::parse_str(wat).unwrap();
    let module = Module::new(&wasm)?;
    Instance::new(realm, &module, imports)
}

fn growable(realm: &Realm) -> Instance {
    instantiate(realm, GROWABLE, &Imports::new()).unwrap()
}

fn compile_error(wat: &str) -> ErrorClass {
    let wasm = wat::parse_str(wat).unwrap();
    Module::new(&wasm).unwrap_err().class()
}

#[test]
fn buffer_is_cached_until_growth() {
    let realm = Realm::new();
    let instance = growable(&realm);
    let memory = instance.get_memory("memory").unwrap();

    let first = memory.buffer();
    assert!(first.same(&memory.buffer()));
    assert_eq!(first.byte_length(), PAGE);
    assert!(first.is_memory_backed());
}

#[test]
fn module_growth_detaches_buffer() {
    let realm = Realm::new();
    let instance = growable(&realm);
    let memory = instance.get_memory("memory").unwrap();
    let grow = instance.get_func("grow").unwrap();

    let old = memory.buffer();
    assert_eq!(grow.call(&[1]).unwrap(), vec![1]);

    let current = memory.buffer();
    assert_eq!(old.byte_length(), 0);
    assert!(old.is_detached());
    assert!(!old.same(&current));
    assert_eq!(current.byte_length(), 2 * PAGE);
    assert!(old.tag().is_superseded_by(&current.tag()));
}

#[test]
fn zero_delta_growth_detaches_buffer() {
    let realm = Realm::new();
    let instance = growable(&realm);
    let memory = instance.get_memory("memory").unwrap();
    let generation = memory.generation();

    let old = memory.buffer();
    assert_eq!(instance.get_func("grow").unwrap().call(&[0]).unwrap(), vec![1]);

    let current = memory.buffer();
    assert_eq!(old.byte_length(), 0);
    assert!(!old.same(&current));
    assert_eq!(current.byte_length(), PAGE);
    assert_eq!(memory.generation(), generation.next());
}

#[test]
fn host_growth_detaches_buffer() {
    let realm = Realm::new();
    let memory = Memory::new(
        &realm,
        MemoryDescriptor {
            initial: 1,
            maximum: Some(2),
        },
    )
    .unwrap();

    let old = memory.buffer();
    assert_eq!(memory.grow(0).unwrap(), 1);
    assert!(old.is_detached());
    assert_eq!(memory.grow(1).unwrap(), 1);
    assert_eq!(memory.buffer().byte_length(), 2 * PAGE);
}

#[test]
fn failed_growth_keeps_buffer() {
    let realm = Realm::new();
    let instance = growable(&realm);
    let memory = instance.get_memory("memory").unwrap();

    let buffer = memory.buffer();
    assert_eq!(instance.get_func("grow").unwrap().call(&[2]).unwrap(), vec![-1]);
    assert!(!buffer.is_detached());

    let error = memory.grow(2).unwrap_err();
    assert_eq!(error.class(), ErrorClass::RangeError);
    insta::assert_snapshot!(error, @"RangeError: could not grow memory of 1 pages by 2: couldn't allocate 2 pages");

    assert!(buffer.same(&memory.buffer()));
    assert_eq!(buffer.byte_length(), PAGE);
}

#[test]
fn buffer_views_memory_contents() {
    let realm = Realm::new();
    let instance = growable(&realm);
    let memory = instance.get_memory("memory").unwrap();

    instance
        .get_func("store")
        .unwrap()
        .call(&[8, 0x0403_0201])
        .unwrap();

    let mut bytes = [0u8; 4];
    memory.buffer().read(8, &mut bytes).unwrap();
    assert_eq!(bytes, [1, 2, 3, 4]);

    memory.buffer().write(8, &[0xFF]).unwrap();
    let load = instance.get_func("load").unwrap();
    assert_eq!(load.call(&[8]).unwrap(), vec![0x0403_02FF]);
}

#[test]
fn byte_accesses_zero_extend() {
    let realm = Realm::new();
    let instance = growable(&realm);

    instance.get_func("store8").unwrap().call(&[0, -1]).unwrap();
    assert_eq!(
        instance.get_func("load8_u").unwrap().call(&[0]).unwrap(),
        vec![0xFF]
    );
    assert_eq!(instance.get_func("load").unwrap().call(&[0]).unwrap(), vec![0xFF00]);
}

#[test]
fn out_of_bounds_access_traps() {
    let realm = Realm::new();
    let instance = growable(&realm);

    let error = instance
        .get_func("load")
        .unwrap()
        .call(&[0x10000])
        .unwrap_err();

    assert_eq!(error.class(), ErrorClass::RuntimeError);
    insta::assert_snapshot!(error, @"RuntimeError: invalid access of linear memory #0 at address 0x10000");

    let error = instance
        .get_func("load8_u")
        .unwrap()
        .call(&[-1])
        .unwrap_err();

    assert_eq!(error.class(), ErrorClass::RuntimeError);
    insta::assert_snapshot!(error, @"RuntimeError: invalid access of linear memory #0 at address 0xFFFFFFFF + 0x1");
}

#[test]
fn wrong_argument_count() {
    let realm = Realm::new();
    let instance = growable(&realm);
    let grow = instance.get_func("grow").unwrap();

    assert_eq!(grow.param_count(), 1);
    assert_eq!(grow.result_count(), 1);

    let error = grow.call(&[]).unwrap_err();
    assert_eq!(error.class(), ErrorClass::TypeError);
    insta::assert_snapshot!(error, @"TypeError: expected 1 arguments, but got 0");
}

#[test]
fn duplicate_exports_are_the_same_object() {
    let realm = Realm::new();
    let instance = instantiate(
        &realm,
        r#"(module
            (memory 1)
            (export "a" (memory 0))
            (export "b" (memory 0)))
        "#,
        &Imports::new(),
    )
    .unwrap();

    let a = instance.get_memory("a").unwrap();
    let b = instance.get_memory("b").unwrap();
    assert!(a.same(&b));
    assert!(a.buffer().same(&b.buffer()));

    let names = instance.exports().map(|(name, _)| name).collect::<Vec<_>>();
    assert_eq!(names, ["a", "b"]);
}

#[test]
fn reexported_imports_are_the_same_object() {
    let realm = Realm::new();
    let memory = Memory::new(
        &realm,
        MemoryDescriptor {
            initial: 1,
            maximum: Some(4),
        },
    )
    .unwrap();

    let mut imports = Imports::new();
    imports.memory("env", "memory", memory.clone());

    let instance = instantiate(
        &realm,
        r#"(module
            (import "env" "memory" (memory 1 4))
            (export "memory" (memory 0))
            (func (export "grow") (param i32) (result i32)
                (memory.grow (local.get 0))))
        "#,
        &imports,
    )
    .unwrap();

    let exported = instance.get_memory("memory").unwrap();
    assert!(exported.same(&memory));

    let old = memory.buffer();
    instance.get_func("grow").unwrap().call(&[0]).unwrap();
    assert!(old.is_detached());
    assert!(!old.same(&exported.buffer()));
}

#[test]
fn memory_import_limits_must_match() {
    let realm = Realm::new();
    let small = Memory::new(
        &realm,
        MemoryDescriptor {
            initial: 1,
            maximum: Some(2),
        },
    )
    .unwrap();

    let mut imports = Imports::new();
    imports.memory("env", "memory", small);

    let too_small = instantiate(
        &realm,
        r#"(module (import "env" "memory" (memory 2)))"#,
        &imports,
    )
    .unwrap_err();
    assert_eq!(too_small.class(), ErrorClass::LinkError);

    let too_large = instantiate(
        &realm,
        r#"(module (import "env" "memory" (memory 1 1)))"#,
        &imports,
    )
    .unwrap_err();
    assert_eq!(too_large.class(), ErrorClass::LinkError);

    let missing = instantiate(
        &realm,
        r#"(module (import "env" "other" (memory 1)))"#,
        &imports,
    )
    .unwrap_err();
    assert_eq!(missing.class(), ErrorClass::LinkError);
    insta::assert_snapshot!(missing, @r###"LinkError: could not link module: missing memory import "env" "other""###);

    assert!(instantiate(
        &realm,
        r#"(module (import "env" "memory" (memory 1 2)))"#,
        &imports,
    )
    .is_ok());
}

#[test]
fn function_imports_are_rejected() {
    let error = instantiate(
        &Realm::new(),
        r#"(module (import "env" "f" (func)))"#,
        &Imports::new(),
    )
    .unwrap_err();

    assert_eq!(error.class(), ErrorClass::LinkError);
    insta::assert_snapshot!(error, @r###"LinkError: could not link module: cannot import function "env" "f", function imports are not supported"###);
}

#[test]
fn unsupported_features_fail_to_compile() {
    assert_eq!(
        compile_error(
            r#"(module (func (param i32) (result i32) (i32.mul (local.get 0) (local.get 0))))"#
        ),
        ErrorClass::CompileError
    );
    assert_eq!(
        compile_error(r#"(module (func (param i64)))"#),
        ErrorClass::CompileError
    );
    assert_eq!(
        compile_error(r#"(module (global i32 (i32.const 0)))"#),
        ErrorClass::CompileError
    );
    assert_eq!(
        compile_error(r#"(module (memory 1) (data (i32.const 0) "abc"))"#),
        ErrorClass::CompileError
    );
    assert_eq!(
        compile_error(r#"(module (table 1 funcref))"#),
        ErrorClass::CompileError
    );
}

#[test]
fn malformed_modules_fail_to_compile() {
    let error = Module::new(&[0x00, 0x61, 0x73, 0x6D, 0x02]).unwrap_err();
    assert_eq!(error.class(), ErrorClass::CompileError);
}

#[test]
fn invalid_memory_descriptors() {
    let realm = Realm::new();
    let error = Memory::new(
        &realm,
        MemoryDescriptor {
            initial: 3,
            maximum: Some(2),
        },
    )
    .unwrap_err();

    assert_eq!(error.class(), ErrorClass::RangeError);
    insta::assert_snapshot!(error, @"RangeError: initial page count 3 is greater than the maximum of 2");

    let error = Memory::new(
        &realm,
        MemoryDescriptor {
            initial: 0,
            maximum: Some(65537),
        },
    )
    .unwrap_err();
    assert_eq!(error.class(), ErrorClass::RangeError);
}
