//! Decoding and validation of binary modules.

use crate::code::{self, Function};
use anyhow::Context as _;
use std::rc::Rc;

/// The set of WebAssembly features accepted by the validator.
const SUPPORTED_FEATURES: wasmparser::WasmFeatures = {
    macro_rules! features {
        ($($name:ident),*) => {{
            let features = wasmparser::WasmFeatures::empty();
            $(
                let features = features.union(wasmparser::WasmFeatures::$name);
            )*
            features
        }};
    }

    features! {
        MUTABLE_GLOBAL,
        SATURATING_FLOAT_TO_INT,
        SIGN_EXTENSION,
        MULTI_VALUE,
        FLOATS
    }
};

/// The limits of a linear memory, in pages.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct MemoryLimits {
    pub(crate) minimum: u32,
    pub(crate) maximum: Option<u32>,
}

impl MemoryLimits {
    fn from_type(ty: &wasmparser::MemoryType) -> anyhow::Result<Self> {
        anyhow::ensure!(!ty.memory64, "64-bit memories are not supported");
        anyhow::ensure!(!ty.shared, "shared memories are not supported");

        Ok(Self {
            minimum: u32::try_from(ty.initial).context("minimum page count is too large")?,
            maximum: ty
                .maximum
                .map(u32::try_from)
                .transpose()
                .context("maximum page count is too large")?,
        })
    }
}

impl std::fmt::Display for MemoryLimits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.minimum)?;
        if let Some(maximum) = self.maximum {
            write!(f, " {maximum}")?;
        }
        Ok(())
    }
}

/// What kind of definition a module exports.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ExportKind {
    /// A function, identified by its index in the function index space.
    Func(u32),
    /// A linear memory, identified by its index in the memory index space.
    Memory(u32),
}

/// Describes an export of a [`Module`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExportDescriptor {
    name: Box<str>,
    kind: ExportKind,
}

impl ExportDescriptor {
    /// The name of the export.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// What is exported.
    pub fn kind(&self) -> ExportKind {
        self.kind
    }
}

/// Describes a memory import of a [`Module`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImportDescriptor {
    module: Box<str>,
    name: Box<str>,
    pub(crate) limits: MemoryLimits,
}

impl ImportDescriptor {
    /// The module name of the import.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The field name of the import.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The minimum number of pages the imported memory must have.
    pub fn minimum(&self) -> u32 {
        self.limits.minimum
    }

    /// The maximum number of pages the imported memory may have, if any.
    pub fn maximum(&self) -> Option<u32> {
        self.limits.maximum
    }
}

pub(crate) struct ModuleInner {
    pub(crate) memory_imports: Vec<ImportDescriptor>,
    /// Function imports are decoded so that instantiation can report them.
    pub(crate) function_imports: Vec<(Box<str>, Box<str>)>,
    pub(crate) memories: Vec<MemoryLimits>,
    pub(crate) functions: Vec<Function>,
    pub(crate) exports: Vec<ExportDescriptor>,
}

/// A validated WebAssembly module, ready to be instantiated.
///
/// Cloning a [`Module`] is cheap.
#[derive(Clone)]
pub struct Module(pub(crate) Rc<ModuleInner>);

struct Sections<'a> {
    memory_imports: Vec<ImportDescriptor>,
    function_imports: Vec<(Box<str>, Box<str>)>,
    memories: Vec<MemoryLimits>,
    exports: Vec<ExportDescriptor>,
    bodies: Vec<wasmparser::FunctionBody<'a>>,
}

fn unsupported(what: &str) -> anyhow::Error {
    anyhow::anyhow!("{what} are not supported")
}

fn parse(wasm: &[u8]) -> anyhow::Result<(Sections<'_>, wasmparser::types::Types)> {
    use wasmparser::{Payload, ValidPayload};

    let mut validator = wasmparser::Validator::new_with_features(SUPPORTED_FEATURES);
    let mut sections = Sections {
        memory_imports: Vec::new(),
        function_imports: Vec::new(),
        memories: Vec::new(),
        exports: Vec::new(),
        bodies: Vec::new(),
    };

    for result in wasmparser::Parser::new(0).parse_all(wasm) {
        let payload = result?;

        match validator.payload(&payload)? {
            ValidPayload::Ok => (),
            ValidPayload::Func(func, body) => {
                let mut func_validator = func.into_validator(Default::default());
                func_validator.validate(&body)?;
                sections.bodies.push(body);
                continue;
            }
            ValidPayload::End(types) => return Ok((sections, types)),
            ValidPayload::Parser(_) => anyhow::bail!("nested modules are not supported"),
        }

        match payload {
            Payload::ImportSection(imports) => {
                for import in imports {
                    let import = import?;
                    match import.ty {
                        wasmparser::TypeRef::Memory(ty) => {
                            sections.memory_imports.push(ImportDescriptor {
                                module: import.module.into(),
                                name: import.name.into(),
                                limits: MemoryLimits::from_type(&ty)?,
                            })
                        }
                        wasmparser::TypeRef::Func(_) => sections
                            .function_imports
                            .push((import.module.into(), import.name.into())),
                        wasmparser::TypeRef::Table(_) => return Err(unsupported("table imports")),
                        wasmparser::TypeRef::Global(_) => {
                            return Err(unsupported("global imports"))
                        }
                        wasmparser::TypeRef::Tag(_) => return Err(unsupported("tag imports")),
                    }
                }
            }
            Payload::MemorySection(memories) => {
                for ty in memories {
                    sections.memories.push(MemoryLimits::from_type(&ty?)?);
                }
            }
            Payload::ExportSection(exports) => {
                for export in exports {
                    let export = export?;
                    let kind = match export.kind {
                        wasmparser::ExternalKind::Func => ExportKind::Func(export.index),
                        wasmparser::ExternalKind::Memory => ExportKind::Memory(export.index),
                        wasmparser::ExternalKind::Table => return Err(unsupported("table exports")),
                        wasmparser::ExternalKind::Global => {
                            return Err(unsupported("global exports"))
                        }
                        wasmparser::ExternalKind::Tag => return Err(unsupported("tag exports")),
                    };

                    sections.exports.push(ExportDescriptor {
                        name: export.name.into(),
                        kind,
                    });
                }
            }
            Payload::TableSection(_) => return Err(unsupported("tables")),
            Payload::GlobalSection(_) => return Err(unsupported("globals")),
            Payload::StartSection { .. } => return Err(unsupported("start functions")),
            Payload::ElementSection(_) => return Err(unsupported("element segments")),
            Payload::DataSection(_) => return Err(unsupported("data segments")),
            // Types and function declarations are read back from the validator.
            _ => (),
        }
    }

    // The validator rejects a module that ends without a `Payload::End`.
    anyhow::bail!("unexpected end of module")
}

impl Module {
    /// Decodes and validates a module in the [binary format].
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorClass::CompileError`] if the module is malformed, invalid, or uses a
    /// feature that is not supported.
    ///
    /// [binary format]: https://webassembly.github.io/spec/core/binary/index.html
    /// [`ErrorClass::CompileError`]: crate::ErrorClass::CompileError
    pub fn new(wasm: &[u8]) -> crate::Result<Self> {
        Self::compile(wasm)
            .context("could not compile module")
            .map_err(crate::Error::compile)
    }

    fn compile(wasm: &[u8]) -> anyhow::Result<Self> {
        let (sections, types) = parse(wasm)?;

        let imported_count = sections.function_imports.len();
        let mut functions = Vec::with_capacity(sections.bodies.len());
        for (defined, body) in sections.bodies.iter().enumerate() {
            let index = u32::try_from(imported_count + defined)
                .context("too many functions")?;

            let func_type = types[types.core_function_at(index)].unwrap_func();
            let function = code::lower(func_type, body)
                .with_context(|| format!("could not lower function #{index}"))?;

            functions.push(function);
        }

        log::debug!(
            "compiled module with {} functions, {} memories, and {} exports",
            functions.len(),
            sections.memory_imports.len() + sections.memories.len(),
            sections.exports.len()
        );

        Ok(Self(Rc::new(ModuleInner {
            memory_imports: sections.memory_imports,
            function_imports: sections.function_imports,
            memories: sections.memories,
            functions,
            exports: sections.exports,
        })))
    }

    /// Gets the exports of the module, in the order they are declared.
    pub fn exports(&self) -> &[ExportDescriptor] {
        &self.0.exports
    }

    /// Gets the memory imports of the module.
    pub fn memory_imports(&self) -> &[ImportDescriptor] {
        &self.0.memory_imports
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("memory_imports", &self.0.memory_imports)
            .field("function_imports", &self.0.function_imports)
            .field("memories", &self.0.memories)
            .field("function_count", &self.0.functions.len())
            .field("exports", &self.0.exports)
            .finish()
    }
}
