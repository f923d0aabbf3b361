use crate::module::ExportKind;
use crate::{code, Error, Memory, Module, Realm};
use anyhow::Context as _;
use memprobe_rt_memory::{HeapMemory, MAX_PAGE_COUNT};
use std::rc::Rc;

/// A value that can be imported into or exported from an [`Instance`].
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Extern {
    /// An exported function.
    Func(Func),
    /// A memory object.
    Memory(Memory),
}

impl Extern {
    /// Gets the memory object, if this is one.
    pub fn as_memory(&self) -> Option<&Memory> {
        match self {
            Self::Memory(memory) => Some(memory),
            _ => None,
        }
    }

    /// Gets the function, if this is one.
    pub fn as_func(&self) -> Option<&Func> {
        match self {
            Self::Func(func) => Some(func),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Func(_) => "function",
            Self::Memory(_) => "memory",
        }
    }
}

impl From<Memory> for Extern {
    fn from(memory: Memory) -> Self {
        Self::Memory(memory)
    }
}

impl From<Func> for Extern {
    fn from(func: Func) -> Self {
        Self::Func(func)
    }
}

/// The values provided to the imports of a [`Module`] when it is instantiated.
#[derive(Clone, Debug, Default)]
pub struct Imports {
    definitions: Vec<(Box<str>, Box<str>, Extern)>,
}

impl Imports {
    /// Creates an empty set of imports.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines the value for the import with the given `module` and `name`, replacing any
    /// previous definition.
    pub fn define(&mut self, module: &str, name: &str, value: impl Into<Extern>) -> &mut Self {
        let value = value.into();
        match self
            .definitions
            .iter_mut()
            .find(|(m, n, _)| **m == *module && **n == *name)
        {
            Some((_, _, existing)) => *existing = value,
            None => self.definitions.push((module.into(), name.into(), value)),
        }
        self
    }

    /// Defines a memory import.
    pub fn memory(&mut self, module: &str, name: &str, memory: Memory) -> &mut Self {
        self.define(module, name, memory)
    }

    /// Gets the value defined for an import.
    pub fn get(&self, module: &str, name: &str) -> Option<&Extern> {
        self.definitions
            .iter()
            .find(|(m, n, _)| **m == *module && **n == *name)
            .map(|(_, _, value)| value)
    }
}

struct InstanceInner {
    module: Module,
    memories: Vec<Memory>,
}

/// A function exported from an [`Instance`].
#[derive(Clone)]
pub struct Func {
    instance: Rc<InstanceInner>,
    index: usize,
}

impl Func {
    fn function(&self) -> crate::Result<&code::Function> {
        self.instance
            .module
            .0
            .functions
            .get(self.index)
            .ok_or_else(|| Error::link(anyhow::anyhow!("no function at index {}", self.index)))
    }

    /// Calls the function with the given `i32` arguments, returning its results.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorClass::TypeError`] if the number of arguments is incorrect, or an
    /// [`ErrorClass::RuntimeError`] if the function traps.
    ///
    /// [`ErrorClass::TypeError`]: crate::ErrorClass::TypeError
    /// [`ErrorClass::RuntimeError`]: crate::ErrorClass::RuntimeError
    pub fn call(&self, arguments: &[i32]) -> crate::Result<Vec<i32>> {
        let function = self.function()?;
        if arguments.len() != function.params {
            return Err(Error::type_error(anyhow::anyhow!(
                "expected {} arguments, but got {}",
                function.params,
                arguments.len()
            )));
        }

        log::trace!("calling function #{} with {arguments:?}", self.index);
        code::execute(function, &self.instance.memories, arguments)
    }

    /// The number of parameters the function takes.
    pub fn param_count(&self) -> usize {
        self.function().map_or(0, |function| function.params)
    }

    /// The number of results the function returns.
    pub fn result_count(&self) -> usize {
        self.function().map_or(0, |function| function.results)
    }
}

impl std::fmt::Debug for Func {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Func").field("index", &self.index).finish()
    }
}

/// An instantiated [`Module`].
pub struct Instance {
    inner: Rc<InstanceInner>,
    exports: Vec<(Box<str>, Extern)>,
}

fn resolve_memory_imports(module: &Module, imports: &Imports) -> anyhow::Result<Vec<Memory>> {
    if let Some((module_name, name)) = module.0.function_imports.first() {
        anyhow::bail!(
            "cannot import function {module_name:?} {name:?}, function imports are not supported"
        );
    }

    let mut memories = Vec::with_capacity(module.0.memory_imports.len());
    for import in module.memory_imports() {
        let value = imports.get(import.module(), import.name()).with_context(|| {
            format!(
                "missing memory import {:?} {:?}",
                import.module(),
                import.name()
            )
        })?;

        let memory = value.as_memory().with_context(|| {
            format!(
                "expected memory for import {:?} {:?}, but got {}",
                import.module(),
                import.name(),
                value.kind()
            )
        })?;

        memprobe_rt_core::limit::check(
            memory.size(),
            memory.maximum(),
            import.minimum(),
            import.maximum().unwrap_or(MAX_PAGE_COUNT),
        )
        .with_context(|| {
            format!(
                "memory import {:?} {:?} with limits {} does not match a memory of {} pages \
                 with a maximum of {}",
                import.module(),
                import.name(),
                import.limits,
                memory.size(),
                memory.maximum()
            )
        })?;

        memories.push(memory.clone());
    }

    Ok(memories)
}

impl Instance {
    /// Instantiates a `module` in the given `realm`.
    ///
    /// Memories defined by the module are allocated and wrapped in memory objects belonging to
    /// the `realm`. Imported memories are used as is, so exporting one returns the same object.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorClass::LinkError`] if an import is missing, has the wrong kind, has
    /// limits that do not match, or is a function. Returns an [`ErrorClass::RangeError`] if a
    /// memory could not be allocated.
    ///
    /// [`ErrorClass::LinkError`]: crate::ErrorClass::LinkError
    /// [`ErrorClass::RangeError`]: crate::ErrorClass::RangeError
    pub fn new(realm: &Realm, module: &Module, imports: &Imports) -> crate::Result<Self> {
        let mut memories = resolve_memory_imports(module, imports)
            .context("could not link module")
            .map_err(Error::link)?;

        for limits in module.0.memories.iter() {
            let memory =
                HeapMemory::with_limits(limits.minimum, limits.maximum.unwrap_or(MAX_PAGE_COUNT))
                    .with_context(|| format!("could not allocate memory with limits {limits}"))
                    .map_err(Error::range)?;

            memories.push(realm.memory_object(Rc::new(memory)));
        }

        let inner = Rc::new(InstanceInner {
            module: module.clone(),
            memories,
        });

        let imported_functions = module.0.function_imports.len();
        let mut exports = Vec::with_capacity(module.exports().len());
        for export in module.exports() {
            let value = match export.kind() {
                ExportKind::Memory(index) => usize::try_from(index)
                    .ok()
                    .and_then(|index| inner.memories.get(index))
                    .cloned()
                    .map(Extern::Memory),
                ExportKind::Func(index) => usize::try_from(index)
                    .ok()
                    .and_then(|index| index.checked_sub(imported_functions))
                    .map(|index| {
                        Extern::Func(Func {
                            instance: inner.clone(),
                            index,
                        })
                    }),
            };

            let value = value
                .with_context(|| format!("could not resolve export {:?}", export.name()))
                .map_err(Error::link)?;

            exports.push((export.name().into(), value));
        }

        log::debug!(
            "instantiated module with {} memories and {} exports",
            inner.memories.len(),
            exports.len()
        );

        Ok(Self { inner, exports })
    }

    /// Gets the exports of the instance, in the order they are declared.
    pub fn exports(&self) -> impl ExactSizeIterator<Item = (&str, &Extern)> + '_ {
        self.exports.iter().map(|(name, value)| (&**name, value))
    }

    /// Gets the export with the given `name`.
    pub fn get_export(&self, name: &str) -> Option<&Extern> {
        self.exports
            .iter()
            .find(|(export, _)| **export == *name)
            .map(|(_, value)| value)
    }

    /// Gets the exported memory with the given `name`.
    pub fn get_memory(&self, name: &str) -> Option<Memory> {
        self.get_export(name)?.as_memory().cloned()
    }

    /// Gets the exported function with the given `name`.
    pub fn get_func(&self, name: &str) -> Option<Func> {
        self.get_export(name)?.as_func().cloned()
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("module", &self.inner.module)
            .field("memories", &self.inner.memories)
            .field("exports", &self.exports)
            .finish()
    }
}
