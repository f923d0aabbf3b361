//! Lowering and interpretation of function bodies.
//!
//! Only a small subset of the `i32` instructions is supported. Control flow is limited to
//! falling off the end of the function or an explicit `return`.

use crate::Memory;
use anyhow::Context as _;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Instr {
    Nop,
    Drop,
    Return,
    I32Const(i32),
    I32Add,
    I32Sub,
    LocalGet(u32),
    LocalSet(u32),
    LocalTee(u32),
    MemorySize(u32),
    MemoryGrow(u32),
    I32Load { memory: u32, offset: u32 },
    I32Store { memory: u32, offset: u32 },
    I32Load8U { memory: u32, offset: u32 },
    I32Store8 { memory: u32, offset: u32 },
}

#[derive(Debug)]
pub(crate) struct Function {
    pub(crate) params: usize,
    pub(crate) results: usize,
    /// Number of locals declared in the body, not counting parameters.
    locals: usize,
    code: Box<[Instr]>,
}

fn require_i32(ty: wasmparser::ValType, what: &str) -> anyhow::Result<()> {
    if ty == wasmparser::ValType::I32 {
        Ok(())
    } else {
        anyhow::bail!("{what} of type {ty} are not supported")
    }
}

fn memory_offset(memarg: &wasmparser::MemArg) -> anyhow::Result<(u32, u32)> {
    let offset = u32::try_from(memarg.offset).context("memory offset is too large")?;
    Ok((memarg.memory, offset))
}

pub(crate) fn lower(
    func_type: &wasmparser::FuncType,
    body: &wasmparser::FunctionBody,
) -> anyhow::Result<Function> {
    use wasmparser::Operator;

    for param in func_type.params() {
        require_i32(*param, "parameters")?;
    }

    for result in func_type.results() {
        require_i32(*result, "results")?;
    }

    let mut locals = 0usize;
    for group in body.get_locals_reader()? {
        let (count, ty) = group?;
        require_i32(ty, "locals")?;
        locals = locals
            .checked_add(usize::try_from(count)?)
            .context("too many locals")?;
    }

    let mut code = Vec::new();
    let mut operators = body.get_operators_reader()?;
    while !operators.eof() {
        let offset = operators.original_position();
        let instr = match operators.read()? {
            Operator::Nop => Instr::Nop,
            Operator::Drop => Instr::Drop,
            Operator::Return => Instr::Return,
            // Without blocks, the only `end` is the one closing the body.
            Operator::End => Instr::Return,
            Operator::I32Const { value } => Instr::I32Const(value),
            Operator::I32Add => Instr::I32Add,
            Operator::I32Sub => Instr::I32Sub,
            Operator::LocalGet { local_index } => Instr::LocalGet(local_index),
            Operator::LocalSet { local_index } => Instr::LocalSet(local_index),
            Operator::LocalTee { local_index } => Instr::LocalTee(local_index),
            Operator::MemorySize { mem, .. } => Instr::MemorySize(mem),
            Operator::MemoryGrow { mem, .. } => Instr::MemoryGrow(mem),
            Operator::I32Load { memarg } => {
                let (memory, offset) = memory_offset(&memarg)?;
                Instr::I32Load { memory, offset }
            }
            Operator::I32Store { memarg } => {
                let (memory, offset) = memory_offset(&memarg)?;
                Instr::I32Store { memory, offset }
            }
            Operator::I32Load8U { memarg } => {
                let (memory, offset) = memory_offset(&memarg)?;
                Instr::I32Load8U { memory, offset }
            }
            Operator::I32Store8 { memarg } => {
                let (memory, offset) = memory_offset(&memarg)?;
                Instr::I32Store8 { memory, offset }
            }
            unsupported => {
                anyhow::bail!("unsupported instruction {unsupported:?} at offset {offset:#X}")
            }
        };

        code.push(instr);
    }

    Ok(Function {
        params: func_type.params().len(),
        results: func_type.results().len(),
        locals,
        code: code.into_boxed_slice(),
    })
}

struct Frame<'a> {
    locals: Vec<i32>,
    stack: Vec<i32>,
    memories: &'a [Memory],
}

impl Frame<'_> {
    fn pop(&mut self) -> crate::Result<i32> {
        self.stack
            .pop()
            .ok_or_else(|| crate::Error::runtime(anyhow::anyhow!("operand stack underflow")))
    }

    fn local(&mut self, index: u32) -> crate::Result<&mut i32> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.locals.get_mut(index))
            .ok_or_else(|| crate::Error::runtime(anyhow::anyhow!("no local at index {index}")))
    }

    fn memory(&self, index: u32) -> crate::Result<&Memory> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.memories.get(index))
            .ok_or_else(|| crate::Error::runtime(anyhow::anyhow!("no memory at index {index}")))
    }
}

/// Runs a function to completion, returning its results.
pub(crate) fn execute(
    function: &Function,
    memories: &[Memory],
    arguments: &[i32],
) -> crate::Result<Vec<i32>> {
    use memprobe_rt_memory as rt;

    let mut locals = Vec::with_capacity(arguments.len() + function.locals);
    locals.extend_from_slice(arguments);
    locals.resize(arguments.len() + function.locals, 0);

    let mut frame = Frame {
        locals,
        stack: Vec::new(),
        memories,
    };

    for instr in function.code.iter().copied() {
        match instr {
            Instr::Nop => (),
            Instr::Drop => {
                frame.pop()?;
            }
            Instr::Return => break,
            Instr::I32Const(value) => frame.stack.push(value),
            Instr::I32Add => {
                let (c2, c1) = (frame.pop()?, frame.pop()?);
                frame.stack.push(c1.wrapping_add(c2));
            }
            Instr::I32Sub => {
                let (c2, c1) = (frame.pop()?, frame.pop()?);
                frame.stack.push(c1.wrapping_sub(c2));
            }
            Instr::LocalGet(index) => {
                let value = *frame.local(index)?;
                frame.stack.push(value);
            }
            Instr::LocalSet(index) => {
                let value = frame.pop()?;
                *frame.local(index)? = value;
            }
            Instr::LocalTee(index) => {
                let value = frame.pop()?;
                *frame.local(index)? = value;
                frame.stack.push(value);
            }
            Instr::MemorySize(index) => {
                let size = rt::size(frame.memory(index)?.heap());
                frame.stack.push(size);
            }
            Instr::MemoryGrow(index) => {
                let delta = frame.pop()?;
                let result = rt::grow(frame.memory(index)?.heap(), delta);
                frame.stack.push(result);
            }
            Instr::I32Load { memory, offset } => {
                let address = frame.pop()?;
                let heap = frame.memory(memory)?.heap();
                let value =
                    rt::i32_load(heap, memory, offset, address).map_err(crate::Error::runtime)?;
                frame.stack.push(value);
            }
            Instr::I32Load8U { memory, offset } => {
                let address = frame.pop()?;
                let heap = frame.memory(memory)?.heap();
                let value =
                    rt::i8_load(heap, memory, offset, address).map_err(crate::Error::runtime)?;
                frame.stack.push(i32::from(value as u8));
            }
            Instr::I32Store { memory, offset } => {
                let (value, address) = (frame.pop()?, frame.pop()?);
                let heap = frame.memory(memory)?.heap();
                rt::i32_store(heap, memory, offset, address, value)
                    .map_err(crate::Error::runtime)?;
            }
            Instr::I32Store8 { memory, offset } => {
                let (value, address) = (frame.pop()?, frame.pop()?);
                let heap = frame.memory(memory)?.heap();
                #[allow(clippy::cast_possible_truncation)]
                let byte = value as i8;
                rt::i8_store(heap, memory, offset, address, byte)
                    .map_err(crate::Error::runtime)?;
            }
        }
    }

    let mut stack = frame.stack;
    let start = stack.len().checked_sub(function.results).ok_or_else(|| {
        crate::Error::runtime(anyhow::anyhow!(
            "expected {} results on the operand stack",
            function.results
        ))
    })?;

    Ok(stack.split_off(start))
}
