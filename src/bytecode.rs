//! Bytecode program model: opcodes, instructions, constant pools and chunks.
//!
//! Every instruction occupies two units (opcode + argument), so the byte
//! offset of instruction `i` is `i * 2`. Jump arguments hold absolute byte
//! offsets.

use std::fmt;
use std::rc::Rc;

/// The full opcode set. Several opcodes are declared for the evaluator but
/// never produced by the compiler: `Call`, `Print`, `Push`, `PushNull`,
/// `CompareOp`, `StoreFast` and `LoadFast`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    Return,
    Call,
    Print,
    Add,
    Sub,
    Mul,
    Div,
    Pop,
    Push,
    MakeFunction,
    CallFunction,
    PushNull,
    BinaryPower,
    StoreFast,
    StoreName,
    CompareOp,
    PopJumpIfFalse,
    LoadFast,
    LoadName,
    LoadConstant,
}

impl OpCode {
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Return => "RETURN",
            OpCode::Call => "CALL",
            OpCode::Print => "PRINT",
            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Mul => "MUL",
            OpCode::Div => "DIV",
            OpCode::Pop => "POP",
            OpCode::Push => "PUSH",
            OpCode::MakeFunction => "MAKE_FUNCTION",
            OpCode::CallFunction => "CALL_FUNCTION",
            OpCode::PushNull => "PUSH_NULL",
            OpCode::BinaryPower => "BINARY_POWER",
            OpCode::StoreFast => "STORE_FAST",
            OpCode::StoreName => "STORE_NAME",
            OpCode::CompareOp => "COMPARE_OP",
            OpCode::PopJumpIfFalse => "POP_JUMP_IF_FALSE",
            OpCode::LoadFast => "LOAD_FAST",
            OpCode::LoadName => "LOAD_NAME",
            OpCode::LoadConstant => "LOAD_CONSTANT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instruction {
    pub opcode: OpCode,
    pub argument: u8,
}

/// Width of one instruction in byte-offset units.
pub const INSTRUCTION_WIDTH: usize = 2;

/// Placeholder argument for jumps that have not been patched yet.
pub const JUMP_PLACEHOLDER: u8 = 0;

#[derive(Debug, Clone, PartialEq)]
pub enum HeapObject {
    Str(String),
    Function {
        name: String,
        params: Vec<String>,
        chunk_index: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Int(i64),
    Float(f64),
    Ref(Rc<Value>),
    Object(Rc<HeapObject>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Ref(inner) => write!(f, "{inner}"),
            Value::Object(obj) => match obj.as_ref() {
                HeapObject::Str(s) => write!(f, "'{s}'"),
                HeapObject::Function { name, .. } => write!(f, "<function {name}>"),
            },
        }
    }
}

/// One compilation unit: a flat instruction stream plus its constant and name
/// pools. `byte_offset` tracks the running offset of the next instruction.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Chunk {
    pub instructions: Vec<Instruction>,
    pub constants: Vec<Value>,
    pub names: Vec<String>,
    pub byte_offset: usize,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, opcode: OpCode, argument: u8) {
        self.instructions.push(Instruction { opcode, argument });
        self.byte_offset += INSTRUCTION_WIDTH;
    }

    pub fn add_constant(&mut self, value: Value) -> u8 {
        self.constants.push(value);
        (self.constants.len() - 1) as u8
    }

    /// Slot of the pool's `None`, inserting it on first use. Keeps the pool at
    /// most one `None` deep.
    pub fn none_constant(&mut self) -> u8 {
        for (slot, value) in self.constants.iter().enumerate() {
            if matches!(value, Value::None) {
                return slot as u8;
            }
        }
        self.add_constant(Value::None)
    }

    /// Emits `opcode` with a placeholder argument and returns the byte offset
    /// just past it, for a later `patch_jump`.
    pub fn emit_jump(&mut self, opcode: OpCode) -> usize {
        self.emit(opcode, JUMP_PLACEHOLDER);
        self.byte_offset
    }

    /// Points the jump recorded by `emit_jump` at the current byte offset.
    pub fn patch_jump(&mut self, saved_offset: usize) {
        let index = (saved_offset - INSTRUCTION_WIDTH) / INSTRUCTION_WIDTH;
        self.instructions[index].argument = self.byte_offset as u8;
    }
}

/// Chunk 0 is the module body; function chunks follow in compilation order
/// and are addressed by the `chunk_index` stored in their function constant.
#[derive(Debug, Clone, PartialEq)]
pub struct ByteCodeProgram {
    pub name: String,
    pub chunks: Vec<Chunk>,
}

impl ByteCodeProgram {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chunks: vec![Chunk::new()],
        }
    }
}
