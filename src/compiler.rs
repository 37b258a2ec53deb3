//! AST to bytecode lowering.
//!
//! Unlike the fail-fast parser, compilation is best-effort: errors are caught
//! per top-level statement and collected, and lowering continues with the
//! next statement, so a program with errors still yields a (partial)
//! `ByteCodeProgram`.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::ast::{Block, Expression, Program, Statement};
use crate::bytecode::{ByteCodeProgram, Chunk, HeapObject, OpCode, Value};

#[derive(Debug, Error, PartialEq, Clone)]
pub enum CompileError {
    #[error("invalid integer literal '{0}'")]
    InvalidInteger(String),
    #[error("invalid float literal '{0}'")]
    InvalidFloat(String),
    #[error("call has {0} arguments, the limit is 255")]
    TooManyArguments(usize),
    #[error("no lowering for {0}")]
    Unsupported(&'static str),
}

/// Lowers a parsed program into chunks of bytecode.
///
/// The name→slot map is shared across all chunks of the compilation, so a
/// name first seen in one chunk resolves to the same slot everywhere, and
/// only the chunk that introduced it records it in its name pool.
pub struct Compiler {
    names: FxHashMap<String, u8>,
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            names: FxHashMap::default(),
        }
    }

    pub fn compile(mut self, program: &Program) -> (ByteCodeProgram, Vec<CompileError>) {
        let mut bytecode = ByteCodeProgram::new("<module>");
        let mut errors = Vec::new();

        for statement in &program.statements {
            if let Err(err) = self.statement(&mut bytecode, 0, statement) {
                errors.push(err);
            }
        }

        // Implicit end-of-module return.
        let module = &mut bytecode.chunks[0];
        let none = module.none_constant();
        module.emit(OpCode::LoadConstant, none);
        module.emit(OpCode::Return, 0);

        (bytecode, errors)
    }

    fn statement(
        &mut self,
        program: &mut ByteCodeProgram,
        chunk: usize,
        statement: &Statement,
    ) -> Result<(), CompileError> {
        match statement {
            Statement::Expr(expr) => self.expression(program, chunk, expr),
            Statement::Return(value) => {
                if let Some(value) = value {
                    self.expression(program, chunk, value)?;
                }
                program.chunks[chunk].emit(OpCode::Return, 0);
                Ok(())
            }
            Statement::If {
                condition, body, ..
            } => self.if_statement(program, chunk, condition, body),
            Statement::FunctionDef { name, params, body } => {
                self.function_def(program, chunk, name, params, body)
            }
            // Recognised by the parser but not lowered yet: pass, break,
            // continue, while, for, match, try, class and method bodies,
            // lambda, nested blocks.
            _ => Ok(()),
        }
    }

    /// Condition, forward jump over the body, body statements each followed
    /// by a `Pop`, then a synthetic load-None return epilogue the jump lands
    /// past. Elif and else arms are not lowered.
    fn if_statement(
        &mut self,
        program: &mut ByteCodeProgram,
        chunk: usize,
        condition: &Expression,
        body: &Block,
    ) -> Result<(), CompileError> {
        self.expression(program, chunk, condition)?;
        let jump = program.chunks[chunk].emit_jump(OpCode::PopJumpIfFalse);

        for statement in &body.statements {
            self.statement(program, chunk, statement)?;
            program.chunks[chunk].emit(OpCode::Pop, 0);
        }

        let none = program.chunks[chunk].none_constant();
        program.chunks[chunk].emit(OpCode::LoadConstant, none);
        program.chunks[chunk].emit(OpCode::Return, 0);

        program.chunks[chunk].patch_jump(jump);
        Ok(())
    }

    fn function_def(
        &mut self,
        program: &mut ByteCodeProgram,
        chunk: usize,
        name: &str,
        params: &[String],
        body: &Block,
    ) -> Result<(), CompileError> {
        let function_chunk = program.chunks.len();
        program.chunks.push(Chunk::new());

        for statement in &body.statements {
            self.statement(program, function_chunk, statement)?;
        }
        program.chunks[function_chunk].emit(OpCode::Return, 0);

        let function = Value::Object(Rc::new(HeapObject::Function {
            name: name.to_string(),
            params: params.to_vec(),
            chunk_index: function_chunk,
        }));
        let name_string = Value::Object(Rc::new(HeapObject::Str(name.to_string())));

        {
            let enclosing = &mut program.chunks[chunk];
            let function_slot = enclosing.add_constant(function);
            enclosing.emit(OpCode::LoadConstant, function_slot);
            let name_slot = enclosing.add_constant(name_string);
            enclosing.emit(OpCode::LoadConstant, name_slot);
            enclosing.emit(OpCode::MakeFunction, 0);
        }

        let slot = self.name_slot(program, chunk, name);
        program.chunks[chunk].emit(OpCode::StoreName, slot);
        Ok(())
    }

    fn expression(
        &mut self,
        program: &mut ByteCodeProgram,
        chunk: usize,
        expr: &Expression,
    ) -> Result<(), CompileError> {
        match expr {
            Expression::IntegerLiteral(text) => {
                let value = text
                    .parse::<i64>()
                    .map_err(|_| CompileError::InvalidInteger(text.clone()))?;
                self.load_constant(program, chunk, Value::Int(value));
                Ok(())
            }
            Expression::FloatLiteral(text) => {
                let value = text
                    .parse::<f64>()
                    .map_err(|_| CompileError::InvalidFloat(text.clone()))?;
                self.load_constant(program, chunk, Value::Float(value));
                Ok(())
            }
            Expression::StringLiteral(text) => {
                let value = Value::Object(Rc::new(HeapObject::Str(text.clone())));
                self.load_constant(program, chunk, value);
                Ok(())
            }
            Expression::Identifier(name) => {
                let slot = self.name_slot(program, chunk, name);
                program.chunks[chunk].emit(OpCode::LoadName, slot);
                Ok(())
            }
            Expression::TermOp { op, left, right } => {
                self.expression(program, chunk, left)?;
                self.expression(program, chunk, right)?;
                let opcode = match op.as_str() {
                    "+" => OpCode::Add,
                    "-" => OpCode::Sub,
                    _ => return Err(CompileError::Unsupported("this term operator")),
                };
                program.chunks[chunk].emit(opcode, 0);
                Ok(())
            }
            Expression::FactorOp { op, left, right } => {
                self.expression(program, chunk, left)?;
                self.expression(program, chunk, right)?;
                let opcode = match op.as_str() {
                    "*" => OpCode::Mul,
                    "/" => OpCode::Div,
                    _ => return Err(CompileError::Unsupported("the '//' and '%' operators")),
                };
                program.chunks[chunk].emit(opcode, 0);
                Ok(())
            }
            Expression::PowerOp { base, exponent } => {
                self.expression(program, chunk, base)?;
                self.expression(program, chunk, exponent)?;
                program.chunks[chunk].emit(OpCode::BinaryPower, 0);
                Ok(())
            }
            Expression::AssignmentOp { target, value } => {
                self.expression(program, chunk, value)?;
                match target.as_ref() {
                    Expression::Identifier(name) => {
                        let slot = self.name_slot(program, chunk, name);
                        program.chunks[chunk].emit(OpCode::StoreName, slot);
                        Ok(())
                    }
                    _ => Err(CompileError::Unsupported(
                        "assignment to a non-identifier target",
                    )),
                }
            }
            Expression::CallExpr { callee, arguments } => {
                self.expression(program, chunk, callee)?;
                if arguments.len() > u8::MAX as usize {
                    return Err(CompileError::TooManyArguments(arguments.len()));
                }
                for argument in arguments {
                    self.expression(program, chunk, argument)?;
                }
                program.chunks[chunk].emit(OpCode::CallFunction, arguments.len() as u8);
                Ok(())
            }
            Expression::BoolLiteral(_) => Err(CompileError::Unsupported("boolean literals")),
            Expression::ComparisonOp { .. } => {
                Err(CompileError::Unsupported("comparison operators"))
            }
            Expression::EqualityOp { .. } => Err(CompileError::Unsupported("equality operators")),
            Expression::BitwiseOp { .. } => Err(CompileError::Unsupported("bitwise operators")),
            Expression::AndOp { .. } | Expression::OrOp { .. } => {
                Err(CompileError::Unsupported("logical operators"))
            }
            Expression::AugmentedAssignmentOp { .. } => {
                Err(CompileError::Unsupported("augmented assignment"))
            }
            Expression::ConstructorCallExpr { .. } => {
                Err(CompileError::Unsupported("constructor calls"))
            }
            Expression::AttributeExpr { .. } => Err(CompileError::Unsupported("attribute access")),
            Expression::ListExpr(_) => Err(CompileError::Unsupported("list literals")),
            Expression::DictExpr(_) => Err(CompileError::Unsupported("dict literals")),
            Expression::SelfExpr { .. } => Err(CompileError::Unsupported("self expressions")),
        }
    }

    fn load_constant(&mut self, program: &mut ByteCodeProgram, chunk: usize, value: Value) {
        let slot = program.chunks[chunk].add_constant(value);
        program.chunks[chunk].emit(OpCode::LoadConstant, slot);
    }

    /// Assign-if-absent slot lookup in the compilation-wide name map. Only a
    /// name's first chunk records it in its name pool.
    fn name_slot(&mut self, program: &mut ByteCodeProgram, chunk: usize, name: &str) -> u8 {
        if let Some(&slot) = self.names.get(name) {
            return slot;
        }
        let slot = self.names.len() as u8;
        self.names.insert(name.to_string(), slot);
        program.chunks[chunk].names.push(name.to_string());
        slot
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Compiles a program, reporting per-statement errors to stderr.
pub fn compile(program: &Program) -> ByteCodeProgram {
    let (bytecode, errors) = Compiler::new().compile(program);
    for err in &errors {
        eprintln!("compile error: {err}");
    }
    bytecode
}
