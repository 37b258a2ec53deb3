//! Front end and bytecode compiler for a Python-like language.
//!
//! The pipeline is `lexer::tokenize` → `parser::parse_tokens` →
//! `compiler::compile`, producing a [`bytecode::ByteCodeProgram`] whose
//! chunks a VM can execute and [`disasm::disassemble`] can render.

pub mod ast;
pub mod bytecode;
pub mod compiler;
pub mod disasm;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod vm;
