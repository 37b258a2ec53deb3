//! Bytecode consumer boundary. Execution itself is not implemented; the type
//! exists to own a finished `ByteCodeProgram` on the evaluator side.

use thiserror::Error;

use crate::bytecode::ByteCodeProgram;

#[derive(Debug, Error)]
pub enum VmError {
    #[error("bytecode execution is not implemented")]
    NotImplemented,
}

pub struct Vm {
    program: ByteCodeProgram,
}

impl Vm {
    pub fn new(program: ByteCodeProgram) -> Self {
        Self { program }
    }

    pub fn program(&self) -> &ByteCodeProgram {
        &self.program
    }

    pub fn run(&mut self) -> Result<(), VmError> {
        Err(VmError::NotImplemented)
    }
}
