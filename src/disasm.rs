//! Disassembly-style textual dump of a compiled program.

use crate::bytecode::{ByteCodeProgram, Chunk, Instruction, OpCode, INSTRUCTION_WIDTH};

pub fn disassemble(program: &ByteCodeProgram) -> String {
    let mut out = String::new();
    for (index, chunk) in program.chunks.iter().enumerate() {
        if index == 0 {
            out.push_str(&format!("{} (chunk 0):\n", program.name));
        } else {
            out.push_str(&format!("\nchunk {index}:\n"));
        }
        disassemble_chunk(chunk, &mut out);
    }
    out
}

fn disassemble_chunk(chunk: &Chunk, out: &mut String) {
    for (index, instruction) in chunk.instructions.iter().enumerate() {
        let offset = index * INSTRUCTION_WIDTH;
        out.push_str(&format!(
            "{:>4}  {:<16} {:>4}",
            offset,
            instruction.opcode.name(),
            instruction.argument
        ));
        if let Some(annotation) = annotate(chunk, instruction) {
            out.push_str(&format!("  ({annotation})"));
        }
        out.push('\n');
    }
}

/// The constant value behind a `LOAD_CONSTANT` or the name behind a
/// `LOAD_NAME`/`STORE_NAME`, where the pool has it.
fn annotate(chunk: &Chunk, instruction: &Instruction) -> Option<String> {
    match instruction.opcode {
        OpCode::LoadConstant => chunk
            .constants
            .get(instruction.argument as usize)
            .map(|value| value.to_string()),
        OpCode::LoadName | OpCode::StoreName => chunk
            .names
            .get(instruction.argument as usize)
            .map(|name| name.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use crate::lexer::tokenize;
    use crate::parser::parse_tokens;

    fn dump(input: &str) -> String {
        let tokens = tokenize(input).expect("tokenize should succeed");
        let program = parse_tokens(tokens).expect("parse should succeed");
        let (bytecode, errors) = Compiler::new().compile(&program);
        assert!(errors.is_empty());
        disassemble(&bytecode)
    }

    #[test]
    fn annotates_constants_and_names() {
        let out = dump("x = 42\n");
        assert!(out.contains("LOAD_CONSTANT"), "missing load: {out}");
        assert!(out.contains("(42)"), "missing constant annotation: {out}");
        assert!(out.contains("STORE_NAME"), "missing store: {out}");
        assert!(out.contains("(x)"), "missing name annotation: {out}");
    }

    #[test]
    fn string_constants_render_quoted() {
        let out = dump("s = 'hi'\n");
        assert!(out.contains("('hi')"), "string not quoted: {out}");
    }

    #[test]
    fn offsets_step_by_two() {
        let out = dump("x = 1\n");
        let offsets: Vec<&str> = out
            .lines()
            .skip(1)
            .map(|line| line.split_whitespace().next().unwrap())
            .collect();
        assert_eq!(offsets, vec!["0", "2", "4", "6"]);
    }

    #[test]
    fn function_chunks_get_their_own_section() {
        let out = dump("def f():\n    return 1\n");
        assert!(out.contains("chunk 1:"), "missing function chunk: {out}");
        assert!(out.contains("MAKE_FUNCTION"), "missing make: {out}");
        assert!(out.contains("(<function f>)"), "missing annotation: {out}");
    }
}
