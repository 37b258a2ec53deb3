use std::env;
use std::fs;

use anyhow::{bail, Context, Result};

use pyforge::{compiler, disasm, lexer, parser};

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let path = match (args.next(), args.next()) {
        (Some(path), None) => path,
        _ => bail!("usage: pyforge <source-file>"),
    };

    let source = fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?;

    let tokens = lexer::tokenize(&source)?;
    let program = parser::parse_tokens(tokens)?;
    let bytecode = compiler::compile(&program);

    print!("{}", disasm::disassemble(&bytecode));
    Ok(())
}
