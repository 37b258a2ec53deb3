/// Token kinds produced by the lexer.
///
/// Keyword kinds cover the full reserved-word set even where later stages do
/// not use them yet; the parser rejects what it does not understand. `Default`
/// is the catch-all for characters the lexer does not recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords
    False,
    None,
    True,
    And,
    As,
    Assert,
    Async,
    Await,
    Break,
    Class,
    Continue,
    Match,
    Case,
    Def,
    Del,
    Elif,
    Else,
    Except,
    Finally,
    For,
    From,
    Global,
    If,
    Import,
    In,
    Is,
    Lambda,
    Nonlocal,
    Not,
    Or,
    Pass,
    Raise,
    Return,
    Try,
    While,
    With,
    Yield,
    Enum,
    SelfKw,
    Init,

    Identifier,
    IntegerLiteral,
    FloatLiteral,
    StringLiteral,
    BytesLiteral,

    // Arithmetic operators
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    Power,
    At,

    // Bitwise operators
    Ampersand,
    Pipe,
    Caret,
    Tilde,
    LeftShift,
    RightShift,

    // Comparison operators
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    DoubleEqual,
    NotEqual,

    // Assignment operators
    Equal,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    DoubleSlashEqual,
    PercentEqual,
    PowerEqual,
    AtEqual,
    AmpersandEqual,
    PipeEqual,
    CaretEqual,
    LeftShiftEqual,
    RightShiftEqual,
    Walrus,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Arrow,
    Ellipsis,

    // Structural
    Newline,
    Indent,
    Dedent,
    Comment,
    Eof,

    Default,
}

/// One lexed token. `text` borrows the matched slice of the source; structural
/// tokens (`Newline`, `Indent`, `Dedent`, `Eof`) carry an empty or synthetic
/// slice. Tokens are immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub line: usize,
    pub column: usize,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str, line: usize, column: usize) -> Self {
        Self {
            kind,
            text,
            line,
            column,
        }
    }
}
