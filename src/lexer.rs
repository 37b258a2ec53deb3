use std::{iter::Peekable, str::CharIndices};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::token::{Token, TokenKind};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("Indentation error: dedent to {indent} spaces matches no enclosing block at line {line}")]
    InvalidDedent { indent: usize, line: usize },
}

pub type LexResult<T> = Result<T, LexError>;

/// Three-character operators, matched before any shorter form.
const THREE_CHAR_OPS: &[(&str, TokenKind)] = &[
    ("...", TokenKind::Ellipsis),
    ("//=", TokenKind::DoubleSlashEqual),
    ("**=", TokenKind::PowerEqual),
    ("<<=", TokenKind::LeftShiftEqual),
    (">>=", TokenKind::RightShiftEqual),
];

const TWO_CHAR_OPS: &[(&str, TokenKind)] = &[
    ("//", TokenKind::DoubleSlash),
    ("**", TokenKind::Power),
    ("<=", TokenKind::LessEqual),
    (">=", TokenKind::GreaterEqual),
    ("==", TokenKind::DoubleEqual),
    ("!=", TokenKind::NotEqual),
    ("+=", TokenKind::PlusEqual),
    ("-=", TokenKind::MinusEqual),
    ("*=", TokenKind::StarEqual),
    ("/=", TokenKind::SlashEqual),
    ("%=", TokenKind::PercentEqual),
    ("@=", TokenKind::AtEqual),
    ("&=", TokenKind::AmpersandEqual),
    ("|=", TokenKind::PipeEqual),
    ("^=", TokenKind::CaretEqual),
    (":=", TokenKind::Walrus),
    ("->", TokenKind::Arrow),
    ("<<", TokenKind::LeftShift),
    (">>", TokenKind::RightShift),
];

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    keywords: FxHashMap<&'static str, TokenKind>,
    indent_stack: Vec<usize>,
    at_line_start: bool,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let keywords: FxHashMap<&'static str, TokenKind> = [
            ("False", TokenKind::False),
            ("None", TokenKind::None),
            ("True", TokenKind::True),
            ("and", TokenKind::And),
            ("as", TokenKind::As),
            ("assert", TokenKind::Assert),
            ("async", TokenKind::Async),
            ("await", TokenKind::Await),
            ("break", TokenKind::Break),
            ("class", TokenKind::Class),
            ("continue", TokenKind::Continue),
            ("match", TokenKind::Match),
            ("case", TokenKind::Case),
            ("def", TokenKind::Def),
            ("del", TokenKind::Del),
            ("elif", TokenKind::Elif),
            ("else", TokenKind::Else),
            ("except", TokenKind::Except),
            ("finally", TokenKind::Finally),
            ("for", TokenKind::For),
            ("from", TokenKind::From),
            ("global", TokenKind::Global),
            ("if", TokenKind::If),
            ("import", TokenKind::Import),
            ("in", TokenKind::In),
            ("is", TokenKind::Is),
            ("lambda", TokenKind::Lambda),
            ("nonlocal", TokenKind::Nonlocal),
            ("not", TokenKind::Not),
            ("or", TokenKind::Or),
            ("pass", TokenKind::Pass),
            ("raise", TokenKind::Raise),
            ("return", TokenKind::Return),
            ("try", TokenKind::Try),
            ("while", TokenKind::While),
            ("with", TokenKind::With),
            ("yield", TokenKind::Yield),
            ("enum", TokenKind::Enum),
            ("self", TokenKind::SelfKw),
            ("__init__", TokenKind::Init),
        ]
        .into_iter()
        .collect();

        Self {
            input,
            chars: input.char_indices().peekable(),
            keywords,
            indent_stack: vec![0],
            at_line_start: true,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(mut self) -> LexResult<Vec<Token<'a>>> {
        let mut tokens = Vec::new();

        while let Some(&(start_idx, ch)) = self.chars.peek() {
            let start_line = self.line;
            let start_column = self.column;

            if self.at_line_start && ch != '\n' {
                self.handle_indentation(&mut tokens, start_line)?;
                self.at_line_start = false;
                continue;
            }

            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.advance();
                continue;
            }

            if ch == '\n' {
                tokens.push(Token::new(
                    TokenKind::Newline,
                    &self.input[start_idx..start_idx + 1],
                    start_line,
                    start_column,
                ));
                self.advance();
                self.at_line_start = true;
                continue;
            }

            if ch.is_ascii_digit() {
                tokens.push(self.read_number(start_idx, start_line, start_column));
                continue;
            }

            if ch == '"' || ch == '\'' {
                tokens.push(self.read_string(ch, start_line, start_column));
                continue;
            }

            if ch.is_alphabetic() || ch == '_' {
                tokens.push(self.read_identifier(start_idx, start_line, start_column));
                continue;
            }

            tokens.push(self.read_operator(start_idx, ch, start_line, start_column));
        }

        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            tokens.push(Token::new(TokenKind::Dedent, "", self.line, self.column));
        }
        tokens.push(Token::new(TokenKind::Eof, "", self.line, self.column));

        Ok(tokens)
    }

    /// Counts leading whitespace (tab = 4 spaces) and emits `Indent`/`Dedent`
    /// tokens against the indent stack. Blank lines leave the stack untouched.
    fn handle_indentation(&mut self, tokens: &mut Vec<Token<'a>>, line: usize) -> LexResult<()> {
        let mut spaces = 0;
        while let Some(&(_, c)) = self.chars.peek() {
            match c {
                ' ' => spaces += 1,
                '\t' => spaces += 4,
                _ => break,
            }
            self.advance();
        }

        // A line holding nothing but whitespace opens no block.
        match self.chars.peek() {
            Option::None | Some(&(_, '\n')) => return Ok(()),
            _ => {}
        }

        let current = *self.indent_stack.last().unwrap_or(&0);
        if spaces > current {
            self.indent_stack.push(spaces);
            tokens.push(Token::new(TokenKind::Indent, "", line, spaces));
        } else if spaces < current {
            while self
                .indent_stack
                .last()
                .is_some_and(|&level| level > spaces)
            {
                self.indent_stack.pop();
                tokens.push(Token::new(TokenKind::Dedent, "", line, spaces));
            }
            if self.indent_stack.last() != Some(&spaces) {
                return Err(LexError::InvalidDedent {
                    indent: spaces,
                    line,
                });
            }
        }

        Ok(())
    }

    /// Integer or float literal; float requires a digit after the dot, so
    /// `1.` lexes as the integer `1` followed by a `Dot`.
    fn read_number(&mut self, start: usize, line: usize, column: usize) -> Token<'a> {
        while self.chars.peek().is_some_and(|&(_, c)| c.is_ascii_digit()) {
            self.advance();
        }

        let mut kind = TokenKind::IntegerLiteral;
        let mut lookahead = self.chars.clone();
        if lookahead.next().is_some_and(|(_, c)| c == '.')
            && lookahead.next().is_some_and(|(_, c)| c.is_ascii_digit())
        {
            kind = TokenKind::FloatLiteral;
            self.advance();
            while self.chars.peek().is_some_and(|&(_, c)| c.is_ascii_digit()) {
                self.advance();
            }
        }

        Token::new(kind, &self.input[start..self.current_index()], line, column)
    }

    /// Quoted string. A backslash escapes the following character verbatim;
    /// the token text is the raw slice between the quotes. A string still open
    /// at end of input closes silently there.
    fn read_string(&mut self, quote: char, line: usize, column: usize) -> Token<'a> {
        self.advance();
        let content_start = self.current_index();

        while let Some(&(idx, c)) = self.chars.peek() {
            if c == quote {
                self.advance();
                return Token::new(
                    TokenKind::StringLiteral,
                    &self.input[content_start..idx],
                    line,
                    column,
                );
            }
            if c == '\\' {
                self.advance();
            }
            self.advance();
        }

        Token::new(
            TokenKind::StringLiteral,
            &self.input[content_start..],
            line,
            column,
        )
    }

    fn read_identifier(&mut self, start: usize, line: usize, column: usize) -> Token<'a> {
        while self
            .chars
            .peek()
            .is_some_and(|&(_, c)| c.is_alphanumeric() || c == '_')
        {
            self.advance();
        }

        let text = &self.input[start..self.current_index()];
        let kind = self
            .keywords
            .get(text)
            .copied()
            .unwrap_or(TokenKind::Identifier);
        Token::new(kind, text, line, column)
    }

    /// Greedy longest-first operator match; anything left over degrades to a
    /// `Default` token rather than failing the lex.
    fn read_operator(&mut self, start: usize, ch: char, line: usize, column: usize) -> Token<'a> {
        let rest = &self.input[start..];

        for &(pattern, kind) in THREE_CHAR_OPS.iter().chain(TWO_CHAR_OPS) {
            if rest.starts_with(pattern) {
                for _ in 0..pattern.len() {
                    self.advance();
                }
                return Token::new(kind, &rest[..pattern.len()], line, column);
            }
        }

        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '@' => TokenKind::At,
            '<' => TokenKind::Less,
            '>' => TokenKind::Greater,
            '=' => TokenKind::Equal,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            '&' => TokenKind::Ampersand,
            '|' => TokenKind::Pipe,
            '^' => TokenKind::Caret,
            '~' => TokenKind::Tilde,
            _ => TokenKind::Default,
        };

        self.advance();
        Token::new(kind, &rest[..ch.len_utf8()], line, column)
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        next
    }

    fn current_index(&mut self) -> usize {
        self.chars
            .peek()
            .map(|&(idx, _)| idx)
            .unwrap_or(self.input.len())
    }
}

pub fn tokenize(input: &str) -> LexResult<Vec<Token<'_>>> {
    Lexer::new(input).tokenize()
}
