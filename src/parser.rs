use thiserror::Error;

use crate::ast::{Block, CaseClause, ElifClause, Expression, Program, Statement};
use crate::token::{Token, TokenKind};

#[derive(Debug, Error, PartialEq, Clone)]
#[error("Syntax error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// Recursive-descent parser over the lexer's token sequence.
///
/// Precedence, loosest binding first:
/// assignment, or, and, equality, comparator, bitwise, term, factor, power,
/// primary. Assignment, comparator and power are right-associative and recurse
/// into themselves; the remaining levels fold left. The first grammar
/// violation aborts the whole parse.
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    /// Armed by a method declaration named `__init__`, consumed by the first
    /// `identifier(...)` parsed afterwards, which becomes a constructor call.
    valid_constructor: bool,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token<'a>>) -> Self {
        Self {
            tokens,
            pos: 0,
            valid_constructor: false,
        }
    }

    pub fn parse_program(mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();
        while !self.at_end() {
            if self.check(&[TokenKind::Newline]) {
                self.advance();
                continue;
            }
            statements.push(self.parse_statement()?);
        }
        Ok(Program { statements })
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.current().kind {
            TokenKind::Def => self.parse_function_def(),
            TokenKind::Class => self.parse_class_def(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Match => self.parse_match_stmt(),
            TokenKind::Try => self.parse_try_stmt(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::Lambda => self.parse_lambda_stmt(),
            TokenKind::Pass => {
                self.advance();
                Ok(Statement::Pass)
            }
            TokenKind::Break => {
                self.advance();
                Ok(Statement::Break)
            }
            TokenKind::Continue => {
                self.advance();
                Ok(Statement::Continue)
            }
            _ => Ok(Statement::Expr(self.parse_expression()?)),
        }
    }

    // ---- expressions -----------------------------------------------------

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expression, ParseError> {
        let target = self.parse_or()?;

        if self.check(&[TokenKind::Equal]) {
            self.advance();
            let value = self.parse_assignment()?;
            return Ok(Expression::AssignmentOp {
                target: Box::new(target),
                value: Box::new(value),
            });
        }

        if self.check(&[
            TokenKind::PlusEqual,
            TokenKind::MinusEqual,
            TokenKind::StarEqual,
            TokenKind::SlashEqual,
        ]) {
            let op = self.advance().text.to_string();
            let value = self.parse_assignment()?;
            return Ok(Expression::AugmentedAssignmentOp {
                op,
                target: Box::new(target),
                value: Box::new(value),
            });
        }

        Ok(target)
    }

    fn parse_or(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_and()?;
        while self.check(&[TokenKind::Or]) {
            self.advance();
            let right = self.parse_and()?;
            left = Expression::OrOp {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_equality()?;
        while self.check(&[TokenKind::And]) {
            self.advance();
            let right = self.parse_equality()?;
            left = Expression::AndOp {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_comparator()?;
        while self.check(&[TokenKind::DoubleEqual, TokenKind::NotEqual]) {
            let op = self.advance().text.to_string();
            let right = self.parse_comparator()?;
            left = Expression::EqualityOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_comparator(&mut self) -> Result<Expression, ParseError> {
        let left = self.parse_bitwise()?;

        if self.check(&[
            TokenKind::Less,
            TokenKind::Greater,
            TokenKind::LessEqual,
            TokenKind::GreaterEqual,
        ]) {
            let op = self.advance().text.to_string();
            let right = self.parse_comparator()?;
            return Ok(Expression::ComparisonOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_bitwise(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_term()?;
        while self.check(&[
            TokenKind::Pipe,
            TokenKind::Caret,
            TokenKind::Ampersand,
            TokenKind::LeftShift,
            TokenKind::RightShift,
        ]) {
            let op = self.advance().text.to_string();
            let right = self.parse_term()?;
            left = Expression::BitwiseOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_factor()?;
        while self.check(&[TokenKind::Plus, TokenKind::Minus]) {
            let op = self.advance().text.to_string();
            let right = self.parse_factor()?;
            left = Expression::TermOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_power()?;
        while self.check(&[
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::DoubleSlash,
            TokenKind::Percent,
        ]) {
            let op = self.advance().text.to_string();
            let right = self.parse_power()?;
            left = Expression::FactorOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_power(&mut self) -> Result<Expression, ParseError> {
        let base = self.parse_primary()?;

        if self.check(&[TokenKind::Power]) {
            self.advance();
            let exponent = self.parse_power()?;
            return Ok(Expression::PowerOp {
                base: Box::new(base),
                exponent: Box::new(exponent),
            });
        }

        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        match self.current().kind {
            TokenKind::IntegerLiteral => {
                let text = self.advance().text.to_string();
                Ok(Expression::IntegerLiteral(text))
            }
            TokenKind::FloatLiteral => {
                let text = self.advance().text.to_string();
                Ok(Expression::FloatLiteral(text))
            }
            TokenKind::StringLiteral => {
                let text = self.advance().text.to_string();
                Ok(Expression::StringLiteral(text))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expression::BoolLiteral(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expression::BoolLiteral(false))
            }
            TokenKind::Identifier => {
                let name = self.advance().text.to_string();
                self.parse_postfix(name)
            }
            TokenKind::LBracket => self.parse_list(),
            TokenKind::LBrace => self.parse_dict(),
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_or()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::SelfKw => {
                self.advance();
                let attribute = if self.check(&[TokenKind::Dot]) {
                    self.advance();
                    Some(self.expect(TokenKind::Identifier)?.text.to_string())
                } else {
                    None
                };
                Ok(Expression::SelfExpr { attribute })
            }
            _ => Err(self.error(format!(
                "unexpected token '{}' in expression",
                self.current().text
            ))),
        }
    }

    /// Call, constructor-call and attribute forms hanging off an identifier.
    fn parse_postfix(&mut self, name: String) -> Result<Expression, ParseError> {
        if self.check(&[TokenKind::LParen]) {
            self.advance();
            let arguments = self.parse_arguments()?;
            if std::mem::take(&mut self.valid_constructor) {
                return Ok(Expression::ConstructorCallExpr {
                    constructor: Box::new(Expression::Identifier(name)),
                    arguments,
                });
            }
            return Ok(Expression::CallExpr {
                callee: Box::new(Expression::Identifier(name)),
                arguments,
            });
        }

        if self.check(&[TokenKind::Dot]) {
            self.advance();
            let attribute = self.expect(TokenKind::Identifier)?.text.to_string();
            let attr = Expression::AttributeExpr {
                object: name,
                attribute,
            };
            if self.check(&[TokenKind::LParen]) {
                self.advance();
                let arguments = self.parse_arguments()?;
                return Ok(Expression::CallExpr {
                    callee: Box::new(attr),
                    arguments,
                });
            }
            return Ok(attr);
        }

        Ok(Expression::Identifier(name))
    }

    /// Caller has consumed the opening `(`; consumes through the closing `)`.
    fn parse_arguments(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut arguments = Vec::new();
        if !self.check(&[TokenKind::RParen]) {
            arguments.push(self.parse_or()?);
            while self.check(&[TokenKind::Comma]) {
                self.advance();
                if self.check(&[TokenKind::RParen]) {
                    break;
                }
                arguments.push(self.parse_or()?);
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(arguments)
    }

    fn parse_list(&mut self) -> Result<Expression, ParseError> {
        self.expect(TokenKind::LBracket)?;
        let mut elements = Vec::new();
        if !self.check(&[TokenKind::RBracket]) {
            elements.push(self.parse_or()?);
            while self.check(&[TokenKind::Comma]) {
                self.advance();
                if self.check(&[TokenKind::RBracket]) {
                    break;
                }
                elements.push(self.parse_or()?);
            }
        }
        self.expect(TokenKind::RBracket)?;
        Ok(Expression::ListExpr(elements))
    }

    fn parse_dict(&mut self) -> Result<Expression, ParseError> {
        self.expect(TokenKind::LBrace)?;
        let mut entries = Vec::new();
        if !self.check(&[TokenKind::RBrace]) {
            loop {
                let key = self.parse_or()?;
                self.expect(TokenKind::Colon)?;
                let value = self.parse_or()?;
                entries.push((key, value));
                if !self.check(&[TokenKind::Comma]) {
                    break;
                }
                self.advance();
                if self.check(&[TokenKind::RBrace]) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Expression::DictExpr(entries))
    }

    // ---- statements ------------------------------------------------------

    /// `:` NEWLINE INDENT statements DEDENT — the shared body helper every
    /// compound statement goes through.
    fn parse_suite(&mut self) -> Result<Block, ParseError> {
        self.expect(TokenKind::Colon)?;
        self.expect(TokenKind::Newline)?;
        if !self.check(&[TokenKind::Indent]) {
            return Err(self.error("expected an indented block after ':'".to_string()));
        }
        self.advance();

        let mut statements = Vec::new();
        while !self.check(&[TokenKind::Dedent]) && !self.at_end() {
            if self.check(&[TokenKind::Newline]) {
                self.advance();
                continue;
            }
            statements.push(self.parse_statement()?);
        }
        self.expect(TokenKind::Dedent)?;

        Ok(Block { statements })
    }

    fn parse_function_def(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::Def)?;
        let name = self.expect(TokenKind::Identifier)?.text.to_string();
        self.expect(TokenKind::LParen)?;
        let params = self.parse_parameters()?;
        let body = self.parse_suite()?;
        Ok(Statement::FunctionDef { name, params, body })
    }

    /// Parameter list after the opening `(`, through the closing `)`.
    fn parse_parameters(&mut self) -> Result<Vec<String>, ParseError> {
        let mut params = Vec::new();
        if self.check(&[TokenKind::Identifier]) {
            params.push(self.advance().text.to_string());
            while self.check(&[TokenKind::Comma]) {
                self.advance();
                params.push(self.expect(TokenKind::Identifier)?.text.to_string());
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    fn parse_class_def(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::Class)?;
        let name = self.expect(TokenKind::Identifier)?.text.to_string();
        self.expect(TokenKind::Colon)?;
        self.expect(TokenKind::Newline)?;
        if !self.check(&[TokenKind::Indent]) {
            return Err(self.error("expected an indented class body".to_string()));
        }
        self.advance();

        let mut statements = Vec::new();
        while !self.check(&[TokenKind::Dedent]) && !self.at_end() {
            if self.check(&[TokenKind::Newline]) {
                self.advance();
                continue;
            }
            if self.check(&[TokenKind::Def]) {
                statements.push(self.parse_method_def()?);
            } else {
                statements.push(self.parse_statement()?);
            }
        }
        self.expect(TokenKind::Dedent)?;

        Ok(Statement::ClassDef {
            name,
            body: Block { statements },
        })
    }

    fn parse_method_def(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::Def)?;

        if !self.check(&[TokenKind::Identifier, TokenKind::Init]) {
            return Err(self.error("expected a method name after 'def'".to_string()));
        }
        let name = self.advance().text.to_string();

        // Arms the one-shot constructor flag before the parameter list so the
        // next `ClassName(...)` call parses as a constructor call.
        self.valid_constructor = name == "__init__";

        self.expect(TokenKind::LParen)?;
        if !self.check(&[TokenKind::SelfKw]) {
            return Err(self.error("method must declare 'self' as its first parameter".to_string()));
        }
        let mut params = vec![self.advance().text.to_string()];
        while self.check(&[TokenKind::Comma]) {
            self.advance();
            params.push(self.expect(TokenKind::Identifier)?.text.to_string());
        }
        self.expect(TokenKind::RParen)?;

        let body = self.parse_suite()?;
        Ok(Statement::MethodDef { name, params, body })
    }

    fn parse_if_stmt(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::If)?;
        let condition = self.parse_or()?;
        let body = self.parse_suite()?;

        let mut elifs = Vec::new();
        while self.check(&[TokenKind::Elif]) {
            self.advance();
            let condition = self.parse_or()?;
            let body = self.parse_suite()?;
            elifs.push(ElifClause { condition, body });
        }

        let else_branch = if self.check(&[TokenKind::Else]) {
            self.advance();
            Some(self.parse_suite()?)
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            body,
            elifs,
            else_branch,
        })
    }

    fn parse_while_stmt(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::While)?;
        let condition = self.parse_or()?;
        let body = self.parse_suite()?;
        Ok(Statement::While { condition, body })
    }

    fn parse_for_stmt(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::For)?;
        let variable = self.expect(TokenKind::Identifier)?.text.to_string();
        self.expect(TokenKind::In)?;
        let iterable = self.parse_or()?;
        let body = self.parse_suite()?;
        Ok(Statement::For {
            variable,
            iterable,
            body,
        })
    }

    fn parse_match_stmt(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::Match)?;
        let subject = self.parse_or()?;
        self.expect(TokenKind::Colon)?;
        self.expect(TokenKind::Newline)?;
        if !self.check(&[TokenKind::Indent]) {
            return Err(self.error("expected an indented block after 'match'".to_string()));
        }
        self.advance();

        let mut cases = Vec::new();
        while !self.at_end() {
            if self.check(&[TokenKind::Newline]) {
                self.advance();
                continue;
            }
            if !self.check(&[TokenKind::Case]) {
                break;
            }
            self.advance();
            let pattern = self.parse_or()?;
            let body = self.parse_suite()?;
            cases.push(CaseClause { pattern, body });
        }
        self.expect(TokenKind::Dedent)?;

        Ok(Statement::Match { subject, cases })
    }

    fn parse_try_stmt(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::Try)?;
        let body = self.parse_suite()?;

        let mut except_branch = None;
        let mut finally_branch = None;
        let mut else_branch = None;

        // At most one of each clause, in any order.
        loop {
            if except_branch.is_none() && self.check(&[TokenKind::Except]) {
                self.advance();
                except_branch = Some(self.parse_suite()?);
            } else if finally_branch.is_none() && self.check(&[TokenKind::Finally]) {
                self.advance();
                finally_branch = Some(self.parse_suite()?);
            } else if else_branch.is_none() && self.check(&[TokenKind::Else]) {
                self.advance();
                else_branch = Some(self.parse_suite()?);
            } else {
                break;
            }
        }

        Ok(Statement::Try {
            body,
            except_branch,
            finally_branch,
            else_branch,
        })
    }

    fn parse_return_stmt(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::Return)?;
        if self.at_end() || self.check(&[TokenKind::Newline, TokenKind::Dedent]) {
            return Ok(Statement::Return(None));
        }
        let value = self.parse_or()?;
        Ok(Statement::Return(Some(value)))
    }

    /// `lambda a, b: a + b` — the body is the single same-line expression.
    fn parse_lambda_stmt(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::Lambda)?;
        let mut params = Vec::new();
        if self.check(&[TokenKind::Identifier]) {
            params.push(self.advance().text.to_string());
            while self.check(&[TokenKind::Comma]) {
                self.advance();
                params.push(self.expect(TokenKind::Identifier)?.text.to_string());
            }
        }
        self.expect(TokenKind::Colon)?;
        let body = vec![Statement::Expr(self.parse_or()?)];
        Ok(Statement::Lambda { params, body })
    }

    // ---- cursor ----------------------------------------------------------

    fn current(&self) -> &Token<'a> {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    /// True at `Eof` or once the tokens run out, so an empty token vector is
    /// simply an empty program.
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len() || self.current().kind == TokenKind::Eof
    }

    /// True if the current token's kind equals any of `kinds`; never advances.
    fn check(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current().kind)
    }

    fn advance(&mut self) -> Token<'a> {
        let token = *self.current();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>, ParseError> {
        if self.check(&[kind]) {
            Ok(self.advance())
        } else {
            Err(self.error(format!(
                "expected {:?}, found '{}'",
                kind,
                self.current().text
            )))
        }
    }

    fn error(&self, message: String) -> ParseError {
        let token = self.current();
        ParseError {
            message,
            line: token.line,
            column: token.column,
        }
    }
}

pub fn parse_tokens(tokens: Vec<Token<'_>>) -> Result<Program, ParseError> {
    Parser::new(tokens).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use indoc::indoc;

    fn parse(input: &str) -> Program {
        let tokens = tokenize(input).expect("tokenize should succeed");
        parse_tokens(tokens).expect("parse should succeed")
    }

    fn parse_err(input: &str) -> ParseError {
        let tokens = tokenize(input).expect("tokenize should succeed");
        parse_tokens(tokens).expect_err("expected parse failure")
    }

    fn int(text: &str) -> Expression {
        Expression::IntegerLiteral(text.to_string())
    }

    fn ident(name: &str) -> Expression {
        Expression::Identifier(name.to_string())
    }

    fn expr_of(program: &Program) -> &Expression {
        match &program.statements[0] {
            Statement::Expr(expr) => expr,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn term_is_left_associative() {
        let program = parse("a - b - c\n");
        let expected = Expression::TermOp {
            op: "-".to_string(),
            left: Box::new(Expression::TermOp {
                op: "-".to_string(),
                left: Box::new(ident("a")),
                right: Box::new(ident("b")),
            }),
            right: Box::new(ident("c")),
        };
        assert_eq!(expr_of(&program), &expected);
    }

    #[test]
    fn power_is_right_associative() {
        let program = parse("a ** b ** c\n");
        let expected = Expression::PowerOp {
            base: Box::new(ident("a")),
            exponent: Box::new(Expression::PowerOp {
                base: Box::new(ident("b")),
                exponent: Box::new(ident("c")),
            }),
        };
        assert_eq!(expr_of(&program), &expected);
    }

    #[test]
    fn comparator_is_right_associative() {
        let program = parse("a < b < c\n");
        let expected = Expression::ComparisonOp {
            op: "<".to_string(),
            left: Box::new(ident("a")),
            right: Box::new(Expression::ComparisonOp {
                op: "<".to_string(),
                left: Box::new(ident("b")),
                right: Box::new(ident("c")),
            }),
        };
        assert_eq!(expr_of(&program), &expected);
    }

    #[test]
    fn factor_binds_tighter_than_term() {
        let program = parse("1 + 2 * 3\n");
        let expected = Expression::TermOp {
            op: "+".to_string(),
            left: Box::new(int("1")),
            right: Box::new(Expression::FactorOp {
                op: "*".to_string(),
                left: Box::new(int("2")),
                right: Box::new(int("3")),
            }),
        };
        assert_eq!(expr_of(&program), &expected);
    }

    #[test]
    fn assignment_is_right_associative() {
        let program = parse("a = b = 1\n");
        let expected = Expression::AssignmentOp {
            target: Box::new(ident("a")),
            value: Box::new(Expression::AssignmentOp {
                target: Box::new(ident("b")),
                value: Box::new(int("1")),
            }),
        };
        assert_eq!(expr_of(&program), &expected);
    }

    #[test]
    fn parses_assignment_of_sum() {
        let program = parse("x = 1 + 2\n");
        let expected = Expression::AssignmentOp {
            target: Box::new(ident("x")),
            value: Box::new(Expression::TermOp {
                op: "+".to_string(),
                left: Box::new(int("1")),
                right: Box::new(int("2")),
            }),
        };
        assert_eq!(expr_of(&program), &expected);
    }

    #[test]
    fn parses_augmented_assignment() {
        let program = parse("x += 1\n");
        let expected = Expression::AugmentedAssignmentOp {
            op: "+=".to_string(),
            target: Box::new(ident("x")),
            value: Box::new(int("1")),
        };
        assert_eq!(expr_of(&program), &expected);
    }

    #[test]
    fn parses_call_arguments_in_order() {
        let program = parse("f(1, 2, 3)\n");
        let expected = Expression::CallExpr {
            callee: Box::new(ident("f")),
            arguments: vec![int("1"), int("2"), int("3")],
        };
        assert_eq!(expr_of(&program), &expected);
    }

    #[test]
    fn parses_attribute_and_method_call() {
        let program = parse("obj.field\nobj.method(1)\n");
        assert_eq!(
            expr_of(&program),
            &Expression::AttributeExpr {
                object: "obj".to_string(),
                attribute: "field".to_string(),
            }
        );
        match &program.statements[1] {
            Statement::Expr(Expression::CallExpr { callee, arguments }) => {
                assert_eq!(
                    callee.as_ref(),
                    &Expression::AttributeExpr {
                        object: "obj".to_string(),
                        attribute: "method".to_string(),
                    }
                );
                assert_eq!(arguments.len(), 1);
            }
            other => panic!("expected method call, got {other:?}"),
        }
    }

    #[test]
    fn parses_list_and_dict_literals() {
        let program = parse("[1, 2]\n{1: 2, 3: 4}\n");
        assert_eq!(
            expr_of(&program),
            &Expression::ListExpr(vec![int("1"), int("2")])
        );
        assert_eq!(
            match &program.statements[1] {
                Statement::Expr(expr) => expr,
                other => panic!("expected expression statement, got {other:?}"),
            },
            &Expression::DictExpr(vec![(int("1"), int("2")), (int("3"), int("4"))])
        );
    }

    #[test]
    fn parses_function_def() {
        let input = indoc! {"
            def add(a, b):
                return a + b
        "};
        let program = parse(input);
        match &program.statements[0] {
            Statement::FunctionDef { name, params, body } => {
                assert_eq!(name, "add");
                assert_eq!(params, &["a".to_string(), "b".to_string()]);
                assert_eq!(body.statements.len(), 1);
                assert!(matches!(body.statements[0], Statement::Return(Some(_))));
            }
            other => panic!("expected function def, got {other:?}"),
        }
    }

    #[test]
    fn parses_if_elif_else() {
        let input = indoc! {"
            if a:
                x
            elif b:
                y
            else:
                z
        "};
        let program = parse(input);
        match &program.statements[0] {
            Statement::If {
                elifs, else_branch, ..
            } => {
                assert_eq!(elifs.len(), 1);
                assert!(else_branch.is_some());
            }
            other => panic!("expected if statement, got {other:?}"),
        }
    }

    #[test]
    fn parses_while_and_for() {
        let input = indoc! {"
            while x < 10:
                x += 1
            for item in items:
                item
        "};
        let program = parse(input);
        assert!(matches!(program.statements[0], Statement::While { .. }));
        match &program.statements[1] {
            Statement::For { variable, .. } => assert_eq!(variable, "item"),
            other => panic!("expected for statement, got {other:?}"),
        }
    }

    #[test]
    fn parses_match_with_cases() {
        let input = indoc! {"
            match x:
                case 1:
                    a
                case 2:
                    b
        "};
        let program = parse(input);
        match &program.statements[0] {
            Statement::Match { subject, cases } => {
                assert_eq!(subject, &ident("x"));
                assert_eq!(cases.len(), 2);
                assert_eq!(cases[0].pattern, int("1"));
            }
            other => panic!("expected match statement, got {other:?}"),
        }
    }

    #[test]
    fn parses_try_except_finally() {
        let input = indoc! {"
            try:
                x
            except:
                y
            finally:
                z
        "};
        let program = parse(input);
        match &program.statements[0] {
            Statement::Try {
                except_branch,
                finally_branch,
                else_branch,
                ..
            } => {
                assert!(except_branch.is_some());
                assert!(finally_branch.is_some());
                assert!(else_branch.is_none());
            }
            other => panic!("expected try statement, got {other:?}"),
        }
    }

    #[test]
    fn parses_class_with_methods_and_constructor_call() {
        // `__init__` must be the class's last declaration for `Point(1)` to
        // be read as a constructor call; any later method clears the flag.
        let input = indoc! {"
            class Point:
                def get(self):
                    return self.x
                def __init__(self, x):
                    self.x = x
            p = Point(1)
        "};
        let program = parse(input);
        match &program.statements[0] {
            Statement::ClassDef { name, body } => {
                assert_eq!(name, "Point");
                assert_eq!(body.statements.len(), 2);
                match &body.statements[1] {
                    Statement::MethodDef { name, params, .. } => {
                        assert_eq!(name, "__init__");
                        assert_eq!(params[0], "self");
                    }
                    other => panic!("expected method def, got {other:?}"),
                }
            }
            other => panic!("expected class def, got {other:?}"),
        }
        match &program.statements[1] {
            Statement::Expr(Expression::AssignmentOp { value, .. }) => {
                assert!(matches!(
                    value.as_ref(),
                    Expression::ConstructorCallExpr { .. }
                ));
            }
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn constructor_flag_is_one_shot() {
        let input = indoc! {"
            class Point:
                def __init__(self):
                    pass
            a = Point()
            b = Point()
        "};
        let program = parse(input);
        match &program.statements[1] {
            Statement::Expr(Expression::AssignmentOp { value, .. }) => {
                assert!(matches!(
                    value.as_ref(),
                    Expression::ConstructorCallExpr { .. }
                ));
            }
            other => panic!("expected assignment, got {other:?}"),
        }
        match &program.statements[2] {
            Statement::Expr(Expression::AssignmentOp { value, .. }) => {
                assert!(matches!(value.as_ref(), Expression::CallExpr { .. }));
            }
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn parses_self_attribute_assignment() {
        let input = indoc! {"
            class C:
                def __init__(self, v):
                    self.v = v
        "};
        let program = parse(input);
        match &program.statements[0] {
            Statement::ClassDef { body, .. } => match &body.statements[0] {
                Statement::MethodDef { body, .. } => match &body.statements[0] {
                    Statement::Expr(Expression::AssignmentOp { target, .. }) => {
                        assert_eq!(
                            target.as_ref(),
                            &Expression::SelfExpr {
                                attribute: Some("v".to_string())
                            }
                        );
                    }
                    other => panic!("expected assignment, got {other:?}"),
                },
                other => panic!("expected method def, got {other:?}"),
            },
            other => panic!("expected class def, got {other:?}"),
        }
    }

    #[test]
    fn parses_lambda_statement() {
        let program = parse("lambda a, b: a + b\n");
        match &program.statements[0] {
            Statement::Lambda { params, body } => {
                assert_eq!(params, &["a".to_string(), "b".to_string()]);
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected lambda, got {other:?}"),
        }
    }

    #[test]
    fn method_without_self_is_an_error() {
        let input = indoc! {"
            class C:
                def m(x):
                    pass
        "};
        let err = parse_err(input);
        assert!(err.message.contains("self"));
    }

    #[test]
    fn missing_indent_after_colon_is_an_error() {
        let err = parse_err("if x:\ny\n");
        assert!(err.message.contains("indented block"));
    }

    #[test]
    fn error_carries_offending_position() {
        let err = parse_err("def 1():\n    pass\n");
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 5);
    }

    #[test]
    fn first_error_aborts_the_parse() {
        let err = parse_err("x = \ny = 1\n");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn empty_token_input_parses_to_an_empty_program() {
        let program = parse_tokens(Vec::new()).expect("no tokens should parse");
        assert!(program.statements.is_empty());
    }
}
