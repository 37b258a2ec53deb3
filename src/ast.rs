//! Syntax tree produced by the parser and consumed by the bytecode compiler.
//!
//! Every node owns its children outright; the grammar is a pure tree with no
//! sharing or cycles. Numeric literals keep their source text — converting to
//! native numbers is the compiler's job.

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    IntegerLiteral(String),
    FloatLiteral(String),
    StringLiteral(String),
    BoolLiteral(bool),
    Identifier(String),
    /// `+` / `-`, left-associative.
    TermOp {
        op: String,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `*` / `/` / `//` / `%`, left-associative.
    FactorOp {
        op: String,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `**`, right-associative.
    PowerOp {
        base: Box<Expression>,
        exponent: Box<Expression>,
    },
    /// `|` / `^` / `&` / `<<` / `>>`, left-associative.
    BitwiseOp {
        op: String,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `<` / `>` / `<=` / `>=`, right-associative.
    ComparisonOp {
        op: String,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `==` / `!=`, left-associative.
    EqualityOp {
        op: String,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    AndOp {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    OrOp {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `target = value`; any expression may appear as the target, validity is
    /// not checked at parse time.
    AssignmentOp {
        target: Box<Expression>,
        value: Box<Expression>,
    },
    AugmentedAssignmentOp {
        op: String,
        target: Box<Expression>,
        value: Box<Expression>,
    },
    CallExpr {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    ConstructorCallExpr {
        constructor: Box<Expression>,
        arguments: Vec<Expression>,
    },
    /// `object.attribute` where both sides are plain identifiers.
    AttributeExpr {
        object: String,
        attribute: String,
    },
    ListExpr(Vec<Expression>),
    DictExpr(Vec<(Expression, Expression)>),
    /// `self` or `self.attribute` inside a method body.
    SelfExpr {
        attribute: Option<String>,
    },
}

#[derive(Debug, PartialEq, Clone)]
pub struct Block {
    pub statements: Vec<Statement>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ElifClause {
    pub condition: Expression,
    pub body: Block,
}

#[derive(Debug, PartialEq, Clone)]
pub struct CaseClause {
    pub pattern: Expression,
    pub body: Block,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    Return(Option<Expression>),
    Pass,
    Break,
    Continue,
    If {
        condition: Expression,
        body: Block,
        elifs: Vec<ElifClause>,
        else_branch: Option<Block>,
    },
    While {
        condition: Expression,
        body: Block,
    },
    For {
        variable: String,
        iterable: Expression,
        body: Block,
    },
    Match {
        subject: Expression,
        cases: Vec<CaseClause>,
    },
    Try {
        body: Block,
        except_branch: Option<Block>,
        finally_branch: Option<Block>,
        else_branch: Option<Block>,
    },
    FunctionDef {
        name: String,
        params: Vec<String>,
        body: Block,
    },
    MethodDef {
        name: String,
        params: Vec<String>,
        body: Block,
    },
    ClassDef {
        name: String,
        body: Block,
    },
    Lambda {
        params: Vec<String>,
        body: Vec<Statement>,
    },
    Block(Block),
    Expr(Expression),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Program {
    pub statements: Vec<Statement>,
}
