//! AST node shapes consumed by the execution engine.
//!
//! The parser is an external collaborator that emits these nodes as JSON
//! (internally tagged by `type`, matching the node names of the grammar).
//! Every node carries a `start` position for diagnostics; it defaults to
//! `0:0` so hand-built trees stay terse.

use std::fmt;

use serde::Deserialize;

/// Source position of a node, `line:col`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Span {
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// An ordered sequence of statements.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Block {
    pub statements: Vec<Statement>,
}

/// A whole top-level program.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Statement {
    Comment {
        #[serde(default)]
        start: Span,
    },
    FunctionDefinition {
        name: String,
        parameters: Vec<String>,
        body: Block,
        #[serde(default)]
        start: Span,
    },
    VarAssignment {
        var_name: String,
        value: Expression,
        #[serde(default)]
        start: Span,
    },
    CallExpression {
        fn_name: String,
        arguments: Vec<Expression>,
        #[serde(default)]
        start: Span,
    },
    WhileLoop {
        condition: Expression,
        body: Block,
        #[serde(default)]
        start: Span,
    },
    IfStatement {
        condition: Expression,
        consequent: Block,
        /// A missing `else` is encoded as an empty block, not omitted.
        #[serde(default)]
        alternate: ElseBranch,
        #[serde(default)]
        start: Span,
    },
    ForLoop {
        loop_variable: String,
        iterable: Expression,
        body: Block,
        #[serde(default)]
        start: Span,
    },
    IndexedAssignment {
        subject: Expression,
        index: Expression,
        value: Expression,
        #[serde(default)]
        start: Span,
    },
    ReturnStatement {
        value: Expression,
        #[serde(default)]
        start: Span,
    },
}

/// The `else` arm of an `if_statement`: either another `if_statement`
/// (an `else if` chain) or a plain block.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ElseBranch {
    ElseIf(Box<Statement>),
    Block(Block),
}

impl Default for ElseBranch {
    fn default() -> Self {
        ElseBranch::Block(Block::default())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expression {
    StringLiteral {
        value: String,
        #[serde(default)]
        start: Span,
    },
    NumberLiteral {
        value: f64,
        #[serde(default)]
        start: Span,
    },
    BooleanLiteral {
        value: bool,
        #[serde(default)]
        start: Span,
    },
    ListLiteral {
        items: Vec<Expression>,
        #[serde(default)]
        start: Span,
    },
    DictionaryLiteral {
        entries: Vec<DictionaryEntry>,
        #[serde(default)]
        start: Span,
    },
    BinaryOperation {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
        #[serde(default)]
        start: Span,
    },
    VarReference {
        var_name: String,
        #[serde(default)]
        start: Span,
    },
    CallExpression {
        fn_name: String,
        arguments: Vec<Expression>,
        #[serde(default)]
        start: Span,
    },
    IndexedAccess {
        subject: Box<Expression>,
        index: Box<Expression>,
        #[serde(default)]
        start: Span,
    },
    /// A function definition in expression position. Evaluating it registers
    /// the function as a side effect and yields no usable value.
    FunctionExpression {
        name: String,
        parameters: Vec<String>,
        body: Block,
        #[serde(default)]
        start: Span,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DictionaryEntry {
    pub key: String,
    pub value: Expression,
    #[serde(default)]
    pub start: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum BinaryOperator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "and")]
    And,
    #[serde(rename = "or")]
    Or,
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Eq => "==",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
        };
        f.write_str(symbol)
    }
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Comment { start }
            | Statement::FunctionDefinition { start, .. }
            | Statement::VarAssignment { start, .. }
            | Statement::CallExpression { start, .. }
            | Statement::WhileLoop { start, .. }
            | Statement::IfStatement { start, .. }
            | Statement::ForLoop { start, .. }
            | Statement::IndexedAssignment { start, .. }
            | Statement::ReturnStatement { start, .. } => *start,
        }
    }
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::StringLiteral { start, .. }
            | Expression::NumberLiteral { start, .. }
            | Expression::BooleanLiteral { start, .. }
            | Expression::ListLiteral { start, .. }
            | Expression::DictionaryLiteral { start, .. }
            | Expression::BinaryOperation { start, .. }
            | Expression::VarReference { start, .. }
            | Expression::CallExpression { start, .. }
            | Expression::IndexedAccess { start, .. }
            | Expression::FunctionExpression { start, .. } => *start,
        }
    }
}
