//! The SongLang AST (spec §3): two plain, immutable tagged-variant trees.
//!
//! Deliberately *not* a lossless CST -- there is no source text to
//! round-trip back out of these nodes, just the evaluated shape of the
//! program. Every node carries the [`Position`] of its first token so
//! runtime errors can point back at source.

use songlang_common::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

/// A literal value written directly in source -- a bare number, string,
/// or identifier, as opposed to a parenthesized expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Identifier(String),
}

impl Literal {
    /// The source-text form of this literal (used for lexeme-based
    /// custom-relation argument binding, spec §4.4).
    pub fn lexeme(&self) -> String {
        match self {
            Literal::Number(n) => format_number(*n),
            Literal::String(s) => s.clone(),
            Literal::Identifier(s) => s.clone(),
        }
    }
}

/// Render a float the way SongLang number literals look in source: no
/// trailing `.0` for whole numbers.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Number {
        value: f64,
        position: Position,
    },
    String {
        value: String,
        position: Position,
    },
    Identifier {
        name: String,
        position: Position,
    },
    PropertyAccess {
        object: Box<Expression>,
        property: String,
        position: Position,
    },
    Binary {
        left: Box<Expression>,
        op: BinaryOp,
        right: Box<Expression>,
        position: Position,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
        position: Position,
    },
    Grouping {
        inner: Box<Expression>,
        position: Position,
    },
    Random {
        min: Box<Expression>,
        max: Box<Expression>,
        position: Position,
    },
}

impl Expression {
    pub fn position(&self) -> Position {
        match self {
            Expression::Number { position, .. }
            | Expression::String { position, .. }
            | Expression::Identifier { position, .. }
            | Expression::PropertyAccess { position, .. }
            | Expression::Binary { position, .. }
            | Expression::Unary { position, .. }
            | Expression::Grouping { position, .. }
            | Expression::Random { position, .. } => *position,
        }
    }
}

/// `?` (wildcard) or `?name` (bound) as produced by the tokenizer (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPattern {
    Wildcard,
    Variable(String),
}

impl QueryPattern {
    /// The context-binding name used while evaluating `WHERE` -- `"_"` for
    /// a wildcard, per spec §4.4.
    pub fn binding_name(&self) -> &str {
        match self {
            QueryPattern::Wildcard => "_",
            QueryPattern::Variable(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LosesKind {
    /// `LOSES IS <parent>`.
    Is,
    /// `LOSES <ability-or-property>`.
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugTarget {
    Graph,
    Tokens,
    Ast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryRelation {
    Is,
    Has,
    Can,
}

/// The target of an `ALL` statement: either every node of a declared
/// type, or the materialized result list of a prior query (spec §4.4).
#[derive(Debug, Clone, PartialEq)]
pub enum AllTarget {
    TypeName(String),
    QueryVariable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// A built-in or custom relation invocation: `subject RELATION arg, arg, ...`.
    Relation {
        subject: String,
        relation: String,
        args: Vec<Literal>,
        position: Position,
    },
    /// `subject HAS property (expression)`.
    HasExpression {
        subject: String,
        property: String,
        value_expression: Expression,
        position: Position,
    },
    /// `expression PRINT`.
    ExpressionPrint { subject: Expression, position: Position },
    /// `expression HAS property [value | (expression)]`.
    ExpressionHas {
        subject: Expression,
        property: String,
        literal_value: Option<Literal>,
        value_expression: Option<Expression>,
        position: Position,
    },
    /// `subject HAS property (Node)`.
    RoleDefinition {
        subject: String,
        role_name: String,
        position: Position,
    },
    /// `subject DO ... END`.
    DoBlock {
        subject: String,
        body: Vec<Statement>,
        position: Position,
    },
    /// `subject CAN ability`.
    Can {
        subject: String,
        ability: String,
        position: Position,
    },
    /// `subject LOSES IS parent` or `subject LOSES target`.
    Loses {
        subject: String,
        target: String,
        kind: LosesKind,
        position: Position,
    },
    Debug { target: DebugTarget, position: Position },
    /// The legacy trailing-`WHEN` form: statement `S` promoted into a
    /// predicate, re-evaluated each time the enclosing body runs.
    When {
        condition: Box<Statement>,
        body: Vec<Statement>,
        position: Position,
    },
    /// `subject WHEN (expr) DO ... [ELSE DO ... | ELSE WHEN (expr) DO ...] END`.
    WhenExpression {
        subject: String,
        condition: Expression,
        body: Vec<Statement>,
        else_body: Option<Vec<Statement>>,
        else_when: Option<Box<Statement>>,
        position: Position,
    },
    /// `CHANCE percent DO ... [ELSE DO ...] END`.
    Chance {
        percent: Expression,
        body: Vec<Statement>,
        else_body: Option<Vec<Statement>>,
        position: Position,
    },
    All {
        target: AllTarget,
        action: Option<Box<Statement>>,
        position: Position,
    },
    /// `subject EACH variable DO ... END`.
    Each {
        collection: String,
        variable: String,
        body: Vec<Statement>,
        position: Position,
    },
    /// `?pattern RELATION [target [value]] [WHERE expr]`.
    Query {
        subject: QueryPattern,
        relation: QueryRelation,
        target: Option<String>,
        target_value: Option<Literal>,
        where_condition: Option<Expression>,
        position: Position,
    },
}

impl Statement {
    pub fn position(&self) -> Position {
        match self {
            Statement::Relation { position, .. }
            | Statement::HasExpression { position, .. }
            | Statement::ExpressionPrint { position, .. }
            | Statement::ExpressionHas { position, .. }
            | Statement::RoleDefinition { position, .. }
            | Statement::DoBlock { position, .. }
            | Statement::Can { position, .. }
            | Statement::Loses { position, .. }
            | Statement::Debug { position, .. }
            | Statement::When { position, .. }
            | Statement::WhenExpression { position, .. }
            | Statement::Chance { position, .. }
            | Statement::All { position, .. }
            | Statement::Each { position, .. }
            | Statement::Query { position, .. } => *position,
        }
    }
}
