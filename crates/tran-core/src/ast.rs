//! Abstract Syntax Tree for Tran.

use crate::span::Span;
use serde::{Deserialize, Serialize};

/// A complete Tran program.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranUnit {
    /// Interface declarations, in source order
    pub interfaces: Vec<InterfaceDecl>,
    /// Class declarations, in source order
    pub classes: Vec<ClassDecl>,
}

impl TranUnit {
    /// Find a class by name. The first declaration wins.
    pub fn class(&self, name: &str) -> Option<&ClassDecl> {
        self.classes.iter().find(|c| c.name.name == name)
    }

    pub fn interface(&self, name: &str) -> Option<&InterfaceDecl> {
        self.interfaces.iter().find(|i| i.name.name == name)
    }
}

/// An interface declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub name: Identifier,
    /// Method headers (at least one)
    pub methods: Vec<MethodHeader>,
    pub span: Span,
}

/// A method signature: `name(type a, type b) : type r, type s`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodHeader {
    pub name: Identifier,
    pub parameters: Vec<VariableDecl>,
    /// Named return variables
    pub returns: Vec<VariableDecl>,
    pub span: Span,
}

/// A typed variable declaration: `number count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDecl {
    pub type_name: Identifier,
    pub name: Identifier,
    pub span: Span,
}

/// A class declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: Identifier,
    /// Names of implemented interfaces
    pub interfaces: Vec<Identifier>,
    pub constructors: Vec<ConstructorDecl>,
    pub methods: Vec<MethodDecl>,
    pub members: Vec<MemberDecl>,
    pub span: Span,
}

/// A method declaration with its body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDecl {
    pub header: MethodHeader,
    pub is_private: bool,
    pub is_shared: bool,
    pub locals: Vec<VariableDecl>,
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl MethodDecl {
    pub fn name(&self) -> &str {
        &self.header.name.name
    }

    pub fn parameters(&self) -> &[VariableDecl] {
        &self.header.parameters
    }

    pub fn returns(&self) -> &[VariableDecl] {
        &self.header.returns
    }
}

/// A constructor: `construct(type a)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructorDecl {
    pub parameters: Vec<VariableDecl>,
    pub locals: Vec<VariableDecl>,
    pub statements: Vec<Statement>,
    pub span: Span,
}

/// A member variable, optionally exposing an accessor and/or mutator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDecl {
    pub declaration: VariableDecl,
    pub accessor: bool,
    pub mutator: bool,
}

/// A statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Statement {
    /// `target = expression`
    Assignment(Assignment),
    /// `[a, b =] [receiver.]method(args)`
    MethodCall(MethodCallStatement),
    If(IfStatement),
    Loop(LoopStatement),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Assignment(a) => a.span,
            Statement::MethodCall(m) => m.span,
            Statement::If(i) => i.span,
            Statement::Loop(l) => l.span,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub target: VariableReference,
    pub expression: Expression,
    pub span: Span,
}

/// A method call whose return values are bound, in order, to `results`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodCallStatement {
    pub results: Vec<VariableReference>,
    pub call: MethodCall,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfStatement {
    pub condition: Expression,
    pub statements: Vec<Statement>,
    pub else_statements: Option<Vec<Statement>>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopStatement {
    /// Variable bound on each iteration (`loop i = 3.times`)
    pub variable: Option<VariableReference>,
    pub control: LoopControl,
    pub statements: Vec<Statement>,
    pub span: Span,
}

/// How a loop decides whether to run another iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LoopControl {
    /// Re-evaluated before every iteration
    Condition(Expression),
    /// `count.times`: iterates with the values 1 through count
    Times(Expression),
}

/// A method call: `[receiver.]method(arguments)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodCall {
    /// Object variable or class name before the dot
    pub receiver: Option<Identifier>,
    pub method: Identifier,
    pub arguments: Vec<Expression>,
    pub span: Span,
}

impl MethodCall {
    /// `receiver.method` or `method`, for messages.
    pub fn display_name(&self) -> String {
        match &self.receiver {
            Some(receiver) => format!("{}.{}", receiver.name, self.method.name),
            None => self.method.name.clone(),
        }
    }
}

/// `new ClassName(arguments)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpression {
    pub class_name: Identifier,
    pub arguments: Vec<Expression>,
    pub span: Span,
}

/// An expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expression {
    Number(NumberLiteral),
    String(StringLiteral),
    Character(CharacterLiteral),
    Boolean(BooleanLiteral),
    Variable(VariableReference),
    MethodCall(MethodCall),
    New(NewExpression),
    MathOp {
        left: Box<Expression>,
        op: MathOperator,
        right: Box<Expression>,
        span: Span,
    },
    /// `and`/`or` take two operands; `not` has no right operand.
    BooleanOp {
        left: Box<Expression>,
        op: BooleanOperator,
        right: Option<Box<Expression>>,
        span: Span,
    },
    Compare {
        left: Box<Expression>,
        op: CompareOperator,
        right: Box<Expression>,
        span: Span,
    },
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Number(n) => n.span,
            Expression::String(s) => s.span,
            Expression::Character(c) => c.span,
            Expression::Boolean(b) => b.span,
            Expression::Variable(v) => v.span,
            Expression::MethodCall(m) => m.span,
            Expression::New(n) => n.span,
            Expression::MathOp { span, .. } => *span,
            Expression::BooleanOp { span, .. } => *span,
            Expression::Compare { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl MathOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            MathOperator::Add => "+",
            MathOperator::Subtract => "-",
            MathOperator::Multiply => "*",
            MathOperator::Divide => "/",
            MathOperator::Modulo => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BooleanOperator {
    And,
    Or,
    Not,
}

impl BooleanOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BooleanOperator::And => "and",
            BooleanOperator::Or => "or",
            BooleanOperator::Not => "not",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOperator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOperator::Eq => "==",
            CompareOperator::Ne => "!=",
            CompareOperator::Lt => "<",
            CompareOperator::Le => "<=",
            CompareOperator::Gt => ">",
            CompareOperator::Ge => ">=",
        }
    }
}

/// A reference to a local, parameter, return variable or member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableReference {
    pub name: String,
    pub span: Span,
}

impl VariableReference {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// An identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

impl Identifier {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// A string literal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StringLiteral {
    pub value: String,
    pub span: Span,
}

impl StringLiteral {
    pub fn new(value: impl Into<String>, span: Span) -> Self {
        Self {
            value: value.into(),
            span,
        }
    }
}

/// A character literal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterLiteral {
    pub value: char,
    pub span: Span,
}

impl CharacterLiteral {
    pub fn new(value: char, span: Span) -> Self {
        Self { value, span }
    }
}

/// A number literal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumberLiteral {
    pub value: f64,
    pub span: Span,
}

impl NumberLiteral {
    pub fn new(value: f64, span: Span) -> Self {
        Self { value, span }
    }
}

/// A boolean literal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BooleanLiteral {
    pub value: bool,
    pub span: Span,
}

impl BooleanLiteral {
    pub fn new(value: bool, span: Span) -> Self {
        Self { value, span }
    }
}
