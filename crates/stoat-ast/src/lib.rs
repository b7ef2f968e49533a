//! AST node types for the Stoat JavaScript engine
//!
//! Plain data produced by `stoat-parser` and consumed by the evaluator in
//! `stoat-core`. Nodes are `Clone` so that debug observers can retain the
//! statement they were notified about.

/// Source position of a node (1-based line, 0-based column).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    /// Line number, starting at 1
    pub line: u32,
    /// Column number, starting at 0
    pub column: u32,
}

impl Span {
    /// Create a span
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A parsed program: the top-level statement list plus its strictness,
/// determined by a leading `"use strict"` directive.
#[derive(Clone, Debug)]
pub struct Program {
    /// Top-level statements
    pub body: Vec<Statement>,
    /// Whether the program opened with a `"use strict"` directive
    pub strict: bool,
}

/// A statement with its source position.
#[derive(Clone, Debug)]
pub struct Statement {
    /// What kind of statement this is
    pub kind: StatementKind,
    /// Where the statement starts
    pub span: Span,
}

/// Statement variants.
#[derive(Clone, Debug)]
pub enum StatementKind {
    /// An expression evaluated for its value/effects
    Expression(Expression),
    /// `var a = 1, b;`
    VarDeclaration(Vec<VarDeclarator>),
    /// `function f(a, b) { ... }` (hoisted)
    FunctionDeclaration(FunctionLiteral),
    /// `{ ... }`
    Block(Vec<Statement>),
    /// `if (test) consequent else alternate`
    If {
        /// Condition
        test: Expression,
        /// Taken when the condition is truthy
        consequent: Box<Statement>,
        /// Taken otherwise, if present
        alternate: Option<Box<Statement>>,
    },
    /// `while (test) body`
    While {
        /// Loop condition
        test: Expression,
        /// Loop body
        body: Box<Statement>,
    },
    /// `do body while (test);`
    DoWhile {
        /// Loop body
        body: Box<Statement>,
        /// Loop condition
        test: Expression,
    },
    /// `for (init; test; update) body`
    For {
        /// Initializer (a var declaration or expression statement)
        init: Option<Box<Statement>>,
        /// Loop condition
        test: Option<Expression>,
        /// Per-iteration update expression
        update: Option<Expression>,
        /// Loop body
        body: Box<Statement>,
    },
    /// `return expr;`
    Return(Option<Expression>),
    /// `throw expr;`
    Throw(Expression),
    /// `try { ... } catch (e) { ... } finally { ... }`
    Try {
        /// Protected statements
        block: Vec<Statement>,
        /// Catch parameter name, when a handler is present
        param: Option<String>,
        /// Catch body
        handler: Option<Vec<Statement>>,
        /// Finally body
        finalizer: Option<Vec<Statement>>,
    },
    /// `break;`
    Break,
    /// `continue;`
    Continue,
    /// `;`
    Empty,
}

/// One `name = init` entry of a `var` declaration.
#[derive(Clone, Debug)]
pub struct VarDeclarator {
    /// Bound name
    pub name: String,
    /// Initializer, if present
    pub init: Option<Expression>,
}

/// A function declaration or expression body.
#[derive(Clone, Debug)]
pub struct FunctionLiteral {
    /// Function name (absent for anonymous expressions)
    pub name: Option<String>,
    /// Formal parameter names, in order
    pub params: Vec<String>,
    /// Body statements
    pub body: Vec<Statement>,
    /// Whether the body opened with a `"use strict"` directive
    pub strict: bool,
}

/// Expression variants.
#[derive(Clone, Debug)]
pub enum Expression {
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// `true` / `false`
    Boolean(bool),
    /// `null`
    Null,
    /// `this`
    This,
    /// A name to resolve in the scope chain
    Identifier(String),
    /// `[a, b, c]`
    Array(Vec<Expression>),
    /// `{ a: 1, get b() {} }`
    Object(Vec<ObjectProperty>),
    /// `function (a) { ... }`
    Function(Box<FunctionLiteral>),
    /// `-x`, `!x`, `typeof x`, `void x`, `delete x.y`
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expression>,
    },
    /// `++x`, `x--`
    Update {
        /// Operator
        op: UpdateOp,
        /// Prefix (`++x`) or postfix (`x++`)
        prefix: bool,
        /// Assignment target
        target: Box<Expression>,
    },
    /// `a + b`, `a instanceof b`, ...
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },
    /// `a && b`, `a || b` (short-circuiting)
    Logical {
        /// Operator
        op: LogicalOp,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },
    /// `test ? consequent : alternate`
    Conditional {
        /// Condition
        test: Box<Expression>,
        /// Value when truthy
        consequent: Box<Expression>,
        /// Value when falsy
        alternate: Box<Expression>,
    },
    /// `target = value` or compound `target op= value`
    Assign {
        /// Compound operator, absent for plain `=`
        op: Option<BinaryOp>,
        /// Assignment target (identifier or member)
        target: Box<Expression>,
        /// Assigned value
        value: Box<Expression>,
    },
    /// `callee(args)`
    Call {
        /// Called expression
        callee: Box<Expression>,
        /// Argument expressions, in order
        args: Vec<Expression>,
    },
    /// `new callee(args)`
    New {
        /// Constructed expression
        callee: Box<Expression>,
        /// Argument expressions, in order
        args: Vec<Expression>,
    },
    /// `object.name` or `object[expr]`
    Member {
        /// Base object expression
        object: Box<Expression>,
        /// Property selector
        property: MemberProperty,
    },
}

/// Property selector of a member expression.
#[derive(Clone, Debug)]
pub enum MemberProperty {
    /// `object.name`
    Dot(String),
    /// `object[expr]`
    Computed(Box<Expression>),
}

/// One property of an object literal.
#[derive(Clone, Debug)]
pub struct ObjectProperty {
    /// Property name
    pub name: PropertyName,
    /// Data value or accessor body
    pub kind: ObjectPropertyKind,
}

/// Object-literal property payload.
#[derive(Clone, Debug)]
pub enum ObjectPropertyKind {
    /// `name: expr`
    Init(Expression),
    /// `get name() { ... }`
    Get(FunctionLiteral),
    /// `set name(v) { ... }`
    Set(FunctionLiteral),
}

/// Literal property name of an object literal.
#[derive(Clone, Debug)]
pub enum PropertyName {
    /// Bare identifier key
    Identifier(String),
    /// Quoted string key
    String(String),
    /// Numeric key
    Number(f64),
}

impl PropertyName {
    /// Render the name as the string key it denotes.
    pub fn as_key_string(&self) -> String {
        match self {
            Self::Identifier(s) | Self::String(s) => s.clone(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e21 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
        }
    }
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `===`
    StrictEq,
    /// `!==`
    StrictNotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `instanceof`
    InstanceOf,
    /// `in`
    In,
}

/// Logical (short-circuit) operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `!`
    Not,
    /// `typeof`
    TypeOf,
    /// `void`
    Void,
    /// `delete`
    Delete,
}

/// Update operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOp {
    /// `++`
    Increment,
    /// `--`
    Decrement,
}
