use std::fmt::{self, Write};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub depth: usize,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expr(Expr),
    Return(Option<Expr>),
}

/// Statements that share one indentation depth.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Identifier(String),
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Array(Vec<Expr>),
    Hash(Vec<(Expr, Expr)>),
    Prefix {
        op: PrefixOp,
        rhs: Box<Expr>,
    },
    Infix {
        lhs: Box<Expr>,
        op: InfixOp,
        rhs: Box<Expr>,
    },
    If {
        condition: Box<Expr>,
        consequence: Block,
        alternative: Option<Block>,
    },
    While {
        condition: Box<Expr>,
        body: Block,
    },
    Function(FunctionLiteral),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLiteral {
    pub name: String,
    pub params: Vec<Param>,
    /// `None` when the header has no `->` clause.
    pub return_type: Option<String>,
    pub body: Block,
}

impl FunctionLiteral {
    pub fn return_type_name(&self) -> &str {
        self.return_type.as_deref().unwrap_or("none")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub type_name: String,
    pub default: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Negate,
    Not,
}

impl PrefixOp {
    pub fn symbol(self) -> &'static str {
        match self {
            PrefixOp::Negate => "-",
            PrefixOp::Not => "!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl InfixOp {
    pub fn symbol(self) -> &'static str {
        match self {
            InfixOp::Assign => "=",
            InfixOp::Add => "+",
            InfixOp::Subtract => "-",
            InfixOp::Multiply => "*",
            InfixOp::Divide => "/",
            InfixOp::Modulo => "%",
            InfixOp::Equal => "==",
            InfixOp::NotEqual => "!=",
            InfixOp::Less => "<",
            InfixOp::LessEqual => "<=",
            InfixOp::Greater => ">",
            InfixOp::GreaterEqual => ">=",
            InfixOp::And => "and",
            InfixOp::Or => "or",
        }
    }
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for PrefixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// Canonical source rendering. Each nesting level adds one tab and every
// infix operation is wrapped in exactly one pair of parentheses.

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write_stmt(f, stmt, 0)?;
            f.write_char('\n')?;
        }
        Ok(())
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_stmt(f, self, 0)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(f, self, 0)
    }
}

fn write_stmt(f: &mut fmt::Formatter<'_>, stmt: &Stmt, level: usize) -> fmt::Result {
    match &stmt.kind {
        StmtKind::Expr(expr) => write_expr(f, expr, level),
        StmtKind::Return(None) => f.write_str("return"),
        StmtKind::Return(Some(value)) => {
            f.write_str("return ")?;
            write_expr(f, value, level)
        }
    }
}

fn write_block(f: &mut fmt::Formatter<'_>, block: &Block, level: usize) -> fmt::Result {
    for (i, stmt) in block.statements.iter().enumerate() {
        if i > 0 {
            f.write_char('\n')?;
        }
        write_indent(f, level)?;
        write_stmt(f, stmt, level)?;
    }
    Ok(())
}

fn write_indent(f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
    for _ in 0..level {
        f.write_char('\t')?;
    }
    Ok(())
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr], level: usize) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_expr(f, item, level)?;
    }
    Ok(())
}

fn write_expr(f: &mut fmt::Formatter<'_>, expr: &Expr, level: usize) -> fmt::Result {
    match &expr.kind {
        ExprKind::Identifier(name) => f.write_str(name),
        ExprKind::Int(value) => write!(f, "{}", value),
        ExprKind::Float(value) => write!(f, "{:?}", value),
        ExprKind::String(value) => write_string_literal(f, value),
        ExprKind::Bool(value) => write!(f, "{}", value),
        ExprKind::Array(items) => {
            f.write_char('[')?;
            write_list(f, items, level)?;
            f.write_char(']')
        }
        ExprKind::Hash(pairs) => {
            f.write_char('{')?;
            for (i, (key, value)) in pairs.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_expr(f, key, level)?;
                f.write_str(": ")?;
                write_expr(f, value, level)?;
            }
            f.write_char('}')
        }
        ExprKind::Prefix { op, rhs } => {
            write!(f, "({}", op)?;
            write_expr(f, rhs, level)?;
            f.write_char(')')
        }
        ExprKind::Infix { lhs, op, rhs } => {
            f.write_char('(')?;
            write_expr(f, lhs, level)?;
            write!(f, " {} ", op)?;
            write_expr(f, rhs, level)?;
            f.write_char(')')
        }
        ExprKind::If {
            condition,
            consequence,
            alternative,
        } => {
            f.write_str("if ")?;
            write_expr(f, condition, level)?;
            f.write_str(":\n")?;
            write_block(f, consequence, level + 1)?;
            if let Some(alternative) = alternative {
                f.write_char('\n')?;
                write_indent(f, level)?;
                f.write_str("else:\n")?;
                write_block(f, alternative, level + 1)?;
            }
            Ok(())
        }
        ExprKind::While { condition, body } => {
            f.write_str("while ")?;
            write_expr(f, condition, level)?;
            f.write_str(":\n")?;
            write_block(f, body, level + 1)
        }
        ExprKind::Function(function) => {
            write!(f, "def {}(", function.name)?;
            for (i, param) in function.params.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}: {}", param.name, param.type_name)?;
                if let Some(default) = &param.default {
                    f.write_str(" = ")?;
                    write_expr(f, default, level)?;
                }
            }
            f.write_char(')')?;
            if let Some(return_type) = &function.return_type {
                write!(f, " -> {}", return_type)?;
            }
            f.write_str(":\n")?;
            write_block(f, &function.body, level + 1)
        }
        ExprKind::Call { callee, args } => {
            write_expr(f, callee, level)?;
            f.write_char('(')?;
            write_list(f, args, level)?;
            f.write_char(')')
        }
        ExprKind::Index { object, index } => {
            f.write_char('(')?;
            write_expr(f, object, level)?;
            f.write_char('[')?;
            write_expr(f, index, level)?;
            f.write_str("])")
        }
    }
}

fn write_string_literal(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in value.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            other => f.write_char(other)?,
        }
    }
    f.write_char('"')
}
