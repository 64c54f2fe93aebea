use crate::span::{Span, Spanned};
use serde::Serialize;
use std::rc::Rc;

pub type Stmt = Spanned<StmtKind>;
pub type TypeExpr = Spanned<TypeKind>;
pub type Ident = Spanned<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Set => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StmtKind {
    Int(String),
    Float(String),
    /// Raw literal text, quotes included.
    Str(String),
    Ident(String),
    Binary { op: BinaryOp, lhs: Box<Stmt>, rhs: Box<Stmt> },
    Compare { op: CompareOp, lhs: Box<Stmt>, rhs: Box<Stmt> },
    Assign { op: AssignOp, lhs: Box<Stmt>, rhs: Box<Stmt> },
    Group(Box<Stmt>),
    Call { callee: Box<Stmt>, args: Vec<Stmt> },
    Dot { lhs: Box<Stmt>, member: Ident },
    Range { lhs: Box<Stmt>, rhs: Box<Stmt>, inclusive: bool },
    StructLiteral { ty: TypeExpr, fields: Vec<(Ident, Stmt)> },
    Let { name: Ident, ty: Option<TypeExpr>, value: Box<Stmt> },
    Return(Box<Stmt>),
    If(IfChain),
    While { cond: Box<Stmt>, body: Vec<Stmt> },
    For { var: Ident, iter: Box<Stmt>, body: Vec<Stmt> },
    Match { value: Box<Stmt>, arms: Vec<MatchArm> },
    Scope(Vec<Stmt>),
    Function(Rc<FunctionDecl>),
    Struct(StructDecl),
    Enum(EnumDecl),
    Extension(ExtensionDecl),
    Import(ImportDecl),
    ExportModule { source: Ident, alias: Option<Ident> },
    Flag { flag: Box<Stmt>, body: Box<Stmt> },
}

/// `if` with any number of `else if` arms and an optional trailing `else`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfChain {
    pub arms: Vec<IfArm>,
    pub else_body: Option<Vec<Stmt>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfArm {
    pub cond: Stmt,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchArm {
    pub pattern: Stmt,
    pub body: ArmBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmBody {
    Inline(Stmt),
    Scoped(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: Ident,
    /// `None` only for a bare leading `self`.
    pub ty: Option<TypeExpr>,
}

impl Param {
    pub fn span(&self) -> &Span {
        self.ty.as_ref().map_or(&self.name.span, |ty| &ty.span)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    pub name: Ident,
    pub generics: Vec<Ident>,
    pub params: Vec<Param>,
    pub ret: TypeExpr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: Ident,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructDecl {
    pub name: Ident,
    pub generics: Vec<Ident>,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumCase {
    pub name: Ident,
    pub discriminator: i64,
    pub payload: Option<Vec<TypeExpr>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDecl {
    pub name: Ident,
    pub generics: Vec<Ident>,
    pub cases: Vec<EnumCase>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionDecl {
    pub target: TypeExpr,
    /// `implement` blocks register cluster-wide; `extension` blocks are scope-local.
    pub global: bool,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportDecl {
    /// Path without quotes.
    pub source: Ident,
    pub scope: ImportScope,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportScope {
    All { alias: Option<Ident> },
    Items(Vec<ImportItem>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportItem {
    pub name: Ident,
    pub alias: Option<Ident>,
}

impl ImportItem {
    pub fn binding(&self) -> &str {
        self.alias.as_ref().unwrap_or(&self.name).node.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Named { name: Ident, args: Vec<TypeExpr> },
    Dot { lhs: Box<TypeExpr>, member: Ident },
    Tuple(Vec<TypeExpr>),
}

impl StmtKind {
    /// Dotted path of an identifier chain, e.g. `compiler.export`.
    pub fn path(&self) -> Option<String> {
        match self {
            StmtKind::Ident(name) => Some(name.clone()),
            StmtKind::Dot { lhs, member } => lhs.node.path().map(|p| format!("{p}.{}", member.node)),
            _ => None,
        }
    }
}

/// Compact prefix rendering of expressions: `add(a, mul(b, c))`.
pub fn sexpr(stmt: &Stmt) -> String {
    let pair = |name: &str, lhs: &Stmt, rhs: &Stmt| format!("{name}({}, {})", sexpr(lhs), sexpr(rhs));
    match &stmt.node {
        StmtKind::Int(v) | StmtKind::Float(v) | StmtKind::Str(v) | StmtKind::Ident(v) => v.clone(),
        StmtKind::Binary { op, lhs, rhs } => {
            let name = match op {
                BinaryOp::Add => "add",
                BinaryOp::Sub => "sub",
                BinaryOp::Mul => "mul",
                BinaryOp::Div => "div",
            };
            pair(name, lhs, rhs)
        }
        StmtKind::Compare { op, lhs, rhs } => pair(op.symbol(), lhs, rhs),
        StmtKind::Assign { op, lhs, rhs } => pair(op.symbol(), lhs, rhs),
        StmtKind::Group(inner) => format!("({})", sexpr(inner)),
        StmtKind::Call { callee, args } => {
            let args: Vec<_> = args.iter().map(sexpr).collect();
            format!("call({}, [{}])", sexpr(callee), args.join(", "))
        }
        StmtKind::Dot { lhs, member } => format!("{}.{}", sexpr(lhs), member.node),
        StmtKind::Range { lhs, rhs, inclusive } => {
            pair(if *inclusive { "range_incl" } else { "range" }, lhs, rhs)
        }
        StmtKind::Let { name, value, .. } => format!("let({}, {})", name.node, sexpr(value)),
        StmtKind::Return(value) => format!("return({})", sexpr(value)),
        StmtKind::Flag { flag, body } => format!("flag({}, {})", sexpr(flag), sexpr(body)),
        other => kind_name(other).to_string(),
    }
}

pub fn kind_name(kind: &StmtKind) -> &'static str {
    match kind {
        StmtKind::Int(_) => "int",
        StmtKind::Float(_) => "float",
        StmtKind::Str(_) => "string",
        StmtKind::Ident(_) => "ident",
        StmtKind::Binary { .. } => "binary",
        StmtKind::Compare { .. } => "compare",
        StmtKind::Assign { .. } => "assign",
        StmtKind::Group(_) => "group",
        StmtKind::Call { .. } => "call",
        StmtKind::Dot { .. } => "dot",
        StmtKind::Range { .. } => "range",
        StmtKind::StructLiteral { .. } => "struct-data",
        StmtKind::Let { .. } => "let",
        StmtKind::Return(_) => "return",
        StmtKind::If(_) => "if",
        StmtKind::While { .. } => "while",
        StmtKind::For { .. } => "for",
        StmtKind::Match { .. } => "match",
        StmtKind::Scope(_) => "scope",
        StmtKind::Function(_) => "function",
        StmtKind::Struct(_) => "struct",
        StmtKind::Enum(_) => "enum",
        StmtKind::Extension(_) => "extension",
        StmtKind::Import(_) => "import",
        StmtKind::ExportModule { .. } => "export-module",
        StmtKind::Flag { .. } => "flag",
    }
}
