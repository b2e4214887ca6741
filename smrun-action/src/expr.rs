//! Expression tree nodes.

use smrun_vars::{Value, VarHandle, VarType};

/// Binary operators, C semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        }
    }
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    AndAssign,
    OrAssign,
    XorAssign,
}

impl AssignOp {
    /// The binary operation a compound assignment applies, if any.
    pub fn binary_op(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::AddAssign => Some(BinaryOp::Add),
            AssignOp::SubAssign => Some(BinaryOp::Sub),
            AssignOp::MulAssign => Some(BinaryOp::Mul),
            AssignOp::DivAssign => Some(BinaryOp::Div),
            AssignOp::AndAssign => Some(BinaryOp::BitAnd),
            AssignOp::OrAssign => Some(BinaryOp::BitOr),
            AssignOp::XorAssign => Some(BinaryOp::BitXor),
        }
    }
}

/// Increment or decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncDec {
    Inc,
    Dec,
}

/// An expression node with the source line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: u32,
}

/// Expression node kinds. Each variant carries exactly the payload it
/// needs: literals a typed value, registry references their handle, timer
/// references their slot id.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Typed constant.
    Literal(Value),
    /// Declared block-local variable.
    Local(String),
    /// Registry variable. The handle is `VarHandle::INVALID` when the
    /// name lookup failed at parse time.
    SysVar { name: String, handle: VarHandle },
    /// Timer slot reference; evaluates to the slot id.
    Timer(u32),
    /// The id of the timer whose expiry is currently being processed.
    ActiveTimer,
    /// Logical negation.
    Not(Box<Expr>),
    /// Prefix `++`/`--`; evaluates to the stored result.
    PreIncDec { op: IncDec, target: Box<Expr> },
    /// Postfix `++`/`--`; evaluates to the value before the update.
    PostIncDec { op: IncDec, target: Box<Expr> },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// C-style cast `(type) expr`.
    Cast { to: VarType, expr: Box<Expr> },
    If {
        cond: Box<Expr>,
        then_branch: Vec<Expr>,
        else_branch: Vec<Expr>,
    },
    CreateTimer { id: u32, interval: Box<Expr> },
    CreateTick { id: u32, interval: Box<Expr> },
    DeleteTimer { id: u32 },
    /// Raw shell script run through `sh -c`.
    Shell(String),
}

impl Expr {
    pub fn new(kind: ExprKind, line: u32) -> Self {
        Self { kind, line }
    }

    /// Direct child expressions, for tree walks.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Literal(_)
            | ExprKind::Local(_)
            | ExprKind::SysVar { .. }
            | ExprKind::Timer(_)
            | ExprKind::ActiveTimer
            | ExprKind::DeleteTimer { .. }
            | ExprKind::Shell(_) => Vec::new(),
            ExprKind::Not(e) | ExprKind::Cast { expr: e, .. } => vec![e],
            ExprKind::PreIncDec { target, .. } | ExprKind::PostIncDec { target, .. } => {
                vec![target]
            }
            ExprKind::Binary { left, right, .. } => vec![left, right],
            ExprKind::Assign { target, value, .. } => vec![target, value],
            ExprKind::CreateTimer { interval, .. } | ExprKind::CreateTick { interval, .. } => {
                vec![interval]
            }
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let mut out: Vec<&Expr> = vec![cond];
                out.extend(then_branch.iter());
                out.extend(else_branch.iter());
                out
            }
        }
    }
}
