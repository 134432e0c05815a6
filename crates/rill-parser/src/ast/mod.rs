//! Typed syntax tree for Rill.
//!
//! Every node is a tagged variant carrying a byte [`Span`] back into the
//! source. Nodes are immutable after construction; function, lambda, and
//! class declarations sit behind `Rc` so runtime values can retain them
//! after parsing without cloning bodies.

pub mod expr;
pub mod pat;
pub mod stmt;

pub use expr::{
    AssignOp, BinOp, CaseBody, CheckCase, CheckExpr, CmpOp, Expr, ExprKind, LambdaBody,
    LambdaDecl, Lit, LogicOp, MapEntry, Param, TemplatePart, UnOp,
};
pub use pat::{Pattern, PatternKind};
pub use stmt::{
    Accessor, BindKind, Block, CatchClause, ClassDecl, ClassMember, ConstructorDecl,
    DestructurePattern, ElseArm, FunctionDecl, ListBinding, MapBinding, MethodDecl, Program,
    PropertyDecl, Stmt, StmtKind,
};
