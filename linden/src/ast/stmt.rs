//! Statement AST nodes

use super::{Expr, Span, Spanned, Type};
use serde::{Deserialize, Serialize};

/// A `{ ... }` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Spanned<Stmt>>,
    pub span: Span,
}

/// One `if (cond) { ... }` or `else if (cond) { ... }` arm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondBlock {
    pub cond: Spanned<Expr>,
    pub body: Block,
}

/// Statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Declaration with optional initializer: int x = 1;
    Declare {
        ty: Spanned<Type>,
        name: Spanned<String>,
        init: Option<Spanned<Expr>>,
    },

    /// Assignment to a variable or an indexed element: target = value;
    Assign {
        target: Spanned<Expr>,
        value: Spanned<Expr>,
    },

    /// Expression evaluated for its effect
    Expr(Spanned<Expr>),

    Return(Option<Spanned<Expr>>),

    /// if / else if chain; branches are tried in order
    If {
        branches: Vec<CondBlock>,
        else_block: Option<Block>,
    },

    While {
        cond: Spanned<Expr>,
        body: Block,
    },
}
