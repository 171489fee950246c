use std::sync::atomic::{AtomicUsize, Ordering};

use crate::token::Token;

// Ids must stay unique across every parse feeding one interpreter (the
// REPL reuses the side table between lines), hence the process-wide
// counter rather than a per-parser one.
static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// Fresh identity for a `Variable`/`Assign`/`This`/`Super` node.
///
/// The resolver keys its scope-distance side table by these ids; a
/// name-keyed table would conflate occurrences of the same name at
/// different depths.
pub fn next_expr_id() -> usize {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone)]
pub enum Expr {
    // Literal values carry their token so the interpreter can read the
    // payload and the line number straight off it.
    Literal(Token),

    Grouping(Box<Expr>),

    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    // Kept apart from Binary so the interpreter can short-circuit.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    Variable {
        id: usize,
        name: Token,
    },

    Assign {
        id: usize,
        name: Token,
        value: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },

    Get {
        object: Box<Expr>,
        name: Token,
    },

    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    This {
        id: usize,
        keyword: Token,
    },

    Super {
        id: usize,
        keyword: Token,
        method: Token,
    },
}
