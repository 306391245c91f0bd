use std::rc::Rc;

use crate::ast::{Expr, FunctionExpr};

/// A function value: a handle on the literal that created it. Nothing from
/// the defining scope is captured.
#[derive(Debug, Clone)]
pub struct Function {
    pub declaration: Rc<FunctionExpr>,
}

impl Function {
    pub fn new(declaration: Rc<FunctionExpr>) -> Self {
        Self { declaration }
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.declaration, &other.declaration)
    }
}

/// Forms recognized by name at the call site rather than looked up in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
}

impl Builtin {
    pub fn arity(&self) -> usize {
        match self {
            Self::Print => 1,
        }
    }

    /// Recognize a builtin from a call's callee expression.
    pub fn from_callee(callee: &Expr) -> Option<Self> {
        match callee {
            Expr::Identifier(id) if id.name == "print" => Some(Self::Print),
            _ => None,
        }
    }
}
