pub mod callable;
pub mod environment;
pub mod value;

use std::io::Write;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::ast::*;
use crate::error::{ErrorKind, RuntimeError};
use crate::interpreter::callable::{Builtin, Function};
use crate::interpreter::environment::Scopes;
use crate::interpreter::value::{Array, Value, ValueKind};
use crate::scanner::token::Span;

pub struct Interpreter {
    scopes: Scopes,
    /// Pending return value, collected and reset by the enclosing call.
    ret: Value,
    /// Printed lines, kept only when capture was asked for.
    output: Option<Vec<String>>,
    /// Writer for print output (allows testing without stdout)
    writer: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_writer(std::io::stdout())
    }

    /// Send `print` output somewhere other than stdout.
    pub fn with_writer(writer: impl Write + 'static) -> Self {
        Self {
            scopes: Scopes::new(),
            ret: Value::Undefined,
            output: None,
            writer: Box::new(writer),
        }
    }

    /// Like [`Interpreter::with_writer`], but also keep every printed line
    /// for [`Interpreter::output`].
    pub fn capturing(writer: impl Write + 'static) -> Self {
        Self {
            output: Some(Vec::new()),
            ..Self::with_writer(writer)
        }
    }

    /// Run every statement of a program. A top-level `return` only sets the
    /// pending value; nothing collects it.
    pub fn interpret(&mut self, program: &Program) -> Result<(), RuntimeError> {
        debug!(
            name = %program.name,
            statements = program.statements.len(),
            "interpreting program"
        );
        let result = program
            .statements
            .iter()
            .try_for_each(|stmt| self.execute_stmt(stmt));
        match result {
            Err(e) => {
                debug!(kind = %e.kind(), error = %e, "runtime error");
                Err(e)
            }
            Ok(()) => {
                debug!(pending = %self.ret, "program finished");
                Ok(())
            }
        }
    }

    /// Every line printed so far. Empty unless built with
    /// [`Interpreter::capturing`].
    pub fn output(&self) -> &[String] {
        self.output.as_deref().unwrap_or_default()
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.depth()
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> Result<(), RuntimeError> {
        match stmt {
            Stmt::Assign(a) => {
                let value = self.evaluate_expr(&a.value)?;
                self.assign(&a.target, value)
            }
            Stmt::Block(b) => self.execute_block(b),
            Stmt::If(i) => {
                if self.evaluate_expr(&i.condition)?.is_true() {
                    self.execute_block(&i.then_branch)
                } else if let Some(else_branch) = &i.else_branch {
                    self.execute_stmt(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::Empty(_) => Ok(()),
            Stmt::Expression(e) => {
                self.evaluate_expr(&e.expression)?;
                Ok(())
            }
            Stmt::While(w) => {
                while self.evaluate_expr(&w.condition)?.is_true() {
                    self.execute_block(&w.body)?;
                }
                Ok(())
            }
            Stmt::Return(r) => {
                self.ret = match &r.value {
                    Some(expr) => self.evaluate_expr(expr)?,
                    None => Value::Undefined,
                };
                Ok(())
            }
        }
    }

    fn execute_block(&mut self, block: &BlockStmt) -> Result<(), RuntimeError> {
        self.scopes.begin();
        let result = block
            .statements
            .iter()
            .try_for_each(|stmt| self.execute_stmt(stmt));
        self.scopes.end();
        result
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Array(a) => self.evaluate_array(a),
            Expr::Number(n) => Ok(Value::Number(n.value)),
            Expr::Str(s) => Ok(Value::Str(s.value.clone())),
            Expr::Function(f) => Ok(Value::Function(Function::new(Rc::clone(f)))),
            Expr::Identifier(id) => self.look_up_variable(id),
            Expr::Unary(u) => {
                let operand = self.evaluate_expr(&u.operand)?;
                match (u.operator, operand) {
                    (UnaryOp::Plus, value) => Ok(value),
                    (UnaryOp::Negate, Value::Number(n)) => Ok(Value::Number(n.wrapping_neg())),
                    (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                    (op, value) => Err(invalid_operator(&op, value.kind(), u.span)),
                }
            }
            Expr::Binary(b) => self.evaluate_binary(b),
            Expr::Index(_) | Expr::Selector(_) => self.read_entry(expr),
            Expr::Paren(p) => self.evaluate_expr(&p.expression),
            Expr::Call(c) => self.evaluate_call(c),
        }
    }

    /// Bare elements are keyed by their position in the literal, counting
    /// keyed elements too.
    fn evaluate_array(&mut self, a: &ArrayExpr) -> Result<Value, RuntimeError> {
        let mut array = Array::new();
        for (position, element) in a.elements.iter().enumerate() {
            match element {
                ArrayElement::Positional(expr) => {
                    let value = self.evaluate_expr(expr)?;
                    array.set(Value::Number(position as i64), value);
                }
                ArrayElement::Pair(pair) => {
                    let key = self.evaluate_expr(&pair.key)?;
                    let value = self.evaluate_expr(&pair.value)?;
                    array.set(key, value);
                }
            }
        }
        Ok(Value::Array(array))
    }

    fn evaluate_binary(&mut self, b: &BinaryExpr) -> Result<Value, RuntimeError> {
        let left = self.evaluate_expr(&b.left)?;
        let right = self.evaluate_expr(&b.right)?;

        if left.kind() != right.kind() {
            return Err(RuntimeError::with_span(
                ErrorKind::TypeMismatch,
                format!(
                    "type mismatch: {} {} {}",
                    left.kind(),
                    b.operator,
                    right.kind()
                ),
                b.span,
            ));
        }

        use BinaryOp::*;
        match (b.operator, &left, &right) {
            (Add, Value::Number(x), Value::Number(y)) => Ok(Value::Number(x.wrapping_add(*y))),
            (Add, Value::Str(x), Value::Str(y)) => Ok(Value::Str(format!("{x}{y}"))),
            (Subtract, Value::Number(x), Value::Number(y)) => {
                Ok(Value::Number(x.wrapping_sub(*y)))
            }
            (Multiply, Value::Number(x), Value::Number(y)) => {
                Ok(Value::Number(x.wrapping_mul(*y)))
            }
            (Divide | Remainder, Value::Number(_), Value::Number(0)) => Err(
                RuntimeError::with_span(ErrorKind::DivisionByZero, "division by zero", b.span),
            ),
            (Divide, Value::Number(x), Value::Number(y)) => Ok(Value::Number(x.wrapping_div(*y))),
            (Remainder, Value::Number(x), Value::Number(y)) => {
                Ok(Value::Number(x.wrapping_rem(*y)))
            }
            (And, Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(*x && *y)),
            (Or, Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(*x || *y)),
            (Equal, Value::Number(_) | Value::Bool(_) | Value::Str(_), _) => {
                Ok(Value::Bool(left == right))
            }
            (NotEqual, Value::Number(_) | Value::Bool(_) | Value::Str(_), _) => {
                Ok(Value::Bool(left != right))
            }
            (Less, Value::Number(x), Value::Number(y)) => Ok(Value::Bool(x < y)),
            (LessEqual, Value::Number(x), Value::Number(y)) => Ok(Value::Bool(x <= y)),
            (Greater, Value::Number(x), Value::Number(y)) => Ok(Value::Bool(x > y)),
            (GreaterEqual, Value::Number(x), Value::Number(y)) => Ok(Value::Bool(x >= y)),
            (op, value, _) => Err(invalid_operator(&op, value.kind(), b.span)),
        }
    }

    fn evaluate_call(&mut self, c: &CallExpr) -> Result<Value, RuntimeError> {
        if let Some(builtin) = Builtin::from_callee(&c.callee) {
            let args = self.evaluate_arguments(&c.arguments)?;
            return self.call_builtin(builtin, args, c.span);
        }

        let function = match self.evaluate_expr(&c.callee)? {
            Value::Function(function) => function,
            other => {
                return Err(RuntimeError::with_span(
                    ErrorKind::NotCallable,
                    format!("cannot call a value of kind {}", other.kind()),
                    c.span,
                ));
            }
        };

        let args = self.evaluate_arguments(&c.arguments)?;
        if args.len() != function.arity() {
            return Err(arity_mismatch(function.arity(), args.len(), c.span));
        }
        self.call_function(&function, args)
    }

    fn evaluate_arguments(&mut self, arguments: &[Expr]) -> Result<Vec<Value>, RuntimeError> {
        arguments.iter().map(|arg| self.evaluate_expr(arg)).collect()
    }

    fn call_builtin(
        &mut self,
        builtin: Builtin,
        args: Vec<Value>,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        if args.len() != builtin.arity() {
            return Err(arity_mismatch(builtin.arity(), args.len(), span));
        }
        match builtin {
            Builtin::Print => {
                let text = args[0].to_string();
                writeln!(self.writer, "{text}").map_err(|e| {
                    RuntimeError::with_span(
                        ErrorKind::Output,
                        format!("failed to write output: {e}"),
                        span,
                    )
                })?;
                if let Some(output) = &mut self.output {
                    output.push(text);
                }
                Ok(Value::Undefined)
            }
        }
    }

    /// The new frame's parent is the caller's current frame, so free names in
    /// the body resolve against whatever is visible at the call site. The
    /// whole body runs; the result is whatever `return` last stored, and the
    /// pending value is cleared afterwards, on failure too.
    fn call_function(
        &mut self,
        function: &Function,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        self.scopes.begin();
        trace!(
            arity = function.arity(),
            depth = self.scopes.depth(),
            "calling function"
        );
        for (param, arg) in function.declaration.params.iter().zip(args) {
            self.scopes.define(param.name.clone(), arg);
        }
        let result = function
            .declaration
            .body
            .statements
            .iter()
            .try_for_each(|stmt| self.execute_stmt(stmt));
        self.scopes.end();
        let value = std::mem::take(&mut self.ret);
        result.map(|()| value)
    }

    fn look_up_variable(&self, id: &IdentExpr) -> Result<Value, RuntimeError> {
        if let Some(value) = boolean_literal(&id.name) {
            return Ok(value);
        }
        self.scopes
            .get(&id.name)
            .cloned()
            .ok_or_else(|| undefined_variable(id))
    }

    /// Read through an index or selector chain. A chain rooted at a variable
    /// is walked in place rather than copying the variable's array. Reading
    /// from anything that is not an array yields the undefined value.
    fn read_entry(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        let mut keys = Vec::new();
        let root = self.resolve_read(expr, &mut keys)?;
        let base = match &root {
            ReadRoot::Variable(id) => self
                .scopes
                .get(&id.name)
                .ok_or_else(|| undefined_variable(id))?,
            ReadRoot::Value(value) => value,
        };
        let found = keys.iter().try_fold(base, |value, key| value.entry(key));
        Ok(found.cloned().unwrap_or_default())
    }

    /// Evaluates each object before its key, innermost first.
    fn resolve_read<'a>(
        &mut self,
        expr: &'a Expr,
        keys: &mut Vec<Value>,
    ) -> Result<ReadRoot<'a>, RuntimeError> {
        match expr {
            Expr::Index(i) => {
                let root = self.resolve_read(&i.object, keys)?;
                keys.push(self.evaluate_expr(&i.index)?);
                Ok(root)
            }
            Expr::Selector(s) => {
                let root = self.resolve_read(&s.object, keys)?;
                keys.push(Value::Str(s.field.name.clone()));
                Ok(root)
            }
            Expr::Identifier(id) if boolean_literal(&id.name).is_none() => {
                if self.scopes.lookup(&id.name).is_none() {
                    return Err(undefined_variable(id));
                }
                Ok(ReadRoot::Variable(id))
            }
            other => Ok(ReadRoot::Value(self.evaluate_expr(other)?)),
        }
    }

    /// Store `value` through an identifier, index or selector target. Keys
    /// are evaluated outermost first, after the right-hand side.
    fn assign(&mut self, target: &Expr, value: Value) -> Result<(), RuntimeError> {
        let mut keys = Vec::new();
        let root = self.resolve_place(target, &mut keys)?;

        let Some(((last, last_span), path)) = keys.split_last() else {
            self.scopes.bind(&root.name, value);
            return Ok(());
        };

        let mut slot = self
            .scopes
            .get_mut(&root.name)
            .ok_or_else(|| undefined_variable(root))?;
        for (key, span) in path {
            slot = match slot {
                Value::Array(array) => array
                    .get_mut(key)
                    .ok_or_else(|| not_indexable(ValueKind::Error, *span))?,
                other => return Err(not_indexable(other.kind(), *span)),
            };
        }
        match slot {
            Value::Array(array) => {
                array.set(last.clone(), value);
                Ok(())
            }
            other => Err(not_indexable(other.kind(), *last_span)),
        }
    }

    fn resolve_place<'a>(
        &mut self,
        target: &'a Expr,
        keys: &mut Vec<(Value, Span)>,
    ) -> Result<&'a IdentExpr, RuntimeError> {
        match target {
            Expr::Identifier(id) => Ok(id),
            Expr::Index(i) => {
                let root = self.resolve_place(&i.object, keys)?;
                let key = self.evaluate_expr(&i.index)?;
                keys.push((key, i.span));
                Ok(root)
            }
            Expr::Selector(s) => {
                let root = self.resolve_place(&s.object, keys)?;
                keys.push((Value::Str(s.field.name.clone()), s.span));
                Ok(root)
            }
            other => Err(RuntimeError::with_span(
                ErrorKind::InvalidAssignment,
                format!("cannot assign to {}", other.describe()),
                other.span(),
            )),
        }
    }
}

/// Where an index or selector chain starts.
enum ReadRoot<'a> {
    Variable(&'a IdentExpr),
    Value(Value),
}

/// `true` and `false` are plain identifiers that resolve before any scope.
fn boolean_literal(name: &str) -> Option<Value> {
    match name {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        _ => None,
    }
}

fn undefined_variable(id: &IdentExpr) -> RuntimeError {
    RuntimeError::with_span(
        ErrorKind::UndefinedVariable,
        format!("no identifier named {} exists", id.name),
        id.span,
    )
}

fn invalid_operator(op: &dyn std::fmt::Display, kind: ValueKind, span: Span) -> RuntimeError {
    RuntimeError::with_span(
        ErrorKind::InvalidOperator,
        format!("invalid operator {op} for {kind}"),
        span,
    )
}

fn not_indexable(kind: ValueKind, span: Span) -> RuntimeError {
    RuntimeError::with_span(
        ErrorKind::NotIndexable,
        format!("cannot index a value of kind {kind}"),
        span,
    )
}

fn arity_mismatch(expected: usize, got: usize, span: Span) -> RuntimeError {
    RuntimeError::with_span(
        ErrorKind::ArityMismatch,
        format!("expected {expected} arguments but got {got}"),
        span,
    )
}
