use std::fmt::{self, Display, Formatter};

use crate::ast::*;

/// One S-expression per top-level statement, each on its own line.
pub fn to_sexp(program: &Program) -> String {
    program
        .statements
        .iter()
        .map(|stmt| format!("{}\n", Sexp(stmt)))
        .collect()
}

pub fn to_json(program: &Program) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(program)
}

/// Renders the wrapped node in S-expression form.
struct Sexp<'a, T>(&'a T);

/// Writes `(head item item ...)`.
fn list<'a, T: 'a>(
    f: &mut Formatter<'_>,
    head: &str,
    items: impl IntoIterator<Item = &'a T>,
) -> fmt::Result
where
    Sexp<'a, T>: Display,
{
    write!(f, "({head}")?;
    for item in items {
        write!(f, " {}", Sexp(item))?;
    }
    write!(f, ")")
}

impl Display for Sexp<'_, BlockStmt> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        list(f, "block", &self.0.statements)
    }
}

impl Display for Sexp<'_, Stmt> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Stmt::Assign(a) => write!(f, "(= {} {})", Sexp(&a.target), Sexp(&a.value)),
            Stmt::Block(b) => Sexp(b).fmt(f),
            Stmt::If(i) => {
                write!(f, "(if {} {}", Sexp(&i.condition), Sexp(&i.then_branch))?;
                if let Some(else_branch) = &i.else_branch {
                    write!(f, " {}", Sexp(else_branch.as_ref()))?;
                }
                write!(f, ")")
            }
            Stmt::Empty(_) => write!(f, "(empty)"),
            Stmt::Expression(e) => Sexp(&e.expression).fmt(f),
            Stmt::While(w) => write!(f, "(while {} {})", Sexp(&w.condition), Sexp(&w.body)),
            Stmt::Return(r) => match &r.value {
                Some(value) => write!(f, "(return {})", Sexp(value)),
                None => write!(f, "(return)"),
            },
        }
    }
}

impl Display for Sexp<'_, ArrayElement> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            ArrayElement::Positional(e) => Sexp(e).fmt(f),
            ArrayElement::Pair(kv) => write!(f, "(: {} {})", Sexp(&kv.key), Sexp(&kv.value)),
        }
    }
}

impl Display for Sexp<'_, Expr> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Expr::Array(a) => list(f, "array", &a.elements),
            Expr::Number(n) => write!(f, "{}", n.value),
            Expr::Str(s) => write!(f, "\"{}\"", s.value),
            Expr::Function(func) => {
                let params: Vec<&str> = func.params.iter().map(|p| p.name.as_str()).collect();
                write!(f, "(func ({}) {})", params.join(" "), Sexp(&func.body))
            }
            Expr::Identifier(id) => write!(f, "{}", id.name),
            Expr::Unary(u) => write!(f, "({} {})", u.operator, Sexp(u.operand.as_ref())),
            Expr::Binary(b) => write!(
                f,
                "({} {} {})",
                b.operator,
                Sexp(b.left.as_ref()),
                Sexp(b.right.as_ref())
            ),
            Expr::Index(i) => write!(
                f,
                "(index {} {})",
                Sexp(i.object.as_ref()),
                Sexp(i.index.as_ref())
            ),
            Expr::Selector(s) => write!(f, "(. {} {})", Sexp(s.object.as_ref()), s.field.name),
            Expr::Paren(p) => write!(f, "(paren {})", Sexp(p.expression.as_ref())),
            Expr::Call(c) => {
                write!(f, "(call {}", Sexp(c.callee.as_ref()))?;
                for arg in &c.arguments {
                    write!(f, " {}", Sexp(arg))?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::token::Span;

    fn number(value: i64, offset: usize) -> Expr {
        Expr::Number(NumberExpr {
            value,
            span: Span::new(offset, 1),
        })
    }

    #[test]
    fn nested_binary_keeps_grouping() {
        let program = Program {
            name: "test".to_string(),
            statements: vec![Stmt::Expression(ExprStmt {
                expression: Expr::Binary(BinaryExpr {
                    left: Box::new(number(1, 0)),
                    operator: BinaryOp::Add,
                    right: Box::new(Expr::Binary(BinaryExpr {
                        left: Box::new(number(2, 4)),
                        operator: BinaryOp::Multiply,
                        right: Box::new(number(3, 8)),
                        span: Span::new(4, 5),
                    })),
                    span: Span::new(0, 9),
                }),
                span: Span::new(0, 10),
            })],
        };
        assert_eq!(to_sexp(&program).trim(), "(+ 1 (* 2 3))");
    }

    #[test]
    fn sexp_array_with_pair() {
        let program = Program {
            name: "test".to_string(),
            statements: vec![Stmt::Expression(ExprStmt {
                expression: Expr::Array(ArrayExpr {
                    elements: vec![
                        ArrayElement::Positional(number(10, 1)),
                        ArrayElement::Pair(KeyValueExpr {
                            key: number(5, 4),
                            value: number(9, 6),
                            span: Span::new(4, 3),
                        }),
                    ],
                    span: Span::new(0, 8),
                }),
                span: Span::new(0, 8),
            })],
        };
        assert_eq!(to_sexp(&program).trim(), "(array 10 (: 5 9))");
    }

    #[test]
    fn json_tags_statement_types() {
        let program = Program {
            name: "test".to_string(),
            statements: vec![Stmt::Assign(AssignStmt {
                target: Expr::Identifier(IdentExpr {
                    name: "x".to_string(),
                    span: Span::new(0, 1),
                }),
                value: number(4, 4),
                span: Span::new(0, 6),
            })],
        };
        let json = to_json(&program).expect("AST should be serializable");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
        assert_eq!(parsed["statements"][0]["type"], "Assign");
        assert_eq!(parsed["statements"][0]["target"]["name"], "x");
    }
}
