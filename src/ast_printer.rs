use crate::ast::{Expr, FunctionDecl, LiteralValue};

/// Renders an expression in parenthesized prefix form, e.g.
/// `(* (- 123.0) (group 45.67))`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Null => "null".into(),

                LiteralValue::Str(s) => s.clone(),

                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        // 3 → 3.0
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "(?: {} {} {})",
                Self::print(condition),
                Self::print(then_branch),
                Self::print(else_branch)
            ),

            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            Expr::Suffix { name, operator, .. } => {
                format!("(post{} {})", operator.lexeme, name.lexeme)
            }

            Expr::Call {
                callee, arguments, ..
            } => Self::parenthesize(&format!("call {}", Self::print(callee)), arguments),

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::Update {
                object,
                name,
                operator,
                value,
            } => format!(
                "({}= (. {} {}) {})",
                operator.lexeme,
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::Subscript { object, index, .. } => {
                format!("([] {} {})", Self::print(object), Self::print(index))
            }

            Expr::This { .. } => "this".into(),

            Expr::Lambda(declaration) => Self::lambda(declaration),
        }
    }

    fn parenthesize(head: &str, exprs: &[Expr]) -> String {
        let mut s = format!("({}", head);
        for expr in exprs {
            s.push(' ');
            s.push_str(&Self::print(expr));
        }
        s.push(')');
        s
    }

    fn lambda(declaration: &FunctionDecl) -> String {
        let params: Vec<&str> = declaration
            .params
            .iter()
            .map(|p| p.lexeme.as_str())
            .collect();

        format!(
            "(fun ({}) <{} statements>)",
            params.join(" "),
            declaration.body.len()
        )
    }
}
