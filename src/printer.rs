use crate::prelude::*;
use crate::stack::ensure_sufficient_stack;

/// Renders the AST as parenthesized prefix notation, one top-level
/// statement per line.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print_program(statements: &[Stmt]) -> String {
        statements.iter().map(|s| Self::stmt_to_string(s) + "\n").collect()
    }

    pub fn stmt_to_string(stmt: &Stmt) -> String {
        ensure_sufficient_stack(|| Self::render_stmt(stmt))
    }

    pub fn to_string(expr: &Expr) -> String {
        ensure_sufficient_stack(|| Self::render_expr(expr))
    }

    fn render_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Break { .. } => "(break)".to_owned(),
            Stmt::Continue { .. } => "(continue)".to_owned(),
            Stmt::Return { value: Some(value), .. } => {
                format!("(return {})", Self::to_string(value))
            }
            Stmt::Return { value: None, .. } => "(return)".to_owned(),
            Stmt::Class { name, methods, superclass } => {
                let mut out = format!("(class {name}");
                if let Some(superclass) = superclass {
                    out += &format!(" < {}", Self::to_string(superclass));
                }
                for method in methods {
                    out += " ";
                    out += &Self::function_to_string("method", method);
                }
                out + ")"
            }
            Stmt::Print { expr, .. } => format!("(print {})", Self::to_string(expr)),
            Stmt::Expression { expr } => format!("(; {})", Self::to_string(expr)),
            Stmt::Var { name, initializer: Some(init) } => {
                format!("(var {name} {})", Self::to_string(init))
            }
            Stmt::Var { name, initializer: None } => format!("(var {name})"),
            Stmt::Block { statements } => Self::block_to_string(statements),
            Stmt::Function { declaration } => Self::function_to_string("fun", declaration),
            Stmt::If { condition, then_branch, else_branch } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    Self::to_string(condition),
                    Self::stmt_to_string(then_branch),
                    Self::stmt_to_string(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    Self::to_string(condition),
                    Self::stmt_to_string(then_branch)
                ),
            },
            Stmt::While { condition, body } => {
                format!("(while {} {})", Self::to_string(condition), Self::stmt_to_string(body))
            }
            Stmt::For { initializer, condition, increment, body } => {
                let initializer =
                    initializer.as_ref().map_or("_".to_owned(), |s| Self::stmt_to_string(s));
                let condition = condition.as_ref().map_or("_".to_owned(), Self::to_string);
                let increment = increment.as_ref().map_or("_".to_owned(), Self::to_string);
                let body = Self::stmt_to_string(body);
                format!("(for {initializer} {condition} {increment} {body})")
            }
            Stmt::ForIn { variable, iterable, body } => format!(
                "(for-in {variable} {} {})",
                Self::to_string(iterable),
                Self::stmt_to_string(body)
            ),
        }
    }

    fn render_expr(expr: &Expr) -> String {
        match expr {
            Expr::Binary { left, operator, right } | Expr::Logical { left, operator, right } => {
                format!(
                    "({} {} {})",
                    operator.lexeme,
                    Self::to_string(left),
                    Self::to_string(right)
                )
            }
            Expr::Grouping { expr } => format!("(group {})", Self::to_string(expr)),
            Expr::Literal { value } => value.repr(),
            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::to_string(right))
            }
            Expr::Variable { name } => format!("{name}"),
            Expr::Assignment { name, value } => format!("(= {name} {})", Self::to_string(value)),
            Expr::Call { callee, arguments, .. } => {
                format!("(call {}{})", Self::to_string(callee), Self::list_to_string(arguments))
            }
            Expr::This { keyword } => format!("{keyword}"),
            Expr::Get { object, name } => format!("(. {} {name})", Self::to_string(object)),
            Expr::Set { object, name, value } => {
                format!("(=. {} {name} {})", Self::to_string(object), Self::to_string(value))
            }
            Expr::Index { object, index, .. } => {
                format!("([] {} {})", Self::to_string(object), Self::to_string(index))
            }
            Expr::IndexSet { object, index, value, .. } => format!(
                "(=[] {} {} {})",
                Self::to_string(object),
                Self::to_string(index),
                Self::to_string(value)
            ),
            Expr::Super { keyword, method } => format!("(. {keyword} {method})"),
            Expr::List { elements, .. } => format!("(list{})", Self::list_to_string(elements)),
            Expr::Dict { entries, .. } => {
                let entries: String = entries
                    .iter()
                    .map(|(k, v)| format!(" (: {} {})", Self::to_string(k), Self::to_string(v)))
                    .collect();
                format!("(dict{entries})")
            }
            Expr::Lambda { declaration } => Self::function_to_string("fun", declaration),
        }
    }

    fn list_to_string(exprs: &[Expr]) -> String {
        exprs.iter().map(|e| format!(" {}", Self::to_string(e))).collect()
    }

    fn block_to_string(statements: &[Stmt]) -> String {
        let body: String =
            statements.iter().map(|s| format!(" {}", Self::stmt_to_string(s))).collect();
        format!("(block{body})")
    }

    fn function_to_string(kind: &str, declaration: &FunctionDecl) -> String {
        let params: Vec<_> = declaration.params.iter().map(|p| p.lexeme.as_str()).collect();
        let name = declaration.name().map(|n| format!(" {n}")).unwrap_or_default();
        let body = Self::block_to_string(&declaration.body);
        format!("({kind}{name} ({}) {body})", params.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    #[test]
    fn print_an_ast() {
        // This is '-123 * (45.67)'
        let expr = Expr::Binary {
            left: Box::new(Expr::Unary {
                operator: Token::new(TokenType::Minus, "-", None, 1),
                right: Box::new(Expr::int_literal(123)),
            }),
            operator: Token::new(TokenType::Star, "*", None, 1),
            right: Box::new(Expr::Grouping { expr: Box::new(Expr::float_literal(45.67)) }),
        };

        let res = AstPrinter::to_string(&expr);
        assert_eq!(res, "(* (- 123) (group 45.67))".to_owned());
    }

    #[test]
    fn strings_keep_their_quotes() {
        let expr = Expr::List {
            bracket: Token::new(TokenType::LeftBracket, "[", None, 1),
            elements: vec![Expr::str_literal("a"), Expr::float_literal(2.0)],
        };
        assert_eq!(AstPrinter::to_string(&expr), "(list \"a\" 2.0)");
    }

    #[test]
    fn deep_nesting() {
        let source = format!("print {}1{};", "(".repeat(300), ")".repeat(300));
        let tokens = Scanner::new(&source).scan_tokens().unwrap();
        let statements = Parser::new(tokens).parse().unwrap();
        let expected = format!("(print {}1{})\n", "(group ".repeat(300), ")".repeat(300));
        assert_eq!(AstPrinter::print_program(&statements), expected);
    }

    #[test]
    fn print_a_program() {
        let source = "fun f(a, b) { return a; }\nfor (;;) break;";
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        let statements = Parser::new(tokens).parse().unwrap();
        assert_eq!(
            AstPrinter::print_program(&statements),
            "(fun f (a b) (block (return a)))\n(for _ _ _ (break))\n"
        );
    }
}
