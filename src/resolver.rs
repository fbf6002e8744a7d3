use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

use crate::prelude::*;
use crate::stack::ensure_sufficient_stack;

#[derive(Debug, Clone, PartialEq, Copy)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Debug, Clone, PartialEq, Copy)]
enum ClassType {
    None,
    Class,
    SubClass,
}

/// Static checks run over the whole program before it executes.
///
/// Variables are still looked up by name at runtime; the resolver only
/// rejects programs that could never run correctly: misplaced `return`,
/// `break`, `continue`, `this` and `super`, and a local read in its own
/// initializer.
pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionType,
    current_class: ClassType,
    loop_depth: usize,
    errors: Vec<ResolverError>,
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            scopes: vec![],
            current_function: FunctionType::None,
            current_class: ClassType::None,
            loop_depth: 0,
            errors: vec![],
        }
    }

    pub fn resolve<I, R>(mut self, statements: I) -> Result<(), Vec<ResolverError>>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<Stmt>,
    {
        self.resolve_stmts(statements);

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

impl Resolver {
    fn visit_stmt(&mut self, input: &Stmt) {
        match input {
            Stmt::Block { statements } => {
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope();
            }
            Stmt::Var { name, initializer } => {
                // We use a 3 step process, so users can't use the same variable in
                // variable definition: declare -> initialize -> define
                self.declare(name);
                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer);
                }
                self.define(name);
            }
            Stmt::Class { name, methods, superclass } => {
                let enclosing_class = self.current_class;
                self.current_class = ClassType::Class;

                self.declare(name);
                self.define(name);

                if let Some(superclass) = superclass {
                    // Make sure super class has a different name!
                    if let Expr::Variable { name: super_name } = superclass {
                        if super_name.lexeme == name.lexeme {
                            self.error(super_name, "A class can't inherit from itself.");
                        }
                    }

                    self.current_class = ClassType::SubClass;
                    self.resolve_expr(superclass);
                }

                for method in methods {
                    let func_type = if method.name() == Some("init") {
                        FunctionType::Initializer
                    } else {
                        FunctionType::Method
                    };

                    self.resolve_function(method, func_type);
                }

                self.current_class = enclosing_class;
            }
            Stmt::Function { declaration } => {
                // Unlike variables, we declare and define functions before processing
                // their body. This way, functions can recursively call themselves.
                if let Some(name) = &declaration.name {
                    self.declare(name);
                    self.define(name);
                }

                self.resolve_function(declaration, FunctionType::Function);
            }
            Stmt::Expression { expr } => self.resolve_expr(expr),
            Stmt::If { condition, then_branch, else_branch } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(stmt) = else_branch {
                    self.resolve_stmt(stmt);
                }
            }
            Stmt::Print { expr, .. } => self.resolve_expr(expr),
            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }

                if let Some(expr) = value {
                    // Cannot return anything from "init" function
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Can't return a value from an initializer.");
                    }
                    self.resolve_expr(expr);
                }
            }
            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_loop_body(body);
            }
            Stmt::For { initializer, condition, increment, body } => {
                self.begin_scope();
                if let Some(initializer) = initializer {
                    self.resolve_stmt(initializer);
                }
                if let Some(condition) = condition {
                    self.resolve_expr(condition);
                }
                if let Some(increment) = increment {
                    self.resolve_expr(increment);
                }
                self.resolve_loop_body(body);
                self.end_scope();
            }
            Stmt::ForIn { variable, iterable, body } => {
                self.resolve_expr(iterable);
                self.begin_scope();
                self.declare(variable);
                self.define(variable);
                self.resolve_loop_body(body);
                self.end_scope();
            }
            Stmt::Break { token } => {
                if self.loop_depth == 0 {
                    self.error(token, "Can't use 'break' outside of a loop.");
                }
            }
            Stmt::Continue { token } => {
                if self.loop_depth == 0 {
                    self.error(token, "Can't use 'continue' outside of a loop.");
                }
            }
        }
    }

    fn visit_expr(&mut self, input: &Expr) {
        match input {
            Expr::Variable { name } => {
                if let Some(false) = self.scopes.last().and_then(|s| s.get(&name.lexeme)) {
                    self.error(name, "Can't read local variable in its own initializer.");
                }
            }
            Expr::Assignment { value, .. } => self.resolve_expr(value),
            Expr::Super { keyword, .. } => match self.current_class {
                ClassType::None => self.error(keyword, "Can't use 'super' outside of a class."),
                ClassType::Class => {
                    self.error(keyword, "Can't use 'super' in a class with no superclass.")
                }
                ClassType::SubClass => {}
            },
            Expr::This { keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'this' outside of a class.");
                }
            }
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Call { callee, arguments, .. } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }
            Expr::Get { object, .. } => self.resolve_expr(object),
            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }
            Expr::Index { object, index, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(index);
            }
            Expr::IndexSet { object, index, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(index);
                self.resolve_expr(value);
            }
            Expr::List { elements, .. } => {
                for element in elements {
                    self.resolve_expr(element);
                }
            }
            Expr::Dict { entries, .. } => {
                for (key, value) in entries {
                    self.resolve_expr(key);
                    self.resolve_expr(value);
                }
            }
            Expr::Lambda { declaration } => {
                self.resolve_function(declaration, FunctionType::Function)
            }
            Expr::Grouping { expr } => self.resolve_expr(expr),
            Expr::Unary { right, .. } => self.resolve_expr(right),
            Expr::Literal { .. } => {}
        }
    }
}

impl Resolver {
    fn resolve_stmts<I, R>(&mut self, statements: I)
    where
        I: IntoIterator<Item = R>,
        R: AsRef<Stmt>,
    {
        for stmt in statements {
            self.resolve_stmt(stmt.as_ref());
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        ensure_sufficient_stack(|| self.visit_stmt(stmt))
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        ensure_sufficient_stack(|| self.visit_expr(expr))
    }

    fn resolve_loop_body(&mut self, body: &Stmt) {
        self.loop_depth += 1;
        self.resolve_stmt(body);
        self.loop_depth -= 1;
    }

    fn resolve_function(&mut self, declaration: &FunctionDecl, func_type: FunctionType) {
        let enclosing_func = self.current_function;
        // `break` can't reach a loop outside the function.
        let enclosing_loop_depth = std::mem::take(&mut self.loop_depth);
        self.current_function = func_type;

        self.begin_scope();
        for param in &declaration.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&declaration.body);
        self.end_scope();

        self.current_function = enclosing_func;
        self.loop_depth = enclosing_loop_depth;
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Redeclaring a name in the same scope is allowed; it just rebinds.
    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn error(&mut self, token: &Token, msg: &str) {
        tracing::debug!(line = token.line, msg, "resolver error");
        self.errors.push(ResolverError { token: token.clone(), msg: msg.to_owned() });
    }
}

#[derive(Debug)]
pub struct ResolverError {
    pub token: Token,
    pub msg: String,
}

impl Display for ResolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[line {}] Error at '{}': {}", self.token.line, self.token.lexeme, self.msg)
    }
}

impl Error for ResolverError {}
