use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crate::prelude::*;
use crate::stack::ensure_sufficient_stack;

use super::ExecResult;

impl Interpreter {
    pub fn execute(&mut self, stmt: &Stmt) -> ExecResult {
        ensure_sufficient_stack(|| self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        match stmt {
            Stmt::Expression { expr } => {
                self.evaluate_expr(expr)?;
            }
            Stmt::Class { name, methods, superclass } => {
                self.handle_class_stmt(name, methods, superclass.as_ref())?
            }
            Stmt::Function { declaration } => {
                // self.environment is the current active environment when function
                // is being declared, NOT when it's being called!
                // In other words, this is the enclosing environment in which the function is
                // declared. For inner functions, it refers to their parent function's
                // environment.
                let env = self.environment.clone();
                let function = LoxFunction::new(declaration.clone(), env, false);
                let name = declaration.name().unwrap_or_default();
                self.environment.borrow_mut().define(name, Object::Callable(Rc::new(function)));
            }
            Stmt::Break { .. } => return Ok(Completion::Break),
            Stmt::Continue { .. } => return Ok(Completion::Continue),
            Stmt::Return { value, .. } => {
                let value =
                    if let Some(expr) = value { self.evaluate_expr(expr)? } else { Object::Null };

                return Ok(Completion::Return(value));
            }
            Stmt::Print { keyword, expr } => {
                let value = self.evaluate_expr(expr)?;
                writeln!(self.output, "{value}")
                    .map_err(|e| RuntimeError::from(e).or_at(keyword.line))?;
            }
            Stmt::Var { name, initializer } => {
                let value = if let Some(expr) = initializer {
                    self.evaluate_expr(expr)?
                } else {
                    Object::Null
                };

                self.environment.borrow_mut().define(&name.lexeme, value);
            }
            Stmt::Block { statements } => {
                // Create a new environment for executing the block
                let new_env =
                    Environment::new().with_enclosing(self.environment.clone()).as_shared();

                return self.execute_block(statements, new_env);
            }
            Stmt::If { condition, then_branch, else_branch } => {
                let condition_result = self.evaluate_expr(condition)?;

                if condition_result.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(stmt) = else_branch {
                    return self.execute(stmt);
                }
            }
            Stmt::While { condition, body } => return self.handle_while_stmt(condition, body),
            Stmt::For { initializer, condition, increment, body } => {
                // The initializer gets one scope for the whole loop; closures created
                // in the body share the loop variable.
                let loop_env =
                    Environment::new().with_enclosing(self.environment.clone()).as_shared();
                let prev_env = std::mem::replace(&mut self.environment, loop_env);

                let result = self.handle_for_stmt(
                    initializer.as_deref(),
                    condition.as_ref(),
                    increment.as_ref(),
                    body,
                );

                self.environment = prev_env;
                return result;
            }
            Stmt::ForIn { variable, iterable, body } => {
                return self.handle_for_in_stmt(variable, iterable, body)
            }
        };
        Ok(Completion::Normal)
    }

    fn handle_class_stmt(
        &mut self,
        name: &Token,
        methods: &[Rc<FunctionDecl>],
        superclass: Option<&Expr>,
    ) -> Result<(), RuntimeError> {
        let superclass = match superclass {
            Some(expr) => match self.evaluate_expr(expr)? {
                Object::Class(c) => Some(c),
                other => {
                    return Err(RuntimeError::type_mismatch(
                        name.line,
                        format!("Superclass must be a class; got {}.", other.type_name()),
                    ))
                }
            },
            None => None,
        };

        self.environment.borrow_mut().define(&name.lexeme, Object::Null);

        // Methods of a subclass close over a scope that holds `super`.
        let method_env = match superclass {
            Some(ref superclass) => {
                let env = Environment::new().with_enclosing(self.environment.clone()).as_shared();
                env.borrow_mut().define("super", Object::Class(superclass.clone()));
                env
            }
            None => self.environment.clone(),
        };

        let method_funcs: HashMap<_, _> = methods
            .iter()
            .map(|method| {
                let method_name = method.name().unwrap_or_default();
                let is_initializer = method_name == "init";
                let function = LoxFunction::new(method.clone(), method_env.clone(), is_initializer);
                (method_name.to_owned(), Rc::new(function))
            })
            .collect();

        let class = Class::new(&name.lexeme, method_funcs, superclass);
        self.environment.borrow_mut().assign(name, Object::Class(class))
    }

    fn handle_while_stmt(&mut self, condition: &Expr, body: &Stmt) -> ExecResult {
        loop {
            let value = self.evaluate_expr(condition)?;
            if !value.is_truthy() {
                break;
            }

            match self.execute(body)? {
                Completion::Normal | Completion::Continue => {}
                Completion::Break => break,
                ret @ Completion::Return(_) => return Ok(ret),
            }
        }

        Ok(Completion::Normal)
    }

    fn handle_for_stmt(
        &mut self,
        initializer: Option<&Stmt>,
        condition: Option<&Expr>,
        increment: Option<&Expr>,
        body: &Stmt,
    ) -> ExecResult {
        if let Some(initializer) = initializer {
            self.execute(initializer)?;
        }

        loop {
            if let Some(condition) = condition {
                if !self.evaluate_expr(condition)?.is_truthy() {
                    break;
                }
            }

            match self.execute(body)? {
                // `continue` still runs the increment.
                Completion::Normal | Completion::Continue => {}
                Completion::Break => break,
                ret @ Completion::Return(_) => return Ok(ret),
            }

            if let Some(increment) = increment {
                self.evaluate_expr(increment)?;
            }
        }

        Ok(Completion::Normal)
    }

    fn handle_for_in_stmt(&mut self, variable: &Token, iterable: &Expr, body: &Stmt) -> ExecResult {
        let collection = self.evaluate_expr(iterable)?;
        let items = collection.iterate().ok_or_else(|| {
            RuntimeError::type_mismatch(
                variable.line,
                format!(
                    "Can only iterate over lists, dicts and strings; got {}.",
                    collection.type_name()
                ),
            )
        })?;

        for item in items {
            // Each iteration binds the loop variable in a fresh scope.
            let iteration_env =
                Environment::new().with_enclosing(self.environment.clone()).as_shared();
            iteration_env.borrow_mut().define(&variable.lexeme, item);

            match self.execute_block(std::iter::once(body), iteration_env)? {
                Completion::Normal | Completion::Continue => {}
                Completion::Break => break,
                ret @ Completion::Return(_) => return Ok(ret),
            }
        }

        Ok(Completion::Normal)
    }
}
