mod expr;
pub(crate) mod ops;
mod stmt;

use std::io::Write;
use std::rc::Rc;

use crate::prelude::*;
use crate::stack::ensure_sufficient_stack;

type InterpreterResult = Result<Object, RuntimeError>;
type ExecResult = Result<Completion, RuntimeError>;

/// How a statement finished.
///
/// Loops consume `Break` and `Continue`; function calls consume `Return`.
/// Anything else passes a non-`Normal` completion straight up.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Normal,
    Return(Object),
    Break,
    Continue,
}

impl Completion {
    pub fn keyword(&self) -> &'static str {
        match self {
            Completion::Normal => "normal",
            Completion::Return(_) => "return",
            Completion::Break => "break",
            Completion::Continue => "continue",
        }
    }
}

/// Tree-walking interpreter.
///
/// Single threaded: environments and composite values are reference counted
/// without locking, so an interpreter and its values stay on one thread.
pub struct Interpreter {
    pub globals: Shared<Environment>,
    environment: Shared<Environment>,
    output: Box<dyn Write>,
    config: Config,
    call_depth: usize,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let globals = Environment::new().as_shared();
        let environment = globals.clone();

        crate::native::define_globals(&mut globals.borrow_mut());

        Self { globals, environment, output: Box::new(std::io::stdout()), config, call_depth: 0 }
    }

    /// Redirect `print` output.
    pub fn with_output(self, output: impl Write + 'static) -> Self {
        Self { output: Box::new(output), ..self }
    }

    /// Writes `text` to the `print` sink as is.
    pub fn write_output(&mut self, text: &str) -> Result<(), RuntimeError> {
        self.output.write_all(text.as_bytes())?;
        Ok(())
    }
}

impl Interpreter {
    /// Runs top-level statements, stopping at the first runtime error.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        let result = self.execute_top_level(statements);
        self.output.flush()?;
        result
    }

    fn execute_top_level(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        for stmt in statements {
            tracing::debug!(?stmt, "executing top-level statement");
            let completion = self.execute(stmt)?;
            if completion != Completion::Normal {
                tracing::warn!(signal = completion.keyword(), "signal reached the top level");
                return Err(RuntimeError::unlocated(ErrorKind::ControlFlowEscape(
                    completion.keyword(),
                )));
            }
        }
        Ok(())
    }

    /// Calls `callee` with already evaluated arguments.
    ///
    /// This is the one entry point for every call, whether it comes from a
    /// call expression or from a builtin calling back into the script.
    pub fn call(
        &mut self,
        callee: &Rc<dyn Callable>,
        arguments: Vec<Object>,
        line: i32,
    ) -> InterpreterResult {
        if let Arity::Fixed(expected) = callee.arity() {
            if expected != arguments.len() {
                let kind = ErrorKind::ArityMismatch { expected, got: arguments.len() };
                return Err(RuntimeError::new(kind, line));
            }
        }

        if self.call_depth >= self.config.max_call_depth {
            return Err(RuntimeError::new(
                ErrorKind::StackOverflow(self.config.max_call_depth),
                line,
            ));
        }

        tracing::debug!(%callee, depth = self.call_depth, "call");
        self.call_depth += 1;
        let result = ensure_sufficient_stack(|| callee.call(self, arguments));
        self.call_depth -= 1;

        result.map_err(|e| e.or_at(line))
    }

    /// Executes `statements` with `environment` as the current scope, then
    /// restores the previous scope however the block finished.
    pub fn execute_block<I, R>(
        &mut self,
        statements: I,
        environment: Shared<Environment>,
    ) -> ExecResult
    where
        I: IntoIterator<Item = R>,
        R: AsRef<Stmt>,
    {
        let prev_env = std::mem::replace(&mut self.environment, environment);

        let mut result = Ok(Completion::Normal);
        for s in statements {
            result = self.execute(s.as_ref());
            if !matches!(result, Ok(Completion::Normal)) {
                break;
            }
        }

        self.environment = prev_env;
        result
    }
}
