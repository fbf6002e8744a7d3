#![allow(clippy::new_without_default)]

mod ast;
mod class;
mod config;
mod environment;
mod error;
mod func;
mod interpreter;
mod native;
mod object;
mod parser;
mod printer;
mod resolver;
mod scanner;
mod stack;
mod token;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::class::*;
    pub use crate::config::Config;
    pub use crate::environment::Environment;
    pub use crate::error::*;
    pub use crate::func::*;
    pub use crate::interpreter::{Completion, Interpreter};
    pub use crate::native::NativeFunction;
    pub use crate::object::*;
    pub use crate::parser::*;
    pub use crate::printer::AstPrinter;
    pub use crate::resolver::{Resolver, ResolverError};
    pub use crate::scanner::*;
    pub use crate::token::*;
    pub use crate::Shared;
}

use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::rc::Rc;

use prelude::*;

pub type Shared<T> = Rc<RefCell<T>>;

/// Why [`Lox::run`] gave up. Details have already been reported on stderr.
#[derive(Debug, thiserror::Error)]
pub enum LoxError {
    #[error("{0} compile error(s)")]
    Compile(usize),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Drives a source text through scanning, parsing, static checks and
/// execution against one long-lived interpreter.
pub struct Lox {
    interpreter: Interpreter,
    error_reporter: ErrorReporter,
    dump_ast: bool,
}

impl Lox {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            interpreter: Interpreter::with_config(config),
            error_reporter: ErrorReporter::default(),
            dump_ast: false,
        }
    }

    /// Send `print` output (and AST dumps) to `output` instead of stdout.
    pub fn with_output(self, output: impl Write + 'static) -> Self {
        Self { interpreter: self.interpreter.with_output(output), ..self }
    }

    pub fn with_ast_dump(self, dump_ast: bool) -> Self {
        Self { dump_ast, ..self }
    }

    pub fn had_error(&self) -> bool {
        self.error_reporter.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.error_reporter.had_runtime_error
    }
}

impl Lox {
    pub fn run_file(&mut self, filename: &str) -> Result<(), anyhow::Error> {
        let content = std::fs::read_to_string(filename)?;
        tracing::debug!(filename, bytes = content.len(), "running script");

        if let Err(e) = self.run(&content) {
            tracing::debug!(%e, "script failed");
        }
        Ok(())
    }

    /// Read-eval-print loop over stdin. Definitions survive across lines,
    /// errors are reported and the loop carries on.
    pub fn run_prompt(&mut self) -> Result<(), anyhow::Error> {
        let stdin = std::io::stdin();
        let mut line = String::new();

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            line.clear();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }

            if let Err(e) = self.run(&line) {
                tracing::debug!(%e, "line failed");
            }
            self.error_reporter.reset();
        }

        Ok(())
    }

    pub fn run(&mut self, input: &str) -> Result<(), LoxError> {
        let tokens = match Scanner::new(input).scan_tokens() {
            Ok(tokens) => tokens,
            Err(errors) => {
                self.print_scanner_errors(&errors);
                return Err(LoxError::Compile(errors.len()));
            }
        };

        let statements = match Parser::new(tokens).parse() {
            Ok(stmts) => stmts,
            Err(errors) => {
                self.print_parser_errors(&errors);
                return Err(LoxError::Compile(errors.len()));
            }
        };

        if let Err(errors) = Resolver::new().resolve(&statements) {
            for e in &errors {
                self.error_reporter.resolver_error(e);
            }
            return Err(LoxError::Compile(errors.len()));
        }

        if self.dump_ast {
            let ast = AstPrinter::print_program(&statements);
            self.interpreter.write_output(&ast)?;
        }

        self.interpreter.interpret(&statements).map_err(|e| {
            self.error_reporter.runtime_error(&e);
            LoxError::Runtime(e)
        })
    }

    fn print_scanner_errors(&mut self, errors: &[ScannerError]) {
        errors.iter().for_each(|e| self.error_reporter.error(e.line, &e.message));
    }

    fn print_parser_errors(&mut self, errors: &[ParserError]) {
        for e in errors {
            if e.token.token_type == TokenType::EOF {
                self.error_reporter.report(e.token.line, "at end", &e.message);
            } else {
                let location = format!("at '{}'", e.token.lexeme);
                self.error_reporter.report(e.token.line, &location, &e.message);
            }
        }
    }
}

/// Writes user-facing diagnostics to stderr and remembers what kind of
/// failure happened, so the binary can pick an exit code.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    pub had_error: bool,
    pub had_runtime_error: bool,
}

impl ErrorReporter {
    pub fn error(&mut self, line: i32, message: &str) {
        self.report(line, "", message);
    }

    pub fn report(&mut self, line: i32, location: &str, message: &str) {
        if location.is_empty() {
            eprintln!("[line {line}] Error: {message}");
        } else {
            eprintln!("[line {line}] Error {location}: {message}");
        }

        self.had_error = true;
    }

    pub fn runtime_error(&mut self, e: &RuntimeError) {
        eprintln!("{e}");
        self.had_runtime_error = true;
    }

    pub fn resolver_error(&mut self, e: &ResolverError) {
        eprintln!("{e}");
        self.had_error = true;
    }

    pub fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }
}
