use std::rc::Rc;

use crate::prelude::*;
use crate::stack::ensure_sufficient_stack;

const MAX_ARGUMENTS: usize = 255;

/// Deepest nesting of statements and expressions the parser accepts.
const MAX_NESTING: usize = 1000;

#[derive(Debug)]
pub struct ParserError {
    pub token: Token,
    pub message: String,
}

impl ParserError {
    fn new(token: Token, message: impl Into<String>) -> Self {
        Self { token, message: message.into() }
    }
}

type ParseResult<T> = Result<T, ParserError>;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
    errors: Vec<ParserError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0, depth: 0, errors: vec![] }
    }

    /// Parses the whole token stream. On failure every error found is
    /// returned, not just the first one.
    pub fn parse(mut self) -> Result<Vec<Stmt>, Vec<ParserError>> {
        let mut statements = vec![];
        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
        }

        if self.errors.is_empty() {
            Ok(statements)
        } else {
            Err(self.errors)
        }
    }

    fn declaration(&mut self) -> ParseResult<Stmt> {
        if self.match_tt(&[TokenType::Var]) {
            self.var_declaration()
        } else if self.check(TokenType::Fun) && self.check_next(TokenType::Identifier) {
            self.advance();
            let declaration = self.function("function")?;
            Ok(Stmt::Function { declaration })
        } else if self.match_tt(&[TokenType::Class]) {
            self.class_declaration()
        } else {
            self.statement()
        }
    }

    fn class_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenType::Identifier, "Expect class name.")?;

        let superclass = if self.match_tt(&[TokenType::Less]) {
            let name = self.consume(TokenType::Identifier, "Expect superclass name.")?;
            Some(Expr::Variable { name })
        } else {
            None
        };

        self.consume(TokenType::LeftBrace, "Expect '{' before class body.")?;

        let mut methods = vec![];
        while !self.check(TokenType::RightBrace) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(TokenType::RightBrace, "Expect '}' after class body.")?;
        Ok(Stmt::Class { name, methods, superclass })
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenType::Identifier, "Expect variable name.")?;

        let initializer =
            if self.match_tt(&[TokenType::Equal]) { Some(self.expression()?) } else { None };

        self.consume(TokenType::Semicolon, "Expect ';' after variable declaration.")?;

        Ok(Stmt::Var { name, initializer })
    }

    fn function(&mut self, kind: &str) -> ParseResult<Rc<FunctionDecl>> {
        let name = self.consume(TokenType::Identifier, &format!("Expect {kind} name."))?;
        self.consume(TokenType::LeftParen, &format!("Expect '(' after {kind} name."))?;
        self.function_body(Some(name), kind)
    }

    /// Parameter list and body; the opening `(` is already consumed.
    fn function_body(
        &mut self,
        name: Option<Token>,
        kind: &str,
    ) -> ParseResult<Rc<FunctionDecl>> {
        let mut params = vec![];
        if !self.check(TokenType::RightParen) {
            loop {
                if params.len() >= MAX_ARGUMENTS {
                    // Reported, but parsing carries on.
                    let token = self.peek().clone();
                    let error = ParserError::new(token, "Can't have more than 255 parameters.");
                    self.errors.push(error);
                }

                params.push(self.consume(TokenType::Identifier, "Expect parameter name.")?);
                if !self.match_tt(&[TokenType::Comma]) {
                    break;
                }
            }
        }

        self.consume(TokenType::RightParen, "Expect ')' after parameters.")?;
        self.consume(TokenType::LeftBrace, &format!("Expect '{{' before {kind} body."))?;

        let body = self.block()?;
        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        self.nested(Self::any_statement)
    }

    fn any_statement(&mut self) -> ParseResult<Stmt> {
        if self.match_tt(&[TokenType::If]) {
            self.if_statement()
        } else if self.match_tt(&[TokenType::While]) {
            self.while_statement()
        } else if self.match_tt(&[TokenType::Return]) {
            self.return_statement()
        } else if self.match_tt(&[TokenType::For]) {
            self.for_statement()
        } else if self.match_tt(&[TokenType::Print]) {
            self.print_statement()
        } else if self.match_tt(&[TokenType::Break]) {
            let token = self.previous();
            self.consume(TokenType::Semicolon, "Expect ';' after 'break'.")?;
            Ok(Stmt::Break { token })
        } else if self.match_tt(&[TokenType::Continue]) {
            let token = self.previous();
            self.consume(TokenType::Semicolon, "Expect ';' after 'continue'.")?;
            Ok(Stmt::Continue { token })
        } else if self.match_tt(&[TokenType::LeftBrace]) {
            Ok(Stmt::Block { statements: self.block()? })
        } else {
            self.expression_statement()
        }
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenType::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_tt(&[TokenType::Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If { condition, then_branch, else_branch })
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous();
        let value =
            if !self.check(TokenType::Semicolon) { Some(self.expression()?) } else { None };

        self.consume(TokenType::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenType::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expect ')' after condition.")?;

        let body = Box::new(self.statement()?);
        Ok(Stmt::While { condition, body })
    }

    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenType::LeftParen, "Expect '(' after 'for'.")?;

        if self.check(TokenType::Var)
            && self.check_next(TokenType::Identifier)
            && self.check_at(2, TokenType::In)
        {
            return self.for_in_statement();
        }

        let initializer = if self.match_tt(&[TokenType::Semicolon]) {
            None
        } else if self.match_tt(&[TokenType::Var]) {
            Some(Box::new(self.var_declaration()?))
        } else {
            Some(Box::new(self.expression_statement()?))
        };

        let condition =
            if !self.check(TokenType::Semicolon) { Some(self.expression()?) } else { None };
        self.consume(TokenType::Semicolon, "Expect ';' after loop condition.")?;

        let increment =
            if !self.check(TokenType::RightParen) { Some(self.expression()?) } else { None };
        self.consume(TokenType::RightParen, "Expect ')' after for clauses.")?;

        let body = Box::new(self.statement()?);
        Ok(Stmt::For { initializer, condition, increment, body })
    }

    fn for_in_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenType::Var, "Expect 'var' in for-in loop.")?;
        let variable = self.consume(TokenType::Identifier, "Expect loop variable name.")?;
        self.consume(TokenType::In, "Expect 'in' after loop variable.")?;
        let iterable = self.expression()?;
        self.consume(TokenType::RightParen, "Expect ')' after iterable.")?;

        let body = Box::new(self.statement()?);
        Ok(Stmt::ForIn { variable, iterable, body })
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous();
        let expr = self.expression()?;
        self.consume(TokenType::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print { keyword, expr })
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = vec![];

        while !self.check(TokenType::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        self.consume(TokenType::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenType::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression { expr })
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.nested(Self::assignment)
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.or()?;

        if self.match_tt(&[TokenType::Equal]) {
            let equals = self.previous();
            let value = Box::new(self.expression()?);

            return match expr {
                Expr::Variable { name } => Ok(Expr::Assignment { name, value }),
                Expr::Get { object, name } => Ok(Expr::Set { object, name, value }),
                Expr::Index { object, bracket, index } => {
                    Ok(Expr::IndexSet { object, bracket, index, value })
                }
                _ => {
                    // Not worth synchronizing over: keep the left-hand side.
                    self.errors.push(ParserError::new(equals, "Invalid assignment target."));
                    Ok(expr)
                }
            };
        }

        Ok(expr)
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;

        while self.match_tt(&[TokenType::Or]) {
            let operator = self.previous();
            let right = self.and()?;
            expr = Expr::Logical { left: Box::new(expr), operator, right: Box::new(right) };
        }

        Ok(expr)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;

        while self.match_tt(&[TokenType::And]) {
            let operator = self.previous();
            let right = self.equality()?;
            expr = Expr::Logical { left: Box::new(expr), operator, right: Box::new(right) };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        self.binary(&[TokenType::BangEqual, TokenType::EqualEqual], Self::comparison)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        self.binary(
            &[TokenType::GreaterEqual, TokenType::Greater, TokenType::LessEqual, TokenType::Less],
            Self::term,
        )
    }

    fn term(&mut self) -> ParseResult<Expr> {
        self.binary(&[TokenType::Minus, TokenType::Plus], Self::factor)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        self.binary(&[TokenType::Slash, TokenType::Star, TokenType::Percent], Self::unary)
    }

    /// A left-associative chain of `operand (operator operand)*`.
    fn binary(
        &mut self,
        operators: &[TokenType],
        operand: fn(&mut Self) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        let mut expr = operand(self)?;

        while self.match_tt(operators) {
            let operator = self.previous();
            let right = operand(self)?;
            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.match_tt(&[TokenType::Bang, TokenType::Minus]) {
            let operator = self.previous();
            let right = self.nested(Self::unary)?;
            return Ok(Expr::Unary { operator, right: Box::new(right) });
        }

        self.call()
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.match_tt(&[TokenType::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else if self.match_tt(&[TokenType::Dot]) {
                let name =
                    self.consume(TokenType::Identifier, "Expect property name after '.'.")?;
                expr = Expr::Get { object: Box::new(expr), name };
            } else if self.match_tt(&[TokenType::LeftBracket]) {
                let bracket = self.previous();
                let index = self.expression()?;
                self.consume(TokenType::RightBracket, "Expect ']' after index.")?;
                expr = Expr::Index { object: Box::new(expr), bracket, index: Box::new(index) };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments = vec![];

        if !self.check(TokenType::RightParen) {
            loop {
                if arguments.len() >= MAX_ARGUMENTS {
                    // Just report the error, keep parsing
                    let token = self.peek().clone();
                    let error = ParserError::new(token, "Can't have more than 255 arguments.");
                    self.errors.push(error);
                }

                arguments.push(self.expression()?);

                if !self.match_tt(&[TokenType::Comma]) {
                    break;
                }
            }
        }

        let paren = self.consume(TokenType::RightParen, "Expect ')' after arguments.")?;
        Ok(Expr::Call { callee: Box::new(callee), paren, arguments })
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        if self.match_tt(&[TokenType::False]) {
            return Ok(Expr::Literal { value: Object::Boolean(false) });
        }
        if self.match_tt(&[TokenType::True]) {
            return Ok(Expr::Literal { value: Object::Boolean(true) });
        }
        if self.match_tt(&[TokenType::Nil]) {
            return Ok(Expr::Literal { value: Object::Null });
        }
        if self.match_tt(&[TokenType::Number, TokenType::StringLiteral]) {
            let token = self.previous();
            return match token.literal {
                Some(value) => Ok(Expr::Literal { value }),
                None => Err(ParserError::new(token, "Expect literal value.")),
            };
        }
        if self.match_tt(&[TokenType::This]) {
            return Ok(Expr::This { keyword: self.previous() });
        }
        if self.match_tt(&[TokenType::Super]) {
            let keyword = self.previous();
            self.consume(TokenType::Dot, "Expect '.' after 'super'.")?;
            let method = self.consume(TokenType::Identifier, "Expect superclass method name.")?;
            return Ok(Expr::Super { keyword, method });
        }
        if self.match_tt(&[TokenType::Identifier]) {
            return Ok(Expr::Variable { name: self.previous() });
        }
        if self.match_tt(&[TokenType::Fun]) {
            self.consume(TokenType::LeftParen, "Expect '(' after 'fun'.")?;
            let declaration = self.function_body(None, "function")?;
            return Ok(Expr::Lambda { declaration });
        }
        if self.match_tt(&[TokenType::LeftParen]) {
            let expr = self.expression()?;
            self.consume(TokenType::RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping { expr: Box::new(expr) });
        }
        if self.match_tt(&[TokenType::LeftBracket]) {
            return self.list_literal();
        }
        if self.match_tt(&[TokenType::LeftBrace]) {
            return self.dict_literal();
        }

        Err(ParserError::new(self.peek().clone(), "Expect expression."))
    }

    fn list_literal(&mut self) -> ParseResult<Expr> {
        let bracket = self.previous();
        let mut elements = vec![];

        if !self.check(TokenType::RightBracket) {
            loop {
                elements.push(self.expression()?);
                // A trailing comma is allowed.
                if !self.match_tt(&[TokenType::Comma]) || self.check(TokenType::RightBracket) {
                    break;
                }
            }
        }

        self.consume(TokenType::RightBracket, "Expect ']' after list elements.")?;
        Ok(Expr::List { bracket, elements })
    }

    fn dict_literal(&mut self) -> ParseResult<Expr> {
        let brace = self.previous();
        let mut entries = vec![];

        if !self.check(TokenType::RightBrace) {
            loop {
                let key = self.expression()?;
                self.consume(TokenType::Colon, "Expect ':' after dict key.")?;
                let value = self.expression()?;
                entries.push((key, value));

                if !self.match_tt(&[TokenType::Comma]) || self.check(TokenType::RightBrace) {
                    break;
                }
            }
        }

        self.consume(TokenType::RightBrace, "Expect '}' after dict entries.")?;
        Ok(Expr::Dict { brace, entries })
    }

    /// Return the next token if its `token_type` matches the given type as input.
    /// Otherwise, return an error carrying `message`.
    /// Enters one level of recursive descent.
    fn nested<T>(&mut self, rule: fn(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(ParserError::new(self.peek().clone(), "Too much nesting."));
        }

        self.depth += 1;
        let result = ensure_sufficient_stack(|| rule(self));
        self.depth -= 1;
        result
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> ParseResult<Token> {
        if self.check(token_type) {
            return Ok(self.advance());
        }

        Err(ParserError::new(self.peek().clone(), message))
    }

    fn match_tt(&mut self, types: &[TokenType]) -> bool {
        for tt in types {
            if self.check(*tt) {
                self.advance();
                return true;
            }
        }

        false
    }

    /// Check to see if the next token's type matches the given `token_type`.
    fn check(&self, token_type: TokenType) -> bool {
        self.check_at(0, token_type)
    }

    fn check_next(&self, token_type: TokenType) -> bool {
        self.check_at(1, token_type)
    }

    fn check_at(&self, offset: usize, token_type: TokenType) -> bool {
        match self.tokens.get(self.current + offset) {
            Some(token) => token.token_type != TokenType::EOF && token.token_type == token_type,
            None => false,
        }
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::EOF
    }

    fn peek(&self) -> &Token {
        // The scanner always terminates the stream with EOF, and `advance`
        // never moves past it.
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn previous(&self) -> Token {
        self.tokens[self.current.saturating_sub(1)].clone()
    }

    fn synchronize(&mut self) {
        self.advance();

        // Move and discard tokens until we find a statement boundary
        while !self.is_at_end() {
            if self.previous().token_type == TokenType::Semicolon {
                return;
            }

            match self.peek().token_type {
                TokenType::Class
                | TokenType::Fun
                | TokenType::Var
                | TokenType::For
                | TokenType::If
                | TokenType::While
                | TokenType::Print
                | TokenType::Return => return,
                _ => {}
            }

            self.advance();
        }
    }
}
