use std::rc::Rc;

use crate::prelude::*;

#[derive(Debug)]
pub enum Expr {
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },
    Get {
        object: Box<Expr>,
        name: Token,
    },
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },
    Index {
        object: Box<Expr>,
        bracket: Token,
        index: Box<Expr>,
    },
    IndexSet {
        object: Box<Expr>,
        bracket: Token,
        index: Box<Expr>,
        value: Box<Expr>,
    },
    Super {
        keyword: Token,
        method: Token,
    },
    This {
        keyword: Token,
    },
    Grouping {
        expr: Box<Expr>,
    },
    Literal {
        value: Object,
    },
    List {
        bracket: Token,
        elements: Vec<Expr>,
    },
    Dict {
        brace: Token,
        entries: Vec<(Expr, Expr)>,
    },
    Lambda {
        declaration: Rc<FunctionDecl>,
    },
    Unary {
        operator: Token,
        right: Box<Expr>,
    },
    Variable {
        name: Token,
    },
    Assignment {
        name: Token,
        value: Box<Expr>,
    },
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn int_literal(v: i64) -> Expr {
        Expr::Literal { value: Object::Integer(v) }
    }

    pub fn float_literal(v: f64) -> Expr {
        Expr::Literal { value: Object::Float(v) }
    }

    pub fn str_literal(s: &str) -> Expr {
        Expr::Literal { value: Object::from(s) }
    }
}

/// Parameters and body of a named function, method or lambda.
///
/// Shared between the AST and every `LoxFunction` created from it, so a
/// closure never copies its body.
#[derive(Debug)]
pub struct FunctionDecl {
    pub name: Option<Token>,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

impl FunctionDecl {
    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().map(|t| t.lexeme.as_str())
    }
}

#[derive(Debug)]
pub enum Stmt {
    Break {
        token: Token,
    },
    Continue {
        token: Token,
    },
    Return {
        keyword: Token,
        value: Option<Expr>,
    },
    Class {
        name: Token,
        methods: Vec<Rc<FunctionDecl>>,
        superclass: Option<Expr>,
    },
    Print {
        keyword: Token,
        expr: Expr,
    },
    Expression {
        expr: Expr,
    },
    Var {
        name: Token,
        initializer: Option<Expr>,
    },
    Block {
        statements: Vec<Stmt>,
    },
    Function {
        declaration: Rc<FunctionDecl>,
    },
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    For {
        initializer: Option<Box<Stmt>>,
        condition: Option<Expr>,
        increment: Option<Expr>,
        body: Box<Stmt>,
    },
    ForIn {
        variable: Token,
        iterable: Expr,
        body: Box<Stmt>,
    },
}

impl AsRef<Stmt> for Stmt {
    fn as_ref(&self) -> &Stmt {
        self
    }
}
