//! Parsing (tokens to AST)
//!
//! A straightforward recursive-descent parser with Pratt-style precedence
//! climbing for expressions. Diagnostics are accumulated rather than
//! returned on first error so the caller can report everything at once.

use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::span::Span;
use crate::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    diagnostics: Vec<Diagnostic>,
}

type StmtResult = Result<Stmt, ()>;
type ExprResult = Result<Expr, ()>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Parse tokens into an AST. Returns the accumulated diagnostics on
    /// failure; a non-empty `Vec` is only ever returned as the `Err` variant.
    pub fn parse(&mut self) -> Result<Program, Vec<Diagnostic>> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            match self.statement() {
                Ok(stmt) => statements.push(stmt),
                Err(()) => self.synchronize(),
            }
        }

        if self.diagnostics.is_empty() {
            Ok(Program { statements })
        } else {
            Err(std::mem::take(&mut self.diagnostics))
        }
    }

    // === Statements ===

    fn statement(&mut self) -> StmtResult {
        match &self.peek().kind {
            TokenKind::Var | TokenKind::Let | TokenKind::Const => self.var_decl(),
            TokenKind::Function => self.function_decl(),
            TokenKind::Return => self.return_stmt(),
            TokenKind::If => self.if_stmt(),
            TokenKind::While => self.while_stmt(),
            TokenKind::LeftBrace => self.block_stmt(),
            TokenKind::Break => {
                let span = self.advance().span;
                self.consume_semicolon();
                Ok(Stmt {
                    kind: StmtKind::Break,
                    span,
                })
            }
            TokenKind::Continue => {
                let span = self.advance().span;
                self.consume_semicolon();
                Ok(Stmt {
                    kind: StmtKind::Continue,
                    span,
                })
            }
            TokenKind::Debugger => {
                let span = self.advance().span;
                self.consume_semicolon();
                Ok(Stmt {
                    kind: StmtKind::Debugger,
                    span,
                })
            }
            _ => self.expr_stmt(),
        }
    }

    fn var_decl(&mut self) -> StmtResult {
        let start = self.peek().span;
        let kind = match self.advance().kind {
            TokenKind::Var => DeclKind::Var,
            TokenKind::Let => DeclKind::Let,
            TokenKind::Const => DeclKind::Const,
            _ => unreachable!(),
        };
        let name = self.consume_ident("expected variable name")?;
        let initializer = if self.check(&TokenKind::Equal) {
            self.advance();
            Some(self.expression()?)
        } else {
            None
        };
        let end = self.previous().span;
        self.consume_semicolon();
        Ok(Stmt {
            kind: StmtKind::VarDecl {
                kind,
                name,
                initializer,
            },
            span: start.merge(end),
        })
    }

    fn function_decl(&mut self) -> StmtResult {
        let start = self.advance().span; // `function`
        let name = self.consume_ident("expected function name")?;
        let params = self.param_list()?;
        let body = self.block()?;
        let end = self.previous().span;
        Ok(Stmt {
            kind: StmtKind::Function(FunctionDecl {
                name,
                params,
                body,
                span: start.merge(end),
            }),
            span: start.merge(end),
        })
    }

    fn param_list(&mut self) -> Result<Vec<Param>, ()> {
        self.consume(&TokenKind::LeftParen, "expected '(' after function name")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                let name = self.consume_ident("expected parameter name")?;
                params.push(Param { name });
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.consume(&TokenKind::RightParen, "expected ')' after parameters")?;
        Ok(params)
    }

    fn return_stmt(&mut self) -> StmtResult {
        let start = self.advance().span; // `return`
        let value = if self.check(&TokenKind::Semicolon) || self.check(&TokenKind::RightBrace) {
            None
        } else {
            Some(self.expression()?)
        };
        let end = self.previous().span;
        self.consume_semicolon();
        Ok(Stmt {
            kind: StmtKind::Return(value),
            span: start.merge(end),
        })
    }

    fn if_stmt(&mut self) -> StmtResult {
        let start = self.advance().span; // `if`
        self.consume(&TokenKind::LeftParen, "expected '(' after 'if'")?;
        let condition = self.expression()?;
        self.consume(&TokenKind::RightParen, "expected ')' after condition")?;
        let then_branch = self.block()?;
        let else_branch = if self.check(&TokenKind::Else) {
            self.advance();
            if self.check(&TokenKind::If) {
                let nested = self.if_stmt()?;
                Some(vec![nested])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        let end = self.previous().span;
        Ok(Stmt {
            kind: StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
            span: start.merge(end),
        })
    }

    fn while_stmt(&mut self) -> StmtResult {
        let start = self.advance().span; // `while`
        self.consume(&TokenKind::LeftParen, "expected '(' after 'while'")?;
        let condition = self.expression()?;
        self.consume(&TokenKind::RightParen, "expected ')' after condition")?;
        let body = self.block()?;
        let end = self.previous().span;
        Ok(Stmt {
            kind: StmtKind::While { condition, body },
            span: start.merge(end),
        })
    }

    fn block_stmt(&mut self) -> StmtResult {
        let start = self.peek().span;
        let statements = self.block()?;
        let end = self.previous().span;
        Ok(Stmt {
            kind: StmtKind::Block(statements),
            span: start.merge(end),
        })
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ()> {
        self.consume(&TokenKind::LeftBrace, "expected '{'")?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.statement()?);
        }
        self.consume(&TokenKind::RightBrace, "expected '}'")?;
        Ok(statements)
    }

    fn expr_stmt(&mut self) -> StmtResult {
        let expr = self.expression()?;
        let span = expr.span;
        self.consume_semicolon();
        Ok(Stmt {
            kind: StmtKind::Expr(expr),
            span,
        })
    }

    fn consume_semicolon(&mut self) {
        // Semicolons are required in Thorn source but a missing trailing one
        // at EOF / before `}` is tolerated rather than treated as fatal.
        if self.check(&TokenKind::Semicolon) {
            self.advance();
        }
    }

    // === Expressions (precedence climbing) ===

    fn expression(&mut self) -> ExprResult {
        self.assignment()
    }

    fn assignment(&mut self) -> ExprResult {
        let expr = self.logical_or()?;

        if self.check(&TokenKind::Equal) {
            self.advance();
            let value = self.assignment()?;
            let span = expr.span.merge(value.span);
            return Ok(Expr {
                kind: ExprKind::Assign(Box::new(expr), Box::new(value)),
                span,
            });
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> ExprResult {
        let mut expr = self.logical_and()?;
        while self.check(&TokenKind::PipePipe) {
            self.advance();
            let right = self.logical_and()?;
            let span = expr.span.merge(right.span);
            expr = Expr {
                kind: ExprKind::Logical(LogicalOp::Or, Box::new(expr), Box::new(right)),
                span,
            };
        }
        Ok(expr)
    }

    fn logical_and(&mut self) -> ExprResult {
        let mut expr = self.equality()?;
        while self.check(&TokenKind::AmpAmp) {
            self.advance();
            let right = self.equality()?;
            let span = expr.span.merge(right.span);
            expr = Expr {
                kind: ExprKind::Logical(LogicalOp::And, Box::new(expr), Box::new(right)),
                span,
            };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ExprResult {
        let mut expr = self.comparison()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::EqualEqual => BinaryOp::Eq,
                TokenKind::BangEqual => BinaryOp::NotEq,
                _ => break,
            };
            self.advance();
            let right = self.comparison()?;
            let span = expr.span.merge(right.span);
            expr = Expr {
                kind: ExprKind::Binary(op, Box::new(expr), Box::new(right)),
                span,
            };
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> ExprResult {
        let mut expr = self.term()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Less => BinaryOp::Less,
                TokenKind::LessEqual => BinaryOp::LessEq,
                TokenKind::Greater => BinaryOp::Greater,
                TokenKind::GreaterEqual => BinaryOp::GreaterEq,
                _ => break,
            };
            self.advance();
            let right = self.term()?;
            let span = expr.span.merge(right.span);
            expr = Expr {
                kind: ExprKind::Binary(op, Box::new(expr), Box::new(right)),
                span,
            };
        }
        Ok(expr)
    }

    fn term(&mut self) -> ExprResult {
        let mut expr = self.factor()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.factor()?;
            let span = expr.span.merge(right.span);
            expr = Expr {
                kind: ExprKind::Binary(op, Box::new(expr), Box::new(right)),
                span,
            };
        }
        Ok(expr)
    }

    fn factor(&mut self) -> ExprResult {
        let mut expr = self.unary()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => break,
            };
            self.advance();
            let right = self.unary()?;
            let span = expr.span.merge(right.span);
            expr = Expr {
                kind: ExprKind::Binary(op, Box::new(expr), Box::new(right)),
                span,
            };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ExprResult {
        let op = match &self.peek().kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.advance().span;
            let operand = self.unary()?;
            let span = start.merge(operand.span);
            return Ok(Expr {
                kind: ExprKind::Unary(op, Box::new(operand)),
                span,
            });
        }
        self.call()
    }

    fn call(&mut self) -> ExprResult {
        let mut expr = self.primary()?;
        loop {
            if self.check(&TokenKind::LeftParen) {
                self.advance();
                let mut args = Vec::new();
                if !self.check(&TokenKind::RightParen) {
                    loop {
                        args.push(self.expression()?);
                        if !self.check(&TokenKind::Comma) {
                            break;
                        }
                        self.advance();
                    }
                }
                let end = self.consume(&TokenKind::RightParen, "expected ')' after arguments")?;
                let span = expr.span.merge(end.span);
                expr = Expr {
                    kind: ExprKind::Call(Box::new(expr), args),
                    span,
                };
            } else if self.check(&TokenKind::Dot) {
                self.advance();
                let name = self.consume_ident("expected property name after '.'")?;
                let end = self.previous().span;
                let span = expr.span.merge(end);
                expr = Expr {
                    kind: ExprKind::Member {
                        object: Box::new(expr),
                        property: Box::new(Expr {
                            kind: ExprKind::String(name),
                            span: end,
                        }),
                        computed: false,
                    },
                    span,
                };
            } else if self.check(&TokenKind::LeftBracket) {
                self.advance();
                let index = self.expression()?;
                let end = self.consume(&TokenKind::RightBracket, "expected ']' after index")?;
                let span = expr.span.merge(end.span);
                expr = Expr {
                    kind: ExprKind::Member {
                        object: Box::new(expr),
                        property: Box::new(index),
                        computed: true,
                    },
                    span,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> ExprResult {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Number(n),
                    span: token.span,
                })
            }
            TokenKind::String(ref s) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::String(s.clone()),
                    span: token.span,
                })
            }
            TokenKind::Bool(b) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Bool(b),
                    span: token.span,
                })
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Null,
                    span: token.span,
                })
            }
            TokenKind::Undefined => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Undefined,
                    span: token.span,
                })
            }
            TokenKind::This => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::This,
                    span: token.span,
                })
            }
            TokenKind::Ident(ref name) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Ident(name.clone()),
                    span: token.span,
                })
            }
            TokenKind::Function => {
                self.advance();
                let name = if let TokenKind::Ident(name) = &self.peek().kind {
                    let name = name.clone();
                    self.advance();
                    Some(name)
                } else {
                    None
                };
                let params = self.param_list()?;
                let body = self.block()?;
                let end = self.previous().span;
                Ok(Expr {
                    kind: ExprKind::Function { name, params, body },
                    span: token.span.merge(end),
                })
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(&TokenKind::RightParen, "expected ')' after expression")?;
                Ok(expr)
            }
            TokenKind::LeftBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(&TokenKind::RightBracket) {
                    loop {
                        elements.push(self.expression()?);
                        if !self.check(&TokenKind::Comma) {
                            break;
                        }
                        self.advance();
                    }
                }
                let end =
                    self.consume(&TokenKind::RightBracket, "expected ']' after array literal")?;
                Ok(Expr {
                    kind: ExprKind::Array(elements),
                    span: token.span.merge(end.span),
                })
            }
            TokenKind::LeftBrace => {
                self.advance();
                let mut fields = Vec::new();
                if !self.check(&TokenKind::RightBrace) {
                    loop {
                        let key = match &self.peek().kind {
                            TokenKind::Ident(name) => name.clone(),
                            TokenKind::String(s) => s.clone(),
                            _ => {
                                self.error_at_current("expected property name");
                                return Err(());
                            }
                        };
                        self.advance();
                        self.consume(&TokenKind::Colon, "expected ':' after property name")?;
                        let value = self.expression()?;
                        fields.push((key, value));
                        if !self.check(&TokenKind::Comma) {
                            break;
                        }
                        self.advance();
                    }
                }
                let end =
                    self.consume(&TokenKind::RightBrace, "expected '}' after object literal")?;
                Ok(Expr {
                    kind: ExprKind::Object(fields),
                    span: token.span.merge(end.span),
                })
            }
            _ => {
                self.error_at_current("expected expression");
                Err(())
            }
        }
    }

    // === Helpers ===

    fn consume_ident(&mut self, message: &str) -> Result<String, ()> {
        if let TokenKind::Ident(name) = &self.peek().kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            self.error_at_current(message);
            Err(())
        }
    }

    fn consume(&mut self, kind: &TokenKind, message: &str) -> Result<Token, ()> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            self.error_at_current(message);
            Err(())
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.current].clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.tokens[self.current].kind, TokenKind::Eof)
    }

    fn error_at_current(&mut self, message: &str) {
        let span = self.peek().span;
        self.diagnostics.push(
            Diagnostic::error_with_code("TH2001", message, span)
                .with_label(format!("near '{}'", self.peek().lexeme)),
        );
    }

    /// Skip tokens until a statement boundary, so one parse error doesn't
    /// cascade into a wall of follow-on diagnostics.
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            if matches!(self.previous().kind, TokenKind::Semicolon) {
                return;
            }
            match self.peek().kind {
                TokenKind::Var
                | TokenKind::Let
                | TokenKind::Const
                | TokenKind::Function
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> Program {
        let (tokens, diags) = Lexer::new(src).tokenize();
        assert!(diags.is_empty(), "lex errors: {:?}", diags);
        Parser::new(tokens).parse().expect("parse failed")
    }

    #[test]
    fn parses_var_decl_with_initializer() {
        let program = parse("var x = 1 + 2;");
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0].kind {
            StmtKind::VarDecl {
                kind,
                name,
                initializer,
            } => {
                assert_eq!(*kind, DeclKind::Var);
                assert_eq!(name, "x");
                assert!(initializer.is_some());
            }
            other => panic!("unexpected stmt: {:?}", other),
        }
    }

    #[test]
    fn parses_function_with_nested_function_and_call() {
        let program = parse(
            "function outer() { function inner() { return 1; } return inner(); } outer();",
        );
        assert_eq!(program.statements.len(), 2);
        assert!(matches!(
            program.statements[0].kind,
            StmtKind::Function(_)
        ));
    }

    #[test]
    fn parses_if_else_and_while() {
        let program = parse("if (x < 10) { y = 1; } else { y = 2; } while (x) { x = x - 1; }");
        assert_eq!(program.statements.len(), 2);
        assert!(matches!(program.statements[0].kind, StmtKind::If { .. }));
        assert!(matches!(
            program.statements[1].kind,
            StmtKind::While { .. }
        ));
    }

    #[test]
    fn parses_object_and_member_access() {
        let program = parse("var o = {a: 1, b: \"test\"}; var x = o.a;");
        assert_eq!(program.statements.len(), 2);
    }

    #[test]
    fn parses_debugger_statement() {
        let program = parse("debugger;");
        assert!(matches!(program.statements[0].kind, StmtKind::Debugger));
    }
}
