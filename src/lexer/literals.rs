//! Scanning of string, number, and identifier/keyword literals.

use super::Lexer;
use crate::token::{Token, TokenKind};

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("var", TokenKind::Var),
    ("let", TokenKind::Let),
    ("const", TokenKind::Const),
    ("function", TokenKind::Function),
    ("return", TokenKind::Return),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("while", TokenKind::While),
    ("for", TokenKind::For),
    ("break", TokenKind::Break),
    ("continue", TokenKind::Continue),
    ("null", TokenKind::Null),
    ("undefined", TokenKind::Undefined),
    ("this", TokenKind::This),
    ("new", TokenKind::New),
    ("debugger", TokenKind::Debugger),
    ("true", TokenKind::Bool(true)),
    ("false", TokenKind::Bool(false)),
];

impl Lexer {
    /// Scan a `"..."` string literal, processing backslash escapes.
    pub(super) fn string(&mut self) -> Token {
        let mut value = String::new();

        while self.peek() != '"' && !self.is_at_end() {
            let c = self.peek();
            if c == '\n' {
                break;
            }
            if c == '\\' {
                self.advance();
                if self.is_at_end() {
                    break;
                }
                let escape = self.advance();
                match escape {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '\\' => value.push('\\'),
                    '"' => value.push('"'),
                    '0' => value.push('\0'),
                    other => {
                        return self.error_invalid_escape(other);
                    }
                }
            } else {
                value.push(c);
                self.advance();
            }
        }

        if self.is_at_end() || self.peek() != '"' {
            return self.error_unterminated_string();
        }
        self.advance(); // closing quote

        let lexeme: String = self.chars[self.start_pos..self.current].iter().collect();
        self.make_token(TokenKind::String(value), &lexeme)
    }

    /// Scan an integer or decimal number literal (e.g. `42`, `3.14`).
    pub(super) fn number(&mut self) -> Token {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // consume '.'
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let lexeme: String = self.chars[self.start_pos..self.current].iter().collect();
        let value: f64 = lexeme.parse().unwrap_or(0.0);
        self.make_token(TokenKind::Number(value), &lexeme)
    }

    /// Scan an identifier, resolving it against the keyword table.
    pub(super) fn identifier(&mut self) -> Token {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let lexeme: String = self.chars[self.start_pos..self.current].iter().collect();

        for (keyword, kind) in KEYWORDS {
            if *keyword == lexeme {
                return self.make_token(kind.clone(), &lexeme);
            }
        }

        self.make_token(TokenKind::Ident(lexeme.clone()), &lexeme)
    }
}
