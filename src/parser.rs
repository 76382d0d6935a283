//! A recursive descent parser for issue filter expressions.
//!
//! Grammar of filter syntax:
//!
//! disjunction -> conjunction ( OR conjunction )*
//! conjunction -> unary ( AND? unary )*
//! unary -> NOT unary | primary
//! primary -> "(" disjunction ")" | QUALIFIER_NAME ":" CONTENT | CONTENT
//!
//! OR is '|', '||' or 'or'; AND is '&', '&&', 'and' or plain adjacency; NOT is '~', '!', '-' or
//! 'not'. A CONTENT term without a qualifier name is a keyword search.
//!
//! Examples: "label:bug", "milestone:current+1 ~is:closed", "(label:ui | label:ux) count:5"
//!
//! The parser never fails. On a syntax error it records a diagnostic and the whole filter
//! becomes `Expr::Empty`, which matches every issue.

use crate::error::{Diagnostic, SyntaxError};
use crate::expr::Expr;
use crate::qualifier;
use crate::scanner::Token;
use crate::token_type::TokenType::{self, *};

const MAX_DEPTH: usize = 64;
const MAX_TOKENS: usize = 1024;

type ParseResult = Result<Expr, SyntaxError>;

pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    depth: usize,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a> Parser<'a> {

    pub fn new(tokens: &'a [Token], diagnostics: &'a mut Vec<Diagnostic>) -> Self {
        Parser {
            tokens,
            current: 0,
            depth: 0,
            diagnostics,
        }
    }

    /// Parses all tokens to return a syntax tree. Encountered problems are stored in
    /// `self.diagnostics`.
    pub fn parse(&mut self) -> Expr {
        match self.expression() {
            Ok(expr) => expr,
            Err(error) => {
                tracing::debug!(%error, "syntax error, filter falls back to matching everything");
                self.diagnostics.push(error.into());
                Expr::Empty
            },
        }
    }

    fn expression(&mut self) -> ParseResult {
        if let Some(token) = self.tokens.get(MAX_TOKENS).filter(|t| t.variant != EOF) {
            return Err(SyntaxError::at(token, "Filter is too long".to_string()))
        }
        if self.at_end() {
            return Ok(Expr::Empty)
        }

        let expr = self.disjunction()?;
        if !self.at_end() {
            // Case: unbalanced ')' or a stray ':'. Ex.: 'label:a)'
            return Err(self.unexpected())
        }
        Ok(expr)
    }

    /// Matches production: disjunction -> conjunction ( OR conjunction )*
    fn disjunction(&mut self) -> ParseResult {
        let mut left = self.conjunction()?;
        while self.match_token(Or) {
            let right = self.conjunction()?;
            left = left.or(right);
        }
        Ok(left)
    }

    /// Matches production: conjunction -> unary ( AND? unary )*
    fn conjunction(&mut self) -> ParseResult {
        let mut left = self.unary()?;
        while self.match_token(And) || self.peek().is_some_and(|t| t.variant.starts_term()) {
            let right = self.unary()?;
            left = left.and(right);
        }
        Ok(left)
    }

    /// Matches production: unary -> NOT unary | primary
    fn unary(&mut self) -> ParseResult {
        if self.match_token(Not) {
            let inner = self.nested(Self::unary)?;
            return Ok(inner.negate())
        }
        self.primary()
    }

    /// Matches production: primary -> "(" disjunction ")" | QUALIFIER_NAME ":" CONTENT | CONTENT
    fn primary(&mut self) -> ParseResult {
        let Some(token) = self.peek().cloned() else {
            return Err(self.unexpected())
        };

        match token.variant {
            LeftParen => {
                self.advance();
                let expr = self.nested(Self::disjunction)?;
                if !self.match_token(RightParen) {
                    return Err(self.error("Expected ')'".to_string()))
                }
                Ok(expr)
            },
            QualifierName => self.qualifier(),
            Content => {
                self.advance();
                Ok(self.leaf(&token, &token, "keyword", token.text()))
            },
            _ => Err(self.unexpected()),
        }
    }

    /// Matches the production: QUALIFIER_NAME ":" CONTENT
    /// Ex.: 'milestone:current-1' or 'title:"two words"'
    fn qualifier(&mut self) -> ParseResult {
        let Some(name) = self.advance() else {
            return Err(self.unexpected())
        };
        let Some(colon) = self.peek().filter(|t| t.variant == Colon).cloned() else {
            return Err(self.error(format!("Expected ':' after '{}'", name.lexeme)))
        };
        self.advance();

        // Content must follow the colon directly. Ex.: 'milestone:' or 'milestone: v1' are errors
        match self.peek().filter(|t| t.variant == Content && t.span.start == colon.span.end).cloned() {
            Some(content) => {
                self.advance();
                Ok(self.leaf(&name, &content, &name.lexeme, content.text()))
            },
            None if self.check(Error) => Err(self.unexpected()),
            None => Err(SyntaxError::at(&colon, format!("Expected content after '{}:'", name.lexeme))),
        }
    }

    /// Builds a qualifier leaf, recording a semantic diagnostic if its content is not understood.
    fn leaf(&mut self, from: &Token, to: &Token, name: &str, content: &str) -> Expr {
        if let Err(error) = qualifier::validate(name, content) {
            self.diagnostics.push(Diagnostic::semantic(error.to_string(), from, to));
        }
        Expr::qualifier(name, content)
    }

    /// Runs a production one nesting level deeper, bounding recursion.
    fn nested(&mut self, production: fn(&mut Self) -> ParseResult) -> ParseResult {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("Filter is nested too deeply".to_string()))
        }
        self.depth += 1;
        let result = production(self);
        self.depth -= 1;
        result
    }

    fn match_token(&mut self, token_type: TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            return true
        }
        false
    }

    fn check(&self, token_type: TokenType) -> bool {
        !self.at_end() && self.peek().is_some_and(|t| t.variant == token_type)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek().cloned();
        if !self.at_end() {
            self.current += 1;
        }
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn at_end(&self) -> bool {
        self.peek().is_none_or(|t| t.variant == EOF)
    }

    /// Creates a SyntaxError at the current token.
    fn error(&self, message: String) -> SyntaxError {
        match self.peek().or(self.tokens.last()) {
            Some(token) => SyntaxError::at(token, message),
            None => SyntaxError { message, span: 0..0, line: 1, column: 1 },
        }
    }

    /// Describes the current token as unexpected. Error tokens carry their own message.
    fn unexpected(&self) -> SyntaxError {
        match self.peek() {
            Some(token) if token.variant == Error => SyntaxError::at(token, token.text().to_string()),
            Some(token) if token.variant != EOF => self.error(format!("Unexpected '{}'", token.lexeme)),
            _ => self.error("Expected a filter term".to_string()),
        }
    }
}
