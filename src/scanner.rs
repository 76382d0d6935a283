use std::fmt;
use std::ops::Range;

use crate::token_type::TokenType::{self, *};

/// Splits filter text into tokens. Scanning never fails: characters that cannot start a token,
/// and unterminated quotes, become `Error` tokens for the parser to report.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    Scanner::new(source, &mut tokens).scan();
    tokens
}

/// The `Scanner` loops through the filter text, identifying tokens and pushing them onto the
/// caller's Vec<Token>.
pub struct Scanner<'a> {
    source: &'a str,
    chars: std::str::CharIndices<'a>, // iterator over chars of source
    tokens: &'a mut Vec<Token>, // stores scanned tokens
    start: usize, // byte index of lexeme start
    current: Option<(usize, char)>, // current char (byte index, char)
    next: Option<(usize, char)>, // next char (byte index, char)
    line: usize, // current line in source
    column: usize, // current column in source
    line_start: usize, // line of lexeme start
    column_start: usize, // column of lexeme start
}

impl<'a> Scanner<'a> {

    pub fn new(source: &'a str, tokens: &'a mut Vec<Token>) -> Self {
        let mut chars = source.char_indices();
        let current = chars.next();
        let next = chars.clone().next();

        Scanner {
            source,
            chars,
            tokens,
            start: 0,
            current,
            next,
            line: 1,
            column: 1,
            line_start: 1,
            column_start: 1,
        }
    }

    pub fn scan(&mut self) {
        while !self.at_end() {
            self.begin_lexeme();
            self.scan_token();
        }
        self.begin_lexeme();
        self.add_token(EOF, None);
    }

    fn scan_token(&mut self) {
        let c = match self.advance() {
            Some(ch) => ch,
            None => return,
        };

        match c {
            '(' => self.add_token(LeftParen, None),
            ')' => self.add_token(RightParen, None),
            '&' => { self.match_char('&'); self.add_token(And, None) },
            '|' => { self.match_char('|'); self.add_token(Or, None) },
            '~' | '!' | '-' => self.add_token(Not, None),
            ':' => self.add_token(Colon, None),
            '"' => self.quoted(),
            _ if c.is_whitespace() => {}, // ignore whitespace
            _ if c.is_control() => self.error("Unexpected control character"),
            _ => self.word(),
        }
    }

    /// Scans a bareword. A word directly followed by ':' names a qualifier and is followed by its
    /// content; otherwise it is a boolean keyword or a free-standing content term.
    fn word(&mut self) {
        while matches!(self.peek(), Some(c) if Self::is_word_char(c)) {
            self.advance();
        }

        if self.peek() == Some(':') {
            self.add_token(QualifierName, None);
            self.begin_lexeme();
            self.advance(); // consume ':'
            self.add_token(Colon, None);
            self.content();
            return;
        }

        let variant = match self.lexeme().to_ascii_lowercase().as_str() {
            "and" => And,
            "or" => Or,
            "not" => Not,
            _ => Content,
        };
        self.add_token(variant, None)
    }

    /// Scans qualifier content directly after the ':'. Missing content emits no token; the
    /// parser reports it.
    fn content(&mut self) {
        self.begin_lexeme();
        match self.peek() {
            Some('"') => {
                self.advance();
                self.quoted();
            },
            Some(c) if Self::is_content_char(c) => {
                while matches!(self.peek(), Some(c) if Self::is_content_char(c)) {
                    self.advance();
                }
                self.add_token(Content, None)
            },
            _ => {},
        }
    }

    /// Scans the rest of a quoted string; the opening quote is already consumed.
    fn quoted(&mut self) {
        while matches!(self.peek(), Some(c) if c != '"') {
            self.advance();
        }

        if self.at_end() {
            return self.error("Unterminated string");
        }
        self.advance(); // consume closing '"'

        let lexeme = self.lexeme();
        let text = lexeme[1..lexeme.len() - 1].to_string();
        self.add_token(Content, Some(text))
    }

    fn is_word_char(c: char) -> bool {
        Self::is_content_char(c) && c != ':'
    }

    pub(crate) fn is_content_char(c: char) -> bool {
        !c.is_whitespace() && !c.is_control() && !matches!(c, '(' | ')' | '"' | '|' | '&')
    }

    /// Whether `text` scans as a single free-standing `Content` token.
    pub(crate) fn is_bare_word(text: &str) -> bool {
        !text.is_empty()
            && !text.starts_with(['~', '!', '-'])
            && text.chars().all(Self::is_word_char)
            && !["and", "or", "not"].iter().any(|keyword| text.eq_ignore_ascii_case(keyword))
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            return true
        }
        false
    }

    fn at_end(&self) -> bool {
        self.current.is_none()
    }

    /// Byte index of the current char, or the source length at the end.
    fn offset(&self) -> usize {
        self.current.map_or(self.source.len(), |(idx, _)| idx)
    }

    /// Advance iterator and indices
    fn advance_iter(&mut self) {
        self.current = self.next; // advance current
        self.chars.next(); // advance iterator
        self.next = self.chars.clone().next(); // advance next
    }

    /// Return current char and advance to next.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.advance_iter();
        match c {
            Some('\n') => { self.line += 1; self.column = 1; },
            Some(_) => self.column += 1,
            None => {},
        }
        c
    }

    /// Return current char without advancing.
    fn peek(&self) -> Option<char> {
        self.current.map(|(_, c)| c)
    }

    fn begin_lexeme(&mut self) {
        self.start = self.offset();
        self.line_start = self.line;
        self.column_start = self.column;
    }

    /// The string slice source[self.start..self.current].
    fn lexeme(&self) -> &'a str {
        &self.source[self.start..self.offset()]
    }

    fn error(&mut self, message: &str) {
        self.add_token(Error, Some(message.to_string()))
    }

    fn add_token(&mut self, variant: TokenType, literal: Option<String>) {
        let token = Token {
            variant,
            lexeme: self.lexeme().to_string(),
            literal,
            line: self.line_start,
            column: self.column_start,
            span: self.start..self.offset(),
        };
        self.tokens.push(token);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub variant: TokenType,
    pub lexeme: String,
    /// Unquoted text of a quoted string, or the message of an `Error` token.
    pub literal: Option<String>,
    pub line: usize,
    pub column: usize,
    pub span: Range<usize>,
}

impl Token {
    /// The text a token stands for: the literal if present, else the lexeme.
    pub fn text(&self) -> &str {
        self.literal.as_deref().unwrap_or(&self.lexeme)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{} {}", self.variant, self.lexeme)?;
        if let Some(literal) = &self.literal {
            write!(f, " {}", literal)?;
        }
        Ok(())
    }
}
