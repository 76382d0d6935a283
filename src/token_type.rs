#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TokenType {
    LeftParen, RightParen, // ()
    QualifierName, Colon, Content,
    And, Or, Not,
    Error,
    EOF,
}

impl TokenType {
    /// Token types that may begin a term of a conjunction.
    pub fn starts_term(self) -> bool {
        matches!(self, TokenType::LeftParen | TokenType::QualifierName | TokenType::Content | TokenType::Not)
    }
}
