use std::fmt;

use crate::context::FilterContext;
use crate::model::Issue;
use crate::qualifier::{self, Predicate, QualifierKind};
use crate::scanner::Scanner;

/// A compiled filter. Equality and hashing are structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Qualifier {
        name: String,
        content: String,
    },
    Conjunction {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Disjunction {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Negation {
        inner: Box<Expr>,
    },
    /// Matches every issue. Also the result of a filter that failed to parse.
    Empty,
}

impl Expr {
    pub fn qualifier(name: impl Into<String>, content: impl Into<String>) -> Self {
        Expr::Qualifier { name: name.into(), content: content.into() }
    }

    pub fn and(self, right: Expr) -> Self {
        Expr::Conjunction { left: Box::new(self), right: Box::new(right) }
    }

    pub fn or(self, right: Expr) -> Self {
        Expr::Disjunction { left: Box::new(self), right: Box::new(right) }
    }

    pub fn negate(self) -> Self {
        Expr::Negation { inner: Box::new(self) }
    }

    pub fn is_satisfied_by(&self, issue: &Issue, ctx: &FilterContext<'_>) -> bool {
        self.matcher(ctx).matches(issue)
    }

    /// Builds every qualifier's predicate against `ctx` once, for testing many issues.
    pub fn matcher<'a>(&self, ctx: &FilterContext<'a>) -> Matcher<'a> {
        match self {
            Expr::Qualifier { name, content } => Matcher::Leaf(qualifier::predicate(name, content, *ctx)),
            Expr::Conjunction { left, right } => Matcher::And(Box::new(left.matcher(ctx)), Box::new(right.matcher(ctx))),
            Expr::Disjunction { left, right } => Matcher::Or(Box::new(left.matcher(ctx)), Box::new(right.matcher(ctx))),
            Expr::Negation { inner } => Matcher::Not(Box::new(inner.matcher(ctx))),
            Expr::Empty => Matcher::Leaf(Predicate::All),
        }
    }

    /// Whether the filter can be applied to an issue, e.g. to fill in a new issue from the filter
    /// of the panel it is created in.
    pub fn can_apply(&self) -> bool {
        match self {
            Expr::Qualifier { name, content } => QualifierKind::lookup(name).is_some_and(|kind| kind.can_apply(content)),
            Expr::Conjunction { left, right } => left.can_apply() && right.can_apply(),
            Expr::Disjunction { .. } | Expr::Negation { .. } | Expr::Empty => false,
        }
    }

    /// Modifies `issue` so that it satisfies the filter.
    ///
    /// # Panics
    ///
    /// If `can_apply` is false.
    pub fn apply_to(&self, issue: &mut Issue, ctx: &FilterContext<'_>) {
        assert!(self.can_apply(), "filter `{self}` cannot be applied to an issue");
        match self {
            Expr::Qualifier { name, content } => {
                if let Some(kind) = QualifierKind::lookup(name) {
                    kind.apply(content, issue, ctx);
                }
            },
            Expr::Conjunction { left, right } => {
                left.apply_to(issue, ctx);
                right.apply_to(issue, ctx);
            },
            Expr::Disjunction { .. } | Expr::Negation { .. } | Expr::Empty => {},
        }
    }

    /// All qualifier leaves as `(name, content)`, left to right.
    pub fn qualifiers(&self) -> Vec<(&str, &str)> {
        self.collect_qualifiers(true)
    }

    /// Qualifier leaves joined to the root by conjunctions only.
    pub fn top_level_qualifiers(&self) -> Vec<(&str, &str)> {
        self.collect_qualifiers(false)
    }

    fn collect_qualifiers(&self, descend: bool) -> Vec<(&str, &str)> {
        let mut found = Vec::new();
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            match expr {
                Expr::Qualifier { name, content } => found.push((name.as_str(), content.as_str())),
                Expr::Conjunction { left, right } => {
                    stack.push(right);
                    stack.push(left);
                },
                Expr::Disjunction { left, right } if descend => {
                    stack.push(right);
                    stack.push(left);
                },
                Expr::Negation { inner } if descend => stack.push(inner),
                _ => {},
            }
        }
        found
    }
}

/// An expression whose qualifiers are bound to a context.
pub enum Matcher<'a> {
    Leaf(Predicate<'a>),
    And(Box<Matcher<'a>>, Box<Matcher<'a>>),
    Or(Box<Matcher<'a>>, Box<Matcher<'a>>),
    Not(Box<Matcher<'a>>),
}

impl Matcher<'_> {
    pub fn matches(&self, issue: &Issue) -> bool {
        match self {
            Matcher::Leaf(predicate) => predicate.test(issue),
            Matcher::And(left, right) => left.matches(issue) && right.matches(issue),
            Matcher::Or(left, right) => left.matches(issue) || right.matches(issue),
            Matcher::Not(inner) => !inner.matches(issue),
        }
    }
}

impl Expr {
    /// Binding strength when printed: OR, then AND, then everything else.
    fn precedence(&self) -> u8 {
        match self {
            Expr::Disjunction { .. } => 0,
            Expr::Conjunction { .. } => 1,
            _ => 2,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter, min_precedence: u8) -> Result<(), fmt::Error> {
        if self.precedence() < min_precedence {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

/// Canonical text form. Compiling the text of a parsed expression yields an equal expression.
///
/// Operator chains print flat, `a b || c`, since both operators associate to the left. Parens
/// appear only where the tree differs from what precedence alone would build.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            Expr::Qualifier { name, content } if name == "keyword" => {
                if Scanner::is_bare_word(content) {
                    write!(f, "{}", content)
                } else {
                    write!(f, "\"{}\"", content)
                }
            },
            Expr::Qualifier { name, content } => {
                if content.is_empty() || !content.chars().all(Scanner::is_content_char) {
                    write!(f, "{}:\"{}\"", name, content)
                } else {
                    write!(f, "{}:{}", name, content)
                }
            },
            Expr::Conjunction { left, right } => {
                left.fmt_operand(f, 1)?;
                write!(f, " ")?;
                right.fmt_operand(f, 2)
            },
            Expr::Disjunction { left, right } => {
                left.fmt_operand(f, 0)?;
                write!(f, " || ")?;
                right.fmt_operand(f, 1)
            },
            Expr::Negation { inner } => {
                write!(f, "~")?;
                inner.fmt_operand(f, 2)
            },
            Expr::Empty => Ok(()),
        }
    }
}
