//! Evaluation of a compiled filter over the issues of a context: match, then sort, then truncate.

use std::cmp::Ordering;
use std::str::FromStr;

use strum::VariantNames;

use crate::content::parse_integer;
use crate::context::FilterContext;
use crate::expr::Expr;
use crate::model::Issue;
use crate::qualifier::{QualifierKind, SemanticError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::EnumString, strum_macros::VariantNames)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortField {
    Id,
    Title,
    Comments,
    Created,
    Updated,
    /// Position in the milestone sequence; issues without a milestone last.
    Milestone,
    Assignee,
    /// Merged pull requests first.
    Merged,
    /// Everything but merged pull requests first.
    Unmerged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl SortKey {
    fn compare(&self, a: &Issue, b: &Issue, ctx: &FilterContext<'_>) -> Ordering {
        let ordering = match self.field {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortField::Comments => a.comment_count.cmp(&b.comment_count),
            SortField::Created => a.created_at.cmp(&b.created_at),
            SortField::Updated => a.updated_at.cmp(&b.updated_at),
            SortField::Milestone => {
                let position = |issue: &Issue| issue.milestone.and_then(|id| ctx.milestone_position(id));
                last_if_none(position(a), position(b))
            },
            SortField::Assignee => {
                let assignee = |issue: &Issue| issue.assignee.as_ref().map(|login| login.to_lowercase());
                last_if_none(assignee(a), assignee(b))
            },
            SortField::Merged => b.is_merged.cmp(&a.is_merged),
            SortField::Unmerged => a.is_merged.cmp(&b.is_merged),
        };
        if self.descending { ordering.reverse() } else { ordering }
    }
}

fn last_if_none<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Parses `sort:` content: comma-separated fields, each optionally prefixed by `-` for
/// descending order.
pub fn parse_sort_keys(content: &str) -> Result<Vec<SortKey>, SemanticError> {
    content
        .split(',')
        .map(|key| {
            let key = key.trim();
            let (name, descending) = match key.strip_prefix('-') {
                Some(name) => (name, true),
                None => (key, false),
            };
            SortField::from_str(name)
                .map(|field| SortKey { field, descending })
                .map_err(|_| SemanticError::UnknownSortKey {
                    key: key.to_string(),
                    expected: SortField::VARIANTS.join(", "),
                })
        })
        .collect()
}

/// Runs the filter over the context's issues. Matching issues keep their source order unless a
/// `sort:` qualifier reorders them; a single top-level `count:` qualifier then truncates.
pub fn evaluate<'a>(expr: &Expr, ctx: &FilterContext<'a>) -> Vec<&'a Issue> {
    let matcher = expr.matcher(ctx);
    let mut matched: Vec<&'a Issue> = ctx.issues().iter().filter(|issue| matcher.matches(issue)).collect();
    let total = matched.len();

    if let Some(keys) = sort_keys(expr) {
        matched.sort_by(|a, b| {
            keys.iter()
                .map(|key| key.compare(a, b, ctx))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });
    }

    if let Some(limit) = count_limit(expr) {
        matched.truncate(limit);
    }

    tracing::trace!(issues = ctx.issues().len(), matched = total, shown = matched.len(), "evaluated filter");
    matched
}

/// Keys of the first `sort:` qualifier with valid content, wherever it appears.
pub fn sort_keys(expr: &Expr) -> Option<Vec<SortKey>> {
    expr.qualifiers()
        .into_iter()
        .filter(|(name, _)| QualifierKind::lookup(name) == Some(QualifierKind::Sort))
        .find_map(|(_, content)| parse_sort_keys(content).ok())
}

/// The truncation limit, present only if exactly one top-level `count:` qualifier holds a
/// non-negative integer.
pub fn count_limit(expr: &Expr) -> Option<usize> {
    let counts: Vec<&str> = expr
        .top_level_qualifiers()
        .into_iter()
        .filter(|(name, _)| QualifierKind::lookup(name) == Some(QualifierKind::Count))
        .map(|(_, content)| content)
        .collect();

    match counts.as_slice() {
        [content] => parse_integer(content).and_then(|n| usize::try_from(n).ok()),
        _ => None,
    }
}
