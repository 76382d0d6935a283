//! Relative milestone references.
//!
//! `current` (or `curr`) names the milestone at the context's current index; `current+N` and
//! `current-N` name the milestones N places after or before it in the ordered sequence.

use chrono::NaiveDate;

use crate::model::Milestone;

const ALIASES: [&str; 2] = ["current", "curr"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasResolution {
    /// The content is an ordinary milestone title.
    NotAlias,
    /// Index into the milestone sequence.
    Resolved(usize),
    /// An alias that names no milestone. Such filters match nothing.
    Unresolved,
}

/// How milestone content reads before any milestone is consulted.
enum AliasSyntax {
    NotAlias,
    Offset(i64),
    Malformed,
}

fn alias_syntax(content: &str) -> AliasSyntax {
    let lowered = content.to_ascii_lowercase();
    let Some(rest) = ALIASES.iter().find_map(|alias| lowered.strip_prefix(alias)) else {
        return AliasSyntax::NotAlias
    };

    match rest.chars().next() {
        None => AliasSyntax::Offset(0),
        Some(sign @ ('+' | '-')) => match parse_offset(&rest[1..]) {
            Some(n) if sign == '-' => AliasSyntax::Offset(-n),
            Some(n) => AliasSyntax::Offset(n),
            None => AliasSyntax::Malformed,
        },
        // e.g. `currency`
        Some(_) => AliasSyntax::NotAlias,
    }
}

/// True for an alias with a broken offset, e.g. `current+abc` or `curr-`.
pub fn is_malformed_alias(content: &str) -> bool {
    matches!(alias_syntax(content), AliasSyntax::Malformed)
}

/// Resolves `content` against a sequence of `len` milestones whose current one is at `current`.
pub fn resolve_alias(content: &str, len: usize, current: Option<usize>) -> AliasResolution {
    let offset = match alias_syntax(content) {
        AliasSyntax::NotAlias => return AliasResolution::NotAlias,
        AliasSyntax::Malformed => return AliasResolution::Unresolved,
        AliasSyntax::Offset(offset) => offset,
    };

    let Some(current) = current else {
        return AliasResolution::Unresolved
    };
    let index = i64::try_from(current).ok().and_then(|c| c.checked_add(offset));
    match index.and_then(|i| usize::try_from(i).ok()) {
        Some(i) if i < len => AliasResolution::Resolved(i),
        _ => AliasResolution::Unresolved,
    }
}

fn parse_offset(digits: &str) -> Option<i64> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None
    }
    digits.parse().ok()
}

/// The conventional current milestone: the first open milestone due on or after `today`.
pub fn current_milestone_index(milestones: &[Milestone], today: NaiveDate) -> Option<usize> {
    milestones
        .iter()
        .position(|m| m.is_open && m.due_date.is_some_and(|due| due >= today))
}
