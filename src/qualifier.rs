//! The qualifier registry: what each `name:content` term means.
//!
//! Every qualifier name maps to the content it expects and to a predicate over issues. Content
//! that fails validation never breaks evaluation: the predicate falls back to matching every
//! issue, except for milestone aliases that name no milestone, which match none.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use strum::VariantNames;

use crate::content::{DateCondition, parse_comparison, parse_integer};
use crate::context::FilterContext;
use crate::milestone::{AliasResolution, is_malformed_alias, resolve_alias};
use crate::model::{Issue, Label};
use crate::pipeline::parse_sort_keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum QualifierKind {
    Id,
    Keyword,
    Title,
    #[strum(to_string = "body", serialize = "desc", serialize = "description")]
    Body,
    #[strum(to_string = "milestone", serialize = "milestones")]
    Milestone,
    #[strum(to_string = "label", serialize = "labels")]
    Label,
    #[strum(to_string = "assignee", serialize = "assignees", serialize = "as")]
    Assignee,
    #[strum(to_string = "author", serialize = "creator")]
    Author,
    #[strum(to_string = "involves", serialize = "user")]
    Involves,
    State,
    Type,
    Is,
    Has,
    No,
    Created,
    Updated,
    Sort,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::EnumString, strum_macros::VariantNames)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
enum StateValue {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::EnumString, strum_macros::VariantNames)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
enum TypeValue {
    Issue,
    #[strum(to_string = "pr", serialize = "pullrequest")]
    Pr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::EnumString, strum_macros::VariantNames)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
enum IsValue {
    Open,
    Closed,
    Issue,
    #[strum(to_string = "pr", serialize = "pullrequest")]
    Pr,
    Merged,
    Unmerged,
}

/// Issue attributes `has:` and `no:` test for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::EnumString, strum_macros::VariantNames)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
enum Field {
    Label,
    Milestone,
    Assignee,
}

/// The kind of content a qualifier expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Integer,
    IntegerComparison,
    DateComparison,
    Choice(&'static [&'static str]),
    SortKeys,
    /// A milestone title, or `current`/`curr` with an optional `+N`/`-N` offset.
    Milestone,
    Identifier,
    Text,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            ContentType::Integer => write!(f, "an integer"),
            ContentType::IntegerComparison => write!(f, "a number, comparison or range such as '>5' or '2..7'"),
            ContentType::DateComparison => write!(f, "a date (YYYY-MM-DD), date comparison, date range or age in hours"),
            ContentType::Choice(values) => write!(f, "one of {}", values.join(", ")),
            ContentType::SortKeys => write!(f, "comma-separated sort keys"),
            ContentType::Milestone => write!(f, "a milestone title or current[+N|-N]"),
            ContentType::Identifier => write!(f, "a name"),
            ContentType::Text => write!(f, "text"),
        }
    }
}

/// Content a qualifier cannot make sense of. The qualifier still compiles and matches every
/// issue, except a malformed milestone alias, which matches none.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SemanticError {
    #[error("Unknown qualifier '{0}'")]
    UnknownQualifier(String),
    #[error("'{qualifier}' expects {expected}, found '{content}'")]
    InvalidContent {
        qualifier: QualifierKind,
        content: String,
        expected: ContentType,
    },
    #[error("Unknown sort key '{key}', expected one of {expected}")]
    UnknownSortKey { key: String, expected: String },
}

/// Checks a qualifier's name and content.
pub fn validate(name: &str, content: &str) -> Result<QualifierKind, SemanticError> {
    let kind = QualifierKind::lookup(name).ok_or_else(|| SemanticError::UnknownQualifier(name.to_string()))?;
    kind.validate(content)?;
    Ok(kind)
}

/// A per-issue test produced by a qualifier.
pub enum Predicate<'a> {
    All,
    Nothing,
    Test(Box<dyn Fn(&Issue) -> bool + 'a>),
}

impl Predicate<'_> {
    pub fn test(&self, issue: &Issue) -> bool {
        match self {
            Predicate::All => true,
            Predicate::Nothing => false,
            Predicate::Test(test) => test(issue),
        }
    }
}

fn check<'a>(f: impl Fn(&Issue) -> bool + 'a) -> Predicate<'a> {
    Predicate::Test(Box::new(f))
}

/// Builds the predicate of the qualifier `name:content`. Unknown names match every issue.
pub fn predicate<'a>(name: &str, content: &str, ctx: FilterContext<'a>) -> Predicate<'a> {
    match QualifierKind::lookup(name) {
        Some(kind) => kind.predicate(content, ctx),
        None => Predicate::All,
    }
}

impl QualifierKind {
    pub fn lookup(name: &str) -> Option<Self> {
        QualifierKind::from_str(name).ok()
    }

    pub fn content_type(self) -> ContentType {
        match self {
            QualifierKind::Id => ContentType::IntegerComparison,
            QualifierKind::Count => ContentType::Integer,
            QualifierKind::Created | QualifierKind::Updated => ContentType::DateComparison,
            QualifierKind::State => ContentType::Choice(StateValue::VARIANTS),
            QualifierKind::Type => ContentType::Choice(TypeValue::VARIANTS),
            QualifierKind::Is => ContentType::Choice(IsValue::VARIANTS),
            QualifierKind::Has | QualifierKind::No => ContentType::Choice(Field::VARIANTS),
            QualifierKind::Sort => ContentType::SortKeys,
            QualifierKind::Milestone => ContentType::Milestone,
            QualifierKind::Label
            | QualifierKind::Assignee
            | QualifierKind::Author
            | QualifierKind::Involves => ContentType::Identifier,
            QualifierKind::Keyword | QualifierKind::Title | QualifierKind::Body => ContentType::Text,
        }
    }

    pub fn validate(self, content: &str) -> Result<(), SemanticError> {
        let valid = match self.content_type() {
            ContentType::Integer => parse_integer(content).is_some(),
            ContentType::IntegerComparison => parse_comparison(content, parse_integer).is_some(),
            ContentType::DateComparison => DateCondition::parse(content).is_some(),
            ContentType::Choice(_) => match self {
                QualifierKind::State => StateValue::from_str(content).is_ok(),
                QualifierKind::Type => TypeValue::from_str(content).is_ok(),
                QualifierKind::Is => IsValue::from_str(content).is_ok(),
                _ => Field::from_str(content).is_ok(),
            },
            ContentType::SortKeys => return parse_sort_keys(content).map(drop),
            ContentType::Milestone => !is_malformed_alias(content),
            ContentType::Identifier | ContentType::Text => true,
        };

        if valid {
            Ok(())
        } else {
            Err(SemanticError::InvalidContent {
                qualifier: self,
                content: content.to_string(),
                expected: self.content_type(),
            })
        }
    }

    pub fn predicate<'a>(self, content: &str, ctx: FilterContext<'a>) -> Predicate<'a> {
        let needle = content.to_lowercase();
        match self {
            QualifierKind::Id => match parse_comparison(content, parse_integer) {
                Some(cmp) => check(move |issue| i64::try_from(issue.id).is_ok_and(|id| cmp.holds(&id))),
                None => Predicate::All,
            },
            QualifierKind::Keyword => check(move |issue| contains(&issue.title, &needle) || contains(&issue.body, &needle)),
            QualifierKind::Title => check(move |issue| contains(&issue.title, &needle)),
            QualifierKind::Body => check(move |issue| contains(&issue.body, &needle)),
            QualifierKind::Milestone => milestone_predicate(content, needle, ctx),
            QualifierKind::Label => check(move |issue| issue.labels.iter().any(|label| label_matches(label, &needle))),
            QualifierKind::Assignee => check(move |issue| {
                issue.assignee.as_deref().is_some_and(|login| user_matches(login, &needle, &ctx))
            }),
            QualifierKind::Author => check(move |issue| user_matches(&issue.author, &needle, &ctx)),
            QualifierKind::Involves => check(move |issue| {
                user_matches(&issue.author, &needle, &ctx)
                    || issue.assignee.as_deref().is_some_and(|login| user_matches(login, &needle, &ctx))
            }),
            QualifierKind::State => match StateValue::from_str(content) {
                Ok(StateValue::Open) => check(|issue| issue.is_open),
                Ok(StateValue::Closed) => check(|issue| !issue.is_open),
                Err(_) => Predicate::All,
            },
            QualifierKind::Type => match TypeValue::from_str(content) {
                Ok(TypeValue::Issue) => check(|issue| !issue.is_pull_request),
                Ok(TypeValue::Pr) => check(|issue| issue.is_pull_request),
                Err(_) => Predicate::All,
            },
            QualifierKind::Is => match IsValue::from_str(content) {
                Ok(IsValue::Open) => check(|issue| issue.is_open),
                Ok(IsValue::Closed) => check(|issue| !issue.is_open),
                Ok(IsValue::Issue) => check(|issue| !issue.is_pull_request),
                Ok(IsValue::Pr) => check(|issue| issue.is_pull_request),
                Ok(IsValue::Merged) => check(|issue| issue.is_pull_request && issue.is_merged),
                Ok(IsValue::Unmerged) => check(|issue| issue.is_pull_request && !issue.is_merged),
                Err(_) => Predicate::All,
            },
            QualifierKind::Has | QualifierKind::No => match Field::from_str(content) {
                Ok(field) => {
                    let wanted = self == QualifierKind::Has;
                    check(move |issue| has_field(issue, field) == wanted)
                },
                Err(_) => Predicate::All,
            },
            QualifierKind::Created => date_predicate(content, ctx, |issue| issue.created_at),
            QualifierKind::Updated => date_predicate(content, ctx, |issue| issue.updated_at),
            QualifierKind::Sort | QualifierKind::Count => Predicate::All,
        }
    }

    /// Whether `kind:content` can be applied to an issue being created or edited.
    pub fn can_apply(self, content: &str) -> bool {
        match self {
            QualifierKind::Label | QualifierKind::Milestone | QualifierKind::Assignee => true,
            QualifierKind::State => StateValue::from_str(content).is_ok(),
            QualifierKind::Is => matches!(IsValue::from_str(content), Ok(IsValue::Open | IsValue::Closed)),
            _ => false,
        }
    }

    /// Makes `issue` satisfy `kind:content`. Callers check `can_apply` first; other qualifiers
    /// leave the issue untouched.
    pub fn apply(self, content: &str, issue: &mut Issue, ctx: &FilterContext<'_>) {
        match self {
            QualifierKind::Label => apply_label(content, issue, ctx),
            QualifierKind::Milestone => apply_milestone(content, issue, ctx),
            QualifierKind::Assignee => {
                let login = ctx
                    .collaborators()
                    .iter()
                    .find(|user| {
                        user.login.eq_ignore_ascii_case(content)
                            || user.name.as_deref().is_some_and(|name| name.eq_ignore_ascii_case(content))
                    })
                    .map_or_else(|| content.to_string(), |user| user.login.clone());
                issue.assignee = Some(login);
            },
            QualifierKind::State | QualifierKind::Is => {
                if let Ok(state) = StateValue::from_str(content) {
                    issue.is_open = state == StateValue::Open;
                }
            },
            _ => {},
        }
    }
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// `needle` is lowercase. `group.` matches any label of the group, `group.name` labels of the
/// group whose name contains `name`, and a plain word the full name, the group or part of the
/// name.
fn label_matches(label: &str, needle: &str) -> bool {
    let label = label.to_lowercase();
    let (group, name, _) = Label::parts(&label);
    match needle.split_once('.') {
        Some((wanted_group, wanted_name)) => group == Some(wanted_group) && name.contains(wanted_name),
        None => label == needle || group == Some(needle) || name.contains(needle),
    }
}

/// `needle` is lowercase. Matches the login or the collaborator's display name.
fn user_matches(login: &str, needle: &str, ctx: &FilterContext<'_>) -> bool {
    contains(login, needle)
        || ctx
            .collaborator(login)
            .and_then(|user| user.name.as_deref())
            .is_some_and(|name| contains(name, needle))
}

fn has_field(issue: &Issue, field: Field) -> bool {
    match field {
        Field::Label => !issue.labels.is_empty(),
        Field::Milestone => issue.milestone.is_some(),
        Field::Assignee => issue.assignee.is_some(),
    }
}

fn milestone_predicate<'a>(content: &str, needle: String, ctx: FilterContext<'a>) -> Predicate<'a> {
    let milestones = ctx.milestones();
    match resolve_alias(content, milestones.len(), ctx.current_milestone()) {
        AliasResolution::Resolved(index) => match milestones.get(index) {
            Some(milestone) => {
                let id = milestone.id;
                check(move |issue| issue.milestone == Some(id))
            },
            None => Predicate::Nothing,
        },
        AliasResolution::Unresolved => {
            tracing::debug!(alias = content, current = ?ctx.current_milestone(), "milestone alias names no milestone");
            Predicate::Nothing
        },
        AliasResolution::NotAlias => check(move |issue| {
            issue
                .milestone
                .and_then(|id| ctx.milestone_by_id(id))
                .is_some_and(|milestone| contains(&milestone.title, &needle))
        }),
    }
}

fn date_predicate<'a>(content: &str, ctx: FilterContext<'a>, timestamp: fn(&Issue) -> DateTime<Utc>) -> Predicate<'a> {
    match DateCondition::parse(content) {
        Some(DateCondition::Date(cmp)) => check(move |issue| cmp.holds(&timestamp(issue).date_naive())),
        Some(DateCondition::AgeInHours(cmp)) => {
            let now = ctx.now();
            check(move |issue| cmp.holds(&(now - timestamp(issue)).num_hours()))
        },
        None => Predicate::All,
    }
}

fn apply_label(content: &str, issue: &mut Issue, ctx: &FilterContext<'_>) {
    let label = ctx
        .labels()
        .iter()
        .find(|label| label.name.eq_ignore_ascii_case(content))
        .map_or_else(|| content.to_string(), |label| label.name.clone());

    let (group, _, exclusive) = Label::parts(&label);
    if exclusive {
        issue.labels.retain(|other| {
            let (other_group, _, other_exclusive) = Label::parts(other);
            !(other_exclusive && other_group == group)
        });
    }
    if !issue.labels.contains(&label) {
        issue.labels.push(label);
    }
}

fn apply_milestone(content: &str, issue: &mut Issue, ctx: &FilterContext<'_>) {
    let milestones = ctx.milestones();
    let target = match resolve_alias(content, milestones.len(), ctx.current_milestone()) {
        AliasResolution::Resolved(index) => milestones.get(index),
        AliasResolution::Unresolved => None,
        AliasResolution::NotAlias => milestones
            .iter()
            .find(|m| m.title.eq_ignore_ascii_case(content))
            .or_else(|| milestones.iter().find(|m| contains(&m.title, &content.to_lowercase()))),
    };

    match target {
        Some(milestone) => issue.milestone = Some(milestone.id),
        None => tracing::warn!(milestone = content, issue = issue.id, "no such milestone, issue left unchanged"),
    }
}
