use std::hash::{DefaultHasher, Hash, Hasher};

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use issue_filter::{compile, evaluate, Expr, FilterContext, Issue};

const NAMES: &[&str] = &["keyword", "title", "label", "milestone", "assignee", "author", "is", "id", "colour"];

fn leaf() -> impl Strategy<Value = Expr> {
    (prop::sample::select(NAMES), "[a-z0-9 .+<>=:-]{0,8}").prop_map(|(name, content)| Expr::qualifier(name, content))
}

fn expr() -> impl Strategy<Value = Expr> {
    leaf().prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| l.and(r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| l.or(r)),
            inner.prop_map(Expr::negate),
        ]
    })
}

fn hash(expr: &Expr) -> u64 {
    let mut hasher = DefaultHasher::new();
    expr.hash(&mut hasher);
    hasher.finish()
}

fn issues() -> Vec<Issue> {
    (1..=6)
        .map(|id| Issue {
            id,
            title: format!("title {id}"),
            body: String::new(),
            author: "alice".to_string(),
            assignee: None,
            labels: vec![format!("l{id}")],
            milestone: None,
            is_open: id % 2 == 0,
            is_pull_request: false,
            is_merged: false,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            comment_count: 0,
        })
        .collect()
}

proptest! {
    #[test]
    fn printed_expression_compiles_to_itself(expr in expr()) {
        let text = expr.to_string();
        let (compiled, diagnostics) = compile(&text);
        prop_assert!(
            diagnostics.iter().all(|d| d.kind != issue_filter::DiagnosticKind::Syntax),
            "{text}: {diagnostics:?}"
        );
        prop_assert_eq!(compiled, expr);
    }

    #[test]
    fn structurally_equal_trees_hash_alike(expr in expr()) {
        let copy = expr.clone();
        prop_assert_eq!(hash(&expr), hash(&copy));
        prop_assert_eq!(&expr, &copy);
        prop_assert_ne!(expr.clone().negate(), expr);
    }

    #[test]
    fn negation_complements_matches(expr in expr()) {
        let issues = issues();
        let ctx = FilterContext::new(&issues);
        for issue in &issues {
            prop_assert_ne!(expr.is_satisfied_by(issue, &ctx), expr.clone().negate().is_satisfied_by(issue, &ctx));
        }
    }

    #[test]
    fn can_apply_rejects_disjunction_and_negation(left in expr(), right in expr()) {
        prop_assert!(!left.clone().or(right.clone()).can_apply());
        prop_assert!(!left.clone().negate().can_apply());
        prop_assert_eq!(left.clone().and(right.clone()).can_apply(), left.can_apply() && right.can_apply());
    }

    #[test]
    fn compiling_never_panics(text in "\\PC{0,40}") {
        let issues = issues();
        let (expr, _) = compile(&text);
        let found = evaluate(&expr, &FilterContext::new(&issues));
        prop_assert!(found.len() <= issues.len());
    }
}
