use chrono::{DateTime, TimeZone, Utc};

use issue_filter::{
    compile, evaluate, has_errors, has_semantic_error, render_diagnostics, DiagnosticKind, Expr, FilterContext, Issue, Label,
    Milestone, Snapshot, User,
};

fn at(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, 12, 0, 0).unwrap()
}

/// Ten issues titled "Issue 1" to "Issue 10". Issues 1 to 4 sit on milestones v0.1 to v0.4, the
/// current one being v0.2. Issues 3 and 5 are merged pull requests.
fn snapshot() -> Snapshot {
    let issues = (1..=10)
        .map(|id| Issue {
            id,
            title: format!("Issue {id}"),
            body: if id % 2 == 0 { "crash on start".to_string() } else { String::new() },
            author: if id <= 5 { "alice" } else { "bob" }.to_string(),
            assignee: (id == 7).then(|| "carol".to_string()),
            labels: match id {
                1 => vec!["type.bug".to_string()],
                2 => vec!["type.feature".to_string(), "priority-high".to_string()],
                _ => vec![],
            },
            milestone: (id <= 4).then_some(id),
            is_open: id != 10,
            is_pull_request: id == 3 || id == 5,
            is_merged: id == 3 || id == 5,
            created_at: at(1, id as u32),
            updated_at: at(1, 20 + id as u32),
            comment_count: (id * 3 % 7) as u32,
        })
        .collect();
    let milestones = (1..=4)
        .map(|id| Milestone { id, title: format!("v0.{id}"), due_date: None, is_open: true })
        .collect();

    Snapshot {
        issues,
        milestones,
        current_milestone: Some(1),
        labels: vec![Label::new("type.bug"), Label::new("type.feature"), Label::new("priority-high")],
        collaborators: vec![User { login: "carol".to_string(), name: Some("Carol Jones".to_string()) }],
    }
}

fn run(snapshot: &Snapshot, filter: &str) -> (Vec<String>, Vec<issue_filter::Diagnostic>) {
    let (expr, diagnostics) = compile(filter);
    let ctx = FilterContext::from_source(snapshot, at(2, 1));
    let titles = evaluate(&expr, &ctx).into_iter().map(|issue| issue.title.clone()).collect();
    (titles, diagnostics)
}

fn titles(ids: &[u64]) -> Vec<String> {
    ids.iter().map(|id| format!("Issue {id}")).collect()
}

#[test]
fn syntax_error_matches_everything() {
    let snapshot = snapshot();
    let (found, diagnostics) = run(&snapshot, "milestone:");
    assert_eq!(found.len(), 10);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::Syntax);
    assert!(has_errors(&diagnostics));
    assert!(!has_semantic_error(&diagnostics));
}

#[test]
fn invalid_content_matches_everything() {
    let snapshot = snapshot();
    let (found, diagnostics) = run(&snapshot, "id:buggy");
    assert_eq!(found.len(), 10);
    assert!(has_semantic_error(&diagnostics));

    let (found, diagnostics) = run(&snapshot, "colour:red label:type.bug");
    assert_eq!(found, titles(&[1]));
    assert!(has_semantic_error(&diagnostics));
}

#[test]
fn milestone_aliases() {
    let snapshot = snapshot();
    let cases = vec![
        ("milestone:current", titles(&[2])),
        ("milestone:curr", titles(&[2])),
        ("milestone:CURRENT", titles(&[2])),
        ("milestone:current-1", titles(&[1])),
        ("milestone:curr+1", titles(&[3])),
        ("milestone:current+2", titles(&[4])),
        ("milestone:current+3", titles(&[])),
        ("milestone:current-2", titles(&[])),
        ("milestone:currency", titles(&[])),
        ("milestone:v0.3", titles(&[3])),
        ("milestone:current | milestone:v0.4", titles(&[2, 4])),
        ("~milestone:current+9", titles(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10])),
    ];

    for (filter, expected) in cases {
        let (found, diagnostics) = run(&snapshot, filter);
        assert_eq!(found, expected, "filter: {filter}");
        assert!(diagnostics.is_empty(), "filter: {filter}, diagnostics: {diagnostics:?}");
    }
}

#[test]
fn malformed_milestone_alias_is_reported() {
    let snapshot = snapshot();
    for filter in ["milestone:current+x", "milestone:current+", "milestone:curr-+1"] {
        let (found, diagnostics) = run(&snapshot, filter);
        assert!(found.is_empty(), "filter: {filter}");
        assert_eq!(diagnostics.len(), 1, "filter: {filter}");
        assert_eq!(diagnostics[0].kind, DiagnosticKind::Semantic);
    }

    // out of range depends on the snapshot, so it stays silent
    let (found, diagnostics) = run(&snapshot, "milestone:current+7");
    assert!(found.is_empty());
    assert!(diagnostics.is_empty());
}

#[test]
fn milestone_aliases_without_current() {
    let mut snapshot = snapshot();
    snapshot.current_milestone = None;
    assert!(run(&snapshot, "milestone:current").0.is_empty());
    assert_eq!(run(&snapshot, "milestone:v0.1").0, titles(&[1]));
}

#[test]
fn count_truncates() {
    let snapshot = snapshot();
    let cases = vec![
        ("count:7", 7, false),
        ("count:10", 10, false),
        ("count:0", 0, false),
        ("count:15", 10, false),
        ("count:6 count:9", 10, false),
        ("count:abcd", 10, true),
        ("count:-1", 10, false),
        ("count:3 | is:open", 10, false),
        ("is:open count:3", 3, false),
    ];

    for (filter, expected, semantic_error) in cases {
        let (found, diagnostics) = run(&snapshot, filter);
        assert_eq!(found.len(), expected, "filter: {filter}");
        assert_eq!(has_semantic_error(&diagnostics), semantic_error, "filter: {filter}");
    }
    assert_eq!(run(&snapshot, "count:3").0, titles(&[1, 2, 3]));
}

#[test]
fn sort_happens_before_count() {
    let snapshot = snapshot();
    let expected = titles(&[1, 2, 4, 6, 7, 8, 9, 10]);
    assert_eq!(run(&snapshot, "count:8 sort:unmerged").0, expected);
    assert_eq!(run(&snapshot, "sort:unmerged count:8").0, expected);

    assert_eq!(run(&snapshot, "sort:merged count:3").0, titles(&[3, 5, 1]));
    assert_eq!(run(&snapshot, "sort:-id count:2").0, titles(&[10, 9]));
    assert_eq!(run(&snapshot, "sort:-milestone has:milestone").0, titles(&[4, 3, 2, 1]));
    assert_eq!(run(&snapshot, "sort:colour sort:-id count:1").0, titles(&[10]));
}

#[test]
fn qualifiers_select_issues() {
    let snapshot = snapshot();
    let cases = vec![
        ("crash", vec![2, 4, 6, 8, 10]),
        ("\"Issue 1\"", vec![1, 10]),
        ("title:\"issue 1\" ~id:10", vec![1]),
        ("id:>8", vec![9, 10]),
        ("id:3..5", vec![3, 4, 5]),
        ("label:bug", vec![1]),
        ("label:type.feature", vec![2]),
        ("label:high", vec![2]),
        ("no:label id:<=3", vec![3]),
        ("author:bob is:closed", vec![10]),
        ("assignee:carol", vec![7]),
        ("assignee:\"Carol Jones\"", vec![7]),
        ("involves:carol | involves:alice id:>4", vec![5, 7]),
        ("is:pr", vec![3, 5]),
        ("is:merged", vec![3, 5]),
        ("type:issue id:<=3", vec![1, 2]),
        ("state:closed", vec![10]),
        ("created:<2024-01-03", vec![1, 2]),
        ("created:2024-01-05", vec![5]),
        ("updated:>2024-01-29", vec![10]),
        ("updated:<80", vec![9, 10]),
        ("not (is:open and label:bug) id:<3", vec![2]),
    ];

    for (filter, ids) in cases {
        let (found, diagnostics) = run(&snapshot, filter);
        assert_eq!(found, titles(&ids), "filter: {filter}");
        assert!(diagnostics.is_empty(), "filter: {filter}, diagnostics: {diagnostics:?}");
    }
}

#[test]
fn negated_post_processing_qualifiers_match_nothing() {
    let snapshot = snapshot();
    assert!(run(&snapshot, "~count:3").0.is_empty());
    assert!(run(&snapshot, "~sort:id").0.is_empty());
}

#[test]
fn apply_filter_to_new_issue() {
    let snapshot = snapshot();
    let ctx = FilterContext::from_source(&snapshot, at(2, 1));
    let (expr, _) = compile("milestone:current+1 label:TYPE.BUG label:priority-high assignee:\"carol jones\" is:closed");
    assert!(expr.can_apply());

    let mut issue = snapshot.issues[5].clone();
    expr.apply_to(&mut issue, &ctx);

    assert_eq!(issue.milestone, Some(3));
    assert_eq!(issue.labels, vec!["type.bug".to_string(), "priority-high".to_string()]);
    assert_eq!(issue.assignee.as_deref(), Some("carol"));
    assert!(!issue.is_open);
    assert!(expr.is_satisfied_by(&issue, &ctx));

    // exclusive groups keep a single label
    compile("label:type.feature").0.apply_to(&mut issue, &ctx);
    assert_eq!(issue.labels, vec!["priority-high".to_string(), "type.feature".to_string()]);

    assert!(!compile("label:a | label:b").0.can_apply());
    assert!(!compile("~label:a").0.can_apply());
    assert!(!compile("label:a count:3").0.can_apply());
    assert!(!compile("is:pr").0.can_apply());
}

#[test]
fn rendered_diagnostics_name_the_problem() {
    let (_, diagnostics) = compile("label:a (milestone:");
    let report = render_diagnostics("label:a (milestone:", &diagnostics, false);
    assert!(report.contains("Expected content after 'milestone:'"), "{report}");

    let (_, diagnostics) = compile("id:buggy");
    let report = render_diagnostics("id:buggy", &diagnostics, false);
    assert!(report.contains("'id' expects"), "{report}");

    assert_eq!(render_diagnostics("label:a", &[], false), "");
}

#[test]
fn empty_filter_keeps_source_order() {
    let snapshot = snapshot();
    let (expr, diagnostics) = compile("   ");
    assert_eq!(expr, Expr::Empty);
    assert!(diagnostics.is_empty());
    assert_eq!(run(&snapshot, "").0, titles(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]));
}
