use chrono::{DateTime, Utc};

use crate::model::{Issue, Label, Milestone, Snapshot, User};

/// Supplies the plain data filters are evaluated against.
pub trait IssueSource {
    fn issues(&self) -> &[Issue];

    /// The ordered milestone sequence and the index of the current milestone within it.
    fn milestones(&self) -> (&[Milestone], Option<usize>);

    fn labels(&self) -> &[Label];

    fn collaborators(&self) -> &[User];
}

impl IssueSource for Snapshot {
    fn issues(&self) -> &[Issue] {
        &self.issues
    }

    fn milestones(&self) -> (&[Milestone], Option<usize>) {
        (&self.milestones, self.current_milestone)
    }

    fn labels(&self) -> &[Label] {
        &self.labels
    }

    fn collaborators(&self) -> &[User] {
        &self.collaborators
    }
}

/// Read-only view of everything a filter may consult while it is evaluated.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    issues: &'a [Issue],
    milestones: &'a [Milestone],
    current_milestone: Option<usize>,
    labels: &'a [Label],
    collaborators: &'a [User],
    now: DateTime<Utc>,
}

impl<'a> FilterContext<'a> {
    pub fn new(issues: &'a [Issue]) -> Self {
        FilterContext {
            issues,
            milestones: &[],
            current_milestone: None,
            labels: &[],
            collaborators: &[],
            now: Utc::now(),
        }
    }

    pub fn from_source<S: IssueSource + ?Sized>(source: &'a S, now: DateTime<Utc>) -> Self {
        let (milestones, current) = source.milestones();
        FilterContext::new(source.issues())
            .with_milestones(milestones, current)
            .with_labels(source.labels())
            .with_collaborators(source.collaborators())
            .at(now)
    }

    pub fn with_milestones(mut self, milestones: &'a [Milestone], current: Option<usize>) -> Self {
        self.milestones = milestones;
        self.current_milestone = current;
        self
    }

    pub fn with_labels(mut self, labels: &'a [Label]) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_collaborators(mut self, collaborators: &'a [User]) -> Self {
        self.collaborators = collaborators;
        self
    }

    /// Sets the instant relative date qualifiers are measured from.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn issues(&self) -> &'a [Issue] {
        self.issues
    }

    pub fn milestones(&self) -> &'a [Milestone] {
        self.milestones
    }

    pub fn current_milestone(&self) -> Option<usize> {
        self.current_milestone
    }

    pub fn labels(&self) -> &'a [Label] {
        self.labels
    }

    pub fn collaborators(&self) -> &'a [User] {
        self.collaborators
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn milestone_by_id(&self, id: u64) -> Option<&'a Milestone> {
        self.milestones.iter().find(|m| m.id == id)
    }

    /// Position of a milestone in the ordered sequence.
    pub fn milestone_position(&self, id: u64) -> Option<usize> {
        self.milestones.iter().position(|m| m.id == id)
    }

    pub fn collaborator(&self, login: &str) -> Option<&'a User> {
        self.collaborators.iter().find(|u| u.login.eq_ignore_ascii_case(login))
    }
}
