use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of toggling one uid in a group's membership list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipChange {
    Added,
    Removed,
    /// Already in the requested state, nothing was written
    Unchanged,
}

/// How a multi-step workflow reacts to a failed step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CascadePolicy {
    /// Run every step and record failures
    #[default]
    BestEffort,
    /// Stop at the first failure and leave the main entry untouched
    StopOnFailure,
}

/// One side effect of a member workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CascadeAction {
    JoinGroup { group: String },
    LeaveGroup { group: String },
    RemoveMaildrop { alias_dn: String },
    DeleteAlias { alias_dn: String },
    DeleteEntry { dn: String },
}

impl fmt::Display for CascadeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CascadeAction::JoinGroup { group } => write!(f, "join group {group}"),
            CascadeAction::LeaveGroup { group } => write!(f, "leave group {group}"),
            CascadeAction::RemoveMaildrop { alias_dn } => write!(f, "remove maildrop from {alias_dn}"),
            CascadeAction::DeleteAlias { alias_dn } => write!(f, "delete alias {alias_dn}"),
            CascadeAction::DeleteEntry { dn } => write!(f, "delete entry {dn}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    Applied,
    Unchanged,
    Skipped,
    Failed { error: String },
}

impl StepOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }
}

impl From<MembershipChange> for StepOutcome {
    fn from(change: MembershipChange) -> Self {
        match change {
            MembershipChange::Added | MembershipChange::Removed => StepOutcome::Applied,
            MembershipChange::Unchanged => StepOutcome::Unchanged,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeStep {
    pub action: CascadeAction,
    pub outcome: StepOutcome,
}

/// Per-step outcome list of a member workflow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeReport {
    /// Uid the workflow acted on
    pub subject: String,
    pub steps: Vec<CascadeStep>,
}

impl CascadeReport {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            steps: Vec::new(),
        }
    }

    pub fn record(&mut self, action: CascadeAction, outcome: StepOutcome) {
        self.steps.push(CascadeStep { action, outcome });
    }

    pub fn failures(&self) -> impl Iterator<Item = &CascadeStep> {
        self.steps.iter().filter(|s| s.outcome.is_failure())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Every recorded step either applied or was already in place
    pub fn is_complete(&self) -> bool {
        self.steps
            .iter()
            .all(|s| matches!(s.outcome, StepOutcome::Applied | StepOutcome::Unchanged))
    }

    pub fn outcome_of(&self, action: &CascadeAction) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|s| &s.action == action)
            .map(|s| &s.outcome)
    }
}
