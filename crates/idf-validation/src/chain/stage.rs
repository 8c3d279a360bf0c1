//! Lifecycle of one chain validation

use std::fmt;

/// Where a validation currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Unvalidated,
    /// Every path id parsed
    FormatChecked,
    /// Chain resolved and owned by the principal
    OwnershipChecked,
    Authorized,
    Rejected,
}

impl Stage {
    /// All stages
    pub const ALL: [Stage; 5] = [
        Stage::Unvalidated,
        Stage::FormatChecked,
        Stage::OwnershipChecked,
        Stage::Authorized,
        Stage::Rejected,
    ];

    /// No transition leaves this stage
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Authorized | Stage::Rejected)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Unvalidated => "unvalidated",
            Stage::FormatChecked => "format-checked",
            Stage::OwnershipChecked => "ownership-checked",
            Stage::Authorized => "authorized",
            Stage::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Attempted to move between stages that are not connected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal stage transition: {from} -> {to}")]
pub struct IllegalTransition {
    pub from: Stage,
    pub to: Stage,
}

/// Validate a stage transition
pub fn validate_transition(from: Stage, to: Stage) -> Result<(), IllegalTransition> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(IllegalTransition { from, to })
    }
}

/// Stages reachable in one step from `from`
#[must_use]
pub fn allowed_transitions(from: Stage) -> &'static [Stage] {
    use Stage::{Authorized, FormatChecked, OwnershipChecked, Rejected, Unvalidated};
    match from {
        Unvalidated => &[FormatChecked, Rejected],
        FormatChecked => &[OwnershipChecked, Rejected],
        OwnershipChecked => &[Authorized],
        Authorized | Rejected => &[],
    }
}
