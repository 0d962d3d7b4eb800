//! Enumeration types for the Delve simulation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The two sequential phases of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Locate phase: reach the hidden target using only local information.
    Find,
    /// Escape phase: reach the exit within the step budget, collecting rewards.
    Flee,
}

impl Phase {
    /// Lowercase label used in logs and presentation notifications.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Find => "find",
            Self::Flee => "flee",
        }
    }
}

impl core::fmt::Display for Phase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// PhaseOutcome
// ---------------------------------------------------------------------------

/// Terminal classification of a single phase.
///
/// Exactly one outcome is recorded per phase and it never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhaseOutcome {
    /// The policy returned while standing on the phase goal.
    Succeeded,
    /// The policy returned somewhere other than the phase goal.
    WrongEndLocation,
    /// The policy returned an error or panicked.
    RuntimeFault {
        /// Diagnostic detail taken from the error or panic payload.
        message: String,
    },
    /// The policy did not return before the phase deadline.
    TimedOut,
    /// A move would have driven the remaining steps below zero (escape only).
    BudgetExhausted,
}

impl PhaseOutcome {
    /// Whether the phase reached its goal.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Short label for log lines and summaries.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::WrongEndLocation => "wrong end location",
            Self::RuntimeFault { .. } => "runtime fault",
            Self::TimedOut => "timed out",
            Self::BudgetExhausted => "out of steps",
        }
    }
}

impl core::fmt::Display for PhaseOutcome {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::RuntimeFault { message } => write!(f, "runtime fault: {message}"),
            other => f.write_str(other.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_succeeded_is_success() {
        assert!(PhaseOutcome::Succeeded.is_success());
        assert!(!PhaseOutcome::WrongEndLocation.is_success());
        assert!(!PhaseOutcome::TimedOut.is_success());
        assert!(!PhaseOutcome::BudgetExhausted.is_success());
        assert!(
            !PhaseOutcome::RuntimeFault {
                message: String::from("boom"),
            }
            .is_success()
        );
    }

    #[test]
    fn fault_display_carries_message() {
        let outcome = PhaseOutcome::RuntimeFault {
            message: String::from("index out of range"),
        };
        assert_eq!(outcome.to_string(), "runtime fault: index out of range");
    }

    #[test]
    fn outcome_serializes_with_kind_tag() {
        let json = serde_json::to_string(&PhaseOutcome::TimedOut).ok();
        assert_eq!(json.as_deref(), Some(r#"{"kind":"timed_out"}"#));
    }

    #[test]
    fn phase_labels() {
        assert_eq!(Phase::Find.to_string(), "find");
        assert_eq!(Phase::Flee.to_string(), "flee");
    }
}
