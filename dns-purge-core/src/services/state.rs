//! Per-resource state machine

use crate::types::AttemptOutcome;

/// Lifecycle of one planned action within a run.
///
/// `Pending → Succeeded | Deferred | Failed | Skipped`, with
/// `Deferred → Deferred` until the attempt budget runs out. `Succeeded`,
/// `Failed` and `Skipped` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    Pending,
    Deferred { attempts: u32 },
    Succeeded,
    Failed,
    Skipped,
}

impl ResourceState {
    /// State after an attempt with `outcome`. Terminal states never change.
    #[must_use]
    pub fn transition(self, outcome: AttemptOutcome) -> Self {
        match self {
            Self::Succeeded | Self::Failed | Self::Skipped => self,
            Self::Pending | Self::Deferred { .. } => match outcome {
                AttemptOutcome::Succeeded => Self::Succeeded,
                AttemptOutcome::Failed => Self::Failed,
                AttemptOutcome::Skipped => Self::Skipped,
                AttemptOutcome::Deferred => Self::Deferred {
                    attempts: self.attempts() + 1,
                },
            },
        }
    }

    /// Attempts made so far while still live.
    pub fn attempts(self) -> u32 {
        match self {
            Self::Deferred { attempts } => attempts,
            _ => 0,
        }
    }

    pub fn is_deferred(self) -> bool {
        matches!(self, Self::Deferred { .. })
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Skipped)
    }
}
