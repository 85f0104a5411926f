/// Pagination state definitions for the feed expansion loop
///
/// The browsing session moves `Idle → Loaded → Expanding → Exhausted | Failed`;
/// `Cancelled` is reached when the run is aborted between reveals.
use std::fmt;

/// Represents the current state of a feed expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaginationState {
    // ===== Active States =====
    /// No session has been opened yet
    Idle,

    /// The landing page is loaded and its first snapshot taken
    Loaded,

    /// The reveal control is being clicked repeatedly
    Expanding,

    // ===== Terminal States =====
    /// The reveal control disappeared; the feed is fully expanded
    Exhausted,

    /// A session error stopped the loop early
    Failed,

    /// The run was cancelled before the feed was exhausted
    Cancelled,
}

impl PaginationState {
    /// Returns true if no further reveals will happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted | Self::Failed | Self::Cancelled)
    }

    /// Returns true if the session may still reveal more content
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if the transition to `next` is part of the state machine
    pub fn can_transition_to(&self, next: PaginationState) -> bool {
        use PaginationState::*;

        match (self, next) {
            (Idle, Loaded) | (Idle, Failed) | (Idle, Cancelled) => true,
            // A feed without a reveal control is exhausted as soon as it loads
            (Loaded, Expanding) | (Loaded, Exhausted) | (Loaded, Failed) | (Loaded, Cancelled) => {
                true
            }
            (Expanding, Expanding)
            | (Expanding, Exhausted)
            | (Expanding, Failed)
            | (Expanding, Cancelled) => true,
            _ => false,
        }
    }

    /// Short lowercase name used in logs and the run summary
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loaded => "loaded",
            Self::Expanding => "expanding",
            Self::Exhausted => "exhausted",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns all possible pagination states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Idle,
            Self::Loaded,
            Self::Expanding,
            Self::Exhausted,
            Self::Failed,
            Self::Cancelled,
        ]
    }
}

impl fmt::Display for PaginationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
