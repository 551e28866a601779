/// Per-task lifecycle.
///
/// `Pending -> InFlight -> {Succeeded, Pending (retryable failure), Failed}`.
/// `attempt` counts retries already spent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    Pending { attempt: u32 },
    InFlight { attempt: u32 },
    Succeeded,
    /// `exhausted` is set when the last failure was retryable but the budget ran out.
    Failed { attempts: u32, exhausted: bool },
}

impl Default for TaskState {
    fn default() -> Self { Self::Pending { attempt: 0 } }
}

impl TaskState {
    #[must_use]
    pub fn begin(self) -> Self {
        match self {
            Self::Pending { attempt } => Self::InFlight { attempt },
            other => other,
        }
    }

    #[must_use]
    pub fn succeed(self) -> Self {
        match self {
            Self::InFlight { .. } => Self::Succeeded,
            other => other,
        }
    }

    /// Record a failure. Retryable failures go back to `Pending` while budget remains.
    #[must_use]
    pub fn fail(self, retryable: bool, max_retries: u32) -> Self {
        match self {
            Self::InFlight { attempt } if retryable && attempt < max_retries => Self::Pending { attempt: attempt + 1 },
            Self::InFlight { attempt } => Self::Failed { attempts: attempt + 1, exhausted: retryable },
            other => other,
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Succeeded | Self::Failed { .. }) }
}
