use std::fmt;

/// Rejections raised by a volley. None of them change session state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolleyError {
    InvalidCapacity,
    CapacityExceeded { capacity: usize },
    EmptyVolley,
}

impl VolleyError {
    /// Stable machine-readable code, used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCapacity => "invalid_capacity",
            Self::CapacityExceeded { .. } => "capacity_exceeded",
            Self::EmptyVolley => "empty_volley",
        }
    }
}

impl fmt::Display for VolleyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCapacity => write!(f, "volley capacity must be at least 1 arrow"),
            Self::CapacityExceeded { capacity } => {
                write!(f, "already recorded all {capacity} arrows for this volley")
            }
            Self::EmptyVolley => write!(f, "no arrows recorded in this volley"),
        }
    }
}

impl std::error::Error for VolleyError {}

/// Failure of a commit that goes through a [`crate::RecordSink`].
#[derive(Debug)]
pub enum CommitError<E> {
    Volley(VolleyError),
    /// The sink refused the batch; the pending shots were kept.
    Sink(E),
}

impl<E> From<VolleyError> for CommitError<E> {
    fn from(err: VolleyError) -> Self {
        Self::Volley(err)
    }
}

impl<E: fmt::Display> fmt::Display for CommitError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Volley(err) => write!(f, "{err}"),
            Self::Sink(err) => write!(f, "failed to save volley: {err}"),
        }
    }
}

impl<E> std::error::Error for CommitError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Volley(err) => Some(err),
            Self::Sink(err) => Some(err),
        }
    }
}
