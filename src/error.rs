use thiserror::Error;

/// Returned by [`RingBuffer::new`](crate::RingBuffer::new) when the requested
/// capacity cannot back a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CapacityError {
    /// The capacity was not a power of two strictly greater than 1.
    #[error("invalid capacity {0}: must be a power of two greater than 1")]
    InvalidCapacity(usize),
}

/// Outcome of a push that did not land in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PushError<T> {
    /// The ring held `capacity - 1` items from this thread's point of view.
    /// The value is handed back to the caller.
    #[error("ring buffer is full")]
    Full(T),
    /// An absent value was offered through
    /// [`RingBuffer::push_opt`](crate::RingBuffer::push_opt). Nothing was mutated.
    #[error("absent value rejected")]
    Rejected,
}

impl<T> PushError<T> {
    /// Recovers the value that was not pushed, if there was one.
    pub fn into_inner(self) -> Option<T> {
        match self {
            PushError::Full(value) => Some(value),
            PushError::Rejected => None,
        }
    }

    /// Returns `true` for [`PushError::Full`].
    pub fn is_full(&self) -> bool {
        matches!(self, PushError::Full(_))
    }
}

/// Outcome of a pop that found nothing to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PopError {
    /// Both cursors pointed at the same generation when sampled.
    #[error("ring buffer is empty")]
    Empty,
}
