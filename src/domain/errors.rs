use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Failure raised by a bus listener while handling one event
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscriberFault {
    /// The listener's outbound stream is gone
    #[error("Transport closed: {0}")]
    Transport(String),
    #[error("Listener failed: {0}")]
    Listener(String),
}
