use thiserror::Error;

/// Errors raised by the TOC synchronization core.
///
/// Missing headings, empty documents and stale timers are not errors: they
/// degrade to "no highlight" and never reach this type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("duplicate heading id `{0}` in table of contents")]
    DuplicateId(String),
    #[error("heading visibility cannot be observed: {0}")]
    ObserverUnavailable(String),
    #[error("invalid sync configuration: {0}")]
    InvalidConfig(String),
    #[error("global slot `{0}` already holds a value of another type")]
    SlotType(&'static str),
}

pub type Result<T> = std::result::Result<T, SyncError>;
