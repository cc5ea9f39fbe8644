use thiserror::Error;

/// Recoverable generation failures. Contract violations (malformed exits,
/// missing player tokens, exhausted placement counters) panic instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// Every attempt failed to produce an acceptable level.
    #[error("no level found after {attempts} attempts")]
    Exhausted { attempts: usize },

    /// The request can never produce a level.
    #[error("invalid generator configuration: {0}")]
    InvalidConfig(&'static str),
}
