//! crates/dream_journal_core/src/error.rs
//!
//! The error taxonomy for the core. Every fallible operation in this crate
//! resolves to one of these four categories so the calling layer can map each
//! to an appropriate response without inspecting message strings.

/// The primary error type for core operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Input outside its documented domain (out-of-range rating, missing
    /// target, malformed period window).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced record (goal, streak, entry, user) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation contradicts current state (freeze with none available,
    /// transition on a terminal goal).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The underlying persistent store failed. Not retried here; surfaced
    /// to the caller.
    #[error("store error: {0}")]
    Store(String),
}

/// Convenience alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;
