//! Error types shared across vantage crates

use thiserror::Error;

/// Errors that can occur while setting up scroll-driven animations
///
/// Steady-state paths (frame updates, scroll dispatch) never produce these;
/// they are returned from setup and configuration calls only.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VantageError {
    /// A referenced node, container or scene object is not mounted
    #[error("missing reference: {0}")]
    MissingReference(String),

    /// A keyframe or field specification is malformed
    #[error("invalid keyframes: {0}")]
    InvalidKeyframes(String),

    /// A scroll boundary descriptor could not be parsed
    #[error("invalid scroll boundary '{0}'")]
    InvalidBoundary(String),

    /// A sync mode string could not be parsed
    #[error("invalid sync mode '{0}'")]
    InvalidSyncMode(String),

    /// An easing name could not be parsed
    #[error("invalid easing '{0}'")]
    InvalidEasing(String),

    /// A playback action name could not be parsed
    #[error("invalid playback action '{0}'")]
    InvalidAction(String),

    /// The root already owns a live animation scope
    #[error("root {0} already has a live animation scope")]
    ScopeAlreadyLive(u64),

    /// The animation scheduler was dropped
    #[error("animation scheduler is no longer alive")]
    SchedulerDropped,

    /// No method with this name was registered on the scope
    #[error("unknown scope method '{0}'")]
    UnknownMethod(String),

    /// Scene configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for vantage operations
pub type Result<T> = std::result::Result<T, VantageError>;
