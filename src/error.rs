//! Errors.

use crate::widget::Handle;
use thiserror::Error;

/// An invalid layout configuration, rejected before any state is changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("margins must be positive")]
    NegativeMargins,

    #[error("spacing cannot be negative")]
    NegativeSpacing,

    #[error("stretch factor must be >= 1")]
    InvalidStretchFactor,

    #[error("handle width must be >= 1")]
    InvalidHandleWidth,

    #[error("unknown widget {0:?}")]
    UnknownWidget(Handle),

    #[error("grid range must span at least one row and one column")]
    EmptyRange,

    #[error("no splitter handle at index {0}")]
    NoSuchHandle(usize),

    #[error("not supported: {0}")]
    Unsupported(&'static str),
}

/// Failure to start a layout performer.
#[derive(Debug, Error)]
pub enum PerformerError {
    #[error("could not build layout thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("could not spawn layout thread: {0}")]
    Spawn(#[from] std::io::Error),
}
