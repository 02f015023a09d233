//! Error types for folio operations.

use thiserror::Error;

use crate::stream::EventKind;
use crate::writer::Format;

/// Errors that can occur while constructing writers or rendering events.
///
/// Content problems never surface here: malformed document data becomes a
/// [`Warning`](crate::Warning) during sanitizing or degrades to empty output.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid {format} configuration: {reason}")]
    InvalidConfig { format: Format, reason: String },

    #[error("Unbalanced event: expected {expected:?}, found {found:?}")]
    UnbalancedEvent {
        expected: Option<EventKind>,
        found: EventKind,
    },

    #[error("Event {0:?} received after the document ended")]
    EventAfterEnd(EventKind),

    #[error("Event stream ended before EndDocument with {open} element(s) open")]
    Truncated { open: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
