//! Nesting validation for event sequences.

use thiserror::Error;

use super::event::{Event, EventKind};
use crate::error::{Error, Result};

/// Tracks open Start events and rejects sequences that break nesting.
///
/// Writers feed every event through one of these before acting on it.
#[derive(Debug, Default)]
pub struct Nesting {
    stack: Vec<EventKind>,
    started: bool,
    ended: bool,
    max_depth: usize,
}

impl Nesting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one event.
    ///
    /// Fails if the sequence does not begin with `StartDocument`, if an End
    /// does not match the innermost open Start, or if anything follows
    /// `EndDocument`.
    pub fn observe(&mut self, kind: EventKind) -> Result<()> {
        if self.ended {
            return Err(Error::EventAfterEnd(kind));
        }
        if !self.started {
            if kind != EventKind::StartDocument {
                return Err(Error::UnbalancedEvent {
                    expected: Some(EventKind::StartDocument),
                    found: kind,
                });
            }
            self.started = true;
        }

        if kind.is_start() {
            self.stack.push(kind);
            self.max_depth = self.max_depth.max(self.stack.len());
        } else if kind.is_end() {
            let expected = self.stack.last().and_then(|open| open.pair());
            if expected != Some(kind) {
                return Err(Error::UnbalancedEvent {
                    expected,
                    found: kind,
                });
            }
            self.stack.pop();
            if kind == EventKind::EndDocument {
                self.ended = true;
            }
        }
        Ok(())
    }

    /// Check that the document was closed.
    pub fn finish(&self) -> Result<()> {
        if self.ended {
            Ok(())
        } else {
            Err(Error::Truncated {
                open: self.stack.len(),
            })
        }
    }

    /// Number of currently open elements.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// True if an element of `kind` is open anywhere on the stack.
    pub fn is_inside(&self, kind: EventKind) -> bool {
        self.stack.contains(&kind)
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

/// A nesting violation and the position of the offending event.
#[derive(Debug, Error)]
#[error("event {index}: {source}")]
pub struct BalanceError {
    /// Zero-based position in the sequence, or its length for truncation.
    pub index: usize,
    pub source: Error,
}

/// Check that `events` form one properly nested document.
///
/// Returns the maximum nesting depth on success.
pub fn validate_balance<'a, I>(events: I) -> std::result::Result<usize, BalanceError>
where
    I: IntoIterator<Item = Event<'a>>,
{
    let mut nesting = Nesting::new();
    let mut count = 0;
    for (index, event) in events.into_iter().enumerate() {
        nesting
            .observe(event.kind())
            .map_err(|source| BalanceError { index, source })?;
        count = index + 1;
    }
    nesting.finish().map_err(|source| BalanceError {
        index: count,
        source,
    })?;
    Ok(nesting.max_depth())
}
