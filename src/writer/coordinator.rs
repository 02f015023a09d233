//! Fan-out of one event stream to several writers.

use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::stream::Event;

use super::{BoxedWriter, Format, Output, create_writer};

/// Drives a set of format writers in lockstep.
///
/// Writers are independent: one that fails to construct or fails while
/// handling an event is dropped and its error recorded, and the others carry
/// on. [`flush_all`](Self::flush_all) consumes the coordinator.
pub struct Coordinator {
    /// Requested formats, deduplicated, in request order.
    formats: Vec<Format>,
    writers: Vec<BoxedWriter>,
    failures: Vec<(Format, Error)>,
}

impl Coordinator {
    /// Build writers for the named formats.
    ///
    /// An unknown name fails the whole call. A writer whose configuration is
    /// invalid fails only its own format; the error is reported by
    /// [`flush_all`](Self::flush_all).
    pub fn new<I, S>(names: I, config: &RenderConfig) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let formats = names
            .into_iter()
            .map(|name| name.as_ref().parse::<Format>())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_formats(&formats, config))
    }

    /// Build writers for already-parsed formats. Duplicates are ignored.
    pub fn from_formats(formats: &[Format], config: &RenderConfig) -> Self {
        let mut coordinator = Self {
            formats: Vec::with_capacity(formats.len()),
            writers: Vec::with_capacity(formats.len()),
            failures: Vec::new(),
        };

        for &format in formats {
            if coordinator.formats.contains(&format) {
                continue;
            }
            coordinator.formats.push(format);
            match create_writer(format, config) {
                Ok(writer) => coordinator.writers.push(writer),
                Err(err) => {
                    log::warn!("cannot create {format} writer: {err}");
                    coordinator.failures.push((format, err));
                }
            }
        }
        coordinator
    }

    /// Add a writer built by the caller.
    ///
    /// Ignored if a writer for the same format was already requested.
    pub fn push_writer(&mut self, writer: BoxedWriter) {
        let format = writer.format();
        if self.formats.contains(&format) {
            log::debug!("ignoring duplicate {format} writer");
            return;
        }
        self.formats.push(format);
        self.writers.push(writer);
    }

    /// Requested formats in request order.
    pub fn formats(&self) -> &[Format] {
        &self.formats
    }

    /// Formats whose writers are still accepting events.
    pub fn live_formats(&self) -> impl Iterator<Item = Format> + '_ {
        self.writers.iter().map(|writer| writer.format())
    }

    /// Forward one event to every live writer, in construction order.
    pub fn dispatch(&mut self, event: &Event<'_>) {
        let failures = &mut self.failures;
        self.writers.retain_mut(|writer| match writer.handle(event) {
            Ok(()) => true,
            Err(err) => {
                let format = writer.format();
                log::warn!("{format} writer failed on {:?}: {err}", event.kind());
                failures.push((format, err));
                false
            }
        });
    }

    /// Dispatch every event of `events`, pulling one at a time.
    ///
    /// Returns the number of events dispatched.
    pub fn process<'a, I>(&mut self, events: I) -> usize
    where
        I: IntoIterator<Item = Event<'a>>,
    {
        let mut count = 0;
        for event in events {
            self.dispatch(&event);
            count += 1;
        }
        log::debug!("dispatched {count} events to {} writer(s)", self.writers.len());
        count
    }

    /// Finish every live writer and collect all results.
    pub fn flush_all(self) -> RenderOutput {
        let Self {
            formats,
            writers,
            failures,
        } = self;

        let mut results: Vec<(Format, Result<Output>)> = failures
            .into_iter()
            .map(|(format, err)| (format, Err(err)))
            .collect();

        for writer in writers {
            let format = writer.format();
            let result = writer.finish();
            if let Err(err) = &result {
                log::warn!("{format} writer failed to finish: {err}");
            }
            results.push((format, result));
        }

        results.sort_by_key(|(format, _)| {
            formats
                .iter()
                .position(|f| f == format)
                .unwrap_or(usize::MAX)
        });
        RenderOutput { results }
    }
}

/// Per-format results of a render, in request order.
#[derive(Debug)]
pub struct RenderOutput {
    results: Vec<(Format, Result<Output>)>,
}

impl RenderOutput {
    pub fn get(&self, format: Format) -> Option<&Result<Output>> {
        self.results
            .iter()
            .find(|(f, _)| *f == format)
            .map(|(_, result)| result)
    }

    pub fn successes(&self) -> impl Iterator<Item = &Output> {
        self.results.iter().filter_map(|(_, result)| result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (Format, &Error)> {
        self.results
            .iter()
            .filter_map(|(format, result)| result.as_ref().err().map(|err| (*format, err)))
    }

    /// True if every requested format produced output.
    pub fn is_complete(&self) -> bool {
        self.results.iter().all(|(_, result)| result.is_ok())
    }

    pub fn formats(&self) -> impl Iterator<Item = Format> + '_ {
        self.results.iter().map(|(format, _)| *format)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_results(self) -> Vec<(Format, Result<Output>)> {
        self.results
    }
}
