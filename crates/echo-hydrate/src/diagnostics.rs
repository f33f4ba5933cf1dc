// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reporting of unsupported values.
//!
//! Diagnostics are fire-and-forget: a sink may drop, format or forward them,
//! and nothing it does can change the serialized output. Each top-level call
//! owns a [`DiagnosticBudget`] that caps how many messages reach the sink.

use tracing::Level;

/// Default cap on diagnostics per top-level call.
pub const DEFAULT_DIAGNOSTIC_LIMIT: usize = 99;

/// Destination for unsupported-value diagnostics.
pub trait DiagnosticSink {
    /// Deliver one message at the given severity.
    fn report(&mut self, level: Level, message: &str);
}

/// Forwards diagnostics to `tracing` under the `echo_hydrate` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "echo_hydrate", "{message}"),
            Level::WARN => tracing::warn!(target: "echo_hydrate", "{message}"),
            Level::INFO => tracing::info!(target: "echo_hydrate", "{message}"),
            Level::DEBUG => tracing::debug!(target: "echo_hydrate", "{message}"),
            _ => tracing::trace!(target: "echo_hydrate", "{message}"),
        }
    }
}

/// Keeps every diagnostic in memory.
#[derive(Clone, Debug, Default)]
pub struct CollectingSink {
    /// Messages in arrival order.
    pub messages: Vec<(Level, String)>,
}

impl CollectingSink {
    /// Empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages received.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, level: Level, message: &str) {
        self.messages.push((level, message.to_owned()));
    }
}

/// Per-call rate limit. Messages past the limit are dropped, not queued.
#[derive(Clone, Debug)]
pub struct DiagnosticBudget {
    limit: usize,
    emitted: usize,
    suppressed: usize,
}

impl DiagnosticBudget {
    /// Budget allowing at most `limit` messages.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            emitted: 0,
            suppressed: 0,
        }
    }

    /// Claim one slot. Returns `false` (and counts a suppression) when spent.
    pub fn admit(&mut self) -> bool {
        if self.emitted < self.limit {
            self.emitted += 1;
            true
        } else {
            self.suppressed += 1;
            false
        }
    }

    /// Messages let through so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Messages dropped so far.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }
}

impl Default for DiagnosticBudget {
    fn default() -> Self {
        Self::new(DEFAULT_DIAGNOSTIC_LIMIT)
    }
}
