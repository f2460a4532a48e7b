//! Image loading collaborators and stale-response tracking.
//!
//! Loading is asynchronous on both targets: the browser fires `onload` or
//! `onerror` on an image element, and the native build fetches and decodes on
//! a background thread. Either way the controller receives [`LoadEvent`]s by
//! polling its [`ImageLoader`], and asks the [`LoadTracker`] whether the event
//! still belongs to the latest request for its slot before acting on it.

use std::collections::HashMap;

use crate::model::RecordId;

#[cfg(not(target_arch = "wasm32"))]
pub mod native;
#[cfg(target_arch = "wasm32")]
pub mod web;

/// Token identifying one load request. Tokens are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadToken(u64);

/// What a load request is displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadSlot {
    /// The single image preview
    Current,
    /// A record's thumbnail in batch mode
    Record(RecordId),
}

/// Terminal outcome of a load request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The image loaded and decoded
    Loaded {
        /// Natural width in pixels
        width: u32,
        /// Natural height in pixels
        height: u32,
    },
    /// The image could not be fetched or decoded
    Failed(String),
}

/// An outcome reported by a loader for a request token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadEvent {
    pub token: LoadToken,
    pub outcome: LoadOutcome,
}

impl LoadEvent {
    pub fn loaded(token: LoadToken, width: u32, height: u32) -> Self {
        Self {
            token,
            outcome: LoadOutcome::Loaded { width, height },
        }
    }

    pub fn failed(token: LoadToken, error: impl Into<String>) -> Self {
        Self {
            token,
            outcome: LoadOutcome::Failed(error.into()),
        }
    }
}

/// Asynchronous image fetch primitive.
///
/// Implementations must eventually report at most one event per token.
/// Outcomes of superseded requests are filtered out by the [`LoadTracker`]
/// either way; [`cancel`](Self::cancel) only lets a loader skip work nobody
/// will look at.
pub trait ImageLoader {
    /// Start loading `reference`. The outcome is reported later by [`poll`](Self::poll).
    fn request(&mut self, token: LoadToken, reference: &str);

    /// Drain outcomes that completed since the last poll. Never blocks.
    fn poll(&mut self) -> Vec<LoadEvent>;

    /// The outcome for `token` is no longer wanted.
    fn cancel(&mut self, _token: LoadToken) {}
}

/// A pending request the tracker still considers current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLoad {
    pub slot: LoadSlot,
    pub reference: String,
}

/// Tracks the latest request token per slot.
///
/// Issuing a request for a slot supersedes whatever was pending there, and
/// resolving a token consumes it, so each request is acted upon at most once.
#[derive(Debug, Default)]
pub struct LoadTracker {
    next_token: u64,
    pending: HashMap<LoadToken, PendingLoad>,
    latest: HashMap<LoadSlot, LoadToken>,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token for `slot`, superseding any pending request there.
    pub fn issue(&mut self, slot: LoadSlot, reference: impl Into<String>) -> LoadToken {
        let token = LoadToken(self.next_token);
        self.next_token += 1;

        if let Some(previous) = self.latest.insert(slot, token) {
            if self.pending.remove(&previous).is_some() {
                log::debug!("Load {:?} superseded by {:?} for {:?}", previous, token, slot);
            }
        }
        self.pending.insert(
            token,
            PendingLoad {
                slot,
                reference: reference.into(),
            },
        );
        token
    }

    /// Claim the outcome for `token`.
    ///
    /// Returns the request if it is still the latest one for its slot, and
    /// `None` for stale, abandoned or already resolved tokens.
    pub fn resolve(&mut self, token: LoadToken) -> Option<PendingLoad> {
        let pending = self.pending.remove(&token)?;
        if self.latest.get(&pending.slot) == Some(&token) {
            self.latest.remove(&pending.slot);
        }
        Some(pending)
    }

    /// Abandon every outstanding request, returning their tokens.
    pub fn abandon_all(&mut self) -> Vec<LoadToken> {
        if !self.pending.is_empty() {
            log::debug!("Abandoning {} pending load(s)", self.pending.len());
        }
        self.latest.clear();
        let mut tokens: Vec<LoadToken> = self.pending.drain().map(|(token, _)| token).collect();
        tokens.sort();
        tokens
    }

    /// Abandon the outstanding request for one slot, if there is one.
    pub fn abandon(&mut self, slot: LoadSlot) -> Option<LoadToken> {
        let token = self.latest.remove(&slot)?;
        self.pending.remove(&token).map(|_| token)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
