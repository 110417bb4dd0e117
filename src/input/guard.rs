// SPDX-License-Identifier: GPL-3.0-only

//! Double-fire suppression.
//!
//! Touch screens and some browsers deliver a single tap as two activations a
//! few milliseconds apart. The guard admits a token only if it differs from
//! the last admitted token or arrives after the window has elapsed.

use super::token::KeyToken;
use std::time::{Duration, Instant};

/// Drops repeated tokens that arrive within a short window.
#[derive(Debug, Clone)]
pub struct KeyGuard {
    last: Option<(KeyToken, Instant)>,
    window: Duration,
}

impl KeyGuard {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self { last: None, window }
    }

    /// Decides whether a press is a new logical press.
    ///
    /// # Returns
    ///
    /// `true` if the press should be handled. Admitted presses become the new
    /// reference point.
    pub fn admit(&mut self, token: &KeyToken, now: Instant) -> bool {
        if let Some((last, at)) = &self.last {
            if last == token && now.saturating_duration_since(*at) < self.window {
                tracing::debug!("Dropping double-fired key {token}");
                return false;
            }
        }
        self.last = Some((token.clone(), now));
        true
    }

    /// Forgets the last press.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
