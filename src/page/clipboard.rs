// SPDX-License-Identifier: GPL-3.0-only

//! Asynchronous system clipboard.
//!
//! Used as the fallback when the page's native copy/cut/paste commands fail.
//! Both operations may be refused by the platform (missing permission, no
//! user gesture), which surfaces as [`ClipboardError::Denied`].

use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Errors returned by clipboard access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    /// The platform refused access
    Denied,
    /// The clipboard backend is gone
    Unavailable(String),
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardError::Denied => write!(f, "clipboard access denied"),
            ClipboardError::Unavailable(reason) => write!(f, "clipboard unavailable: {reason}"),
        }
    }
}

impl std::error::Error for ClipboardError {}

/// Async clipboard access.
pub trait Clipboard: Send + Sync {
    fn read_text(&self) -> BoxFuture<'static, Result<String, ClipboardError>>;

    fn write_text(&self, text: String) -> BoxFuture<'static, Result<(), ClipboardError>>;
}

/// Process-local clipboard that can be told to refuse access.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Arc<Mutex<String>>,
    denied: Arc<AtomicBool>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        let clipboard = Self::new();
        clipboard.set_contents(text);
        clipboard
    }

    /// Makes every subsequent access fail with [`ClipboardError::Denied`].
    pub fn set_denied(&self, denied: bool) {
        self.denied.store(denied, Ordering::SeqCst);
    }

    pub fn contents(&self) -> String {
        self.contents
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    pub fn set_contents(&self, text: impl Into<String>) {
        if let Ok(mut contents) = self.contents.lock() {
            *contents = text.into();
        }
    }
}

impl Clipboard for MemoryClipboard {
    fn read_text(&self) -> BoxFuture<'static, Result<String, ClipboardError>> {
        let contents = Arc::clone(&self.contents);
        let denied = self.denied.load(Ordering::SeqCst);
        async move {
            if denied {
                return Err(ClipboardError::Denied);
            }
            contents
                .lock()
                .map(|c| c.clone())
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))
        }
        .boxed()
    }

    fn write_text(&self, text: String) -> BoxFuture<'static, Result<(), ClipboardError>> {
        let contents = Arc::clone(&self.contents);
        let denied = self.denied.load(Ordering::SeqCst);
        async move {
            if denied {
                return Err(ClipboardError::Denied);
            }
            let mut guard = contents
                .lock()
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            *guard = text;
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_then_read() {
        let clipboard = MemoryClipboard::new();
        clipboard.write_text("kopya".to_string()).await.unwrap();
        assert_eq!(clipboard.read_text().await.unwrap(), "kopya");
    }

    /// Denied access fails both directions and leaves the contents alone
    #[tokio::test]
    async fn test_denied() {
        let clipboard = MemoryClipboard::with_text("eski");
        clipboard.set_denied(true);

        assert_eq!(clipboard.read_text().await, Err(ClipboardError::Denied));
        assert_eq!(
            clipboard.write_text("yeni".to_string()).await,
            Err(ClipboardError::Denied)
        );
        assert_eq!(clipboard.contents(), "eski");
    }
}
