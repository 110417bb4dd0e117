// SPDX-License-Identifier: GPL-3.0-only

//! Async runtime around the [`Orchestrator`].
//!
//! A single task multiplexes page events, host requests, timer ticks and
//! clipboard completions with `tokio::select!`, so every engine mutation
//! happens in one place. Effects returned by the orchestrator are carried out
//! here: timers are (re)armed or cancelled, clipboard work is spawned, and the
//! enabled preference is written back to disk.

use crate::config::{Config, PreferenceStore};
use crate::host::HostRequest;
use crate::orchestrator::{Effect, Orchestrator, PageEvent, Snapshot, TimerEvent};
use crate::page::{Clipboard, ClipboardError, FieldId, Page};
use crate::timing::{Debounce, RepeatOnHold, Throttle};
use futures::StreamExt;
use futures::channel::mpsc;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

type PasteResult = (FieldId, Result<String, ClipboardError>);

/// Current time on the tokio clock, so paused-clock tests stay consistent.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Owns the orchestrator and the async machinery around it.
pub struct Session<P: Page> {
    orchestrator: Orchestrator<P>,
    clipboard: Arc<dyn Clipboard>,
    preferences: Option<PreferenceStore>,
    events: mpsc::Receiver<PageEvent>,
    host: mpsc::Receiver<HostRequest>,
    timer_rx: mpsc::UnboundedReceiver<TimerEvent>,
    paste_tx: mpsc::UnboundedSender<PasteResult>,
    paste_rx: mpsc::UnboundedReceiver<PasteResult>,
    pending_reads: usize,
    preview_debounce: Debounce<TimerEvent>,
    preview_throttle: Throttle<TimerEvent>,
    repeat: RepeatOnHold<TimerEvent>,
    observer: Option<mpsc::UnboundedSender<Snapshot>>,
    last_snapshot: Option<Snapshot>,
    /// Latest preference write; each write waits for the one before it
    pending_save: Option<JoinHandle<()>>,
}

impl<P: Page> std::fmt::Debug for Session<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("visible", &self.orchestrator.is_visible())
            .field("pending_reads", &self.pending_reads)
            .finish_non_exhaustive()
    }
}

impl<P: Page> Session<P> {
    /// Creates a session.
    ///
    /// # Arguments
    ///
    /// * `orchestrator` - The engine to drive
    /// * `clipboard` - Async clipboard used when native commands decline
    /// * `events` - Page events, the session ends when this channel closes
    /// * `host` - Host control requests
    pub fn new(
        orchestrator: Orchestrator<P>,
        clipboard: Arc<dyn Clipboard>,
        events: mpsc::Receiver<PageEvent>,
        host: mpsc::Receiver<HostRequest>,
    ) -> Self {
        let timings = orchestrator.config().timings;
        let (timer_tx, timer_rx) = mpsc::unbounded();
        let (paste_tx, paste_rx) = mpsc::unbounded();

        Self {
            preview_debounce: Debounce::new(timings.preview_debounce(), timer_tx.clone()),
            preview_throttle: Throttle::new(timings.selection_throttle(), timer_tx.clone()),
            repeat: RepeatOnHold::new(timings.repeat_delay(), timings.repeat_interval(), timer_tx),
            orchestrator,
            clipboard,
            preferences: None,
            events,
            host,
            timer_rx,
            paste_tx,
            paste_rx,
            pending_reads: 0,
            observer: None,
            last_snapshot: None,
            pending_save: None,
        }
    }

    /// Persists the enabled flag to `store` whenever it changes.
    #[must_use]
    pub fn with_preferences(mut self, store: PreferenceStore) -> Self {
        self.preferences = Some(store);
        self
    }

    /// Sends a [`Snapshot`] every time the visible state changes.
    #[must_use]
    pub fn with_observer(mut self, observer: mpsc::UnboundedSender<Snapshot>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn orchestrator(&self) -> &Orchestrator<P> {
        &self.orchestrator
    }

    /// Runs until the page event channel closes and every clipboard read
    /// has completed.
    ///
    /// # Returns
    ///
    /// The orchestrator, for inspection after shutdown.
    pub async fn run(mut self) -> Orchestrator<P> {
        tracing::info!("Keyboard session started");
        let mut events_open = true;

        loop {
            if !events_open && self.pending_reads == 0 {
                break;
            }

            tokio::select! {
                event = self.events.next(), if events_open => match event {
                    Some(event) => {
                        let effects = self.orchestrator.handle_event(event, now());
                        self.apply(effects);
                    }
                    None => {
                        tracing::debug!("Page event channel closed");
                        events_open = false;
                    }
                },
                Some(request) = self.host.next() => {
                    let (response, effects) = self.orchestrator.handle_host(request.message, now());
                    self.apply(effects);
                    request.respond(response);
                }
                Some(tick) = self.timer_rx.next() => {
                    let effects = self.orchestrator.handle_timer(tick, now());
                    self.apply(effects);
                }
                Some((field, result)) = self.paste_rx.next() => {
                    self.pending_reads = self.pending_reads.saturating_sub(1);
                    let effects = self.orchestrator.complete_paste(field, result, now());
                    self.apply(effects);
                }
            }

            self.notify();
        }

        self.cancel_timers();
        if let Some(save) = self.pending_save.take() {
            if let Err(e) = save.await {
                tracing::error!("Preference write task failed: {e}");
            }
        }
        tracing::info!("Keyboard session stopped");
        self.orchestrator
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            tracing::trace!("Effect {:?}", effect);
            match effect {
                Effect::WriteClipboard(text) => {
                    let write = self.clipboard.write_text(text);
                    tokio::spawn(async move {
                        if let Err(e) = write.await {
                            tracing::warn!("Clipboard write failed: {e}");
                        }
                    });
                }
                Effect::ReadClipboard(field) => {
                    let read = self.clipboard.read_text();
                    let tx = self.paste_tx.clone();
                    self.pending_reads += 1;
                    tokio::spawn(async move {
                        let result = read.await;
                        if tx.unbounded_send((field, result)).is_err() {
                            tracing::debug!("Paste completed after the session stopped");
                        }
                    });
                }
                Effect::StartRepeat(token) => self.repeat.start(TimerEvent::Repeat(token)),
                Effect::StopRepeat => self.repeat.stop(),
                Effect::DebouncePreview => self.preview_debounce.trigger(TimerEvent::PreviewSync),
                Effect::ThrottlePreview => self.preview_throttle.trigger(TimerEvent::PreviewSync),
                Effect::CancelTimers => self.cancel_timers(),
                Effect::VisibilityChanged(visible) => {
                    tracing::debug!("Panel visible: {visible}");
                }
                Effect::EnabledChanged(enabled) => self.save_preferences(enabled),
            }
        }
    }

    fn notify(&mut self) {
        let Some(observer) = &self.observer else {
            return;
        };
        let snapshot = self.orchestrator.snapshot();
        if self.last_snapshot.as_ref() == Some(&snapshot) {
            return;
        }
        if observer.unbounded_send(snapshot.clone()).is_err() {
            tracing::debug!("Snapshot observer went away");
            self.observer = None;
        }
        self.last_snapshot = Some(snapshot);
    }

    fn cancel_timers(&mut self) {
        self.preview_debounce.cancel();
        self.preview_throttle.cancel();
        self.repeat.stop();
    }

    /// Writes the preference file off the session task.
    fn save_preferences(&mut self, enabled: bool) {
        let Some(store) = self.preferences.clone() else {
            return;
        };
        let config = Config {
            keyboard_enabled: enabled,
            ..self.orchestrator.config().clone()
        };
        let previous = self.pending_save.take();

        self.pending_save = Some(tokio::spawn(async move {
            if let Some(previous) = previous {
                // Failures were already logged by the earlier task
                let _ = previous.await;
            }
            let path = store.path().to_path_buf();
            match tokio::task::spawn_blocking(move || store.save(&config)).await {
                Ok(Ok(())) => tracing::debug!("Preferences saved to {}", path.display()),
                Ok(Err(e)) => tracing::error!("Failed to save preferences: {e}"),
                Err(e) => tracing::error!("Preference write task failed: {e}"),
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{self, HostClient};
    use crate::input::KeyToken;
    use crate::orchestrator::{ClickTarget, Components};
    use crate::page::{FieldKind, MemoryClipboard, MemoryField, MemoryPage};
    use futures::SinkExt;
    use std::time::Duration;
    use tokio::time::sleep;

    struct Setup {
        session: Session<MemoryPage>,
        events: mpsc::Sender<PageEvent>,
        client: HostClient,
        field: FieldId,
    }

    fn setup(value: &str, clipboard: MemoryClipboard) -> Setup {
        let mut page = MemoryPage::new();
        let field = page.add_field(MemoryField::new(FieldKind::Text).with_value(value));
        let orchestrator = Orchestrator::new(Components::new(page, Config::default()));
        let (events, events_rx) = mpsc::channel(32);
        let (client, host_rx) = host::channel(8);
        Setup {
            session: Session::new(orchestrator, Arc::new(clipboard), events_rx, host_rx),
            events,
            client,
            field,
        }
    }

    async fn press(events: &mut mpsc::Sender<PageEvent>, token: &str) {
        events
            .send(PageEvent::KeyPress(token.parse().unwrap()))
            .await
            .unwrap();
        sleep(Duration::from_millis(200)).await;
    }

    /// Copy falls back to the async clipboard, paste reads it back
    #[tokio::test(start_paused = true)]
    async fn test_clipboard_round_trip() {
        let clipboard = MemoryClipboard::new();
        let Setup {
            session,
            mut events,
            field,
            ..
        } = setup("merhaba", clipboard.clone());

        let driver = async move {
            events.send(PageEvent::Focus(field)).await.unwrap();
            for token in ["HepsiniSec", "Control", "c", "ArrowRight", "Control", "v"] {
                press(&mut events, token).await;
            }
        };
        let (orchestrator, ()) = tokio::join!(session.run(), driver);

        assert_eq!(clipboard.contents(), "merhaba");
        assert_eq!(orchestrator.page().value(field).unwrap(), "merhabamerhaba");
    }

    /// A refused clipboard read alerts the user
    #[tokio::test(start_paused = true)]
    async fn test_denied_paste_alerts() {
        let clipboard = MemoryClipboard::with_text("x");
        clipboard.set_denied(true);
        let Setup {
            session,
            mut events,
            field,
            ..
        } = setup("ab", clipboard);

        let driver = async move {
            events.send(PageEvent::Focus(field)).await.unwrap();
            press(&mut events, "Control").await;
            press(&mut events, "v").await;
        };
        let (orchestrator, ()) = tokio::join!(session.run(), driver);

        assert_eq!(orchestrator.page().value(field).unwrap(), "ab");
        assert_eq!(orchestrator.page().alerts().len(), 1);
    }

    /// Holding Sil deletes on the repeat schedule until release
    #[tokio::test(start_paused = true)]
    async fn test_hold_backspace() {
        let Setup {
            session,
            mut events,
            field,
            ..
        } = setup("abcdefghij", MemoryClipboard::new());

        let driver = async move {
            events.send(PageEvent::Focus(field)).await.unwrap();
            events.send(PageEvent::KeyDown(KeyToken::Backspace)).await.unwrap();
            // Repeats at 400, 470 and 540 ms
            sleep(Duration::from_millis(560)).await;
            events.send(PageEvent::KeyUp).await.unwrap();
            events.send(PageEvent::KeyPress(KeyToken::Backspace)).await.unwrap();
            sleep(Duration::from_millis(500)).await;
        };
        let (orchestrator, ()) = tokio::join!(session.run(), driver);

        assert_eq!(orchestrator.page().value(field).unwrap(), "abcdefg");
    }

    /// Hiding the panel cancels a running hold repeat
    #[tokio::test(start_paused = true)]
    async fn test_hide_cancels_repeat() {
        let Setup {
            session,
            mut events,
            field,
            ..
        } = setup("abcdef", MemoryClipboard::new());

        let driver = async move {
            events.send(PageEvent::Focus(field)).await.unwrap();
            sleep(Duration::from_millis(350)).await;
            events.send(PageEvent::KeyDown(KeyToken::Backspace)).await.unwrap();
            sleep(Duration::from_millis(100)).await;
            events
                .send(PageEvent::Click(ClickTarget::Outside))
                .await
                .unwrap();
            sleep(Duration::from_millis(1000)).await;
        };
        let (orchestrator, ()) = tokio::join!(session.run(), driver);

        assert!(!orchestrator.is_visible());
        assert_eq!(orchestrator.page().value(field).unwrap(), "abcdef");
    }

    /// Observers see each visible change once
    #[tokio::test(start_paused = true)]
    async fn test_observer() {
        let Setup {
            session,
            mut events,
            field,
            ..
        } = setup("", MemoryClipboard::new());
        let (tx, rx) = mpsc::unbounded();
        let session = session.with_observer(tx);

        let driver = async move {
            events.send(PageEvent::Focus(field)).await.unwrap();
            press(&mut events, "k").await;
            events.send(PageEvent::Click(ClickTarget::Keyboard)).await.unwrap();
        };
        tokio::join!(session.run(), driver);

        let previews: Vec<String> = rx.map(|s| s.preview).collect().await;
        assert_eq!(previews, vec!["|", "k|"]);
    }

    /// Enable/disable requests are answered and persisted
    #[tokio::test(start_paused = true)]
    async fn test_host_requests_persist() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("config.json"));
        let Setup {
            session,
            events,
            mut client,
            ..
        } = setup("", MemoryClipboard::new());
        let session = session.with_preferences(store.clone());

        let driver = async move {
            assert!(client.get_status().await.unwrap());
            assert!(client.set_enabled(false).await.unwrap());
            assert!(!client.get_status().await.unwrap());
            assert!(!client.show_keyboard().await.unwrap());
            drop(events);
        };
        let (orchestrator, ()) = tokio::join!(session.run(), driver);

        assert!(!orchestrator.is_enabled());
        assert!(!store.load().unwrap().keyboard_enabled);
    }

    /// Back-to-back toggles are written in order and finished before shutdown
    #[tokio::test(start_paused = true)]
    async fn test_preference_writes_keep_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("nested").join("config.json"));
        let Setup {
            session,
            events,
            mut client,
            ..
        } = setup("", MemoryClipboard::new());
        let session = session.with_preferences(store.clone());

        let driver = async move {
            for enabled in [false, true, true, false] {
                assert!(client.set_enabled(enabled).await.unwrap());
            }
            drop(events);
        };
        let (orchestrator, ()) = tokio::join!(session.run(), driver);

        assert!(!orchestrator.is_enabled());
        assert!(!store.load().unwrap().keyboard_enabled);
    }
}
