// SPDX-License-Identifier: GPL-3.0-only

//! Klavye demo host
//!
//! Runs a keyboard session against an in-memory page with a small sign-up
//! form and drives it from stdin, one command per line:
//!
//! ```text
//! focus <id> | blur <id>        focus or blur a field by the id printed at start
//! key <token>                   press a virtual key (a, Sil, Shift, ArrowLeft, ...)
//! hold <token> <ms>             hold a key down for <ms> milliseconds
//! click outside|keyboard|form   click somewhere on the page
//! host <json>                   send a host message, e.g. {"action":"getStatus"},
//!                               and print the popup's status line
//! quit
//! ```
//!
//! Every state change is printed as a one-line snapshot. An optional first
//! argument names a JSON layout file replacing the built-in Turkish-Q rows.

use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use klavye::host::{self, HostClient, HostError, HostMessage, HostResponse};
use klavye::input::KeyToken;
use klavye::layout::parse_layout_file;
use klavye::orchestrator::{ClickTarget, Components, Orchestrator, PageEvent};
use klavye::page::{FieldId, FieldKind, MemoryClipboard, MemoryField, MemoryPage, Rect};
use klavye::{PreferenceStore, Session, fl, i18n};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("klavye=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Get the system's preferred languages.
    let requested_languages = i18n_embed::DesktopLanguageRequester::requested_languages();

    // Enable localizations to be applied.
    i18n::init(&requested_languages);

    let store = match PreferenceStore::from_env() {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Cannot locate preferences: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let config = match store.load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Cannot read preferences from {}: {}", store.path().display(), e);
            return ExitCode::FAILURE;
        }
    };

    let (page, fields) = demo_page();
    for (id, name) in &fields {
        println!("{}: {name}", id.0);
    }
    let mut components = Components::new(page, config);
    if let Some(path) = std::env::args().nth(1) {
        match parse_layout_file(&path) {
            Ok(layout) => components = components.with_layout(layout),
            Err(e) => {
                tracing::error!("Cannot load layout {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        }
    }

    let (events_tx, events_rx) = mpsc::channel(32);
    let (host_client, host_rx) = host::channel(8);
    let (snapshot_tx, mut snapshot_rx) = mpsc::unbounded();

    let session = Session::new(
        Orchestrator::new(components),
        Arc::new(MemoryClipboard::new()),
        events_rx,
        host_rx,
    )
    .with_preferences(store)
    .with_observer(snapshot_tx);

    let printer = tokio::spawn(async move {
        while let Some(snapshot) = snapshot_rx.next().await {
            println!("{snapshot}");
        }
    });
    let session = tokio::spawn(session.run());

    read_commands(events_tx, host_client).await;

    match session.await {
        Ok(orchestrator) => {
            let typed = fields
                .iter()
                .filter(|(id, _)| orchestrator.page().input_count(*id) > 0)
                .count();
            tracing::info!("Session ended, {} field(s) typed into", typed);
        }
        Err(e) => {
            tracing::error!("Keyboard session failed: {}", e);
            return ExitCode::FAILURE;
        }
    }
    if let Err(e) = printer.await {
        tracing::warn!("Snapshot printer failed: {}", e);
    }
    ExitCode::SUCCESS
}

/// A sign-up form: name, e-mail, password and a message box.
fn demo_page() -> (MemoryPage, Vec<(FieldId, &'static str)>) {
    let mut page = MemoryPage::new();
    let form = page.add_form(true);
    let fields = [
        (FieldKind::Text, "ad", 40.0),
        (FieldKind::Email, "eposta", 90.0),
        (FieldKind::Password, "sifre", 140.0),
        (FieldKind::Textarea, "mesaj", 190.0),
    ];
    let ids = fields
        .into_iter()
        .map(|(kind, name, y)| {
            let id = page.add_field(
                MemoryField::new(kind)
                    .with_id(name)
                    .in_form(form)
                    .at(Rect::new(100.0, y, 300.0, 32.0)),
            );
            (id, name)
        })
        .collect();
    (page, ids)
}

/// Reads stdin until EOF or `quit`, then closes the event channel.
async fn read_commands(mut events: mpsc::Sender<PageEvent>, mut host: HostClient) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Failed to read stdin: {}", e);
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }

        if let Some(json) = line.strip_prefix("host ") {
            let message: HostMessage = match serde_json::from_str(json) {
                Ok(message) => message,
                Err(e) => {
                    eprintln!("host error: {}", HostError::Malformed(e));
                    continue;
                }
            };
            match host.send(message).await {
                Ok(response) => {
                    match serde_json::to_string(&response) {
                        Ok(reply) => println!("host <- {reply}"),
                        Err(e) => tracing::warn!("Cannot encode host reply: {}", e),
                    }
                    if let Some(status) = popup_status(message, response) {
                        println!("popup: {status}");
                    }
                }
                Err(e) => eprintln!("host error: {e}"),
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("hold ") {
            let Some((token, ms)) = parse_hold(rest) else {
                eprintln!("usage: hold <token> <ms>");
                continue;
            };
            if events.send(PageEvent::KeyDown(token.clone())).await.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(ms)).await;
            if events.send(PageEvent::KeyUp).await.is_err() {
                break;
            }
            // The click that ends the hold
            if events.send(PageEvent::KeyPress(token)).await.is_err() {
                break;
            }
            continue;
        }

        match parse_event(line) {
            Ok(event) => {
                if events.send(event).await.is_err() {
                    tracing::warn!("Keyboard session stopped accepting events");
                    break;
                }
            }
            Err(message) => eprintln!("{message}"),
        }
    }
}

/// The line the toolbar popup shows after a reply.
fn popup_status(message: HostMessage, response: HostResponse) -> Option<String> {
    match message {
        HostMessage::GetStatus => Some(if response.enabled.unwrap_or(true) {
            fl!("status-enabled")
        } else {
            fl!("status-disabled")
        }),
        HostMessage::EnableKeyboard if response.success => Some(fl!("status-enabled")),
        HostMessage::DisableKeyboard if response.success => Some(fl!("status-disabled")),
        HostMessage::ShowKeyboard if !response.success => Some(fl!("show-failed")),
        _ => None,
    }
}

fn parse_hold(rest: &str) -> Option<(KeyToken, u64)> {
    let (token, ms) = rest.rsplit_once(' ')?;
    Some((token.parse().ok()?, ms.trim().parse().ok()?))
}

fn parse_event(line: &str) -> Result<PageEvent, String> {
    let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
    let field = || {
        arg.trim()
            .parse()
            .map(FieldId)
            .map_err(|_| format!("not a field id: {arg:?}"))
    };

    match command {
        "focus" => Ok(PageEvent::Focus(field()?)),
        "blur" => Ok(PageEvent::Blur(field()?)),
        "key" => arg
            .parse::<KeyToken>()
            .map(PageEvent::KeyPress)
            .map_err(|e| e.to_string()),
        "click" => match arg.trim() {
            "outside" => Ok(PageEvent::Click(ClickTarget::Outside)),
            "keyboard" => Ok(PageEvent::Click(ClickTarget::Keyboard)),
            "form" => Ok(PageEvent::Click(ClickTarget::FormControl)),
            other => other
                .parse()
                .map(|id| PageEvent::Click(ClickTarget::Field(FieldId(id))))
                .map_err(|_| format!("unknown click target: {other:?}")),
        },
        _ => Err(format!("unknown command: {command:?}")),
    }
}
