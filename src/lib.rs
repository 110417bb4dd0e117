// SPDX-License-Identifier: GPL-3.0-only

//! Klavye - input-state engine of an on-screen Turkish keyboard
//!
//! The keyboard is injected into web pages and types into the focused form
//! field. This crate is its engine, run headless: the page is reached
//! through the [`page::Page`] trait, the clipboard through
//! [`page::Clipboard`], and the toolbar popup through [`host`] messages.
//!
//! # Architecture
//!
//! ```text
//!   page events ──┐
//!   host requests ┼─▶ Session ──▶ Orchestrator ──▶ FieldEditor ──▶ Page
//!   timer ticks ──┤      ▲             │
//!   clipboard ────┘      │             ├──▶ ModifierState / HistoryStore
//!                        └─ effects ◀──┴──▶ KeyRenderer / PreviewPanel / Positioner
//! ```
//!
//! # Modules
//!
//! - `app_settings`: Centralized application constants
//! - `config`: User preferences persisted as JSON
//! - `editor`: Applies key tokens to the focused field
//! - `history`: Per-field undo/redo snapshots
//! - `host`: Control messages from the toolbar popup
//! - `i18n`: Localization support using fluent translations
//! - `input`: Key tokens, modifiers, character map and double-fire guard
//! - `layout`: Key rows of the on-screen keyboard
//! - `orchestrator`: State machine tying the components together
//! - `page`: The DOM surface consumed, with an in-memory implementation
//! - `renderer`: Key faces, preview header and panel placement
//! - `session`: Async loop carrying out timers and clipboard work
//! - `timing`: Debounce, throttle and press-and-hold timers

pub mod app_settings;
pub mod config;
pub mod editor;
pub mod history;
pub mod host;
pub mod i18n;
pub mod input;
pub mod layout;
pub mod orchestrator;
pub mod page;
pub mod renderer;
pub mod session;
pub mod timing;

// Re-export the fl! macro for localization
pub use crate::i18n::LANGUAGE_LOADER;

pub use crate::config::{Config, PreferenceStore};
pub use crate::orchestrator::{Components, Effect, Orchestrator, PageEvent, Snapshot};
pub use crate::session::Session;

// ============================================================================
// Integration Tests
// ============================================================================
