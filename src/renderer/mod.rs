// SPDX-License-Identifier: GPL-3.0-only

//! Keyboard panel presentation state.
//!
//! Nothing here paints. Each sub-module turns engine state into plain data the
//! host applies to its surface:
//!
//! - **keys**: glyph, active flag and corner hints for every key, derived from
//!   the layout and the modifier state.
//! - **preview**: the header text mirroring the focused field, with caret and
//!   selection marks, masked for passwords.
//! - **placement**: where the panel docks and how far it is scaled.
//!
//! # Usage
//!
//! ```rust,ignore
//! use klavye::input::ModifierState;
//! use klavye::layout::Layout;
//! use klavye::renderer::KeyRenderer;
//!
//! let layout = Layout::turkish_q();
//! let mut modifiers = ModifierState::new();
//! modifiers.toggle_shift();
//!
//! let faces = KeyRenderer::default().render(&layout, &modifiers);
//! assert_eq!(faces[0][6].label, "/");
//! ```

pub mod keys;
pub mod placement;
pub mod preview;

pub use keys::{GlyphTier, KeyFace, KeyRenderer};
pub use placement::{Edge, Placement, Positioner};
pub use preview::{PreviewContent, PreviewPanel};
