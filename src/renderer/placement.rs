// SPDX-License-Identifier: GPL-3.0-only

//! Panel placement relative to the focused field.
//!
//! The panel docks at the viewport edge away from the field: a field in the
//! upper half puts the panel at the bottom and vice versa. Horizontally the
//! panel is centred, and its visual size comes from a base scale that shrinks
//! further when the panel would not fit vertically.

use crate::app_settings;
use crate::page::{Rect, Size, Viewport};

// ============================================================================
// Types
// ============================================================================

/// Viewport edge the panel docks against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
}

/// Computed panel geometry in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub edge: Edge,
    /// Distance from the docking edge
    pub margin: f32,
    /// Left edge of the panel's visual box
    pub left: f32,
    /// Visual width of the panel
    pub width: f32,
    /// Scale applied to the panel contents
    pub scale: f32,
}

/// Computes placements.
#[derive(Debug, Clone, Copy)]
pub struct Positioner {
    fallback: Size,
    base_scale: f32,
    min_scale: f32,
    viewport_fraction: f32,
    margin: f32,
}

impl Default for Positioner {
    fn default() -> Self {
        Self {
            fallback: Size {
                width: app_settings::DEFAULT_PANEL_WIDTH,
                height: app_settings::DEFAULT_PANEL_HEIGHT,
            },
            base_scale: app_settings::PANEL_BASE_SCALE,
            min_scale: app_settings::PANEL_MIN_SCALE,
            viewport_fraction: app_settings::PANEL_VIEWPORT_FRACTION,
            margin: app_settings::PANEL_EDGE_MARGIN,
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

impl Positioner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Places the panel for a field.
    ///
    /// # Arguments
    ///
    /// * `field` - Bounding rect of the focused field
    /// * `viewport` - Visible page area
    /// * `panel` - Measured panel size, `None` when it could not be measured
    /// * `manually_positioned` - The user moved the panel; placement is frozen
    ///
    /// # Returns
    ///
    /// `None` when placement is frozen, otherwise the new geometry.
    #[must_use]
    pub fn place(
        &self,
        field: Rect,
        viewport: Viewport,
        panel: Option<Size>,
        manually_positioned: bool,
    ) -> Option<Placement> {
        if manually_positioned {
            tracing::debug!("Panel was moved by the user, keeping its position");
            return None;
        }

        let panel = panel
            .filter(|size| size.width > 0.0 && size.height > 0.0)
            .unwrap_or_else(|| {
                tracing::warn!(
                    "Panel size unavailable, assuming {}x{}",
                    self.fallback.width,
                    self.fallback.height
                );
                self.fallback
            });

        let edge = if field.center_y() < viewport.height / 2.0 {
            Edge::Bottom
        } else {
            Edge::Top
        };

        let width = (viewport.width * self.viewport_fraction).min(panel.width);
        let left = ((viewport.width - width) / 2.0).clamp(0.0, (viewport.width - width).max(0.0));

        Some(Placement {
            edge,
            margin: self.margin,
            left,
            width,
            scale: self.fit_scale(panel.height, viewport.height),
        })
    }

    /// Base scale, reduced until the panel fits between the margins.
    fn fit_scale(&self, panel_height: f32, viewport_height: f32) -> f32 {
        let available = viewport_height - 2.0 * self.margin;
        if panel_height * self.base_scale <= available {
            return self.base_scale;
        }
        (available / panel_height).clamp(self.min_scale, self.base_scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 1280.0,
        height: 800.0,
    };

    fn panel() -> Option<Size> {
        Some(Size {
            width: 900.0,
            height: 320.0,
        })
    }

    /// A field in the upper half docks the panel at the bottom
    #[test]
    fn test_edge_selection() {
        let positioner = Positioner::new();

        let upper = Rect::new(10.0, 100.0, 200.0, 30.0);
        let placed = positioner.place(upper, VIEWPORT, panel(), false).unwrap();
        assert_eq!(placed.edge, Edge::Bottom);
        assert_eq!(placed.margin, 20.0);

        let lower = Rect::new(10.0, 600.0, 200.0, 30.0);
        let placed = positioner.place(lower, VIEWPORT, panel(), false).unwrap();
        assert_eq!(placed.edge, Edge::Top);
    }

    #[test]
    fn test_horizontal_centering() {
        let positioner = Positioner::new();
        let field = Rect::new(0.0, 0.0, 100.0, 20.0);

        let placed = positioner.place(field, VIEWPORT, panel(), false).unwrap();
        assert_eq!(placed.width, 900.0);
        assert_eq!(placed.left, 190.0);

        let narrow = Viewport {
            width: 500.0,
            height: 800.0,
        };
        let placed = positioner.place(field, narrow, panel(), false).unwrap();
        assert_eq!(placed.width, 450.0);
        assert_eq!(placed.left, 25.0);
    }

    /// Short viewports shrink the panel, never below the minimum
    #[test]
    fn test_scale_fits_vertically() {
        let positioner = Positioner::new();
        let field = Rect::new(0.0, 0.0, 100.0, 20.0);

        let placed = positioner.place(field, VIEWPORT, panel(), false).unwrap();
        assert_eq!(placed.scale, 0.85);

        let short = Viewport {
            width: 1280.0,
            height: 200.0,
        };
        let placed = positioner.place(field, short, panel(), false).unwrap();
        assert!((placed.scale - 0.5).abs() < 1e-6);

        let tiny = Viewport {
            width: 1280.0,
            height: 60.0,
        };
        let placed = positioner.place(field, tiny, panel(), false).unwrap();
        assert_eq!(placed.scale, 0.4);
    }

    #[test]
    fn test_unmeasurable_panel_uses_fallback() {
        let positioner = Positioner::new();
        let field = Rect::new(0.0, 0.0, 100.0, 20.0);

        let placed = positioner.place(field, VIEWPORT, None, false).unwrap();
        assert_eq!(placed.width, 900.0);

        let zero = Some(Size {
            width: 0.0,
            height: 0.0,
        });
        assert_eq!(positioner.place(field, VIEWPORT, zero, false), Some(placed));
    }

    #[test]
    fn test_manual_position_freezes() {
        let positioner = Positioner::new();
        let field = Rect::new(0.0, 0.0, 100.0, 20.0);
        assert!(positioner.place(field, VIEWPORT, panel(), true).is_none());
    }
}
