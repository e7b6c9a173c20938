//! Tooltip placement next to a hovered element.

use serde::{Deserialize, Serialize};
use vitrail_carton::{Rect, Size};

/// Offsets applied around the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementOptions {
    /// Horizontal gap between anchor and preview.
    pub offset_x: f64,
    /// Vertical shift from the anchor's top edge.
    pub offset_y: f64,
    /// Smallest distance kept from the viewport's left and top edges when
    /// clamping.
    pub min_inset: f64,
}

impl Default for PlacementOptions {
    fn default() -> Self {
        Self {
            offset_x: 20.0,
            offset_y: 0.0,
            min_inset: 8.0,
        }
    }
}

/// Side of the anchor the preview sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Right,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub side: Side,
    /// The preview was moved above its default position.
    pub flipped: bool,
}

impl Placement {
    pub fn rect(&self, size: Size) -> Rect {
        Rect::at(self.x, self.y, size)
    }
}

/// Position a preview of `size` next to `anchor` inside `viewport`.
///
/// The preview goes right of the anchor, or left of it when the right side
/// overflows. Vertically it starts at the anchor's top and moves up to end at
/// the anchor's bottom when it would overflow the viewport's bottom edge.
/// When the preview fits the viewport, every edge of the result lies inside it.
pub fn place(anchor: Rect, size: Size, viewport: Size, options: &PlacementOptions) -> Placement {
    let mut side = Side::Right;
    let mut x = anchor.right() + options.offset_x;
    if x + size.width > viewport.width {
        side = Side::Left;
        x = anchor.left() - options.offset_x - size.width;
        if x < 0.0 {
            x = options.min_inset;
        }
    }

    let mut flipped = false;
    let mut y = anchor.top() + options.offset_y;
    if y + size.height > viewport.height {
        y = anchor.bottom() - size.height;
        flipped = true;
        if y < 0.0 {
            y = options.min_inset;
        }
    }

    Placement {
        x: clamp_axis(x, size.width, viewport.width),
        y: clamp_axis(y, size.height, viewport.height),
        side,
        flipped,
    }
}

fn clamp_axis(position: f64, length: f64, extent: f64) -> f64 {
    if length >= extent {
        return 0.0;
    }
    position.clamp(0.0, extent - length)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Size = Size {
        width: 1280.0,
        height: 720.0,
    };
    const PREVIEW: Size = Size {
        width: 400.0,
        height: 300.0,
    };

    fn place_default(anchor: Rect) -> Placement {
        place(anchor, PREVIEW, VIEWPORT, &PlacementOptions::default())
    }

    fn assert_inside(placement: &Placement) {
        let rect = placement.rect(PREVIEW);
        assert!(rect.is_within(&VIEWPORT), "{:?} escapes the viewport", rect);
    }

    #[test]
    fn test_default_is_right_of_anchor() {
        let placement = place_default(Rect::new(100.0, 100.0, 200.0, 40.0));
        assert_eq!(placement.side, Side::Right);
        assert_eq!((placement.x, placement.y), (320.0, 100.0));
        assert!(!placement.flipped);
    }

    #[test]
    fn test_right_edge_flips_left() {
        let placement = place_default(Rect::new(1000.0, 100.0, 200.0, 40.0));
        assert_eq!(placement.side, Side::Left);
        assert_eq!(placement.x, 580.0);
        assert_inside(&placement);
    }

    #[test]
    fn test_wide_anchor_clamps_to_inset() {
        let placement = place_default(Rect::new(0.0, 100.0, 900.0, 40.0));
        assert_eq!(placement.side, Side::Left);
        assert_eq!(placement.x, 8.0);
        assert_inside(&placement);
    }

    #[test]
    fn test_bottom_edge_flips_up() {
        let placement = place_default(Rect::new(100.0, 690.0, 200.0, 20.0));
        assert!(placement.flipped);
        assert_eq!(placement.y, 410.0);
        assert_inside(&placement);
    }

    #[test]
    fn test_every_edge_stays_inside() {
        let anchors = [
            Rect::new(0.0, 300.0, 40.0, 40.0),
            Rect::new(1240.0, 300.0, 40.0, 40.0),
            Rect::new(600.0, 0.0, 40.0, 40.0),
            Rect::new(600.0, 680.0, 40.0, 40.0),
            Rect::new(0.0, 0.0, 40.0, 40.0),
            Rect::new(1240.0, 680.0, 40.0, 40.0),
            Rect::new(-50.0, -50.0, 20.0, 20.0),
            Rect::new(1300.0, 800.0, 20.0, 20.0),
        ];
        for anchor in anchors {
            assert_inside(&place_default(anchor));
        }
    }

    #[test]
    fn test_oversized_preview_pins_to_origin() {
        let placement = place(
            Rect::new(500.0, 500.0, 10.0, 10.0),
            Size::new(2000.0, 1000.0),
            VIEWPORT,
            &PlacementOptions::default(),
        );
        assert_eq!((placement.x, placement.y), (0.0, 0.0));
    }
}
