//! # vitrail_musea
//!
//! Musea - The gallery where blocks are shown before they are used.
//!
//! ## Name Origin
//!
//! **Musea** is the plural of museum. The block palette of the editor is a
//! small museum of everything the user can drop onto the canvas, and this
//! crate curates it: the [`PaletteCatalog`] describing each entry, the
//! preview fragments rendered for them, the placement of a preview next to
//! the hovered entry, and the [`HoverPreviewEngine`] that ties these to
//! pointer events.
//!
//! ## Usage
//!
//! ```rust
//! use vitrail_musea::{place, render_preview, PaletteCatalog, PlacementOptions};
//! use vitrail_carton::{Rect, Size};
//!
//! let catalog = PaletteCatalog::from_json(r#"[{"id": "faq", "label": "FAQ", "kind": "accordion"}]"#).unwrap();
//! let html = render_preview(catalog.get("faq").unwrap());
//! assert!(html.contains("block-preview--collapse"));
//!
//! let placement = place(
//!     Rect::new(1000.0, 100.0, 200.0, 40.0),
//!     Size::new(400.0, 300.0),
//!     Size::new(1280.0, 720.0),
//!     &PlacementOptions::default(),
//! );
//! assert_eq!(placement.x, 580.0);
//! ```

pub mod catalog;
pub mod engine;
pub mod placement;
pub mod preview;

pub use catalog::{CatalogError, PaletteCatalog, PaletteEntry};
pub use engine::{
    HoverOptions, HoverPhase, HoverPreviewEngine, ENTRY_ID_ATTRIBUTE, LEAVING_CLASS, TOOLTIP_CLASS,
};
pub use placement::{place, Placement, PlacementOptions, Side};
pub use preview::{render_preview, render_unknown, PreviewKind, Renderer};
