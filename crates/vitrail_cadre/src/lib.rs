//! # vitrail_cadre
//!
//! Cadre - The frame around the canvas.
//!
//! ## Name Origin
//!
//! A **cadre** is the frame a picture hangs in. This crate models the
//! sandboxed frame the visual editor renders user content into: its own
//! document, its own window globals and its own event dispatch. It also owns
//! the [`AssetLoader`], which injects third-party widget scripts into a frame
//! exactly once and lets any number of callers await the result.
//!
//! ## Usage
//!
//! ```rust
//! use futures::executor::block_on;
//! use std::rc::Rc;
//! use vitrail_cadre::{AssetLoader, AssetSpec, Frame};
//! use vitrail_carton::Size;
//!
//! let frame = Frame::new(Size::new(1280.0, 720.0));
//! frame.set_global("lib", Rc::new(1_u8)).unwrap();
//!
//! let loader = AssetLoader::new();
//! let asset = AssetSpec::new("lib", "https://cdn.example/lib.js", "lib-script");
//! let library = block_on(loader.ensure(&frame, &asset, |frame| frame.global::<u8>("lib")));
//! assert!(library.is_some());
//! ```

pub mod dom;
pub mod loader;

pub use dom::{
    DomError, ElementRef, Event, EventKind, Frame, FrameId, Listener, ListenerId, NodeId, WeakFrame,
};
pub use loader::{AssetLoader, AssetResolution, AssetSpec, LoadStatus, LoadToken, LOADED_FLAG};
