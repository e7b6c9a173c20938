//! # vitrail_atelier
//!
//! Atelier - The workshop where components are put together.
//!
//! ## Name Origin
//!
//! An **atelier** is the workshop where pieces are assembled before they go
//! on display. This crate holds the component model of the editor: the
//! registry of component types with their trait schema, the reconciler that
//! keeps a component's managed classes consistent with its traits, and the
//! [`WidgetBinding`] controller that keeps an imperative widget (a carousel,
//! a collapsible panel) in sync with the declarative component.
//!
//! ## Usage
//!
//! ```rust
//! use vitrail_atelier::{reconcile, ClassList, ManagedClassSpec};
//!
//! let spec = ManagedClassSpec::from_slices(&["card"], &[&["shadow-sm", "shadow-lg"]]).unwrap();
//! let current = ClassList::parse("classA card shadow-sm");
//! let next = reconcile(&current, &spec, &["shadow-lg"]);
//! assert_eq!(next.to_attribute(), "classA card shadow-lg");
//! ```

pub mod adapters;
pub mod binding;
pub mod classes;
pub mod component;
pub mod registry;
pub mod widget;

pub use adapters::{
    bootstrap_asset, normalize_interval, CarouselAdapter, CarouselOptions, CollapseAdapter,
    CollapseOptions, Interval, PauseOn, BOOTSTRAP_GLOBAL, DEFAULT_CAROUSEL_INTERVAL_MS,
    MAX_TIMER_MS,
};
pub use binding::{
    BindOutcome, BindingError, BindingState, UpdateOutcome, WidgetBinding, ID_PLACEHOLDER,
};
pub use classes::{reconcile, reconcile_classes, ClassList, ClassSpecError, ManagedClassSpec};
pub use component::{Attributes, ComponentInstance};
pub use registry::{
    builtin_types, ComponentRegistry, ComponentType, RegistryError, TraitEffect, TraitKind,
    TraitSpec,
};
pub use widget::{LibraryHandle, WidgetAdapter, WidgetHandle, WidgetInstance, WidgetLibrary};
