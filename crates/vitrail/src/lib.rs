//! # Vitrail
//!
//! Widget and palette runtime for block-based visual page editors.
//!
//! This crate re-exports the Vitrail sub-crates for unified documentation
//! and adds the [`Runtime`] object that wires them together per editor.
//!
//! ## Name Origin
//!
//! A **vitrail** is a stained-glass window: many small panes held in one
//! frame. The editor canvas is such a window, assembled from blocks that
//! each carry their own widget.
//!
//! ## Crates
//!
//! - [`carton`] - Shared utilities: geometry, ids, scheduling and retry
//! - [`cadre`] - Headless frame document and the asset loader
//! - [`atelier`] - Component model, class reconciliation and widget binding
//! - [`musea`] - Block palette catalog and hover previews
//!
//! ## Usage
//!
//! ```rust
//! use std::rc::Rc;
//! use vitrail::{ManualScheduler, Runtime, RuntimeConfig};
//!
//! let runtime = Runtime::new(RuntimeConfig::default(), Rc::new(ManualScheduler::new())).unwrap();
//! let card = runtime.instantiate("card").unwrap();
//! assert_eq!(card.classes.to_attribute(), "card shadow-sm");
//! ```

pub mod config;
pub mod runtime;

/// Shared utilities: geometry, ids, scheduling and retry.
pub use vitrail_carton as carton;

/// Headless frame document and the asset loader.
pub use vitrail_cadre as cadre;

/// Component model, class reconciliation and widget binding.
pub use vitrail_atelier as atelier;

/// Block palette catalog and hover previews.
pub use vitrail_musea as musea;

pub use config::{
    load_config, load_config_file, load_config_from_str, ConfigError, HoverConfig, RetryConfig,
    RuntimeConfig, WidgetConfig, CONFIG_FILE_NAME, CONFIG_SCHEMA,
};
pub use runtime::{ComponentBinding, Runtime, RuntimeError};
pub use vitrail_carton::{ManualScheduler, Scheduler};
