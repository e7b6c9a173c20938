//! Carton - The toolbox for Vitrail.
//!
//! This crate provides the small, dependency-light building blocks shared by
//! every Vitrail crate: geometry for overlay placement, collision-resistant
//! id tokens, a single-threaded timer abstraction and a bounded retry
//! primitive built on top of it.
//!
//! # Modules
//!
//! - **geometry**: `Rect` and `Size` in CSS pixels
//! - **ident**: random id tokens for DOM nodes
//! - **schedule**: the `Scheduler` trait and a deterministic `ManualScheduler`
//! - **retry**: `retry(fn, policy)` with pluggable `Backoff`
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use std::time::Duration;
//! use vitrail_carton::{retry, Backoff, ManualScheduler, RetryPolicy, Scheduler};
//!
//! let scheduler = Rc::new(ManualScheduler::new());
//! let policy = RetryPolicy::new(3, Backoff::Fixed(Duration::from_millis(10)));
//! let handle = retry(scheduler.clone(), policy, |_| false, |_| {});
//!
//! scheduler.advance(Duration::from_millis(100));
//! assert_eq!(handle.attempts(), 3);
//! ```

pub mod geometry;
pub mod ident;
pub mod retry;
pub mod schedule;

pub use geometry::{Rect, Size};
pub use ident::{generate_id, generate_unique_id};
pub use retry::{retry, Backoff, Retry, RetryOutcome, RetryPolicy};
pub use schedule::{ManualScheduler, Scheduler, TimerId};

// Re-export compact_str::CompactString for convenience
pub use compact_str::CompactString;

// Re-export smallvec for stack-optimized collections
pub use smallvec::{smallvec, SmallVec};

// Re-export rustc-hash for fast hash maps/sets
pub use rustc_hash::{FxHashMap, FxHashSet};

// Re-export phf for compile-time lookup tables
pub use phf::{phf_map, phf_set, Map as PhfMap, Set as PhfSet};
