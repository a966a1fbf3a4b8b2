//! # Core Module
//!
//! Concurrency primitives shared by every subsystem of the engine.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking
//! - `ConcurrentSet`: Thread-safe set whose `add` is an atomic insert-if-absent, used to
//!   coalesce background work per chunk
//!
//! ## Usage
//! ```rust
//! use curved_voxel_engine::core::{ConcurrentSet, MtResource};
//!
//! // Thread-safe resource
//! let counter = MtResource::new(0);
//! *counter.get_mut() += 1;
//! assert_eq!(*counter.get(), 1);
//!
//! // Work coalescing
//! let queued = ConcurrentSet::new();
//! assert!(queued.add((0, 0, 0)));
//! assert!(!queued.add((0, 0, 0)));
//! ```

pub mod concurrent_set;
pub mod mt_resource;

pub use concurrent_set::ConcurrentSet;
pub use mt_resource::MtResource;
