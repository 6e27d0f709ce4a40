//! Lazy materialization of stubs into live nodes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐  get_live   ┌──────────────────────┐  miss   ┌──────────────┐
//! │ StubRef  │────────────▶│ MaterializationCache │────────▶│ TypeRegistry │
//! └──────────┘             │ (slot per node,      │◀────────│ (kind →      │
//!                          │  lock per tree)      │ LiveNode│  factory)    │
//!                          └──────────────────────┘         └──────────────┘
//! ```
//!
//! The first caller for a node runs the factory under the tree's lock; every
//! later caller reads the populated slot without locking.

mod cache;
mod node;
mod registry;

pub use cache::MaterializationCache;
pub use node::{Element, LiveNode};
pub use registry::{StubFactory, TypeRegistry, TypeRegistryBuilder};
