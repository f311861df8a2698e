//! Daemon components.
//!
//! Components are the building blocks of the daemon. Each component handles
//! a specific domain and can:
//!
//! - React to events
//! - Spawn background tasks
//! - Share state with the outside through a cloneable handle
//!
//! Available components:
//!
//! - [`category::CategoryComponent`]: Category index and filter memory
//! - [`sync::SyncComponent`]: Periodic server sync

pub mod category;
pub mod sync;

pub use category::CategoryComponent;
pub use sync::SyncComponent;
