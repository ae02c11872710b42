//! The shared area every dungeon run is built in.
//!
//! One area hosts all concurrently active runs. Each run gets its own grid
//! cell ("slot"), far enough from its neighbours that runs never overlap,
//! so no locking is needed between them.
//!
//! Lifecycle:
//!
//! ```text
//! UNINITIALIZED ──initialize──▶ READY ──shutdown──▶ DESTROYED
//!                                 │ ▲
//!                                 └─┘ reset
//! ```
//!
//! The area itself is created and destroyed by an [`AreaBackend`]; this
//! crate decides *when*, and makes sure nobody is left inside when it
//! goes.

mod backend;
mod config;
mod error;
mod space;

pub use backend::{AreaBackend, BackendError};
pub use config::{AreaSettings, SpaceConfig};
pub use error::SpaceError;
pub use space::{InstanceSpace, Slot, SpaceState};
