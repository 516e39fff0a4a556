//! Synchronization between the store and the remote catalog
//!
//! `SyncController` turns user intents into repository calls and applies the
//! results to the `CatalogStore`. `SequenceTracker` is the stale-completion
//! guard it relies on.

mod controller;
mod sequence;

pub use controller::{SaveResult, SyncController, SyncResult, EXTERNAL_NOT_FOUND};
pub use sequence::{SequenceClass, SequenceTracker, Ticket};
