//! Persistence layer for user preferences and the cached forecast response
//!
//! See [`prefs::Preferences`] for the observable store contract.

pub mod prefs;

pub use prefs::{DiskBackend, MemoryBackend, PrefBackend, PrefData, Preferences, SavedLocation};
