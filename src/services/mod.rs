//! Service layer modules.
//!
//! Contains the caregiver profile store and the pieces it is built from.

pub mod caregiver_row;
pub mod keyed_lock;
pub mod profile_store;

pub use profile_store::{ProfileStore, StoreError};
