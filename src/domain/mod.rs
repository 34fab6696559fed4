//! Domain types and pure profile logic
//!
//! The caregiver entity, its merge policies and completeness scoring. Nothing
//! here touches storage.

pub mod caregivers;
pub mod completeness;
pub mod merge;

// Re-export commonly used types
pub use caregivers::*;
pub use completeness::CompletenessReport;
