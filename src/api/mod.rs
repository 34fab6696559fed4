//! API response types

pub mod response;

pub use response::{Created, DataResponse, NoContent};
