//! Core types for fnshim
//!
//! This crate provides the error taxonomy and request ids shared by the
//! function crate and the hosting binary.

pub mod error;
pub mod request_id;

pub use error::{ErrorCode, HostError};
pub use request_id::RequestId;
