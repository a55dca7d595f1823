//! Census Taker common types and errors.
//!
//! This crate provides foundational types shared across ct-* crates:
//! - The census document model and its builder
//! - Run and platform identity
//! - The unified error type

pub mod document;
pub mod error;
pub mod id;
pub mod platform;

pub use document::{CensusBuilder, CensusDocument};
pub use error::{Error, ErrorCategory, Result};
pub use id::RunId;
pub use platform::PlatformInfo;
