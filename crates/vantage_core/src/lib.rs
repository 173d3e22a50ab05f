//! Vantage Core
//!
//! Small, allocation-free math types and the error type shared by every
//! vantage crate.
//!
//! # Modules
//!
//! - [`math`] - `Vec3`, `Quat`, `Mat4`
//! - [`error`] - `VantageError` and the `Result` alias

pub mod error;
pub mod math;

pub use error::{Result, VantageError};
pub use math::{Mat4, Quat, Vec3};
