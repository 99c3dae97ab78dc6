//! Core value types shared across the crate

pub mod color;
pub mod handle;
pub mod transform;
pub mod vector;

pub use color::ColorNumber;
pub use handle::Handle;
pub use transform::{Matrix3, Transform};
pub use vector::Vector3;
