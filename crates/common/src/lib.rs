//! Common types shared by the QuickSight provider crates

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
