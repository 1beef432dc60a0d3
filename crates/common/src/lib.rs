//! Types shared by the ghctl crates

pub mod env;
mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
