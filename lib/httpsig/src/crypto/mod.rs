//!
//! Common cryptographic operations
//!

mod sign;
mod verify;

pub mod algorithm;
pub mod key;

pub use self::sign::{sign, SigningKey};
pub use self::verify::verify;
