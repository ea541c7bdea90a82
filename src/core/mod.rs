//! Core constants, error types, and the sequence-number type.
//!
//! Everything in this module is independent of the transport and of any
//! particular peer role.

pub mod constants;
mod error;
mod seq;

pub use error::*;
pub use seq::Seq;
