//! Session establishment: handshake and negotiated parameters.

pub mod handshake;
mod params;

pub use params::{SessionConfig, SessionParams};
