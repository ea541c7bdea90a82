//! Wire codec, UDP socket wrapper, and retransmission timing.

pub mod packet;
pub mod socket;
pub mod timing;

pub use packet::{ControlFlag, Packet};
pub use socket::DriftSocket;
pub use timing::RtoEstimator;
