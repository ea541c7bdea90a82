//! Receiving side: reassembly buffer and transfer engine.

mod engine;
mod reassembly;

pub use engine::{FileOutcome, FileReceiver};
pub use reassembly::{Reassembly, ReceiveOutcome, Segment};
