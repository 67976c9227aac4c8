//! Cycle based simulation of synchronous digital systems built out of modules.
//!
//! Declare the ports of a module type with [ports!], implement [Module] for it, register
//! instances in a [System], wire them together and step the clock.
#[macro_use]
pub mod graph;
pub mod data_structures;
pub mod circuits;
pub use circuits::*;
pub use graph::*;
