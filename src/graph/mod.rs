mod config;
mod connection;
mod dot;
mod error;
mod handles;
#[macro_use]
mod module;
mod propagation;
mod scope;
mod signals;
mod system;
pub use config::*;
pub use connection::{Connection, Driver};
pub use error::*;
pub use handles::*;
pub use module::{ClockContext, Module, Ports, UpdateContext};
pub use scope::{vcd_id, VcdScope};
pub use signals::*;
pub use system::{ModuleRef, StopReason, System, SystemInput, SYSTEM_INPUTS, SYSTEM_NAME};
