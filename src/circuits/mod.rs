mod bus;
mod clock;
mod counting_register;
mod logic;
mod switch;
pub use bus::*;
pub use clock::*;
pub use counting_register::*;
pub use logic::*;
pub use switch::*;
