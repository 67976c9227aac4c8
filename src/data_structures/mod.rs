mod bit_set;
mod work_queue;
pub use bit_set::*;
pub use work_queue::*;
