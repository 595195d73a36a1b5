pub mod countdown;
pub mod timer;

pub use countdown::{Countdown, TICK_NS, Ticket};
pub use timer::{HighPrecisionTimer, ManualTimer, Timer};
