// Candela Commands
// The UI command catalog and the single-worker boundary that runs it

mod boundary;
mod command;
mod queue;
mod system;

#[cfg(test)]
mod testing;

pub use boundary::*;
pub use command::*;
pub use queue::*;
pub use system::*;
