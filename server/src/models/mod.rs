// Candela Models
// Data structures shared by the services and the command boundary

mod catalog;
mod invoke;
mod paths;

pub use catalog::*;
pub use invoke::*;
pub use paths::*;
