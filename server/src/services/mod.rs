// Candela Services
// Business logic layer

mod events;
mod host;
mod locale_manager;
mod log_manager;
mod palette;
mod settings_manager;

pub use events::*;
pub use host::*;
pub use locale_manager::*;
pub use log_manager::*;
pub use palette::*;
pub use settings_manager::*;
