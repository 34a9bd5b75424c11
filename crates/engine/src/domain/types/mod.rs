// Re-export all types so callers can use `domain::types::*`
// while the definitions stay split by concern.

pub use source::*;
pub use pin_set::*;
pub use policy::*;
pub use debug::*;
pub use config::*;

// Module declarations
mod source;
mod pin_set;
mod policy;
mod debug;
mod config;
