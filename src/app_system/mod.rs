//! System orchestration, startup, and shutdown logic.

pub mod system;
pub mod tracing;

pub use self::tracing::setup_tracing;
pub use system::*;
