// crates/engine/src/domain/global.rs

//! Process-wide slot for hosts that cannot thread a `TrustConfiguration`
//! through to their connection code. Set once at startup, read-only after.

use once_cell::sync::OnceCell;
use tracing::info;

use super::configuration::TrustConfiguration;
use super::error::{EngineError, EngineResult};

static TRUST_CONFIGURATION: OnceCell<TrustConfiguration> = OnceCell::new();

/// Publishes a fully built configuration. The value is built before this
/// call, so readers never observe a partial configuration. A second call
/// fails with `AlreadyInitialized` and leaves the first value in place.
pub fn initialize(config: TrustConfiguration) -> EngineResult<&'static TrustConfiguration> {
    match TRUST_CONFIGURATION.try_insert(config) {
        Ok(installed) => {
            info!(domains = installed.policies().len(), "trust configuration initialized");
            Ok(installed)
        }
        Err(_) => Err(EngineError::AlreadyInitialized),
    }
}

/// The published configuration, if `initialize` has run.
pub fn trust_configuration() -> Option<&'static TrustConfiguration> {
    TRUST_CONFIGURATION.get()
}
