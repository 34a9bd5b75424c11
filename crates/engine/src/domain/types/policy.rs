use std::collections::BTreeSet;

use serde::Serialize;
use url::Url;

use super::config::EngineDefaults;
use super::pin_set::PinSet;

/// One hostname's resolved pinning configuration.
///
/// Only produced by `PolicyArena::build`, after inheritance has been applied
/// and every field has a value. Immutable for the life of the
/// `TrustConfiguration` that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainPolicy {
    pub(crate) hostname: String,
    pub(crate) include_subdomains: bool,
    pub(crate) pin_set: PinSet,
    pub(crate) enforce_pinning: bool,
    pub(crate) disable_default_report_uri: bool,
    pub(crate) report_uris: BTreeSet<Url>,
}

impl DomainPolicy {
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn include_subdomains(&self) -> bool {
        self.include_subdomains
    }

    pub fn pin_set(&self) -> &PinSet {
        &self.pin_set
    }

    /// When false the policy is report-only: failures are reported but the
    /// connection is allowed to proceed.
    pub fn enforce_pinning(&self) -> bool {
        self.enforce_pinning
    }

    pub fn disable_default_report_uri(&self) -> bool {
        self.disable_default_report_uri
    }

    pub fn report_uris(&self) -> &BTreeSet<Url> {
        &self.report_uris
    }

    /// Every URI a pin failure for this policy should be sent to: the custom
    /// URIs, plus the default collector unless it was disabled.
    pub fn report_targets(&self) -> Vec<Url> {
        let mut targets: Vec<Url> = self.report_uris.iter().cloned().collect();
        if !self.disable_default_report_uri {
            if let Ok(default_uri) = Url::parse(EngineDefaults::DEFAULT_REPORT_URI) {
                if !targets.contains(&default_uri) {
                    targets.push(default_uri);
                }
            }
        }
        targets
    }
}
