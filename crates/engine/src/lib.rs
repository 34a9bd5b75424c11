// crates/engine/src/lib.rs

//! Public facade for the PinKit engine.
//! Exposes a stable API and re-exports types for consumers (host apps, FFI).

pub mod adapters;
pub mod crypto;
pub mod domain;

use domain::collaborators::{CertificateLoader, PolicyEventSource};
use domain::error::EngineResult;

// High-level helpers for the common "load once at startup" path.

/// Build a configuration from policy document events using the secure
/// default options.
pub fn load_policy_document(
    source: &mut dyn PolicyEventSource,
    loader: &dyn CertificateLoader,
) -> EngineResult<TrustConfiguration> {
    TrustConfiguration::from_policy_document(source, loader, &LoadOptions::secure_default())
}

/// Same as `load_policy_document`, for the JSON form of the policy.
pub fn load_policy_json(json: &str, loader: &dyn CertificateLoader) -> EngineResult<TrustConfiguration> {
    TrustConfiguration::from_json(json, loader, &LoadOptions::secure_default())
}

/// Validator wired to the built-in SPKI digester and, when the
/// configuration carries one, the debug override with signature-based
/// anchor checks.
#[cfg(feature = "x509")]
pub fn default_validator<'a>(
    chain_trust: &'a dyn ChainTrustEvaluator,
    config: &'a TrustConfiguration,
) -> PinValidator<'a> {
    static DIGESTER: crypto::spki::Sha256SpkiDigester = crypto::spki::Sha256SpkiDigester;
    static ANCHORS: crypto::anchors::SignatureAnchorEvaluator = crypto::anchors::SignatureAnchorEvaluator;

    PinValidator::new(&DIGESTER, chain_trust).with_debug_override(config.debug_override(), &ANCHORS)
}

// Re-exports for convenience
pub use adapters::events::EventDocument;
pub use adapters::resources::{DirectoryCertificateLoader, InMemoryCertificateLoader};
#[cfg(feature = "x509")]
pub use crypto::{anchors::SignatureAnchorEvaluator, spki::Sha256SpkiDigester};
pub use domain::collaborators::{
    ChainTrustEvaluator, PolicyEvent, PrecomputedChainTrust, SpkiDigester, StartTag,
    TrustAnchorEvaluator,
};
pub use domain::configuration::TrustConfiguration;
pub use domain::error::EngineError;
pub use domain::global::{initialize, trust_configuration};
pub use domain::report::PinFailureReport;
pub use domain::types::{DebugOverride, DomainPolicy, EngineDefaults, LoadOptions, PinSet, PolicyDocument};
pub use domain::validation::{PinEvaluation, PinValidationResult, PinValidator};
