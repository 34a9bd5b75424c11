// crates/engine/src/domain/validation.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::collaborators::{ChainTrustEvaluator, SpkiDigester, TrustAnchorEvaluator};
use super::configuration::TrustConfiguration;
use super::hostname::is_valid_hostname;
use super::types::{DebugOverride, DomainPolicy};

/// Outcome of checking one presented chain against one policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PinValidationResult {
    Success,
    Failed,
    CertificateChainNotTrusted,
    InvalidParameters,
    UserDefinedTrustAnchorFailure,
    CouldNotGenerateDigest,
}

impl PinValidationResult {
    pub fn is_success(self) -> bool {
        self == PinValidationResult::Success
    }
}

/// A result plus what the caller needs to act on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinEvaluation {
    pub result: PinValidationResult,
    /// Digest of every certificate in the chain, leaf first. Empty when the
    /// digests could not be computed.
    pub served_digests: Vec<String>,
    pub enforce_pinning: bool,
}

impl PinEvaluation {
    /// `Failed` only blocks when the policy enforces pinning; every other
    /// non-success result always blocks.
    pub fn should_block_connection(&self) -> bool {
        match self.result {
            PinValidationResult::Success => false,
            PinValidationResult::Failed => self.enforce_pinning,
            _ => true,
        }
    }

    pub fn should_report(&self) -> bool {
        self.result == PinValidationResult::Failed
    }
}

/// Stateless pin checker. Holds only references to its collaborators and
/// can be shared between threads and connections.
pub struct PinValidator<'a> {
    digester: &'a dyn SpkiDigester,
    chain_trust: &'a dyn ChainTrustEvaluator,
    debug: Option<(&'a DebugOverride, &'a dyn TrustAnchorEvaluator)>,
}

impl<'a> PinValidator<'a> {
    pub fn new(digester: &'a dyn SpkiDigester, chain_trust: &'a dyn ChainTrustEvaluator) -> Self {
        Self {
            digester,
            chain_trust,
            debug: None,
        }
    }

    /// Lets chains anchored to a debug trust anchor skip pin checks when the
    /// override asks for it.
    pub fn with_debug_override(
        mut self,
        debug_override: &'a DebugOverride,
        anchors: &'a dyn TrustAnchorEvaluator,
    ) -> Self {
        self.debug = Some((debug_override, anchors));
        self
    }

    pub fn validate(
        &self,
        policy: &DomainPolicy,
        chain: &[Vec<u8>],
        now: DateTime<Utc>,
    ) -> PinValidationResult {
        self.evaluate(policy, chain, now).result
    }

    /// Classification, highest priority first: invalid parameters, digest
    /// failure, debug anchor handling, CA trust, then the pins themselves.
    pub fn evaluate(
        &self,
        policy: &DomainPolicy,
        chain: &[Vec<u8>],
        now: DateTime<Utc>,
    ) -> PinEvaluation {
        let outcome = |result, served_digests| PinEvaluation {
            result,
            served_digests,
            enforce_pinning: policy.enforce_pinning(),
        };

        if chain.is_empty()
            || chain.iter().any(|cert| cert.is_empty())
            || !is_valid_hostname(policy.hostname())
        {
            return outcome(PinValidationResult::InvalidParameters, Vec::new());
        }

        let served_digests = match chain
            .iter()
            .map(|cert| self.digester.spki_digest(cert))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(digests) => digests,
            Err(e) => {
                debug!(hostname = policy.hostname(), error = %e, "could not generate SPKI digest");
                return outcome(PinValidationResult::CouldNotGenerateDigest, Vec::new());
            }
        };

        let mut debug_bypass_expected = false;
        if let Some((debug_override, anchors)) = self.debug {
            if debug_override.bypasses_pins() {
                if anchors.chains_to_anchor(chain, debug_override.trust_anchors()) {
                    debug!(hostname = policy.hostname(), "chain anchored to debug trust anchor; pins skipped");
                    return outcome(PinValidationResult::Success, served_digests);
                }
                debug_bypass_expected = true;
            }
        }

        if !self.chain_trust.is_trusted(chain) {
            let result = if debug_bypass_expected {
                PinValidationResult::UserDefinedTrustAnchorFailure
            } else {
                PinValidationResult::CertificateChainNotTrusted
            };
            return outcome(result, served_digests);
        }

        let pin_set = policy.pin_set();
        let result = if pin_set.is_expired_at(now) {
            debug!(hostname = policy.hostname(), expiration = ?pin_set.expiration_date(), "pin set expired");
            PinValidationResult::Failed
        } else if served_digests.iter().any(|d| pin_set.contains(d)) {
            PinValidationResult::Success
        } else {
            PinValidationResult::Failed
        };
        debug!(hostname = policy.hostname(), ?result, "pin validation finished");
        outcome(result, served_digests)
    }

    /// Resolve + evaluate in one go. `None` when no policy covers the
    /// hostname; a malformed hostname yields `InvalidParameters`.
    pub fn evaluate_connection(
        &self,
        config: &TrustConfiguration,
        hostname: &str,
        chain: &[Vec<u8>],
        now: DateTime<Utc>,
    ) -> Option<PinEvaluation> {
        match config.resolve(hostname) {
            Ok(Some(policy)) => Some(self.evaluate(policy, chain, now)),
            Ok(None) => None,
            Err(_) => Some(PinEvaluation {
                result: PinValidationResult::InvalidParameters,
                served_digests: Vec::new(),
                enforce_pinning: true,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use chrono::TimeZone;

    use crate::domain::builder::PolicyArena;
    use crate::domain::collaborators::PrecomputedChainTrust;
    use crate::domain::error::{EngineError, EngineResult};
    use crate::domain::types::{DomainSpec, LoadOptions, PinConfig, PinSetConfig, TrustkitConfig};

    /// Certificates in these tests are just their digest as bytes.
    struct EchoDigester;

    impl SpkiDigester for EchoDigester {
        fn spki_digest(&self, certificate_der: &[u8]) -> EngineResult<String> {
            String::from_utf8(certificate_der.to_vec())
                .map_err(|_| EngineError::InvalidParameters("not utf-8".into()))
        }
    }

    struct FirstByteAnchor;

    impl TrustAnchorEvaluator for FirstByteAnchor {
        fn chains_to_anchor(&self, chain: &[Vec<u8>], anchors: &BTreeSet<Vec<u8>>) -> bool {
            chain.iter().any(|c| anchors.contains(c))
        }
    }

    fn policy(expiration: Option<&str>, enforce: bool) -> DomainPolicy {
        let mut arena = PolicyArena::new();
        let id = arena.push_root();
        let b = arena.get_mut(id).unwrap();
        b.set_domain(&DomainSpec { hostname: "example.com".into(), include_subdomains: Some(true) })
            .unwrap();
        b.set_pin_set(&PinSetConfig {
            expiration: expiration.map(str::to_string),
            pins: vec![PinConfig::sha256("GOOD")],
        })
        .unwrap();
        b.set_trustkit_config(&TrustkitConfig {
            enforce_pinning: Some(enforce),
            ..TrustkitConfig::default()
        })
        .unwrap();
        arena.build(id, &LoadOptions::default()).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn chain(items: &[&str]) -> Vec<Vec<u8>> {
        items.iter().map(|s| s.as_bytes().to_vec()).collect()
    }

    #[test]
    fn pinned_digest_anywhere_in_chain_succeeds() {
        let trusted = PrecomputedChainTrust(true);
        let validator = PinValidator::new(&EchoDigester, &trusted);
        let result = validator.validate(&policy(None, true), &chain(&["LEAF", "GOOD", "ROOT"]), now());
        assert_eq!(result, PinValidationResult::Success);
    }

    #[test]
    fn unpinned_chain_fails() {
        let trusted = PrecomputedChainTrust(true);
        let validator = PinValidator::new(&EchoDigester, &trusted);
        let eval = validator.evaluate(&policy(None, false), &chain(&["LEAF", "ROOT"]), now());
        assert_eq!(eval.result, PinValidationResult::Failed);
        assert_eq!(eval.served_digests, vec!["LEAF".to_string(), "ROOT".to_string()]);
        assert!(eval.should_report());
        assert!(!eval.should_block_connection(), "report-only lets the connection through");
    }

    #[test]
    fn expired_pin_set_fails_even_when_pinned() {
        let trusted = PrecomputedChainTrust(true);
        let validator = PinValidator::new(&EchoDigester, &trusted);
        let result = validator.validate(&policy(Some("2000-01-01"), true), &chain(&["GOOD"]), now());
        assert_eq!(result, PinValidationResult::Failed);
    }

    #[test]
    fn priority_order() {
        let untrusted = PrecomputedChainTrust(false);
        let validator = PinValidator::new(&EchoDigester, &untrusted);
        let p = policy(None, true);

        assert_eq!(validator.validate(&p, &[], now()), PinValidationResult::InvalidParameters);
        assert_eq!(
            validator.validate(&p, &[vec![0xff, 0xfe]], now()),
            PinValidationResult::CouldNotGenerateDigest
        );
        assert_eq!(
            validator.validate(&p, &chain(&["GOOD"]), now()),
            PinValidationResult::CertificateChainNotTrusted
        );
    }

    #[test]
    fn debug_anchor_bypasses_pins_only_when_overriding() {
        let untrusted = PrecomputedChainTrust(false);
        let anchored = DebugOverride::new(true, vec![b"DEBUG-CA".to_vec()]);
        let validator = PinValidator::new(&EchoDigester, &untrusted)
            .with_debug_override(&anchored, &FirstByteAnchor);
        let p = policy(None, true);

        assert_eq!(
            validator.validate(&p, &chain(&["LEAF", "DEBUG-CA"]), now()),
            PinValidationResult::Success
        );
        assert_eq!(
            validator.validate(&p, &chain(&["LEAF", "OTHER-CA"]), now()),
            PinValidationResult::UserDefinedTrustAnchorFailure
        );

        let not_overriding = DebugOverride::new(false, vec![b"DEBUG-CA".to_vec()]);
        let validator = PinValidator::new(&EchoDigester, &untrusted)
            .with_debug_override(&not_overriding, &FirstByteAnchor);
        assert_eq!(
            validator.validate(&p, &chain(&["LEAF", "DEBUG-CA"]), now()),
            PinValidationResult::CertificateChainNotTrusted
        );
    }

    #[test]
    fn debug_override_falls_back_to_pins_for_ca_trusted_chains() {
        let trusted = PrecomputedChainTrust(true);
        let anchored = DebugOverride::new(true, vec![b"DEBUG-CA".to_vec()]);
        let validator = PinValidator::new(&EchoDigester, &trusted)
            .with_debug_override(&anchored, &FirstByteAnchor);
        let p = policy(None, true);
        assert_eq!(validator.validate(&p, &chain(&["GOOD"]), now()), PinValidationResult::Success);
        assert_eq!(validator.validate(&p, &chain(&["LEAF"]), now()), PinValidationResult::Failed);
    }

    #[test]
    fn closures_act_as_chain_trust() {
        let only_two_long = |chain: &[Vec<u8>]| chain.len() == 2;
        let validator = PinValidator::new(&EchoDigester, &only_two_long);
        let p = policy(None, true);
        assert_eq!(validator.validate(&p, &chain(&["GOOD", "ROOT"]), now()), PinValidationResult::Success);
        assert_eq!(
            validator.validate(&p, &chain(&["GOOD"]), now()),
            PinValidationResult::CertificateChainNotTrusted
        );
    }

    #[test]
    fn blocking_rules() {
        let eval = |result, enforce_pinning| PinEvaluation { result, served_digests: vec![], enforce_pinning };
        assert!(!eval(PinValidationResult::Success, true).should_block_connection());
        assert!(eval(PinValidationResult::Failed, true).should_block_connection());
        assert!(!eval(PinValidationResult::Failed, false).should_block_connection());
        assert!(eval(PinValidationResult::CertificateChainNotTrusted, false).should_block_connection());
    }
}
