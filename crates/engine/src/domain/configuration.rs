// crates/engine/src/domain/configuration.rs

use std::collections::HashSet;

use tracing::debug;

use super::collaborators::{CertificateLoader, PolicyEventSource};
use super::error::{EngineError, EngineResult};
use super::hostname::{is_subdomain_of, is_valid_hostname};
use super::parser::{arena_from_document, parse_policy_document, ParsedPolicy};
use super::types::{DebugOverride, DomainPolicy, LoadOptions, PolicyDocument};

/// The finished, validated set of domain policies plus the debug override.
///
/// Construction either yields a complete value or an error; nothing is
/// mutated afterwards, so one instance can be shared across threads for the
/// life of the process.
#[derive(Debug, Clone)]
pub struct TrustConfiguration {
    policies: Vec<DomainPolicy>,
    debug_override: DebugOverride,
}

impl TrustConfiguration {
    /// Rejects an empty policy list and hostnames declared twice (ignoring
    /// ASCII case).
    pub fn new(
        policies: Vec<DomainPolicy>,
        debug_override: Option<DebugOverride>,
    ) -> EngineResult<Self> {
        if policies.is_empty() {
            return Err(EngineError::NoDomains);
        }
        let mut seen = HashSet::with_capacity(policies.len());
        for policy in &policies {
            if !seen.insert(policy.hostname().to_ascii_lowercase()) {
                return Err(EngineError::DuplicateHostname(policy.hostname().to_string()));
            }
        }
        Ok(Self {
            policies,
            debug_override: debug_override.unwrap_or_default(),
        })
    }

    /// Load from a stream of markup events.
    pub fn from_policy_document(
        source: &mut dyn PolicyEventSource,
        loader: &dyn CertificateLoader,
        options: &LoadOptions,
    ) -> EngineResult<Self> {
        let parsed = parse_policy_document(source, loader)?;
        Self::from_parsed(parsed, options)
    }

    /// Load from the declarative model, for policies built in code.
    pub fn from_domain_configs(
        document: &PolicyDocument,
        loader: &dyn CertificateLoader,
        options: &LoadOptions,
    ) -> EngineResult<Self> {
        let parsed = arena_from_document(document, loader)?;
        Self::from_parsed(parsed, options)
    }

    pub fn from_json(
        json: &str,
        loader: &dyn CertificateLoader,
        options: &LoadOptions,
    ) -> EngineResult<Self> {
        let document: PolicyDocument = serde_json::from_str(json)?;
        Self::from_domain_configs(&document, loader, options)
    }

    fn from_parsed(parsed: ParsedPolicy, options: &LoadOptions) -> EngineResult<Self> {
        let policies = parsed.arena.build_all(options)?;
        let config = Self::new(policies, parsed.debug_override)?;
        debug!(
            domains = config.policies.len(),
            override_pins = config.debug_override.override_pins(),
            debug_anchors = config.debug_override.trust_anchors().len(),
            "trust configuration built"
        );
        Ok(config)
    }

    pub fn policies(&self) -> &[DomainPolicy] {
        &self.policies
    }

    pub fn debug_override(&self) -> &DebugOverride {
        &self.debug_override
    }

    /// Most specific policy for `hostname`.
    ///
    /// An exact hostname match wins outright. Otherwise the longest
    /// include-subdomains policy whose hostname is a dot-anchored suffix of
    /// `hostname` is chosen. `Ok(None)` means no pinning applies.
    pub fn resolve(&self, hostname: &str) -> EngineResult<Option<&DomainPolicy>> {
        if !is_valid_hostname(hostname) {
            return Err(EngineError::InvalidParameters(format!(
                "invalid domain supplied: {hostname:?}"
            )));
        }

        if let Some(exact) = self
            .policies
            .iter()
            .find(|p| p.hostname().eq_ignore_ascii_case(hostname))
        {
            debug!(hostname, policy = exact.hostname(), "exact policy match");
            return Ok(Some(exact));
        }

        let mut best: Option<&DomainPolicy> = None;
        for policy in self
            .policies
            .iter()
            .filter(|p| p.include_subdomains() && is_subdomain_of(p.hostname(), hostname))
        {
            match best {
                Some(current) if policy.hostname().len() == current.hostname().len() => {
                    return Err(EngineError::AmbiguousPolicy(hostname.to_string()));
                }
                Some(current) if policy.hostname().len() < current.hostname().len() => {}
                _ => best = Some(policy),
            }
        }
        debug!(hostname, policy = best.map(DomainPolicy::hostname), "subdomain policy match");
        Ok(best)
    }
}
