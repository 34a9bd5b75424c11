// crates/engine/src/domain/builder.rs

//! Pre-validation policy builders and the arena that links them.
//!
//! Each `<domain-config>` gets one builder. A nested config points at its
//! enclosing config by index, and parents are always pushed before their
//! children, so a parent index is strictly smaller than its child's. Unset
//! fields are looked up through the ancestors only when `build` runs, which
//! keeps sibling subtrees independent of each other.

use std::collections::BTreeSet;

use super::error::{EngineError, EngineResult};
use super::hostname::is_parsable_hostname;
use super::report::validate_report_uri;
use super::types::{
    parse_expiration_date, DigestAlgorithm, DomainPolicy, DomainSpec, EngineDefaults, LoadOptions,
    PinSet, PinSetConfig, TrustkitConfig,
};

/// Index of a builder inside its `PolicyArena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuilderId(usize);

impl BuilderId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A `<pin-set>` as declared; the expiration is checked at build time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PinSetDraft {
    digests: BTreeSet<String>,
    expiration: Option<String>,
}

/// Every field optional; `None` means "inherit".
#[derive(Debug, Clone, Default)]
pub struct PolicyBuilder {
    parent: Option<BuilderId>,
    hostname: Option<String>,
    include_subdomains: Option<bool>,
    pin_set: Option<PinSetDraft>,
    enforce_pinning: Option<bool>,
    disable_default_report_uri: Option<bool>,
    report_uris: Option<BTreeSet<String>>,
    has_domain: bool,
    has_trustkit_config: bool,
}

impl PolicyBuilder {
    pub fn parent(&self) -> Option<BuilderId> {
        self.parent
    }

    /// Hostname and include-subdomains come from one `<domain>` element as a
    /// whole; a second one in the same scope is rejected.
    pub fn set_domain(&mut self, domain: &DomainSpec) -> EngineResult<&mut Self> {
        if self.has_domain {
            return Err(EngineError::Config(format!(
                "more than one <domain> in the same <domain-config> ({})",
                domain.hostname.trim()
            )));
        }
        let hostname = domain.hostname.trim();
        if !is_parsable_hostname(hostname) {
            return Err(EngineError::Config(format!("unparsable hostname {:?}", domain.hostname)));
        }
        self.has_domain = true;
        self.hostname = Some(hostname.to_string());
        self.include_subdomains = domain.include_subdomains;
        Ok(self)
    }

    /// Digest algorithms are checked here; the expiration string is kept raw
    /// until `build`.
    pub fn set_pin_set(&mut self, pin_set: &PinSetConfig) -> EngineResult<&mut Self> {
        if self.pin_set.is_some() {
            return Err(EngineError::Config(
                "more than one <pin-set> in the same <domain-config>".into(),
            ));
        }
        let mut digests = BTreeSet::new();
        for pin in &pin_set.pins {
            pin.digest.parse::<DigestAlgorithm>()?;
            let value = pin.value.trim();
            if value.is_empty() {
                return Err(EngineError::Config("empty <pin> value".into()));
            }
            digests.insert(value.to_string());
        }
        if digests.is_empty() {
            return Err(EngineError::Config("<pin-set> declares no pins".into()));
        }
        self.pin_set = Some(PinSetDraft {
            digests,
            expiration: pin_set.expiration.clone(),
        });
        Ok(self)
    }

    /// Absent attributes stay unset and are inherited; the report-uri set is
    /// replaced as a whole, even when empty.
    pub fn set_trustkit_config(&mut self, config: &TrustkitConfig) -> EngineResult<&mut Self> {
        if self.has_trustkit_config {
            return Err(EngineError::Config(
                "more than one <trustkit-config> in the same <domain-config>".into(),
            ));
        }
        self.has_trustkit_config = true;
        self.enforce_pinning = config.enforce_pinning;
        self.disable_default_report_uri = config.disable_default_report_uri;
        self.report_uris = Some(
            config
                .report_uris
                .iter()
                .map(|u| u.trim().to_string())
                .collect(),
        );
        Ok(self)
    }
}

/// Flat storage for builders; children reference parents by `BuilderId`.
#[derive(Debug, Clone, Default)]
pub struct PolicyArena {
    builders: Vec<PolicyBuilder>,
}

impl PolicyArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Ids in discovery order: every parent comes before its children.
    pub fn ids(&self) -> impl Iterator<Item = BuilderId> {
        (0..self.builders.len()).map(BuilderId)
    }

    pub fn push_root(&mut self) -> BuilderId {
        self.push(None)
    }

    pub fn push_child(&mut self, parent: BuilderId) -> EngineResult<BuilderId> {
        if parent.0 >= self.builders.len() {
            return Err(EngineError::Config(format!(
                "parent builder #{} does not exist",
                parent.0
            )));
        }
        Ok(self.push(Some(parent)))
    }

    fn push(&mut self, parent: Option<BuilderId>) -> BuilderId {
        self.builders.push(PolicyBuilder {
            parent,
            ..PolicyBuilder::default()
        });
        BuilderId(self.builders.len() - 1)
    }

    pub fn get(&self, id: BuilderId) -> Option<&PolicyBuilder> {
        self.builders.get(id.0)
    }

    pub fn get_mut(&mut self, id: BuilderId) -> EngineResult<&mut PolicyBuilder> {
        self.builders
            .get_mut(id.0)
            .ok_or_else(|| EngineError::Config(format!("builder #{} does not exist", id.0)))
    }

    /// Nearest value in `id`'s ancestry (itself first).
    fn inherited<'a, T>(
        &'a self,
        id: BuilderId,
        pick: impl Fn(&'a PolicyBuilder) -> Option<&'a T>,
    ) -> Option<&'a T> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let builder = self.builders.get(current.0)?;
            if let Some(value) = pick(builder) {
                return Some(value);
            }
            cursor = builder.parent;
        }
        None
    }

    pub fn build(&self, id: BuilderId, options: &LoadOptions) -> EngineResult<DomainPolicy> {
        if id.0 >= self.builders.len() {
            return Err(EngineError::Config(format!("builder #{} does not exist", id.0)));
        }

        let hostname = self
            .inherited(id, |b| b.hostname.as_ref())
            .cloned()
            .ok_or_else(|| EngineError::MissingField {
                field: "hostname",
                scope: format!("domain-config #{}", id.0),
            })?;

        let draft = self
            .inherited(id, |b| b.pin_set.as_ref())
            .ok_or_else(|| EngineError::MissingField {
                field: "pin-set",
                scope: hostname.clone(),
            })?;
        let expiration_date = draft
            .expiration
            .as_deref()
            .map(parse_expiration_date)
            .transpose()?;
        let pin_set = PinSet::new(draft.digests.iter().cloned(), expiration_date);

        let report_uris = match self.inherited(id, |b| b.report_uris.as_ref()) {
            Some(uris) => uris
                .iter()
                .map(|u| validate_report_uri(u, options.allow_http_report_uris))
                .collect::<EngineResult<BTreeSet<_>>>()?,
            None => BTreeSet::new(),
        };

        Ok(DomainPolicy {
            include_subdomains: self
                .inherited(id, |b| b.include_subdomains.as_ref())
                .copied()
                .unwrap_or(EngineDefaults::INCLUDE_SUBDOMAINS),
            enforce_pinning: self
                .inherited(id, |b| b.enforce_pinning.as_ref())
                .copied()
                .unwrap_or(EngineDefaults::ENFORCE_PINNING),
            disable_default_report_uri: self
                .inherited(id, |b| b.disable_default_report_uri.as_ref())
                .copied()
                .unwrap_or(EngineDefaults::DISABLE_DEFAULT_REPORT_URI),
            hostname,
            pin_set,
            report_uris,
        })
    }

    /// Builds every node in discovery order. Fails on the first bad node.
    pub fn build_all(&self, options: &LoadOptions) -> EngineResult<Vec<DomainPolicy>> {
        self.ids().map(|id| self.build(id, options)).collect()
    }
}
