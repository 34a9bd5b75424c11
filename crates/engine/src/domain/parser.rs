// crates/engine/src/domain/parser.rs

//! Turns a policy document into builders and a debug override.
//!
//! Works over `PolicyEventSource`, so any markup parser the host has can
//! feed it. Each element reader consumes events up to and including its own
//! end tag. Unknown elements are skipped.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use super::builder::{BuilderId, PolicyArena};
use super::collaborators::{CertificateLoader, PolicyEvent, PolicyEventSource, StartTag};
use super::error::{EngineError, EngineResult};
use super::types::{
    CertificateSource, CertificatesConfig, DebugOverride, DebugOverridesConfig, DomainConfig,
    DomainSpec, PinConfig, PinSetConfig, PolicyDocument, TrustkitConfig,
};

pub const TAG_DOMAIN_CONFIG: &str = "domain-config";
pub const TAG_DOMAIN: &str = "domain";
pub const TAG_PIN_SET: &str = "pin-set";
pub const TAG_PIN: &str = "pin";
pub const TAG_TRUSTKIT_CONFIG: &str = "trustkit-config";
pub const TAG_REPORT_URI: &str = "report-uri";
pub const TAG_DEBUG_OVERRIDES: &str = "debug-overrides";
pub const TAG_CERTIFICATES: &str = "certificates";

/// Builders in discovery order plus the optional debug override.
#[derive(Debug, Clone, Default)]
pub struct ParsedPolicy {
    pub arena: PolicyArena,
    pub debug_override: Option<DebugOverride>,
}

pub fn parse_policy_document(
    source: &mut dyn PolicyEventSource,
    loader: &dyn CertificateLoader,
) -> EngineResult<ParsedPolicy> {
    let mut parsed = ParsedPolicy::default();
    loop {
        match source.next_event()? {
            PolicyEvent::EndDocument => break,
            PolicyEvent::Start(tag) if tag.name() == TAG_DOMAIN_CONFIG => {
                read_domain_config(source, &mut parsed.arena, None)?;
            }
            PolicyEvent::Start(tag) if tag.name() == TAG_DEBUG_OVERRIDES => {
                if parsed.debug_override.is_some() {
                    return Err(EngineError::Config(
                        "more than one <debug-overrides> element".into(),
                    ));
                }
                let config = read_debug_overrides(source)?;
                parsed.debug_override = Some(resolve_debug_overrides(&config, loader)?);
            }
            _ => {}
        }
    }
    debug!(builders = parsed.arena.len(), "parsed policy document");
    Ok(parsed)
}

/// Same output as `parse_policy_document`, from the declarative model.
pub fn arena_from_document(
    document: &PolicyDocument,
    loader: &dyn CertificateLoader,
) -> EngineResult<ParsedPolicy> {
    let mut parsed = ParsedPolicy::default();
    for config in &document.domain_configs {
        push_domain_config(&mut parsed.arena, config, None)?;
    }
    if let Some(config) = &document.debug_overrides {
        parsed.debug_override = Some(resolve_debug_overrides(config, loader)?);
    }
    Ok(parsed)
}

fn push_domain_config(
    arena: &mut PolicyArena,
    config: &DomainConfig,
    parent: Option<BuilderId>,
) -> EngineResult<()> {
    let id = match parent {
        Some(parent) => arena.push_child(parent)?,
        None => arena.push_root(),
    };
    let builder = arena.get_mut(id)?;
    if let Some(domain) = &config.domain {
        builder.set_domain(domain)?;
    }
    if let Some(pin_set) = &config.pin_set {
        builder.set_pin_set(pin_set)?;
    }
    if let Some(trustkit) = &config.trustkit_config {
        builder.set_trustkit_config(trustkit)?;
    }
    for nested in &config.domain_configs {
        push_domain_config(arena, nested, Some(id))?;
    }
    Ok(())
}

/// Called right after the `<domain-config>` start tag. The builder is pushed
/// before any nested config is read, so parents precede children.
fn read_domain_config(
    source: &mut dyn PolicyEventSource,
    arena: &mut PolicyArena,
    parent: Option<BuilderId>,
) -> EngineResult<()> {
    let id = match parent {
        Some(parent) => arena.push_child(parent)?,
        None => arena.push_root(),
    };
    loop {
        match source.next_event()? {
            PolicyEvent::End(name) if name == TAG_DOMAIN_CONFIG => return Ok(()),
            PolicyEvent::EndDocument => return Err(unexpected_end(TAG_DOMAIN_CONFIG)),
            PolicyEvent::Start(tag) => match tag.name() {
                TAG_DOMAIN_CONFIG => read_domain_config(source, arena, Some(id))?,
                TAG_DOMAIN => {
                    let domain = read_domain(source, &tag)?;
                    arena.get_mut(id)?.set_domain(&domain)?;
                }
                TAG_PIN_SET => {
                    let pin_set = read_pin_set(source, &tag)?;
                    arena.get_mut(id)?.set_pin_set(&pin_set)?;
                }
                TAG_TRUSTKIT_CONFIG => {
                    let trustkit = read_trustkit_config(source, &tag)?;
                    arena.get_mut(id)?.set_trustkit_config(&trustkit)?;
                }
                other => skip_element(source, other)?,
            },
            _ => {}
        }
    }
}

fn read_domain(source: &mut dyn PolicyEventSource, tag: &StartTag) -> EngineResult<DomainSpec> {
    let include_subdomains = bool_attribute(tag, "includeSubdomains")?;
    let hostname = read_text(source, TAG_DOMAIN)?;
    Ok(DomainSpec {
        hostname,
        include_subdomains,
    })
}

fn read_pin_set(source: &mut dyn PolicyEventSource, tag: &StartTag) -> EngineResult<PinSetConfig> {
    let mut result = PinSetConfig {
        expiration: tag.attribute("expiration").map(str::to_string),
        pins: Vec::new(),
    };
    loop {
        match source.next_event()? {
            PolicyEvent::End(name) if name == TAG_PIN_SET => return Ok(result),
            PolicyEvent::EndDocument => return Err(unexpected_end(TAG_PIN_SET)),
            PolicyEvent::Start(pin) if pin.name() == TAG_PIN => {
                // Fail on the algorithm before reading the value.
                let digest = pin.attribute("digest").unwrap_or_default();
                digest.parse::<super::types::DigestAlgorithm>()?;
                let value = read_text(source, TAG_PIN)?;
                result.pins.push(PinConfig {
                    digest: digest.to_string(),
                    value,
                });
            }
            PolicyEvent::Start(other) => skip_element(source, other.name())?,
            _ => {}
        }
    }
}

fn read_trustkit_config(
    source: &mut dyn PolicyEventSource,
    tag: &StartTag,
) -> EngineResult<TrustkitConfig> {
    let mut result = TrustkitConfig {
        enforce_pinning: bool_attribute(tag, "enforcePinning")?,
        disable_default_report_uri: bool_attribute(tag, "disableDefaultReportUri")?,
        report_uris: Vec::new(),
    };
    loop {
        match source.next_event()? {
            PolicyEvent::End(name) if name == TAG_TRUSTKIT_CONFIG => return Ok(result),
            PolicyEvent::EndDocument => return Err(unexpected_end(TAG_TRUSTKIT_CONFIG)),
            PolicyEvent::Start(uri) if uri.name() == TAG_REPORT_URI => {
                result.report_uris.push(read_text(source, TAG_REPORT_URI)?);
            }
            PolicyEvent::Start(other) => skip_element(source, other.name())?,
            _ => {}
        }
    }
}

fn read_debug_overrides(source: &mut dyn PolicyEventSource) -> EngineResult<DebugOverridesConfig> {
    let mut result = DebugOverridesConfig::default();
    loop {
        match source.next_event()? {
            PolicyEvent::End(name) if name == TAG_DEBUG_OVERRIDES => return Ok(result),
            PolicyEvent::EndDocument => return Err(unexpected_end(TAG_DEBUG_OVERRIDES)),
            PolicyEvent::Start(tag) if tag.name() == TAG_CERTIFICATES => {
                result.certificates.push(CertificatesConfig {
                    src: tag.attribute("src").unwrap_or_default().to_string(),
                    override_pins: bool_attribute(&tag, "overridePins")?,
                });
            }
            _ => {}
        }
    }
}

/// Folds the `<certificates>` entries into one global override.
///
/// Only one `overridePins` value is supported. Once two entries disagree the
/// flag is forced to `false` and stays there for every later disagreement.
/// Sources that cannot be loaded contribute nothing.
pub fn resolve_debug_overrides(
    config: &DebugOverridesConfig,
    loader: &dyn CertificateLoader,
) -> EngineResult<DebugOverride> {
    let mut last_override_pins: Option<bool> = None;
    let mut anchors = BTreeSet::new();

    for entry in &config.certificates {
        let current = entry.override_pins.unwrap_or(false);
        match last_override_pins {
            Some(last) if last != current => {
                last_override_pins = Some(false);
                warn!(
                    "different values for overridePins are set in the policy but only one value \
                     is supported; using overridePins=false for all connections"
                );
            }
            _ => last_override_pins = Some(current),
        }

        match entry.src.parse::<CertificateSource>() {
            Ok(CertificateSource::Raw(name)) => match loader.load(&name) {
                Ok(bytes) => {
                    anchors.insert(certificate_der(&bytes, &name)?);
                }
                Err(e) => {
                    warn!(resource = %name, error = %e, "debug-overrides certificate could not be loaded; skipping");
                }
            },
            Ok(source) => {
                info!(?source, "user and system certificate sources are not loaded for debug-overrides");
            }
            Err(e) => {
                info!(src = %entry.src, error = %e, "no debug-overrides certificates found for entry");
            }
        }
    }

    Ok(DebugOverride::new(
        last_override_pins.unwrap_or(super::types::EngineDefaults::OVERRIDE_PINS),
        anchors,
    ))
}

#[cfg(feature = "x509")]
fn certificate_der(bytes: &[u8], name: &str) -> EngineResult<Vec<u8>> {
    crate::crypto::certificate::to_der(bytes)
        .map_err(|e| EngineError::Config(format!("debug-overrides certificate {name:?}: {e}")))
}

#[cfg(not(feature = "x509"))]
fn certificate_der(bytes: &[u8], name: &str) -> EngineResult<Vec<u8>> {
    if bytes.is_empty() {
        return Err(EngineError::Config(format!("debug-overrides certificate {name:?} is empty")));
    }
    Ok(bytes.to_vec())
}

/// Text content up to the matching end tag; child elements are an error.
fn read_text(source: &mut dyn PolicyEventSource, element: &str) -> EngineResult<String> {
    let mut text = String::new();
    loop {
        match source.next_event()? {
            PolicyEvent::Text(chunk) => text.push_str(&chunk),
            PolicyEvent::End(name) if name == element => return Ok(text.trim().to_string()),
            PolicyEvent::End(name) => {
                return Err(EngineError::Config(format!(
                    "unexpected </{name}> inside <{element}>"
                )))
            }
            PolicyEvent::Start(tag) => {
                return Err(EngineError::Config(format!(
                    "unexpected <{}> inside text-only <{element}>",
                    tag.name()
                )))
            }
            PolicyEvent::EndDocument => return Err(unexpected_end(element)),
        }
    }
}

/// Consumes an unrecognised element through its matching end tag, so
/// nothing nested inside it reaches the enclosing scope.
fn skip_element(source: &mut dyn PolicyEventSource, element: &str) -> EngineResult<()> {
    let mut depth = 1usize;
    loop {
        match source.next_event()? {
            PolicyEvent::Start(_) => depth += 1,
            PolicyEvent::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            PolicyEvent::Text(_) => {}
            PolicyEvent::EndDocument => return Err(unexpected_end(element)),
        }
    }
}

fn bool_attribute(tag: &StartTag, name: &str) -> EngineResult<Option<bool>> {
    tag.attribute(name).map(|raw| parse_bool(raw, name)).transpose()
}

/// Only `true`/`false` (any case) are accepted. Android's own
/// network-security-config reader treats every other value as `false`;
/// here a typo such as `"yes"` fails the load instead.
fn parse_bool(raw: &str, attribute: &str) -> EngineResult<bool> {
    let value = raw.trim();
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(EngineError::Config(format!(
            "invalid boolean {raw:?} for attribute {attribute}"
        )))
    }
}

fn unexpected_end(element: &str) -> EngineError {
    EngineError::Config(format!("document ended inside <{element}>"))
}
