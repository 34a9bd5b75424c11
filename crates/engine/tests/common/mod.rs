#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use rcgen::{BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType, IsCa};

use pinkit_engine::crypto::spki::spki_sha256_base64;
use pinkit_engine::EventDocument;

/// A fixed point in time so expiration checks are deterministic.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Self-signed leaf certificate for `host`, DER.
pub fn self_signed(host: &str) -> (Certificate, Vec<u8>) {
    let cert = rcgen::generate_simple_self_signed(vec![host.to_string()]).expect("cert");
    let der = cert.serialize_der().expect("der");
    (cert, der)
}

/// Pin value (base64 SHA-256 of the SPKI) for a generated certificate.
pub fn pin_of(cert: &Certificate) -> String {
    spki_sha256_base64(&cert.get_key_pair().public_key_der())
}

/// A CA certificate with the given common name.
pub fn ca(common_name: &str) -> Certificate {
    let mut params = CertificateParams::new(vec![]);
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    params.distinguished_name = dn;
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    Certificate::from_params(params).expect("ca")
}

/// Leaf for `host` issued by `issuer`, DER.
pub fn leaf_signed_by(host: &str, issuer: &Certificate) -> (Certificate, Vec<u8>) {
    let leaf = Certificate::from_params(CertificateParams::new(vec![host.to_string()])).expect("leaf");
    let der = leaf.serialize_der_with_signer(issuer).expect("signed leaf");
    (leaf, der)
}

/// Placeholder pin values for tests that never digest a real chain.
pub const PIN_A: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";
pub const PIN_B: &str = "BBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB=";

/// `<domain-config>` with a domain, a pin set and a trustkit-config, left open
/// so callers can nest further configs before closing it.
pub fn open_domain_config(
    doc: EventDocument,
    host: &str,
    include_subdomains: bool,
    pins: &[&str],
    enforce: bool,
) -> EventDocument {
    let include = if include_subdomains { "true" } else { "false" };
    let enforce = if enforce { "true" } else { "false" };
    let mut doc = doc
        .start("domain-config", &[])
        .element("domain", &[("includeSubdomains", include)], host)
        .start("pin-set", &[]);
    for pin in pins {
        doc = doc.element("pin", &[("digest", "SHA-256")], pin);
    }
    doc.end("pin-set")
        .empty_element("trustkit-config", &[("enforcePinning", enforce)])
}

/// One complete, closed `<domain-config>`.
pub fn domain_config(
    doc: EventDocument,
    host: &str,
    include_subdomains: bool,
    pins: &[&str],
    enforce: bool,
) -> EventDocument {
    open_domain_config(doc, host, include_subdomains, pins, enforce).end("domain-config")
}

/// Wraps the body in `<network-security-config>`.
pub fn document(body: impl FnOnce(EventDocument) -> EventDocument) -> EventDocument {
    body(EventDocument::new().start("network-security-config", &[])).end("network-security-config")
}
