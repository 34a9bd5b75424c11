mod common;

use chrono::Duration;
use common::{ca, document, domain_config, leaf_signed_by, now, pin_of, self_signed, PIN_A};
use pinkit_engine as pk;
use pk::{InMemoryCertificateLoader, PinValidationResult, PrecomputedChainTrust};

fn config_pinning(host: &str, pins: &[&str], enforce: bool) -> pk::TrustConfiguration {
    let doc = document(|d| domain_config(d, host, true, pins, enforce));
    pk::load_policy_document(&mut doc.reader(), &InMemoryCertificateLoader::default()).unwrap()
}

#[test]
fn served_key_matching_a_pin_succeeds() {
    let (cert, der) = self_signed("api.example.com");
    let pin = pin_of(&cert);
    let config = config_pinning("example.com", &[PIN_A, pin.as_str()], true);
    let validator = pk::default_validator(&PrecomputedChainTrust(true), &config);

    let evaluation = validator
        .evaluate_connection(&config, "api.example.com", &[der], now())
        .unwrap();
    assert_eq!(evaluation.result, PinValidationResult::Success);
    assert_eq!(evaluation.served_digests, vec![pin]);
    assert!(!evaluation.should_block_connection());
    assert!(!evaluation.should_report());
}

#[test]
fn pin_on_an_intermediate_also_matches() {
    let issuer = ca("Intermediate CA");
    let (_, leaf) = leaf_signed_by("example.com", &issuer);
    let issuer_der = issuer.serialize_der().unwrap();
    let config = config_pinning("example.com", &[pin_of(&issuer).as_str()], true);
    let validator = pk::default_validator(&PrecomputedChainTrust(true), &config);

    let policy = config.resolve("example.com").unwrap().unwrap();
    assert_eq!(validator.validate(policy, &[leaf, issuer_der], now()), PinValidationResult::Success);
}

#[test]
fn unknown_key_fails_and_blocks_only_when_enforced() {
    let (_, der) = self_signed("example.com");

    let enforcing = config_pinning("example.com", &[PIN_A], true);
    let validator = pk::default_validator(&PrecomputedChainTrust(true), &enforcing);
    let evaluation = validator
        .evaluate_connection(&enforcing, "example.com", &[der.clone()], now())
        .unwrap();
    assert_eq!(evaluation.result, PinValidationResult::Failed);
    assert!(evaluation.should_block_connection());
    assert!(evaluation.should_report());

    let report_only = config_pinning("example.com", &[PIN_A], false);
    let validator = pk::default_validator(&PrecomputedChainTrust(true), &report_only);
    let evaluation = validator
        .evaluate_connection(&report_only, "example.com", &[der], now())
        .unwrap();
    assert_eq!(evaluation.result, PinValidationResult::Failed);
    assert!(!evaluation.should_block_connection());
}

#[test]
fn expired_pin_set_fails_even_with_a_matching_pin() {
    let (cert, der) = self_signed("example.com");
    let pin = pin_of(&cert);
    let doc = document(|d| {
        d.start("domain-config", &[])
            .element("domain", &[], "example.com")
            .start("pin-set", &[("expiration", "2024-05-31")])
            .element("pin", &[("digest", "SHA-256")], &pin)
            .end("pin-set")
            .end("domain-config")
    });
    let config = pk::load_policy_document(&mut doc.reader(), &InMemoryCertificateLoader::default()).unwrap();
    let validator = pk::default_validator(&PrecomputedChainTrust(true), &config);
    let policy = config.resolve("example.com").unwrap().unwrap();

    assert_eq!(validator.validate(policy, &[der.clone()], now()), PinValidationResult::Failed);
    // still valid on the expiration day itself
    let earlier = now() - Duration::days(1);
    assert_eq!(validator.validate(policy, &[der], earlier), PinValidationResult::Success);
}

#[test]
fn untrusted_chain_is_reported_before_pins() {
    let (cert, der) = self_signed("example.com");
    let config = config_pinning("example.com", &[pin_of(&cert).as_str()], true);
    let validator = pk::default_validator(&PrecomputedChainTrust(false), &config);

    let evaluation = validator
        .evaluate_connection(&config, "example.com", &[der], now())
        .unwrap();
    assert_eq!(evaluation.result, PinValidationResult::CertificateChainNotTrusted);
    assert!(evaluation.should_block_connection());
    assert!(!evaluation.should_report());
}

#[test]
fn empty_or_blank_chains_are_invalid_parameters() {
    let config = config_pinning("example.com", &[PIN_A], false);
    let validator = pk::default_validator(&PrecomputedChainTrust(true), &config);
    let policy = config.resolve("example.com").unwrap().unwrap();

    assert_eq!(validator.validate(policy, &[], now()), PinValidationResult::InvalidParameters);
    assert_eq!(validator.validate(policy, &[Vec::new()], now()), PinValidationResult::InvalidParameters);
}

#[test]
fn garbage_certificate_cannot_be_digested() {
    let config = config_pinning("example.com", &[PIN_A], false);
    let validator = pk::default_validator(&PrecomputedChainTrust(true), &config);
    let policy = config.resolve("example.com").unwrap().unwrap();

    let evaluation = validator.evaluate(policy, &[b"not a certificate".to_vec()], now());
    assert_eq!(evaluation.result, PinValidationResult::CouldNotGenerateDigest);
    assert!(evaluation.served_digests.is_empty());
    assert!(evaluation.should_block_connection());
}

#[test]
fn unpinned_and_malformed_hostnames() {
    let (_, der) = self_signed("example.org");
    let config = config_pinning("example.com", &[PIN_A], true);
    let validator = pk::default_validator(&PrecomputedChainTrust(true), &config);

    assert!(validator
        .evaluate_connection(&config, "example.org", &[der.clone()], now())
        .is_none());
    let evaluation = validator
        .evaluate_connection(&config, "not a host", &[der], now())
        .unwrap();
    assert_eq!(evaluation.result, PinValidationResult::InvalidParameters);
}

#[test]
fn custom_chain_trust_closure_is_consulted() {
    let (cert, der) = self_signed("example.com");
    let expected_leaf = der.clone();
    let trust = move |chain: &[Vec<u8>]| chain.first() == Some(&expected_leaf);
    let config = config_pinning("example.com", &[pin_of(&cert).as_str()], true);
    let validator = pk::default_validator(&trust, &config);
    let policy = config.resolve("example.com").unwrap().unwrap();

    assert_eq!(validator.validate(policy, &[der], now()), PinValidationResult::Success);
    let (_, other) = self_signed("example.com");
    assert_eq!(
        validator.validate(policy, &[other], now()),
        PinValidationResult::CertificateChainNotTrusted
    );
}
