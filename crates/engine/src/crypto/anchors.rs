//! Debug trust anchor checks for `<debug-overrides>`.

use std::collections::BTreeSet;

use x509_parser::prelude::*;

use super::certificate::parse;
use crate::domain::collaborators::TrustAnchorEvaluator;

/// A chain is anchored when the path starting at the leaf reaches a debug
/// anchor: each certificate must be issued by the next one (matching names
/// and a valid signature) until one of them is an anchor or is signed by
/// one. Certificates off that path never count.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureAnchorEvaluator;

impl TrustAnchorEvaluator for SignatureAnchorEvaluator {
    fn chains_to_anchor(&self, chain: &[Vec<u8>], anchors: &BTreeSet<Vec<u8>>) -> bool {
        if anchors.is_empty() {
            return false;
        }
        let parsed_anchors: Vec<X509Certificate<'_>> =
            anchors.iter().filter_map(|der| parse(der).ok()).collect();

        let mut position = 0;
        let Some(mut current) = chain.first().and_then(|der| parse(der).ok()) else {
            return false;
        };
        loop {
            if anchors.contains(&chain[position]) {
                return true;
            }
            if parsed_anchors.iter().any(|anchor| issued_by(&current, anchor)) {
                return true;
            }
            let Some(next) = chain.get(position + 1).and_then(|der| parse(der).ok()) else {
                return false;
            };
            if !issued_by(&current, &next) {
                return false;
            }
            current = next;
            position += 1;
        }
    }
}

fn issued_by(cert: &X509Certificate<'_>, issuer: &X509Certificate<'_>) -> bool {
    cert.issuer().as_raw() == issuer.subject().as_raw()
        && cert.verify_signature(Some(issuer.public_key())).is_ok()
}
