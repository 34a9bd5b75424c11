// crates/engine/src/domain/collaborators.rs

//! Seams to the host. The engine never parses markup, touches the
//! filesystem, builds CA paths or talks to the network on its own; the host
//! (or an adapter in this crate) supplies these.

use std::collections::BTreeSet;

use super::error::EngineResult;

/// One structural event of a policy document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyEvent {
    Start(StartTag),
    End(String),
    Text(String),
    EndDocument,
}

/// An opening tag and its attributes, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    name: String,
    attributes: Vec<(String, String)>,
}

impl StartTag {
    pub fn new(name: impl Into<String>, attributes: Vec<(String, String)>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// First attribute with this name, if any.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }
}

/// Pull-style reader over a policy document. After the last event it keeps
/// returning `EndDocument`.
pub trait PolicyEventSource {
    fn next_event(&mut self) -> EngineResult<PolicyEvent>;
}

/// Resolves the NAME of an `@raw/NAME` certificate source to PEM or DER bytes.
pub trait CertificateLoader {
    fn load(&self, name: &str) -> EngineResult<Vec<u8>>;
}

/// Ordinary CA validation of a presented chain (leaf first), done by the host.
pub trait ChainTrustEvaluator: Send + Sync {
    fn is_trusted(&self, chain: &[Vec<u8>]) -> bool;
}

impl<F> ChainTrustEvaluator for F
where
    F: Fn(&[Vec<u8>]) -> bool + Send + Sync,
{
    fn is_trusted(&self, chain: &[Vec<u8>]) -> bool {
        self(chain)
    }
}

/// The host already ran CA validation and hands over its verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrecomputedChainTrust(pub bool);

impl ChainTrustEvaluator for PrecomputedChainTrust {
    fn is_trusted(&self, _chain: &[Vec<u8>]) -> bool {
        self.0
    }
}

/// Maps a DER certificate to the digest of its public key, in the same
/// encoding the policy's pins use.
pub trait SpkiDigester: Send + Sync {
    fn spki_digest(&self, certificate_der: &[u8]) -> EngineResult<String>;
}

/// Decides whether a chain is anchored to one of the debug trust anchors.
pub trait TrustAnchorEvaluator: Send + Sync {
    fn chains_to_anchor(&self, chain: &[Vec<u8>], anchors: &BTreeSet<Vec<u8>>) -> bool;
}
