//! SPKI digests in the pin format: base64(SHA-256(SubjectPublicKeyInfo)).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};

use super::certificate::parse;
use crate::domain::collaborators::SpkiDigester;
use crate::domain::error::{EngineError, EngineResult};

/// Digest of raw SubjectPublicKeyInfo DER.
pub fn spki_sha256_base64(spki_der: &[u8]) -> String {
    BASE64.encode(Sha256::digest(spki_der))
}

/// Hashes the SPKI of each DER certificate; the digest used by `<pin>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256SpkiDigester;

impl SpkiDigester for Sha256SpkiDigester {
    fn spki_digest(&self, certificate_der: &[u8]) -> EngineResult<String> {
        let cert = parse(certificate_der)
            .map_err(|e| EngineError::InvalidParameters(format!("could not read public key: {e}")))?;
        Ok(spki_sha256_base64(cert.public_key().raw))
    }
}
