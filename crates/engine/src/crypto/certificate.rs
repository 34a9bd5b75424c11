//! PEM/DER certificate decoding.

use thiserror::Error;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::*;

#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("Empty certificate data")]
    Empty,
    #[error("Invalid PEM certificate: {0}")]
    Pem(String),
    #[error("Invalid X.509 certificate: {0}")]
    Der(String),
}

const PEM_MARKER: &[u8] = b"-----BEGIN";

/// Normalises PEM or DER input to DER, checking that it parses as X.509.
pub fn to_der(bytes: &[u8]) -> Result<Vec<u8>, CertificateError> {
    let trimmed = trim_ascii_start(bytes);
    if trimmed.is_empty() {
        return Err(CertificateError::Empty);
    }
    let der = if trimmed.starts_with(PEM_MARKER) {
        let (_, pem) = parse_x509_pem(trimmed).map_err(|e| CertificateError::Pem(e.to_string()))?;
        pem.contents
    } else {
        trimmed.to_vec()
    };
    parse(&der)?;
    Ok(der)
}

pub fn parse(der: &[u8]) -> Result<X509Certificate<'_>, CertificateError> {
    X509Certificate::from_der(der)
        .map(|(_, cert)| cert)
        .map_err(|e| CertificateError::Der(e.to_string()))
}

fn trim_ascii_start(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}
