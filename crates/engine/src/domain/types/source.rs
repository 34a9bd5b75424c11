use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::domain::error::EngineError;

/// Digest algorithms a `<pin>` may declare. The engine pins exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DigestAlgorithm {
    #[serde(rename = "SHA-256")]
    Sha256,
}

impl DigestAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "SHA-256",
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SHA-256" => Ok(DigestAlgorithm::Sha256),
            other => Err(EngineError::UnsupportedDigest(other.to_string())),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CertificateSourceError {
    #[error("Empty certificate source")]
    Empty,
    #[error("Missing resource name for '@raw/' certificate source")]
    MissingRawName,
    #[error("Unrecognized certificate source: {0}")]
    Unrecognized(String),
}

/// Where a `<certificates>` entry of `<debug-overrides>` takes its anchors from.
/// Format examples:
/// - user
/// - system
/// - @raw/debug_ca
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateSource {
    /// Certificates installed by the device user. Never loaded by the engine.
    User,
    /// The platform store. Never loaded by the engine.
    System,
    /// A bundled raw resource, resolved through a `CertificateLoader`.
    Raw(String),
}

impl FromStr for CertificateSource {
    type Err = CertificateSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CertificateSourceError::Empty);
        }
        match s {
            "user" => Ok(CertificateSource::User),
            "system" => Ok(CertificateSource::System),
            _ => {
                let name = s
                    .strip_prefix("@raw/")
                    .ok_or_else(|| CertificateSourceError::Unrecognized(s.to_string()))?;
                if name.is_empty() {
                    return Err(CertificateSourceError::MissingRawName);
                }
                Ok(CertificateSource::Raw(name.to_string()))
            }
        }
    }
}
