//! X.509 plumbing behind the `x509` feature: certificate decoding, SPKI
//! digests and debug trust anchor checks.

#[cfg(feature = "x509")]
pub mod anchors;
#[cfg(feature = "x509")]
pub mod certificate;
#[cfg(feature = "x509")]
pub mod spki;
