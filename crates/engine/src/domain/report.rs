// crates/engine/src/domain/report.rs

//! Report URI validation and the payload a caller sends on pin failure.
//! Delivering the payload is the host's job.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use url::Url;

use super::error::{EngineError, EngineResult};
use super::types::DomainPolicy;
use super::validation::{PinEvaluation, PinValidationResult};

pub fn validate_report_uri(uri: &str, allow_http: bool) -> EngineResult<Url> {
    let url = Url::parse(uri.trim())
        .map_err(|e| EngineError::Config(format!("invalid report-uri {uri:?}: {e}")))?;
    match url.scheme() {
        "https" => {}
        "http" => {
            if !allow_http {
                return Err(EngineError::Config(format!("HTTP report-uri is not allowed: {uri}")));
            }
        }
        other => {
            return Err(EngineError::Config(format!("unsupported report-uri scheme {other:?}: {uri}")))
        }
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(EngineError::Config(format!("report-uri missing host: {uri}")));
    }
    Ok(url)
}

/// JSON body describing one pin validation failure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PinFailureReport {
    pub date_time: String,
    /// Hostname the client was connecting to.
    pub hostname: String,
    /// Hostname of the policy that matched it.
    pub noted_hostname: String,
    pub include_subdomains: bool,
    pub enforce_pinning: bool,
    /// `pin-sha256="..."` for each digest in the policy's pin set.
    pub known_pins: Vec<String>,
    pub served_spki_digests: Vec<String>,
    pub validation_result: PinValidationResult,
}

impl PinFailureReport {
    pub fn new(
        served_hostname: &str,
        policy: &DomainPolicy,
        evaluation: &PinEvaluation,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            date_time: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            hostname: served_hostname.to_string(),
            noted_hostname: policy.hostname().to_string(),
            include_subdomains: policy.include_subdomains(),
            enforce_pinning: policy.enforce_pinning(),
            known_pins: policy
                .pin_set()
                .digests()
                .iter()
                .map(|d| format!("pin-sha256=\"{d}\""))
                .collect(),
            served_spki_digests: evaluation.served_digests.clone(),
            validation_result: evaluation.result,
        }
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
