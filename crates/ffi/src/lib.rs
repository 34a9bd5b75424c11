use std::sync::Arc;

use chrono::Utc;

use pinkit_engine::domain::error::EngineError;
use pinkit_engine::{
    DomainPolicy, EventDocument, InMemoryCertificateLoader, LoadOptions, PinEvaluation,
    PinValidationResult, PolicyEvent, StartTag, TrustConfiguration,
};

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum FfiError {
    #[error("{message}")]
    Generic { message: String },
    #[error("{message}")]
    Configuration { message: String },
}

impl From<EngineError> for FfiError {
    fn from(e: EngineError) -> Self {
        if e.is_configuration_error() {
            FfiError::Configuration {
                message: e.to_string(),
            }
        } else {
            FfiError::Generic {
                message: e.to_string(),
            }
        }
    }
}

// ===== FFI types mirroring the public Rust API (FFI-friendly) =====

#[derive(uniffi::Record, Debug, Clone)]
pub struct FfiAttribute {
    pub name: String,
    pub value: String,
}

/// One event from the host's markup parser.
#[derive(uniffi::Enum, Debug, Clone)]
pub enum FfiPolicyEvent {
    Start { name: String, attributes: Vec<FfiAttribute> },
    End { name: String },
    Text { text: String },
}

impl From<FfiPolicyEvent> for PolicyEvent {
    fn from(v: FfiPolicyEvent) -> Self {
        match v {
            FfiPolicyEvent::Start { name, attributes } => PolicyEvent::Start(StartTag::new(
                name,
                attributes.into_iter().map(|a| (a.name, a.value)).collect(),
            )),
            FfiPolicyEvent::End { name } => PolicyEvent::End(name),
            FfiPolicyEvent::Text { text } => PolicyEvent::Text(text),
        }
    }
}

/// Bytes of an `@raw/NAME` certificate, PEM or DER.
#[derive(uniffi::Record, Debug, Clone)]
pub struct FfiCertificateResource {
    pub name: String,
    pub bytes: Vec<u8>,
}

fn loader_from(resources: Vec<FfiCertificateResource>) -> InMemoryCertificateLoader {
    resources.into_iter().map(|r| (r.name, r.bytes)).collect()
}

#[derive(uniffi::Enum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiPinValidationResult {
    Success,
    Failed,
    CertificateChainNotTrusted,
    InvalidParameters,
    UserDefinedTrustAnchorFailure,
    CouldNotGenerateDigest,
}

impl From<PinValidationResult> for FfiPinValidationResult {
    fn from(v: PinValidationResult) -> Self {
        match v {
            PinValidationResult::Success => FfiPinValidationResult::Success,
            PinValidationResult::Failed => FfiPinValidationResult::Failed,
            PinValidationResult::CertificateChainNotTrusted => FfiPinValidationResult::CertificateChainNotTrusted,
            PinValidationResult::InvalidParameters => FfiPinValidationResult::InvalidParameters,
            PinValidationResult::UserDefinedTrustAnchorFailure => FfiPinValidationResult::UserDefinedTrustAnchorFailure,
            PinValidationResult::CouldNotGenerateDigest => FfiPinValidationResult::CouldNotGenerateDigest,
        }
    }
}

#[derive(uniffi::Record, Debug, Clone)]
pub struct FfiDomainPolicy {
    pub hostname: String,
    pub include_subdomains: bool,
    pub enforce_pinning: bool,
    pub disable_default_report_uri: bool,
    pub pins: Vec<String>,
    /// `YYYY-MM-DD`
    pub expiration_date: Option<String>,
    /// Custom URIs plus the default one unless disabled.
    pub report_uris: Vec<String>,
}

impl From<&DomainPolicy> for FfiDomainPolicy {
    fn from(v: &DomainPolicy) -> Self {
        FfiDomainPolicy {
            hostname: v.hostname().to_string(),
            include_subdomains: v.include_subdomains(),
            enforce_pinning: v.enforce_pinning(),
            disable_default_report_uri: v.disable_default_report_uri(),
            pins: v.pin_set().digests().iter().cloned().collect(),
            expiration_date: v.pin_set().expiration_date().map(|d| d.format("%Y-%m-%d").to_string()),
            report_uris: v.report_targets().iter().map(|u| u.to_string()).collect(),
        }
    }
}

#[derive(uniffi::Record, Debug, Clone)]
pub struct FfiPinEvaluation {
    pub result: FfiPinValidationResult,
    pub served_digests: Vec<String>,
    pub should_block_connection: bool,
    pub should_report: bool,
}

impl From<&PinEvaluation> for FfiPinEvaluation {
    fn from(v: &PinEvaluation) -> Self {
        FfiPinEvaluation {
            result: v.result.into(),
            served_digests: v.served_digests.clone(),
            should_block_connection: v.should_block_connection(),
            should_report: v.should_report(),
        }
    }
}

// ===== Trust configuration object =====

#[derive(uniffi::Object, Debug)]
pub struct FfiTrustConfiguration {
    inner: TrustConfiguration,
}

impl FfiTrustConfiguration {
    fn options(allow_http_report_uris: bool) -> LoadOptions {
        LoadOptions {
            allow_http_report_uris,
        }
    }
}

#[uniffi::export]
impl FfiTrustConfiguration {
    #[uniffi::constructor]
    pub fn from_events(
        events: Vec<FfiPolicyEvent>,
        certificates: Vec<FfiCertificateResource>,
        allow_http_report_uris: bool,
    ) -> Result<Arc<Self>, FfiError> {
        let document = EventDocument::from(events.into_iter().map(PolicyEvent::from).collect::<Vec<_>>());
        let inner = TrustConfiguration::from_policy_document(
            &mut document.reader(),
            &loader_from(certificates),
            &Self::options(allow_http_report_uris),
        )?;
        Ok(Arc::new(Self { inner }))
    }

    #[uniffi::constructor]
    pub fn from_json(
        json: String,
        certificates: Vec<FfiCertificateResource>,
        allow_http_report_uris: bool,
    ) -> Result<Arc<Self>, FfiError> {
        let inner = TrustConfiguration::from_json(
            &json,
            &loader_from(certificates),
            &Self::options(allow_http_report_uris),
        )?;
        Ok(Arc::new(Self { inner }))
    }

    pub fn policies(&self) -> Vec<FfiDomainPolicy> {
        self.inner.policies().iter().map(FfiDomainPolicy::from).collect()
    }

    pub fn resolve(&self, hostname: String) -> Result<Option<FfiDomainPolicy>, FfiError> {
        Ok(self.inner.resolve(&hostname)?.map(FfiDomainPolicy::from))
    }

    pub fn override_pins(&self) -> bool {
        self.inner.debug_override().override_pins()
    }

    /// Publishes this configuration as the process-wide one.
    pub fn install_globally(&self) -> Result<(), FfiError> {
        pinkit_engine::initialize(self.inner.clone())?;
        Ok(())
    }
}

#[cfg(feature = "x509")]
#[uniffi::export]
impl FfiTrustConfiguration {
    /// `None` when no policy covers `hostname`. `chain_trusted` is the host's
    /// own CA validation verdict for `chain` (DER, leaf first).
    pub fn evaluate(
        &self,
        hostname: String,
        chain: Vec<Vec<u8>>,
        chain_trusted: bool,
    ) -> Option<FfiPinEvaluation> {
        let trust = pinkit_engine::PrecomputedChainTrust(chain_trusted);
        pinkit_engine::default_validator(&trust, &self.inner)
            .evaluate_connection(&self.inner, &hostname, &chain, Utc::now())
            .as_ref()
            .map(FfiPinEvaluation::from)
    }

    /// JSON failure report for the host to deliver to each report URI, or
    /// `None` when the connection does not warrant one.
    pub fn failure_report(
        &self,
        hostname: String,
        chain: Vec<Vec<u8>>,
        chain_trusted: bool,
    ) -> Result<Option<String>, FfiError> {
        let Some(policy) = self.inner.resolve(&hostname)? else {
            return Ok(None);
        };
        let trust = pinkit_engine::PrecomputedChainTrust(chain_trusted);
        let now = Utc::now();
        let evaluation = pinkit_engine::default_validator(&trust, &self.inner).evaluate(policy, &chain, now);
        if !evaluation.should_report() {
            return Ok(None);
        }
        let report = pinkit_engine::PinFailureReport::new(&hostname, policy, &evaluation, now);
        Ok(Some(report.to_json()?))
    }
}

// ===== Free functions =====

/// Installs a `fmt` subscriber filtered by `level` (an `EnvFilter`
/// directive such as `"info"` or `"pinkit_engine=debug"`). Falls back to
/// `info` on a bad directive. Fails if a subscriber is already installed.
#[uniffi::export]
pub fn init_logging(level: String) -> Result<(), FfiError> {
    let env_filter = tracing_subscriber::EnvFilter::try_new(&level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|e| FfiError::Generic {
            message: format!("logging already initialized: {e}"),
        })
}

/// Resolves against the process-wide configuration installed with
/// `install_globally`.
#[uniffi::export]
pub fn resolve_global(hostname: String) -> Result<Option<FfiDomainPolicy>, FfiError> {
    let config = pinkit_engine::trust_configuration().ok_or_else(|| FfiError::Generic {
        message: "trust configuration not initialized".to_string(),
    })?;
    Ok(config.resolve(&hostname)?.map(FfiDomainPolicy::from))
}

uniffi::setup_scaffolding!();
