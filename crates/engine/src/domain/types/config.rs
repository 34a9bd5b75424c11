use serde::{Deserialize, Serialize};

/// Centralized defaults for the pinning engine.
/// A value a policy leaves unset (after inheritance) falls back to these.
pub struct EngineDefaults;

impl EngineDefaults {
    // Policy defaults
    pub const INCLUDE_SUBDOMAINS: bool = false;
    pub const ENFORCE_PINNING: bool = false; // report-only unless asked
    pub const DISABLE_DEFAULT_REPORT_URI: bool = false;
    pub const OVERRIDE_PINS: bool = false;

    // Reporting defaults
    pub const DEFAULT_REPORT_URI: &'static str = "https://overmind.datatheorem.com/trustkit/report";
    pub const ALLOW_HTTP_REPORT_URIS: bool = false; // Secure default: HTTPS only

    // Pinning
    pub const SUPPORTED_DIGEST: &'static str = "SHA-256";

    // Resource lookup for `@raw/NAME` certificate sources
    pub const RAW_RESOURCE_EXTENSIONS: &'static [&'static str] = &["pem", "crt", "cer", "der"];
}

/// Per-load options. Defaults are tuned for production safety.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Opt-in: accept `http://` report URIs.
    pub allow_http_report_uris: bool,
}

impl LoadOptions {
    pub fn secure_default() -> Self {
        Self {
            allow_http_report_uris: EngineDefaults::ALLOW_HTTP_REPORT_URIS,
        }
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::secure_default()
    }
}

// ===== Declarative policy model =====
//
// Mirrors the markup grammar element by element. The markup parser produces
// these per element; JSON policies deserialize straight into them. Both paths
// then go through the same builder arena.

/// A whole policy document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PolicyDocument {
    #[serde(default)]
    pub domain_configs: Vec<DomainConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_overrides: Option<DebugOverridesConfig>,
}

/// `<domain-config>`; nested configs inherit unset fields from this one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DomainConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<DomainSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_set: Option<PinSetConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trustkit_config: Option<TrustkitConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain_configs: Vec<DomainConfig>,
}

/// `<domain includeSubdomains="..">HOSTNAME</domain>`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DomainSpec {
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_subdomains: Option<bool>,
}

/// `<pin-set expiration="YYYY-MM-DD">`. The expiration stays a string until
/// build time, where it is parsed strictly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PinSetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
    #[serde(default)]
    pub pins: Vec<PinConfig>,
}

/// `<pin digest="SHA-256">BASE64</pin>`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PinConfig {
    pub digest: String,
    pub value: String,
}

impl PinConfig {
    pub fn sha256(value: impl Into<String>) -> Self {
        Self {
            digest: EngineDefaults::SUPPORTED_DIGEST.to_string(),
            value: value.into(),
        }
    }
}

/// `<trustkit-config>`. Absent attributes are inherited from the parent scope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TrustkitConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce_pinning: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_default_report_uri: Option<bool>,
    #[serde(default)]
    pub report_uris: Vec<String>,
}

/// `<debug-overrides>`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DebugOverridesConfig {
    #[serde(default)]
    pub certificates: Vec<CertificatesConfig>,
}

/// `<certificates src=".." overridePins=".."/>`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CertificatesConfig {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_pins: Option<bool>,
}
