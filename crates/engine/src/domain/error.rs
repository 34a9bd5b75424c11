// crates/engine/src/domain/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("configuration: {0}")]
  Config(String),

  #[error("invalid parameters: {0}")]
  InvalidParameters(String),

  #[error("configuration: policy contains the same domain defined twice: {0}")]
  DuplicateHostname(String),

  #[error("configuration: policy contains 0 domains to pin")]
  NoDomains,

  #[error("configuration: invalid expiration date in pin-set: {0:?}")]
  InvalidExpirationDate(String),

  #[error("invalid parameters: unexpected digest value: {0:?}")]
  UnsupportedDigest(String),

  #[error("configuration: no {field} resolved for {scope} after walking parent chain")]
  MissingField { field: &'static str, scope: String },

  #[error("configuration: more than one policy matches {0} with the same specificity")]
  AmbiguousPolicy(String),

  #[error("trust configuration already initialized")]
  AlreadyInitialized,

  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error(transparent)]
  Json(#[from] serde_json::Error),
}

impl EngineError {
  /// Load-time errors that must stop the process from using the policy.
  /// Everything else is a per-call failure the caller may recover from.
  pub fn is_configuration_error(&self) -> bool {
    matches!(
      self,
      EngineError::Config(_)
        | EngineError::DuplicateHostname(_)
        | EngineError::NoDomains
        | EngineError::InvalidExpirationDate(_)
        | EngineError::UnsupportedDigest(_)
        | EngineError::MissingField { .. }
        | EngineError::AmbiguousPolicy(_)
        | EngineError::Json(_)
    )
  }
}

pub type EngineResult<T> = Result<T, EngineError>;
