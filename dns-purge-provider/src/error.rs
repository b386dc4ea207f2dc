use serde::{Deserialize, Serialize};

/// Unified error type for every cloud resource API call.
///
/// Each variant includes a `provider` field identifying which API backend produced
/// the error, plus variant-specific context. All variants are serializable so they
/// can be attached verbatim to deletion attempts in the run report.
///
/// # Transient Errors
///
/// The following variants describe conditions that may clear on their own and are
/// eligible for deferred retry:
/// - [`ResourceInUse`](Self::ResourceInUse): still referenced by another resource
/// - [`Timeout`](Self::Timeout): the per-call timeout elapsed
/// - [`NetworkError`](Self::NetworkError): connectivity issues
/// - [`RateLimited`](Self::RateLimited): API rate limit exceeded
///
/// Use [`ProviderError::class`] to get the orchestration-level classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ProviderError {
    /// The resource is still referenced by another resource (dependency race).
    ResourceInUse {
        /// Provider that produced the error.
        provider: String,
        /// Identifier of the resource that could not be removed.
        resource_id: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// The API rate limit has been exceeded.
    RateLimited {
        /// Provider that produced the error.
        provider: String,
        /// Suggested wait time in seconds before retrying, if provided by the API.
        retry_after: Option<u64>,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// The call did not complete within the per-call timeout.
    Timeout {
        /// Provider that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// A network-level error occurred.
    NetworkError {
        /// Provider that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// The authenticated principal lacks permission for the operation.
    PermissionDenied {
        /// Provider that produced the error.
        provider: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// The credentials backing the API client are invalid or expired.
    InvalidCredentials {
        /// Provider that produced the error.
        provider: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// The API rejected the request as malformed or not allowed in the current state.
    ValidationError {
        /// Provider that produced the error.
        provider: String,
        /// Description of what's wrong.
        detail: String,
    },

    /// The resource does not exist (any more).
    NotFound {
        /// Provider that produced the error.
        provider: String,
        /// Identifier of the missing resource.
        resource_id: String,
    },

    /// An unrecognized error from the provider API.
    Unknown {
        /// Provider that produced the error.
        provider: String,
        /// Raw error code from the API, if available.
        raw_code: Option<String>,
        /// Raw error message from the API.
        raw_message: String,
    },
}

/// Orchestration-level error classification.
///
/// This is the taxonomy the retry scheduler acts on; it is deliberately coarser
/// than [`ProviderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Dependency race or timeout; deferred and retried.
    TransientInUse,
    /// Throttled; deferred with a smaller attempt budget.
    RateLimited,
    /// Terminal.
    PermissionDenied,
    /// Terminal.
    ValidationError,
    /// The resource is already gone; counts as success.
    NotFound,
    /// Terminal.
    Unexpected,
}

impl ErrorClass {
    /// Whether the class is eligible for deferred retry.
    #[must_use]
    pub fn is_transient(self) -> bool {
        matches!(self, Self::TransientInUse | Self::RateLimited)
    }
}

impl ProviderError {
    /// Classify this error for retry scheduling.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::ResourceInUse { .. } | Self::Timeout { .. } | Self::NetworkError { .. } => {
                ErrorClass::TransientInUse
            }
            Self::RateLimited { .. } => ErrorClass::RateLimited,
            Self::PermissionDenied { .. } | Self::InvalidCredentials { .. } => {
                ErrorClass::PermissionDenied
            }
            Self::ValidationError { .. } => ErrorClass::ValidationError,
            Self::NotFound { .. } => ErrorClass::NotFound,
            Self::Unknown { .. } => ErrorClass::Unexpected,
        }
    }

    /// Suggested wait in seconds, only for [`RateLimited`](Self::RateLimited).
    #[must_use]
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// 是否为预期行为（权限、资源依赖、资源不存在等），用于日志分级。
    ///
    /// 返回 `true` 时应使用 `warn` 级别，`false` 时使用 `error` 级别。
    /// **新增变体时请同步更新此方法。**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::ResourceInUse { .. }
                | Self::RateLimited { .. }
                | Self::PermissionDenied { .. }
                | Self::InvalidCredentials { .. }
                | Self::ValidationError { .. }
                | Self::NotFound { .. }
        )
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ResourceInUse {
                provider,
                resource_id,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{provider}] Resource '{resource_id}' is still in use: {msg}")
                } else {
                    write!(f, "[{provider}] Resource '{resource_id}' is still in use")
                }
            }
            Self::RateLimited {
                provider,
                retry_after,
                ..
            } => {
                if let Some(secs) = retry_after {
                    write!(f, "[{provider}] Rate limited (retry after {secs}s)")
                } else {
                    write!(f, "[{provider}] Rate limited")
                }
            }
            Self::Timeout { provider, detail } => {
                write!(f, "[{provider}] Request timeout: {detail}")
            }
            Self::NetworkError { provider, detail } => {
                write!(f, "[{provider}] Network error: {detail}")
            }
            Self::PermissionDenied {
                provider,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{provider}] Permission denied: {msg}")
                } else {
                    write!(f, "[{provider}] Permission denied")
                }
            }
            Self::InvalidCredentials {
                provider,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{provider}] Invalid credentials: {msg}")
                } else {
                    write!(f, "[{provider}] Invalid credentials")
                }
            }
            Self::ValidationError { provider, detail } => {
                write!(f, "[{provider}] Validation error: {detail}")
            }
            Self::NotFound {
                provider,
                resource_id,
            } => {
                write!(f, "[{provider}] Resource '{resource_id}' not found")
            }
            Self::Unknown {
                provider,
                raw_message,
                ..
            } => {
                write!(f, "[{provider}] {raw_message}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Convenience type alias for `Result<T, ProviderError>`.
pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn in_use() -> ProviderError {
        ProviderError::ResourceInUse {
            provider: "memory".into(),
            resource_id: "hc-1".into(),
            raw_message: None,
        }
    }

    #[test]
    fn display_resource_in_use() {
        assert_eq!(
            in_use().to_string(),
            "[memory] Resource 'hc-1' is still in use"
        );
    }

    #[test]
    fn display_rate_limited_with_retry() {
        let e = ProviderError::RateLimited {
            provider: "route53".to_string(),
            retry_after: Some(30),
            raw_message: None,
        };
        assert_eq!(e.to_string(), "[route53] Rate limited (retry after 30s)");
    }

    #[test]
    fn display_permission_denied() {
        let e = ProviderError::PermissionDenied {
            provider: "test".to_string(),
            raw_message: Some("no access".to_string()),
        };
        assert_eq!(e.to_string(), "[test] Permission denied: no access");
    }

    #[test]
    fn display_not_found() {
        let e = ProviderError::NotFound {
            provider: "test".to_string(),
            resource_id: "Z1".to_string(),
        };
        assert_eq!(e.to_string(), "[test] Resource 'Z1' not found");
    }

    #[test]
    fn classify_transient_conditions() {
        assert_eq!(in_use().class(), ErrorClass::TransientInUse);
        let timeout = ProviderError::Timeout {
            provider: "t".into(),
            detail: "30s".into(),
        };
        assert_eq!(timeout.class(), ErrorClass::TransientInUse);
        let network = ProviderError::NetworkError {
            provider: "t".into(),
            detail: "reset".into(),
        };
        assert_eq!(network.class(), ErrorClass::TransientInUse);
        let throttled = ProviderError::RateLimited {
            provider: "t".into(),
            retry_after: None,
            raw_message: None,
        };
        assert_eq!(throttled.class(), ErrorClass::RateLimited);
        assert!(throttled.class().is_transient());
    }

    #[test]
    fn classify_terminal_conditions() {
        let denied = ProviderError::InvalidCredentials {
            provider: "t".into(),
            raw_message: None,
        };
        assert_eq!(denied.class(), ErrorClass::PermissionDenied);
        assert!(!denied.class().is_transient());

        let invalid = ProviderError::ValidationError {
            provider: "t".into(),
            detail: "bad".into(),
        };
        assert_eq!(invalid.class(), ErrorClass::ValidationError);

        let unknown = ProviderError::Unknown {
            provider: "t".into(),
            raw_code: None,
            raw_message: "boom".into(),
        };
        assert_eq!(unknown.class(), ErrorClass::Unexpected);
        assert!(!unknown.is_expected());
    }

    #[test]
    fn serialize_carries_code_tag() {
        let e = ProviderError::RateLimited {
            provider: "route53".to_string(),
            retry_after: Some(60),
            raw_message: Some("Throttling".to_string()),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"code\":\"RateLimited\""));
        assert!(json.contains("\"retry_after\":60"));
        assert_eq!(e.retry_after(), Some(60));
    }
}
