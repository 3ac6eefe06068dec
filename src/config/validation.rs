//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (counts > 0, probe timeout < interval)
//! - Validate backend address and path prefix shapes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no backends configured")]
    NoBackends,

    #[error("backend address {0:?} must be a bare host:port")]
    InvalidBackendAddress(String),

    #[error("routing.shard_capacity must be greater than zero")]
    ZeroShardCapacity,

    #[error("retries.{0} must be greater than zero")]
    ZeroRetryLimit(&'static str),

    #[error("health_check.{0} must be greater than zero")]
    ZeroProbeTiming(&'static str),

    #[error("health_check.timeout_secs must be shorter than interval_secs")]
    ProbeTimeoutTooLong,

    #[error("routing.api_prefix {0:?} must start with '/' and not end with '/'")]
    InvalidApiPrefix(String),
}

/// Check every semantic rule and collect all violations.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }
    for address in &config.backends {
        let trimmed = address.trim();
        if trimmed.is_empty() || trimmed.contains("://") || trimmed.contains('/') {
            errors.push(ValidationError::InvalidBackendAddress(address.clone()));
        }
    }

    if config.routing.shard_capacity == 0 {
        errors.push(ValidationError::ZeroShardCapacity);
    }

    let prefix = &config.routing.api_prefix;
    if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
        errors.push(ValidationError::InvalidApiPrefix(prefix.clone()));
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::ZeroRetryLimit("max_attempts"));
    }
    if config.retries.max_retries == 0 {
        errors.push(ValidationError::ZeroRetryLimit("max_retries"));
    }

    let health = &config.health_check;
    if health.interval_secs == 0 {
        errors.push(ValidationError::ZeroProbeTiming("interval_secs"));
    }
    if health.timeout_secs == 0 {
        errors.push(ValidationError::ZeroProbeTiming("timeout_secs"));
    }
    if health.interval_secs > 0 && health.timeout_secs >= health.interval_secs {
        errors.push(ValidationError::ProbeTimeoutTooLong);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.backends = vec!["127.0.0.1:4000".into()];
        config
    }

    #[test]
    fn accepts_defaults_with_backends() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn empty_backend_list_is_rejected() {
        let config = ProxyConfig::default();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::NoBackends]);
    }

    #[test]
    fn collects_every_violation() {
        let mut config = valid();
        config.backends.push("http://10.0.0.2:4000".into());
        config.routing.shard_capacity = 0;
        config.routing.api_prefix = "api/".into();
        config.retries.max_retries = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::InvalidBackendAddress(
            "http://10.0.0.2:4000".into()
        )));
        assert!(errors.contains(&ValidationError::ZeroShardCapacity));
        assert!(errors.contains(&ValidationError::ZeroRetryLimit("max_retries")));
    }

    #[test]
    fn probe_timeout_must_fit_in_interval() {
        let mut config = valid();
        config.health_check.interval_secs = 2;
        config.health_check.timeout_secs = 2;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::ProbeTimeoutTooLong]
        );
    }

    #[test]
    fn prefix_shapes() {
        let mut config = valid();
        config.routing.api_prefix = "/api".into();
        assert!(validate_config(&config).is_ok());

        config.routing.api_prefix = "/".into();
        assert!(validate_config(&config).is_err());
    }
}
