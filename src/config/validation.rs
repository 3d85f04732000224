use crate::config::types::{ChannelConfig, FrontierConfig, PolitenessConfig, RetryConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &FrontierConfig) -> Result<(), ConfigError> {
    validate_politeness(&config.politeness)?;
    validate_retry(&config.retry)?;
    validate_channels(&config.channels)?;
    validate_journal(config)?;
    Ok(())
}

/// Validates politeness delay settings
fn validate_politeness(config: &PolitenessConfig) -> Result<(), ConfigError> {
    if config.delay_factor < 0.0 || !config.delay_factor.is_finite() {
        return Err(ConfigError::Validation(format!(
            "delay-factor must be a non-negative finite number, got {}",
            config.delay_factor
        )));
    }

    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min-delay-ms ({}) must not exceed max-delay-ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    Ok(())
}

/// Validates retry settings
fn validate_retry(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.max_retries > 100 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= 100, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates channel sizing
fn validate_channels(config: &ChannelConfig) -> Result<(), ConfigError> {
    if config.outbound_capacity < 1 || config.outbound_capacity > 1024 {
        return Err(ConfigError::Validation(format!(
            "outbound-capacity must be between 1 and 1024, got {}",
            config.outbound_capacity
        )));
    }

    if config.inbound_multiple < 1 || config.inbound_multiple > 16 {
        return Err(ConfigError::Validation(format!(
            "inbound-multiple must be between 1 and 16, got {}",
            config.inbound_multiple
        )));
    }

    Ok(())
}

/// Validates journal settings
fn validate_journal(config: &FrontierConfig) -> Result<(), ConfigError> {
    if config.journal.enabled && config.journal.path.is_empty() {
        return Err(ConfigError::Validation(
            "journal path cannot be empty when journaling is enabled".to_string(),
        ));
    }

    Ok(())
}
