//! Configuration validation traits and utilities

use crate::error::{ConfigError, ConfigResult};

/// Trait for validatable configuration
pub trait Validatable {
    /// Validate the configuration
    fn validate(&self) -> ConfigResult<()>;

    /// Get the domain name for error reporting
    fn domain_name(&self) -> &'static str;

    /// Helper to create a domain-specific validation error
    fn validation_error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::DomainError {
            domain: self.domain_name().to_string(),
            message: message.into(),
        }
    }
}

/// Validate a positive number
pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value <= T::default() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be greater than 0, got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate that a value is one of the allowed choices
pub fn validate_enum_choice(value: &str, choices: &[&str], field_name: &str, domain: &str) -> ConfigResult<()> {
    if !choices.contains(&value) {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be one of {:?}, got '{}'", field_name, choices, value),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive(1usize, "concurrent_users", "runner").is_ok());
        let err = validate_positive(0usize, "concurrent_users", "runner").unwrap_err();
        assert!(err.to_string().contains("concurrent_users must be greater than 0"));
    }

    #[test]
    fn test_validate_enum_choice() {
        assert!(validate_enum_choice("info", &["info", "debug"], "level", "logging").is_ok());
        assert!(validate_enum_choice("loud", &["info", "debug"], "level", "logging").is_err());
    }
}
