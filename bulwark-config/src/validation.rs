// Configuration validation

use crate::{ConfigError, Result};

/// Trait for validating configuration
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Reusable validation rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate that a value is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                field
            )));
        }
        Ok(())
    }

    /// Validate that a number is within an inclusive range
    pub fn in_range<T: PartialOrd + std::fmt::Display>(
        value: T,
        min: T,
        max: T,
        field: &str,
    ) -> Result<()> {
        if value < min || value > max {
            return Err(ConfigError::ValidationError(format!(
                "{} must be between {} and {} (got {})",
                field, min, max, value
            )));
        }
        Ok(())
    }

    /// Validate that a value can be placed in a single header directive:
    /// no whitespace and none of the `;` / `,` separators.
    pub fn is_directive_token(value: &str, field: &str) -> Result<()> {
        Self::not_empty(value, field)?;
        if value
            .chars()
            .any(|c| c.is_whitespace() || c == ';' || c == ',' || c.is_control())
        {
            return Err(ConfigError::ValidationError(format!(
                "{} must not contain whitespace, ';' or ',' (got {:?})",
                field, value
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_empty() {
        assert!(ConfigValidator::not_empty("value", "field").is_ok());
        assert!(ConfigValidator::not_empty("", "field").is_err());
        assert!(ConfigValidator::not_empty("   ", "field").is_err());
    }

    #[test]
    fn test_in_range() {
        assert!(ConfigValidator::in_range(16, 1, 1024, "nonce_size").is_ok());
        let err = ConfigValidator::in_range(0, 1, 1024, "nonce_size").unwrap_err();
        assert!(err.to_string().contains("between 1 and 1024"));
    }

    #[test]
    fn test_is_directive_token() {
        assert!(ConfigValidator::is_directive_token("/api/csp-report", "report_uri").is_ok());
        assert!(
            ConfigValidator::is_directive_token("https://r.example.com/csp", "report_uri").is_ok()
        );
        assert!(ConfigValidator::is_directive_token("/a b", "report_uri").is_err());
        assert!(ConfigValidator::is_directive_token("/a;script-src *", "report_uri").is_err());
        assert!(ConfigValidator::is_directive_token("/a,/b", "report_uri").is_err());
        assert!(ConfigValidator::is_directive_token("", "report_uri").is_err());
    }
}
