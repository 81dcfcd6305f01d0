//! X-XSS-Protection
//!
//! Only honoured by legacy browsers; modern ones rely on the CSP.

use crate::headers::SecurityHeader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XssFilter {
    Disabled,
    Enabled,
    /// Block the page instead of sanitizing it
    #[default]
    EnabledBlock,
}

impl SecurityHeader for XssFilter {
    const NAME: &'static str = "X-XSS-Protection";

    fn header_value(&self) -> String {
        match self {
            Self::Disabled => "0",
            Self::Enabled => "1",
            Self::EnabledBlock => "1; mode=block",
        }
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xss_filter() {
        assert_eq!(XssFilter::Disabled.header_value(), "0");
        assert_eq!(XssFilter::Enabled.header_value(), "1");
        assert_eq!(XssFilter::default().header_value(), "1; mode=block");
    }
}
