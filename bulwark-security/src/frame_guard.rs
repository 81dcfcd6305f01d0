//! X-Frame-Options
//!
//! Legacy clickjacking guard; `frame-ancestors` is not part of the baseline
//! policy, so this header stays in the fixed set.

use crate::headers::SecurityHeader;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FrameGuard {
    #[default]
    Deny,
    SameOrigin,
    /// Obsolete; ignored by current browsers
    AllowFrom(String),
}

impl SecurityHeader for FrameGuard {
    const NAME: &'static str = "X-Frame-Options";

    fn header_value(&self) -> String {
        match self {
            Self::Deny => "DENY".to_string(),
            Self::SameOrigin => "SAMEORIGIN".to_string(),
            Self::AllowFrom(origin) => format!("ALLOW-FROM {}", origin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_guard() {
        assert_eq!(FrameGuard::default().header_value(), "DENY");
        assert_eq!(FrameGuard::SameOrigin.header_value(), "SAMEORIGIN");
        assert_eq!(
            FrameGuard::AllowFrom("https://example.com".to_string()).header_value(),
            "ALLOW-FROM https://example.com"
        );
    }
}
