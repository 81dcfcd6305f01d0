//! Referrer-Policy

use crate::headers::SecurityHeader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferrerPolicy {
    NoReferrer,
    NoReferrerWhenDowngrade,
    Origin,
    OriginWhenCrossOrigin,
    SameOrigin,
    StrictOrigin,
    /// Full URL same-origin, origin only cross-origin, nothing on downgrade
    #[default]
    StrictOriginWhenCrossOrigin,
    UnsafeUrl,
}

impl ReferrerPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoReferrer => "no-referrer",
            Self::NoReferrerWhenDowngrade => "no-referrer-when-downgrade",
            Self::Origin => "origin",
            Self::OriginWhenCrossOrigin => "origin-when-cross-origin",
            Self::SameOrigin => "same-origin",
            Self::StrictOrigin => "strict-origin",
            Self::StrictOriginWhenCrossOrigin => "strict-origin-when-cross-origin",
            Self::UnsafeUrl => "unsafe-url",
        }
    }
}

impl SecurityHeader for ReferrerPolicy {
    const NAME: &'static str = "Referrer-Policy";

    fn header_value(&self) -> String {
        self.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referrer_policy() {
        assert_eq!(
            ReferrerPolicy::default().header_value(),
            "strict-origin-when-cross-origin"
        );
        assert_eq!(ReferrerPolicy::NoReferrer.header_value(), "no-referrer");
        assert_eq!(ReferrerPolicy::SameOrigin.as_str(), "same-origin");
    }
}
