//! Cross-origin isolation headers (COEP, COOP, CORP)

use crate::headers::SecurityHeader;

/// `Cross-Origin-Embedder-Policy`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossOriginEmbedderPolicy {
    UnsafeNone,
    RequireCorp,
    /// Cross-origin no-cors requests are sent without credentials
    #[default]
    Credentialless,
}

impl SecurityHeader for CrossOriginEmbedderPolicy {
    const NAME: &'static str = "Cross-Origin-Embedder-Policy";

    fn header_value(&self) -> String {
        match self {
            Self::UnsafeNone => "unsafe-none",
            Self::RequireCorp => "require-corp",
            Self::Credentialless => "credentialless",
        }
        .to_string()
    }
}

/// `Cross-Origin-Opener-Policy`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossOriginOpenerPolicy {
    UnsafeNone,
    SameOriginAllowPopups,
    #[default]
    SameOrigin,
}

impl SecurityHeader for CrossOriginOpenerPolicy {
    const NAME: &'static str = "Cross-Origin-Opener-Policy";

    fn header_value(&self) -> String {
        match self {
            Self::UnsafeNone => "unsafe-none",
            Self::SameOriginAllowPopups => "same-origin-allow-popups",
            Self::SameOrigin => "same-origin",
        }
        .to_string()
    }
}

/// `Cross-Origin-Resource-Policy`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossOriginResourcePolicy {
    #[default]
    SameSite,
    SameOrigin,
    CrossOrigin,
}

impl SecurityHeader for CrossOriginResourcePolicy {
    const NAME: &'static str = "Cross-Origin-Resource-Policy";

    fn header_value(&self) -> String {
        match self {
            Self::SameSite => "same-site",
            Self::SameOrigin => "same-origin",
            Self::CrossOrigin => "cross-origin",
        }
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(CrossOriginEmbedderPolicy::default().header_value(), "credentialless");
        assert_eq!(CrossOriginOpenerPolicy::default().header_value(), "same-origin");
        assert_eq!(CrossOriginResourcePolicy::default().header_value(), "same-site");
    }

    #[test]
    fn test_variants() {
        assert_eq!(CrossOriginEmbedderPolicy::RequireCorp.header_value(), "require-corp");
        assert_eq!(
            CrossOriginOpenerPolicy::SameOriginAllowPopups.header_value(),
            "same-origin-allow-popups"
        );
        assert_eq!(CrossOriginResourcePolicy::CrossOrigin.header_value(), "cross-origin");
    }
}
