//! Permissions-Policy
//!
//! Each feature maps to an allowlist rendered in structured-header form:
//! `camera=()` denies everywhere, `camera=(self)` allows the page's own
//! origin, and quoted origins extend the list.

use crate::headers::SecurityHeader;

/// Allowlist for one browser feature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Allowlist {
    /// `()`
    None,
    /// `(self)`
    SelfOnly,
    /// `*`
    All,
    /// `(self "https://a.example")` or `("https://a.example")`
    Origins { include_self: bool, origins: Vec<String> },
}

impl Allowlist {
    fn render(&self) -> String {
        match self {
            Self::None => "()".to_string(),
            Self::SelfOnly => "(self)".to_string(),
            Self::All => "*".to_string(),
            Self::Origins {
                include_self,
                origins,
            } => {
                let mut items: Vec<String> = Vec::with_capacity(origins.len() + 1);
                if *include_self {
                    items.push("self".to_string());
                }
                items.extend(origins.iter().map(|origin| format!("\"{}\"", origin)));
                format!("({})", items.join(" "))
            }
        }
    }
}

/// Ordered feature allowlists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionsPolicy {
    features: Vec<(String, Allowlist)>,
}

impl PermissionsPolicy {
    /// Policy with no features listed
    pub fn empty() -> Self {
        Self {
            features: Vec::new(),
        }
    }

    pub fn deny(self, feature: impl Into<String>) -> Self {
        self.feature(feature, Allowlist::None)
    }

    pub fn allow_self(self, feature: impl Into<String>) -> Self {
        self.feature(feature, Allowlist::SelfOnly)
    }

    pub fn allow_origins<I, S>(self, feature: impl Into<String>, include_self: bool, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.feature(
            feature,
            Allowlist::Origins {
                include_self,
                origins: origins.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// Set a feature's allowlist, keeping its position if already listed
    pub fn feature(mut self, feature: impl Into<String>, allowlist: Allowlist) -> Self {
        let feature = feature.into();
        match self.features.iter_mut().find(|(name, _)| *name == feature) {
            Some(entry) => entry.1 = allowlist,
            None => self.features.push((feature, allowlist)),
        }
        self
    }

    pub fn get(&self, feature: &str) -> Option<&Allowlist> {
        self.features
            .iter()
            .find(|(name, _)| name == feature)
            .map(|(_, allowlist)| allowlist)
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Default for PermissionsPolicy {
    /// Camera, microphone and geolocation denied; FLoC cohort opt-out
    fn default() -> Self {
        Self::empty()
            .deny("camera")
            .deny("microphone")
            .deny("geolocation")
            .deny("interest-cohort")
    }
}

impl SecurityHeader for PermissionsPolicy {
    const NAME: &'static str = "Permissions-Policy";

    fn header_value(&self) -> String {
        self.features
            .iter()
            .map(|(name, allowlist)| format!("{}={}", name, allowlist.render()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
