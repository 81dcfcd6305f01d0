//! Security header sets
//!
//! [`SecurityHeadersConfig`] holds the typed non-CSP headers and
//! [`SecurityHeaders`] is the rendered, ordered result that gets copied onto
//! a response.

use crate::content_security_policy::{CSP_HEADER, CSP_REPORT_ONLY_HEADER, CspHeader};
use crate::content_type_options::ContentTypeOptions;
use crate::cross_origin::{
    CrossOriginEmbedderPolicy, CrossOriginOpenerPolicy, CrossOriginResourcePolicy,
};
use crate::frame_guard::FrameGuard;
use crate::hsts::HstsConfig;
use crate::permissions_policy::PermissionsPolicy;
use crate::referrer_policy::ReferrerPolicy;
use crate::xss_filter::XssFilter;
use bulwark_core::HttpResponse;

/// A response header with a fixed name and a typed value
pub trait SecurityHeader {
    const NAME: &'static str;

    fn header_value(&self) -> String;
}

/// Rendered header name/value pairs in emission order.
///
/// Names are unique ignoring ASCII case, and at most one of the two CSP
/// header names is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityHeaders {
    headers: Vec<(String, String)>,
}

impl SecurityHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a header
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name, value)),
        }
    }

    /// Set the CSP header, dropping the other CSP variant if present
    pub fn set_csp(&mut self, csp: CspHeader) {
        let other = if csp.is_report_only() {
            CSP_HEADER
        } else {
            CSP_REPORT_ONLY_HEADER
        };
        self.headers
            .retain(|(name, _)| !name.eq_ignore_ascii_case(other));
        self.insert(csp.name, csp.value);
    }

    pub fn insert_typed<H: SecurityHeader>(&mut self, header: &H) {
        self.insert(H::NAME, header.header_value());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The CSP-family header, whichever variant is set
    pub fn csp(&self) -> Option<(&str, &str)> {
        self.headers
            .iter()
            .find(|(name, _)| {
                name.eq_ignore_ascii_case(CSP_HEADER)
                    || name.eq_ignore_ascii_case(CSP_REPORT_ONLY_HEADER)
            })
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Write every header onto the response, replacing same-named headers.
    ///
    /// A CSP header of the other variant already on the response is removed
    /// so the response never carries both.
    pub fn apply_to(&self, response: &mut HttpResponse) {
        if let Some((name, _)) = self.csp() {
            let other = if name.eq_ignore_ascii_case(CSP_HEADER) {
                CSP_REPORT_ONLY_HEADER
            } else {
                CSP_HEADER
            };
            response
                .headers
                .retain(|existing, _| !existing.eq_ignore_ascii_case(other));
        }

        for (name, value) in &self.headers {
            response.set_header(name.clone(), value.clone());
        }
    }
}

impl<'a> IntoIterator for &'a SecurityHeaders {
    type Item = &'a (String, String);
    type IntoIter = std::slice::Iter<'a, (String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.headers.iter()
    }
}

/// The non-CSP headers emitted alongside the policy.
///
/// Defaults produce the standard fixed set; a `None` HSTS omits that header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityHeadersConfig {
    pub hsts: Option<HstsConfig>,
    pub frame_guard: FrameGuard,
    pub content_type_options: ContentTypeOptions,
    pub xss_filter: XssFilter,
    pub referrer_policy: ReferrerPolicy,
    pub permissions_policy: PermissionsPolicy,
    pub coep: CrossOriginEmbedderPolicy,
    pub coop: CrossOriginOpenerPolicy,
    pub corp: CrossOriginResourcePolicy,
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self {
            hsts: Some(HstsConfig::default()),
            frame_guard: FrameGuard::default(),
            content_type_options: ContentTypeOptions::default(),
            xss_filter: XssFilter::default(),
            referrer_policy: ReferrerPolicy::default(),
            permissions_policy: PermissionsPolicy::default(),
            coep: CrossOriginEmbedderPolicy::default(),
            coop: CrossOriginOpenerPolicy::default(),
            corp: CrossOriginResourcePolicy::default(),
        }
    }
}

impl SecurityHeadersConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hsts(mut self, config: HstsConfig) -> Self {
        self.hsts = Some(config);
        self
    }

    pub fn without_hsts(mut self) -> Self {
        self.hsts = None;
        self
    }

    pub fn with_frame_guard(mut self, guard: FrameGuard) -> Self {
        self.frame_guard = guard;
        self
    }

    pub fn with_xss_filter(mut self, filter: XssFilter) -> Self {
        self.xss_filter = filter;
        self
    }

    pub fn with_referrer_policy(mut self, policy: ReferrerPolicy) -> Self {
        self.referrer_policy = policy;
        self
    }

    pub fn with_permissions_policy(mut self, policy: PermissionsPolicy) -> Self {
        self.permissions_policy = policy;
        self
    }

    pub fn with_coep(mut self, policy: CrossOriginEmbedderPolicy) -> Self {
        self.coep = policy;
        self
    }

    pub fn with_coop(mut self, policy: CrossOriginOpenerPolicy) -> Self {
        self.coop = policy;
        self
    }

    pub fn with_corp(mut self, policy: CrossOriginResourcePolicy) -> Self {
        self.corp = policy;
        self
    }

    /// Append the non-CSP headers in their fixed order
    pub fn write_into(&self, headers: &mut SecurityHeaders) {
        if let Some(ref hsts) = self.hsts {
            headers.insert_typed(hsts);
        }
        headers.insert_typed(&self.frame_guard);
        headers.insert_typed(&self.content_type_options);
        headers.insert_typed(&self.xss_filter);
        headers.insert_typed(&self.referrer_policy);
        if !self.permissions_policy.is_empty() {
            headers.insert_typed(&self.permissions_policy);
        }
        headers.insert_typed(&self.coep);
        headers.insert_typed(&self.coop);
        headers.insert_typed(&self.corp);
    }
}
