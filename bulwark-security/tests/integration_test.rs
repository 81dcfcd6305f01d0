//! Integration tests for bulwark-security

use base64::{Engine, engine::general_purpose::STANDARD};
use bulwark_config::{Environment, SecuritySettings};
use bulwark_core::{HttpRequest, HttpResponse, MiddlewareChain, handler};
use bulwark_security::*;

#[test]
fn test_generate_nonce_sizes() {
    for size in [8, 16, 32] {
        let nonce = generate_nonce(size).unwrap();
        assert_eq!(STANDARD.decode(&nonce).unwrap().len(), size);
    }
}

#[test]
fn test_default_policy_shape() {
    let csp = generate_csp(&PolicyConfig::default());

    assert_eq!(csp.name, CSP_HEADER);
    assert!(csp.value.contains("default-src 'self'"));
    assert!(csp.value.contains("frame-src 'none'"));
    assert!(csp.value.contains("object-src 'none'"));
    assert!(csp.value.ends_with("; upgrade-insecure-requests"));
}

#[test]
fn test_generated_nonce_round_trips_into_policy() {
    let nonce = generate_nonce(16).unwrap();
    let config = PolicyConfig::builder().nonce(nonce.clone()).build().unwrap();
    let csp = generate_csp(&config);

    assert_eq!(csp.value.matches(&format!("'nonce-{}'", nonce)).count(), 2);
}

#[test]
fn test_security_headers_have_no_duplicates() {
    let headers = get_security_headers("example.com", &PolicyConfig::default());
    let names: Vec<&str> = headers.names().collect();

    assert_eq!(names.len(), 10);
    for (i, name) in names.iter().enumerate() {
        assert!(
            !names[i + 1..].iter().any(|other| other.eq_ignore_ascii_case(name)),
            "{} emitted twice",
            name
        );
    }
}

#[test]
fn test_environment_csp_is_only_branch() {
    let config = PolicyConfig::builder()
        .report_only(true)
        .upgrade_insecure_requests(false)
        .build()
        .unwrap();

    // Without the environment step the caller's values are used as given
    assert_eq!(generate_csp(&config).name, CSP_REPORT_ONLY_HEADER);

    let production = get_environment_csp(&config, false);
    assert_eq!(production.name, CSP_HEADER);
    assert!(production.value.contains("report-uri /api/csp-report"));

    let development = get_environment_csp(&config, true);
    assert_eq!(development.name, CSP_REPORT_ONLY_HEADER);
    assert!(!development.value.contains("upgrade-insecure-requests"));
}

#[test]
fn test_custom_header_config() {
    let builder = PolicyBuilder::default().with_headers(
        SecurityHeadersConfig::new()
            .with_hsts(HstsConfig::new(600).include_subdomains(false))
            .with_frame_guard(FrameGuard::SameOrigin)
            .with_coep(CrossOriginEmbedderPolicy::RequireCorp)
            .with_permissions_policy(PermissionsPolicy::empty().allow_self("fullscreen")),
    );
    let headers = builder.security_headers("example.com", &PolicyConfig::default());

    assert_eq!(headers.get("Strict-Transport-Security"), Some("max-age=600"));
    assert_eq!(headers.get("X-Frame-Options"), Some("SAMEORIGIN"));
    assert_eq!(headers.get("Cross-Origin-Embedder-Policy"), Some("require-corp"));
    assert_eq!(headers.get("Permissions-Policy"), Some("fullscreen=(self)"));
}

#[tokio::test]
async fn test_report_endpoint_matches_policy() {
    let settings = SecuritySettings::new().environment(Environment::Production);
    let security = SecurityHeadersMiddleware::from_settings(&settings).unwrap();
    let reports = CspReportHandler::from_settings(&settings).unwrap();

    let mut chain = MiddlewareChain::new();
    chain.use_middleware(security);
    chain.use_middleware(reports.clone());

    let page = handler(|_req: HttpRequest| async move { Ok(HttpResponse::ok().with_html("<p>hi</p>")) });
    let response = chain
        .respond(HttpRequest::new("GET".into(), "/".into()), page.clone())
        .await;
    let csp = response.header(CSP_HEADER).unwrap();
    assert!(csp.contains(&format!("report-uri {}", reports.path())));

    let report = HttpRequest::new("POST".into(), reports.path().to_string())
        .with_header("Content-Type", "application/csp-report")
        .with_body(r#"{"csp-report": {"document-uri": "https://example.com/", "blocked-uri": "inline"}}"#);
    let response = chain.respond(report, page).await;

    assert_eq!(response.status, 204);
    assert!(response.header(CSP_HEADER).is_some());
}
