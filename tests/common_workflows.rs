//! Integration tests for common Bulwark workflows.
//!
//! A page handler behind the full pipeline: request logging, the CSP report
//! endpoint and the security headers hook.

use base64::{Engine, engine::general_purpose::STANDARD};
use bulwark::prelude::*;
use std::collections::HashSet;

fn page() -> HandlerFn {
    handler(|req: HttpRequest| async move {
        let attribute = req
            .extension::<CspNonce>()
            .map(|nonce| nonce.attribute())
            .unwrap_or_default();
        Ok(HttpResponse::ok().with_html(format!(
            "<html><head><style {0}>body{{margin:0}}</style></head><body><script {0}>boot()</script></body></html>",
            attribute
        )))
    })
}

fn pipeline(settings: &SecuritySettings) -> MiddlewareChain {
    let mut chain = MiddlewareChain::new();
    chain.use_middleware(LoggingMiddleware::new());
    chain.use_middleware(SecurityHeadersMiddleware::from_settings(settings).unwrap());
    if let Some(reports) = CspReportHandler::from_settings(settings) {
        chain.use_middleware(reports);
    }
    chain
}

fn get(path: &str) -> HttpRequest {
    HttpRequest::new("GET".to_string(), path.to_string()).with_header("Host", "shop.example.com")
}

fn nonce_in_body(response: &HttpResponse) -> String {
    let body = String::from_utf8(response.body.clone()).unwrap();
    let start = body.find("nonce=\"").unwrap() + "nonce=\"".len();
    let end = start + body[start..].find('"').unwrap();
    body[start..end].to_string()
}

// =============================================================================
// Production
// =============================================================================

#[tokio::test]
async fn test_production_page_gets_full_header_set() {
    let chain = pipeline(&SecuritySettings::new().environment(Environment::Production));
    let response = chain.respond(get("/"), page()).await;

    assert_eq!(response.status, 200);

    let csp = response.header("Content-Security-Policy").unwrap();
    assert!(csp.starts_with("default-src 'self'; script-src 'self'"));
    assert!(csp.contains("report-uri /api/csp-report"));
    assert!(csp.ends_with("; upgrade-insecure-requests"));
    assert!(response.header("Content-Security-Policy-Report-Only").is_none());

    for (name, value) in [
        ("Strict-Transport-Security", "max-age=31536000; includeSubDomains; preload"),
        ("X-Frame-Options", "DENY"),
        ("X-Content-Type-Options", "nosniff"),
        ("X-XSS-Protection", "1; mode=block"),
        ("Referrer-Policy", "strict-origin-when-cross-origin"),
        ("Permissions-Policy", "camera=(), microphone=(), geolocation=(), interest-cohort=()"),
        ("Cross-Origin-Embedder-Policy", "credentialless"),
        ("Cross-Origin-Opener-Policy", "same-origin"),
        ("Cross-Origin-Resource-Policy", "same-site"),
    ] {
        assert_eq!(response.header(name), Some(value), "{}", name);
    }
}

#[tokio::test]
async fn test_template_nonce_matches_header() {
    let chain = pipeline(&SecuritySettings::new());
    let response = chain.respond(get("/"), page()).await;

    let nonce = nonce_in_body(&response);
    assert_eq!(STANDARD.decode(&nonce).unwrap().len(), 16);

    let csp = response.header("Content-Security-Policy").unwrap();
    assert_eq!(csp.matches(&format!("'nonce-{}'", nonce)).count(), 2);
}

#[tokio::test]
async fn test_nonces_are_unique_across_requests() {
    let chain = pipeline(&SecuritySettings::new().nonce_size(24));

    let mut seen = HashSet::new();
    for _ in 0..50 {
        let response = chain.respond(get("/"), page()).await;
        let nonce = nonce_in_body(&response);
        assert_eq!(STANDARD.decode(&nonce).unwrap().len(), 24);
        assert!(seen.insert(nonce));
    }
}

#[tokio::test]
async fn test_configured_hashes_in_policy() {
    let settings = SecuritySettings::new()
        .script_hash("'sha256-XYZ'")
        .script_hash("XYZ2")
        .style_hash("sha384-abc");
    let response = pipeline(&settings).respond(get("/"), page()).await;
    let csp = response.header("Content-Security-Policy").unwrap();

    assert!(csp.contains("'sha256-XYZ' 'sha256-XYZ2'; style-src"));
    assert!(csp.contains("'sha384-abc'; img-src"));
}

#[tokio::test]
async fn test_violation_report_round_trip() {
    let chain = pipeline(&SecuritySettings::new());

    let report = HttpRequest::new("POST".to_string(), "/api/csp-report".to_string())
        .with_header("Content-Type", "application/reports+json")
        .with_body(
            serde_json::to_vec(&serde_json::json!([{
                "type": "csp-violation",
                "url": "https://shop.example.com/",
                "body": {
                    "documentURL": "https://shop.example.com/",
                    "blockedURL": "https://cdn.evil.example/x.js",
                    "effectiveDirective": "script-src-elem",
                    "disposition": "enforce"
                }
            }]))
            .unwrap(),
        );
    let response = chain.respond(report, page()).await;
    assert_eq!(response.status, 204);
    assert!(response.body.is_empty());

    let wrong_method = chain.respond(get("/api/csp-report"), page()).await;
    assert_eq!(wrong_method.status, 405);
    assert!(wrong_method.header("Content-Security-Policy").is_some());
}

#[tokio::test]
async fn test_handler_errors_still_secured() {
    let chain = pipeline(&SecuritySettings::new());
    let failing = handler(|_req: HttpRequest| async move {
        Err(Error::Internal("database down".to_string()))
    });

    let response = chain.respond(get("/orders"), failing).await;
    assert_eq!(response.status, 500);
    assert_eq!(response.body, b"Internal Server Error".to_vec());
    assert!(response.header("Content-Security-Policy").is_some());
    assert!(response.header("Strict-Transport-Security").is_some());
}

// =============================================================================
// Development
// =============================================================================

#[tokio::test]
async fn test_development_is_report_only() {
    let settings = SecuritySettings::new()
        .environment(Environment::Development)
        .report_uri("/custom-report");
    let chain = pipeline(&settings);
    let response = chain.respond(get("/"), page()).await;

    assert!(response.header("Content-Security-Policy").is_none());
    let csp = response.header("Content-Security-Policy-Report-Only").unwrap();
    assert!(!csp.contains("upgrade-insecure-requests"));
    assert!(!csp.contains("report-uri"));
    assert!(csp.contains(&format!("'nonce-{}'", nonce_in_body(&response))));

    // No report endpoint is mounted in development
    let report = HttpRequest::new("POST".to_string(), "/custom-report".to_string());
    let response = chain
        .respond(report, handler(|_req: HttpRequest| async move { Ok(HttpResponse::not_found()) }))
        .await;
    assert_eq!(response.status, 404);
}

// =============================================================================
// Settings
// =============================================================================

#[test]
fn test_settings_from_env_map() {
    let vars = bulwark::bulwark_config::EnvLoader::new(Some("BULWARK".to_string())).load_from(vec![
        ("BULWARK_ENV".to_string(), "development".to_string()),
        ("BULWARK_SCRIPT_HASHES".to_string(), "abc=,def=".to_string()),
    ]);
    let settings = SecuritySettings::default().merge_env(&vars).unwrap();
    let security = SecurityHeadersMiddleware::from_settings(&settings).unwrap();

    assert!(security.environment().is_development());
    assert_eq!(
        security.policy().unwrap().script_hashes(),
        ["'sha256-abc='", "'sha256-def='"]
    );
}

#[test]
fn test_static_policy_helpers() {
    let config = PolicyConfig::builder().nonce("abc123").build().unwrap();

    let csp = generate_csp(&config);
    assert_eq!(csp.value.matches("'nonce-abc123'").count(), 2);

    let headers = get_security_headers("example.com", &config);
    assert_eq!(headers.len(), 10);
    assert_eq!(headers.csp().map(|(_, value)| value), Some(csp.value.as_str()));

    assert!(get_environment_csp(&config, true).is_report_only());
    assert!(generate_nonce(0).is_err());
}
