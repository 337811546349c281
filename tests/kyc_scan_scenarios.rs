//! End-to-end scenarios for `ScanEngine::scan`, stubbing the crawl target
//! with `wiremock` rather than hitting a real website.
//!
//! # Fixture Requirements
//!
//! Fixture HTML lives under `tests/fixtures/`. Each test loads what it
//! needs by name; a missing fixture fails loudly via `expect` rather than
//! silently skipping, since (unlike the CLI-binary integration tests this
//! harness is modeled on) these fixtures are checked in, not generated.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kyc_screen::config::Config;
use kyc_screen::model::{Decision, MatchStatus};
use kyc_screen::{MerchantKYCInput, ScanEngine};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("missing fixture {}: {e}", path.display()))
}

/// Cache-less config so tests never touch a shared sqlite file, with
/// timeouts short enough that a scan finishes well inside the test
/// harness's own patience.
fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        crawl_concurrency: 10,
        max_pages: 20,
        page_timeout: Duration::from_secs(5),
        total_crawl_timeout: Duration::from_secs(15),
        cache_db_path: String::new(),
        cache_enabled: false,
        chromium_binary_path: None,
        webhook_max_retries: 3,
        webhook_initial_backoff_secs: 2,
        scan_version: "test".to_string(),
    }
}

fn html_mock(template: ResponseTemplate) -> ResponseTemplate {
    template.insert_header("content-type", "text/html; charset=utf-8")
}

fn base_input(website_url: String) -> MerchantKYCInput {
    MerchantKYCInput {
        merchant_legal_name: "Acme Solutions Pvt Ltd".to_string(),
        registered_address: "123 Market Street, Suite 400, Springfield".to_string(),
        declared_business_type: "E-commerce".to_string(),
        declared_products_services: vec!["Furniture".to_string(), "Home goods".to_string()],
        website_url,
        merchant_display_name: "Acme Solutions".to_string(),
        optional_data: None,
    }
}

#[tokio::test]
async fn dns_failure_fails_with_dns_reason() {
    let engine = ScanEngine::new(test_config());
    let input = base_input("http://kyc-scan-test-nonexistent-domain-xyz123.invalid".to_string());

    let output = engine.scan(input).await.expect("input validation must succeed");

    assert_eq!(output.decision, Decision::Fail);
    assert_eq!(output.confidence_score, 0.95);
    let accessibility_reason = output
        .reason_codes
        .iter()
        .find(|r| r.code == "DNS_FAIL" || r.code == "SITE_UNREACHABLE")
        .expect("an accessibility failure reason must be present when the homepage can't be reached");
    assert!(accessibility_reason.is_auto_fail);
}

#[tokio::test]
async fn missing_privacy_policy_fails_without_flagging_terms() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_mock(ResponseTemplate::new(200).set_body_string(fixture("home_no_privacy_link.html"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/terms-conditions"))
        .respond_with(html_mock(ResponseTemplate::new(200).set_body_string(fixture("terms_conditions.html"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/contact-us"))
        .respond_with(html_mock(ResponseTemplate::new(200).set_body_string(fixture("contact_us.html"))))
        .mount(&server)
        .await;

    let engine = ScanEngine::new(test_config());
    let input = base_input(server.uri());
    let output = engine.scan(input).await.expect("input validation must succeed");

    assert_eq!(output.decision, Decision::Fail);
    assert!(output.reason_codes.iter().any(|r| r.code == "MISSING_PRIVACY_POLICY"));
    assert!(!output.reason_codes.iter().any(|r| r.code == "MISSING_TERMS"));
}

#[tokio::test]
async fn prohibitive_policy_page_mention_does_not_trigger_high_risk_fail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_mock(ResponseTemplate::new(200).set_body_string(fixture("standard_footer.html"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/privacy-policy"))
        .respond_with(html_mock(
            ResponseTemplate::new(200).set_body_string(fixture("privacy_policy_prohibitive_gambling.html")),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/terms-conditions"))
        .respond_with(html_mock(ResponseTemplate::new(200).set_body_string(fixture("terms_conditions.html"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/refund-policy"))
        .respond_with(html_mock(ResponseTemplate::new(200).set_body_string(fixture("refund_policy.html"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/contact-us"))
        .respond_with(html_mock(ResponseTemplate::new(200).set_body_string(fixture("contact_us.html"))))
        .mount(&server)
        .await;

    let engine = ScanEngine::new(test_config());
    let input = base_input(server.uri());
    let output = engine.scan(input).await.expect("input validation must succeed");

    assert!(
        !output.reason_codes.iter().any(|r| r.code.starts_with("HIGH_RISK_CONTENT")),
        "a prohibitive mention on a policy page must never surface as a high-risk content FAIL: {:?}",
        output.reason_codes
    );
    let summary = output.content_risk_summary.expect("content risk summary must be populated");
    assert!(summary.policy_mentions_count >= 1);
}

#[tokio::test]
async fn gambling_content_corroborated_across_two_pages_fails_as_critical() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_mock(ResponseTemplate::new(200).set_body_string(fixture("gambling_home.html"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/games"))
        .respond_with(html_mock(ResponseTemplate::new(200).set_body_string(fixture("gambling_games.html"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/privacy-policy"))
        .respond_with(html_mock(ResponseTemplate::new(200).set_body_string(fixture("privacy_policy.html"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/terms-conditions"))
        .respond_with(html_mock(ResponseTemplate::new(200).set_body_string(fixture("terms_conditions.html"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/contact-us"))
        .respond_with(html_mock(ResponseTemplate::new(200).set_body_string(fixture("contact_us.html"))))
        .mount(&server)
        .await;

    let engine = ScanEngine::new(test_config());
    let input = base_input(server.uri());
    let output = engine.scan(input).await.expect("input validation must succeed");

    assert_eq!(output.decision, Decision::Fail);
    let gambling_reason = output
        .reason_codes
        .iter()
        .find(|r| r.code == "HIGH_RISK_CONTENT_GAMBLING")
        .expect("corroborated gambling content must fail with a dedicated reason code");
    assert_eq!(gambling_reason.severity, kyc_screen::model::ReasonSeverity::Critical);
    let summary = output.content_risk_summary.expect("content risk summary must be populated");
    assert!(summary.corroborated_categories.iter().any(|c| c == "gambling"));
}

#[tokio::test]
async fn ecommerce_without_refund_policy_escalates_with_working_checkout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_mock(
            ResponseTemplate::new(200).set_body_string(fixture("ecommerce_home_no_refund.html")),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/privacy-policy"))
        .respond_with(html_mock(ResponseTemplate::new(200).set_body_string(fixture("privacy_policy.html"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/terms-conditions"))
        .respond_with(html_mock(ResponseTemplate::new(200).set_body_string(fixture("terms_conditions.html"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/contact-us"))
        .respond_with(html_mock(ResponseTemplate::new(200).set_body_string(fixture("contact_us.html"))))
        .mount(&server)
        .await;
    // No browser is available in this harness, so the checkout validator
    // falls back to directly probing the common checkout paths over HTTP.
    Mock::given(method("GET"))
        .and(path("/checkout"))
        .respond_with(html_mock(ResponseTemplate::new(200).set_body_string(fixture("checkout_page.html"))))
        .mount(&server)
        .await;

    let mut input = base_input(server.uri());
    input.declared_business_type = "E-commerce retailer".to_string();
    input.declared_products_services = vec!["Widgets".to_string(), "Gadgets".to_string()];

    let engine = ScanEngine::new(test_config());
    let output = engine.scan(input).await.expect("input validation must succeed");

    assert_eq!(output.decision, Decision::Escalate);
    assert!(output.reason_codes.iter().any(|r| r.code == "MISSING_REFUND_POLICY"));
    assert!(!output.reason_codes.iter().any(|r| r.is_auto_fail));
    let checkout = output.checkout_flow.expect("checkout flow result must be populated");
    assert!(checkout.checkout_reachable, "direct /checkout probe should score above the checkout threshold");
}

#[tokio::test]
async fn declared_entity_mismatched_with_site_content_escalates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_mock(ResponseTemplate::new(200).set_body_string(fixture("entity_mismatch_home.html"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/privacy-policy"))
        .respond_with(html_mock(ResponseTemplate::new(200).set_body_string(fixture("privacy_policy.html"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/terms-conditions"))
        .respond_with(html_mock(ResponseTemplate::new(200).set_body_string(fixture("terms_conditions.html"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/contact-us"))
        .respond_with(html_mock(ResponseTemplate::new(200).set_body_string(fixture("contact_us.html"))))
        .mount(&server)
        .await;

    let engine = ScanEngine::new(test_config());
    let input = base_input(server.uri());
    let output = engine.scan(input).await.expect("input validation must succeed");

    assert!(output.reason_codes.iter().any(|r| r.code == "LEGAL_ENTITY_MISMATCH"));
    assert!(matches!(output.decision, Decision::Escalate | Decision::Fail));
    let entity = output.entity_match.expect("entity match result must be populated");
    assert_eq!(entity.match_status, MatchStatus::Mismatch);
    assert!(entity.match_score < 60.0);
}
