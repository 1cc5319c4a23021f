//! Tests for the API connectors

use super::*;
use crate::broker::{Lifecycle, RequestOptions};
use crate::config::{BrokerOptions, EnvSource};
use crate::error::Error;
use pretty_assertions::assert_eq;
use secrecy::ExposeSecret;
use std::collections::HashMap;
use test_case::test_case;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn process_env(pairs: &[(&str, &str)]) -> EnvSource {
    let process: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    EnvSource::from_parts(HashMap::new(), process)
}

fn mock_options(server: &MockServer) -> BrokerOptions {
    BrokerOptions::builder(server.uri()).build()
}

// ============================================================================
// DomainTools
// ============================================================================

#[test]
fn test_domaintools_missing_key() {
    let err = AsyncDomainToolsConnector::new(None, BrokerOptions::default()).unwrap_err();
    assert!(matches!(err, Error::MissingCredential { ref name } if name == DOMAINTOOLS_API_KEY));
}

#[test]
fn test_domaintools_key_from_env() {
    let options = BrokerOptions::builder("")
        .load_env_vars(true)
        .env_source(process_env(&[(DOMAINTOOLS_API_KEY, "env-key")]))
        .build();
    let connector = AsyncDomainToolsConnector::new(None, options).unwrap();
    assert_eq!(connector.api_key().expose_secret(), "env-key");
    assert_eq!(connector.broker().config().base_url(), DOMAINTOOLS_BASE_URL);
}

#[test]
fn test_domaintools_argument_wins_over_env() {
    let options = BrokerOptions::builder("")
        .load_env_vars(true)
        .env_source(process_env(&[(DOMAINTOOLS_API_KEY, "env-key")]))
        .build();
    let connector =
        AsyncDomainToolsConnector::new(Some("arg-key".to_string()), options).unwrap();
    assert_eq!(connector.api_key().expose_secret(), "arg-key");
}

#[test]
fn test_domaintools_env_ignored_without_load_env_vars() {
    let options = BrokerOptions::builder("")
        .env_source(process_env(&[(DOMAINTOOLS_API_KEY, "env-key")]))
        .build();
    let err = AsyncDomainToolsConnector::new(None, options).unwrap_err();
    assert!(matches!(err, Error::MissingCredential { .. }));
}

#[test]
fn test_async_connector_rejects_mounts() {
    let options = BrokerOptions::builder("")
        .mount("http", "http://proxy.internal:3128")
        .build();
    let err = AsyncDomainToolsConnector::new(Some("key".to_string()), options).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[tokio::test]
async fn test_iris_requires_params() {
    let connector =
        AsyncDomainToolsConnector::new(Some("key".to_string()), BrokerOptions::default()).unwrap();
    let err = connector.iris_investigate(&[]).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid parameter: At least one Iris Investigate parameter is required"
    );
}

#[test_case(&[("domain", "example.com")], true ; "single known field")]
#[test_case(&[("ip", "1.2.3.4"), ("tld", "com")], true ; "several known fields")]
#[test_case(&[("domain", "example.com"), ("colour", "red")], false ; "unknown field")]
fn test_iris_param_validation(params: &[(&str, &str)], ok: bool) {
    assert_eq!(super::domaintools::validate_iris_params(params).is_ok(), ok);
}

#[test]
fn test_iris_unknown_params_listed_sorted() {
    let err = super::domaintools::validate_iris_params(&[("zeta", "1"), ("alpha", "2"), ("domain", "x")])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid parameter: Invalid Iris Investigate parameters: alpha, zeta"
    );
}

#[tokio::test]
async fn test_domaintools_parsed_whois() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/example.com/whois/parsed"))
        .and(header("X-API-KEY", "dt-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": {"registrant": "Example Org"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connector =
        AsyncDomainToolsConnector::new(Some("dt-key".to_string()), mock_options(&server)).unwrap();
    let response = connector
        .parsed_whois("example.com", RequestOptions::new())
        .await
        .unwrap();

    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["response"]["registrant"], "Example Org");
}

#[tokio::test]
async fn test_domaintools_reverse_lookups() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/example.com/reverse-ip"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ip"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/ns1.example.com/name-server-domains"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ns"))
        .expect(1)
        .mount(&server)
        .await;

    let connector =
        AsyncDomainToolsConnector::new(Some("dt-key".to_string()), mock_options(&server)).unwrap();

    let ip = connector
        .reverse_ip("example.com", RequestOptions::new().query("limit", "10"))
        .await
        .unwrap();
    assert_eq!(ip.text(), "ip");

    let ns = connector
        .reverse_nameserver("ns1.example.com", RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(ns.text(), "ns");
}

#[tokio::test]
async fn test_domaintools_iris_investigate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/iris-investigate"))
        .and(query_param("domain", "example.com"))
        .and(query_param("risk_score", "70"))
        .and(header("X-API-KEY", "dt-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let connector = AsyncDomainToolsConnector::new(
        Some("dt-key".to_string()),
        BrokerOptions::builder(server.uri()).logging(true).build(),
    )
    .unwrap();

    let response = connector
        .iris_investigate(&[("domain", "example.com"), ("risk_score", "70")])
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[test]
fn test_domaintools_blocking_whois() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/8.8.8.8/whois/parsed"))
            .and(header("X-API-KEY", "dt-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string("whois"))
            .expect(1)
            .mount(&server)
            .await;
        server
    });

    let connector =
        DomainToolsConnector::new(Some("dt-key".to_string()), mock_options(&server)).unwrap();
    let text = connector.scope(|c| {
        c.parsed_whois("8.8.8.8", RequestOptions::new())
            .map(|r| r.text())
    });
    assert_eq!(text.unwrap(), "whois");

    rt.block_on(server.verify());
}

// ============================================================================
// IPQS
// ============================================================================

#[test]
fn test_ipqs_missing_key() {
    let err = AsyncIpqsConnector::new(None, BrokerOptions::default()).unwrap_err();
    assert!(matches!(err, Error::MissingCredential { ref name } if name == IPQS_API_KEY));
}

#[test]
fn test_ipqs_defaults() {
    let connector =
        AsyncIpqsConnector::new(Some("ipqs-key".to_string()), BrokerOptions::default()).unwrap();
    let config = connector.broker().config();
    assert_eq!(config.base_url(), IPQS_BASE_URL);
    assert_eq!(
        config.headers().get("Content-Type").map(String::as_str),
        Some("application/x-www-form-urlencoded")
    );
}

#[tokio::test]
async fn test_ipqs_malicious_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/url/"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("url=example.com"))
        .and(body_string_contains("key=ipqs-key"))
        .and(body_string_contains("strictness=1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "domain": "example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut connector =
        AsyncIpqsConnector::new(Some("ipqs-key".to_string()), mock_options(&server)).unwrap();
    let response = connector
        .malicious_url("example.com", &[("strictness", "1")])
        .await
        .unwrap();

    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["success"], true);

    connector.close();
    assert!(connector.is_closed());
    let err = connector.malicious_url("example.com", &[]).await.unwrap_err();
    assert!(matches!(err, Error::Closed));
}

#[test]
fn test_ipqs_blocking_malicious_url() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/url/"))
            .and(body_string_contains("key=env-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"success\":true}"))
            .expect(1)
            .mount(&server)
            .await;
        server
    });

    let options = BrokerOptions::builder(server.uri())
        .load_env_vars(true)
        .env_source(process_env(&[(IPQS_API_KEY, "env-key")]))
        .build();
    let connector = IpqsConnector::new(None, options).unwrap();
    let response = connector.malicious_url("example.com", &[]).unwrap();
    assert!(response.is_success());
    drop(connector);

    rt.block_on(server.verify());
}

// ============================================================================
// Scoped use and Debug output
// ============================================================================

#[tokio::test]
async fn test_domaintools_async_scope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/example.com/whois/parsed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"response\":{}}"))
        .expect(1)
        .mount(&server)
        .await;

    let connector =
        AsyncDomainToolsConnector::new(Some("dt-key".to_string()), mock_options(&server)).unwrap();
    let (status, was_open) = connector
        .scope(|c| {
            Box::pin(async move {
                let response = c
                    .parsed_whois("example.com", RequestOptions::new())
                    .await
                    .unwrap();
                (response.status(), !c.is_closed())
            })
        })
        .await;

    assert_eq!(status, 200);
    assert!(was_open);
}

#[tokio::test]
async fn test_ipqs_async_scope() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/url/"))
        .and(body_string_contains("key=ipqs-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"success\":true}"))
        .expect(1)
        .mount(&server)
        .await;

    let connector =
        AsyncIpqsConnector::new(Some("ipqs-key".to_string()), mock_options(&server)).unwrap();
    let result = connector
        .scope(|c| Box::pin(async move { c.malicious_url("example.com", &[]).await }))
        .await
        .unwrap();

    assert!(result.is_success());
}

#[test]
fn test_connector_debug_hides_env_key() {
    let options = BrokerOptions::builder("")
        .load_env_vars(true)
        .env_source(process_env(&[(DOMAINTOOLS_API_KEY, "ENVSECRET456")]))
        .build();
    let connector = DomainToolsConnector::new(None, options).unwrap();
    assert_eq!(connector.api_key().expose_secret(), "ENVSECRET456");

    let rendered = format!("{connector:?}");
    assert!(!rendered.contains("ENVSECRET456"), "{rendered}");

    let options = BrokerOptions::builder("")
        .load_env_vars(true)
        .env_source(process_env(&[(IPQS_API_KEY, "ENVSECRET789")]))
        .build();
    let connector = AsyncIpqsConnector::new(None, options).unwrap();
    assert!(!format!("{connector:?}").contains("ENVSECRET789"));
}
