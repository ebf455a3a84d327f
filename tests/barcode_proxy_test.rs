//! Barcode lookup proxy against a mock upstream.

use fabtrack_api::{errors::ServiceError, services::barcode::BarcodeLookupService};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn forwards_upstream_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/4006381333931"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": "4006381333931",
            "name": "Stabilo Boss Highlighter",
        })))
        .mount(&server)
        .await;

    let service = BarcodeLookupService::new(Some(server.uri()));
    let body = service.lookup("4006381333931").await.unwrap();

    assert_eq!(body["name"], "Stabilo Boss Highlighter");
}

#[tokio::test]
async fn upstream_failure_maps_to_external_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let service = BarcodeLookupService::new(Some(server.uri()));
    let err = service.lookup("0000000000000").await.unwrap_err();

    assert!(matches!(err, ServiceError::ExternalServiceError(_)));
}

#[tokio::test]
async fn upstream_non_json_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let service = BarcodeLookupService::new(Some(server.uri()));
    let err = service.lookup("1234567890123").await.unwrap_err();

    assert!(matches!(err, ServiceError::ExternalServiceError(_)));
}
