// HTTP transport tests
// Drives HttpTransport against a mock server: method mapping, bodies,
// headers, status handling and empty responses.

#![cfg(feature = "http")]

use mockito::Matcher;
use refwire_transport::{FetchOptions, HttpTransport, Method, Transport, TransportError};
use serde_json::json;

#[tokio::test]
async fn test_get_decodes_json() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/user/5")
        .match_header("accept", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"$uri": "/user/5", "first_name": "Ann"}"#)
        .create_async()
        .await;

    let transport = HttpTransport::new_with_url(&server.url()).unwrap();
    let body = transport.fetch("/user/5", FetchOptions::default()).await.unwrap();

    assert_eq!(body, json!({"$uri": "/user/5", "first_name": "Ann"}));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_put_sends_json_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/user/5")
        .match_body(Matcher::Json(json!({"first_name": "Bea"})))
        .match_header("x-request-id", "abc")
        .with_status(200)
        .with_body(r#"{"$uri": "/user/5", "first_name": "Bea"}"#)
        .create_async()
        .await;

    let transport = HttpTransport::new_with_url(&server.url()).unwrap();
    let options = FetchOptions::new(Method::Put)
        .with_data(json!({"first_name": "Bea"}))
        .with_header("x-request-id", "abc");
    let body = transport.fetch("/user/5", options).await.unwrap();

    assert_eq!(body["first_name"], "Bea");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_body_is_null() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/user/5")
        .with_status(204)
        .create_async()
        .await;

    let transport = HttpTransport::new_with_url(&server.url()).unwrap();
    let body = transport
        .fetch("/user/5", FetchOptions::new(Method::Delete))
        .await
        .unwrap();

    assert!(body.is_null());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/user/404")
        .with_status(404)
        .with_body("not found")
        .create_async()
        .await;

    let transport = HttpTransport::new_with_url(&server.url()).unwrap();
    let err = transport
        .fetch("/user/404", FetchOptions::default())
        .await
        .unwrap_err();

    match err {
        TransportError::Http { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_invalid_json_is_decode_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/user/1")
        .with_status(200)
        .with_body("{not json")
        .create_async()
        .await;

    let transport = HttpTransport::new_with_url(&server.url()).unwrap();
    let err = transport
        .fetch("/user/1", FetchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Decode(_)));
}
