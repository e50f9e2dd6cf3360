mod common;

use common::{MockResponse, MockTransport, client, endpoint};
use futures::StreamExt;
use registry_transfer::digest::Digest;
use registry_transfer::error::RegistryError;
use registry_transfer::image::manifest::{DOCKER_LAYER_TAR_GZIP, Layer};
use registry_transfer::registry::RegistryClient;
use registry_transfer::registry::auth::StaticAuth;
use registry_transfer::registry::operations::{BlobContent, FetchMode};
use reqwest::Method;
use std::sync::Arc;

fn blob() -> Digest {
    Digest::compute(b"OK")
}

#[tokio::test]
async fn test_exists_maps_statuses() {
    for (status, expected) in [(200, true), (404, false), (500, false), (401, false)] {
        let transport = MockTransport::new(vec![MockResponse::new(status)]);
        let client = client(transport.clone());

        assert_eq!(client.blob_exists(&blob()).await.unwrap(), expected, "status {}", status);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::HEAD);
        assert_eq!(requests[0].url.as_str(), endpoint(&format!("blobs/{}", blob())));
    }
}

#[tokio::test]
async fn test_exists_propagates_transport_failure() {
    let transport = MockTransport::new(vec![MockResponse::transport_error("dns failure")]);
    let client = client(transport);

    let err = client.blob_exists(&blob()).await.unwrap_err();
    assert!(matches!(err, RegistryError::Transport(_)));
}

#[tokio::test]
async fn test_fetch_follows_redirects_and_drains_bodies() {
    let transport = MockTransport::new(vec![
        MockResponse::redirect("https://cdn.example.com/blobs/one"),
        MockResponse::redirect("/blobs/two?signature=xyz"),
        MockResponse::new(200).body(b"OK"),
    ]);
    let client = RegistryClient::builder(common::location())
        .with_transport(transport.clone())
        .with_auth(Arc::new(StaticAuth::bearer("secret")))
        .with_logger(registry_transfer::Logger::new_quiet())
        .build()
        .unwrap();

    let bytes = client
        .fetch_blob(&blob(), FetchMode::Buffered)
        .await
        .unwrap()
        .into_bytes()
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"OK");

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1].url.as_str(), "https://cdn.example.com/blobs/one");
    assert_eq!(
        requests[2].url.as_str(),
        "https://cdn.example.com/blobs/two?signature=xyz"
    );

    assert_eq!(requests[0].header("authorization"), Some("Bearer secret"));
    assert_eq!(requests[1].header("authorization"), None);
    assert_eq!(requests[2].header("authorization"), None);

    assert!(transport.body_consumed(0));
    assert!(transport.body_consumed(1));
}

#[tokio::test]
async fn test_fetch_accepts_four_redirects() {
    let mut script: Vec<MockResponse> = (1..=4)
        .map(|n| MockResponse::redirect(&format!("https://mirror.test/hop/{}", n)))
        .collect();
    script.push(MockResponse::new(200).body(b"payload"));
    let transport = MockTransport::new(script);
    let client = client(transport.clone());

    let bytes = client.blob_reader().fetch_bytes(&blob()).await.unwrap();

    assert_eq!(&bytes[..], b"payload");
    assert_eq!(transport.request_count(), 5);
}

#[tokio::test]
async fn test_fetch_gives_up_after_five_redirects() {
    let script: Vec<MockResponse> = (1..=6)
        .map(|n| MockResponse::redirect(&format!("https://mirror.test/hop/{}", n)))
        .collect();
    let transport = MockTransport::new(script);
    let client = client(transport.clone());

    let err = client.blob_reader().fetch_bytes(&blob()).await.unwrap_err();

    match err {
        RegistryError::RedirectLoop { last_url } => {
            assert_eq!(last_url, "https://mirror.test/hop/4");
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(transport.request_count(), 5);
}

#[tokio::test]
async fn test_fetch_reports_terminal_status() {
    let transport = MockTransport::new(vec![
        MockResponse::redirect("https://cdn.example.com/expired"),
        MockResponse::new(404).body(b"BLOB_UNKNOWN"),
    ]);
    let client = client(transport);

    match client.blob_reader().fetch_bytes(&blob()).await.unwrap_err() {
        RegistryError::UnexpectedStatus { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "BLOB_UNKNOWN");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_streaming_fetch_defers_body() {
    let transport = MockTransport::new(vec![MockResponse::new(200).body(b"lazy body")]);
    let client = client(transport.clone());

    let mut stream = client.fetch_blob_stream(&blob()).await.unwrap();
    assert!(!transport.body_consumed(0));
    assert_eq!(stream.source().as_str(), endpoint(&format!("blobs/{}", blob())));

    let mut received = Vec::new();
    while let Some(chunk) = stream.next().await {
        received.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(received, b"lazy body");
    assert!(transport.body_consumed(0));
}

#[tokio::test]
async fn test_streaming_mode_returns_stream_variant() {
    let transport = MockTransport::new(vec![MockResponse::new(200).body(b"abc")]);
    let client = client(transport);

    let content = client.fetch_blob(&blob(), FetchMode::Streaming).await.unwrap();
    assert!(matches!(content, BlobContent::Streaming(_)));
    assert_eq!(&content.into_bytes().await.unwrap()[..], b"abc");
}

#[tokio::test]
async fn test_fetch_verified_rejects_wrong_content() {
    let transport = MockTransport::new(vec![MockResponse::new(200).body(b"tampered")]);
    let client = client(transport);

    let err = client.blob_reader().fetch_verified(&blob()).await.unwrap_err();
    match err {
        RegistryError::DigestMismatch { expected, actual } => {
            assert_eq!(expected, blob().to_string());
            assert_eq!(actual, Digest::compute(b"tampered").to_string());
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_layer_falls_back_to_alternate_urls() {
    let transport = MockTransport::new(vec![
        MockResponse::new(404),
        MockResponse::new(503),
        MockResponse::new(200).body(b"OK"),
    ]);
    let client = client(transport.clone());
    let layer = Layer {
        media_type: DOCKER_LAYER_TAR_GZIP.to_string(),
        size: 2,
        digest: blob(),
        urls: Some(vec![
            "ftp://unsupported.test/layer".to_string(),
            "https://foreign-a.test/layer".to_string(),
            "https://foreign-b.test/layer".to_string(),
        ]),
    };

    let bytes = client
        .fetch_layer(&layer, FetchMode::Buffered)
        .await
        .unwrap()
        .into_bytes()
        .await
        .unwrap();

    assert_eq!(&bytes[..], b"OK");
    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1].url.as_str(), "https://foreign-a.test/layer");
    assert_eq!(requests[2].url.as_str(), "https://foreign-b.test/layer");
}

#[tokio::test]
async fn test_fetch_layer_without_urls_keeps_registry_error() {
    let transport = MockTransport::new(vec![MockResponse::new(404)]);
    let client = client(transport.clone());
    let layer = Layer {
        media_type: DOCKER_LAYER_TAR_GZIP.to_string(),
        size: 2,
        digest: blob(),
        urls: None,
    };

    let err = client
        .fetch_layer(&layer, FetchMode::Buffered)
        .await
        .err()
        .unwrap();
    assert_eq!(err.status(), Some(404));
    assert_eq!(transport.request_count(), 1);
}
