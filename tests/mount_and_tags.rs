mod common;

use common::{MockResponse, MockTransport, REPOSITORY, client, endpoint, path_of};
use registry_transfer::digest::Digest;
use registry_transfer::error::RegistryError;
use reqwest::Method;

#[tokio::test]
async fn test_mount_created() {
    let transport = MockTransport::new(vec![MockResponse::new(201)]);
    let client = client(transport.clone());
    let digest = Digest::compute(b"shared layer");

    client.mount_blob(&digest, "team/base").await.unwrap();

    let request = &transport.requests()[0];
    assert_eq!(request.method, Method::POST);
    assert_eq!(path_of(request), endpoint("blobs/uploads"));
    assert_eq!(request.query("mount"), Some(digest.to_string()));
    assert_eq!(request.query("from"), Some("team/base".to_string()));
    assert!(request.body.is_empty());
}

#[tokio::test]
async fn test_mount_accepted_is_reported_as_failure() {
    let transport = MockTransport::new(vec![
        MockResponse::new(202).header("Docker-Upload-Uuid", "fallback-session"),
    ]);
    let client = client(transport.clone());
    let digest = Digest::compute(b"shared layer");

    match client.mount_blob(&digest, "team/base").await.unwrap_err() {
        RegistryError::Mount {
            digest: failed,
            source_repository,
            destination_repository,
            status,
        } => {
            assert_eq!(failed, digest.to_string());
            assert_eq!(source_repository, "team/base");
            assert_eq!(destination_repository, REPOSITORY);
            assert_eq!(status, 202);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_mount_requires_source() {
    let transport = MockTransport::new(vec![]);
    let client = client(transport.clone());

    let err = client
        .mount_blob(&Digest::empty(), "")
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Validation(_)));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_list_tags() {
    let transport = MockTransport::new(vec![
        MockResponse::new(200).body(br#"{"name":"team/app","tags":["v1","latest"]}"#),
    ]);
    let client = client(transport.clone());

    let tags = client.list_tags().await.unwrap();

    assert_eq!(tags.name, "team/app");
    assert_eq!(tags.tags, vec!["v1", "latest"]);
    assert_eq!(transport.requests()[0].url.as_str(), endpoint("tags/list"));
}

#[tokio::test]
async fn test_list_tags_null() {
    let transport =
        MockTransport::new(vec![MockResponse::new(200).body(br#"{"name":"team/app","tags":null}"#)]);
    let client = client(transport);

    assert!(client.list_tags().await.unwrap().tags.is_empty());
}

#[tokio::test]
async fn test_list_tags_unknown_repository() {
    let transport = MockTransport::new(vec![MockResponse::new(404).body(b"NAME_UNKNOWN")]);
    let client = client(transport);

    let err = client.list_tags().await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_mount_created_with_unreadable_body() {
    let transport = MockTransport::new(vec![
        MockResponse::new(201).broken_body("connection reset"),
    ]);
    let client = client(transport);

    client
        .mount_blob(&Digest::compute(b"shared layer"), "team/base")
        .await
        .unwrap();
}
