//! Integration tests for the Kaggle API client.
//!
//! These tests run the client against a mock HTTP server.

use kernel_archiver::api::{KernelMetadata, METADATA_FILE_NAME};
use kernel_archiver::{ApiError, Credentials, KaggleClient, KernelApi, ListQuery};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{basic_auth, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> KaggleClient {
    let base = format!("{}/api/v1", server.uri());
    KaggleClient::with_base_url(Credentials::new("alice", "secret"), &base)
        .expect("client should build")
}

#[tokio::test]
async fn test_list_kernels_sends_query_and_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/kernels/list"))
        .and(query_param("page", "2"))
        .and(query_param("pageSize", "50"))
        .and(query_param("user", "bob"))
        .and(query_param("sortBy", "dateRun"))
        .and(query_param("group", "profile"))
        .and(basic_auth("alice", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 7, "ref": "bob/eda", "title": "EDA", "author": "bob", "isPrivateNullable": false},
            {"id": 8, "ref": "bob/draft", "title": "Draft", "isPrivate": true},
            {"id": 9, "ref": "bob/unknown", "title": "Unknown"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let kernels = client
        .list_kernels(&ListQuery::new("bob", 2, 50))
        .await
        .expect("listing should succeed");

    assert_eq!(kernels.len(), 3);
    assert_eq!(kernels[0].kernel_ref, "bob/eda");
    assert_eq!(kernels[0].author.as_deref(), Some("bob"));
    assert_eq!(kernels[0].private, Some(false));
    assert!(!kernels[0].is_private());
    assert!(kernels[1].is_private());
    assert_eq!(kernels[2].private, None);
    assert!(kernels[2].is_private(), "unknown privacy counts as private");
}

#[tokio::test]
async fn test_authenticated_user_is_credentials_username() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    assert_eq!(client.authenticated_user(), "alice");
}

#[tokio::test]
async fn test_list_kernels_unauthorized_maps_to_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/kernels/list"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let error = client
        .list_kernels(&ListQuery::new("alice", 1, 100))
        .await
        .expect_err("401 should fail");

    assert!(error.is_unauthorized());
    assert!(matches!(error, ApiError::Unauthorized { status: 401, .. }));
    assert!(error.to_string().contains("[AUTH]"));
}

#[tokio::test]
async fn test_list_kernels_server_error_maps_to_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/kernels/list"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let error = client
        .list_kernels(&ListQuery::new("alice", 1, 100))
        .await
        .expect_err("500 should fail");

    assert!(!error.is_unauthorized());
    assert!(matches!(error, ApiError::HttpStatus { status: 500, .. }));
}

#[tokio::test]
async fn test_list_kernels_malformed_body_maps_to_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/kernels/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let error = client
        .list_kernels(&ListQuery::new("alice", 1, 100))
        .await
        .expect_err("HTML body should fail");

    assert!(matches!(error, ApiError::Decode { .. }));
}

#[tokio::test]
async fn test_pull_kernel_writes_source_and_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/kernels/pull"))
        .and(query_param("userName", "alice"))
        .and(query_param("kernelSlug", "titanic-eda"))
        .and(basic_auth("alice", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metadata": {
                "id": 42,
                "ref": "alice/titanic-eda",
                "title": "Titanic EDA",
                "language": "python",
                "kernelType": "notebook",
                "isPrivate": false,
                "enableGpu": true,
                "datasetDataSources": ["heptapod/titanic"]
            },
            "blob": {
                "source": "{\"cells\": []}",
                "language": "python",
                "kernelType": "notebook",
                "slug": "titanic-eda"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dest = TempDir::new().expect("failed to create temp dir");
    let client = client_for(&server);
    let source = client
        .pull_kernel("alice/titanic-eda", dest.path())
        .await
        .expect("pull should succeed");

    assert_eq!(source, dest.path().join("titanic-eda.ipynb"));
    assert_eq!(
        std::fs::read_to_string(&source).unwrap(),
        "{\"cells\": []}"
    );

    let raw = std::fs::read_to_string(dest.path().join(METADATA_FILE_NAME)).unwrap();
    let metadata: KernelMetadata = serde_json::from_str(&raw).unwrap();
    assert_eq!(metadata.id, "alice/titanic-eda");
    assert_eq!(metadata.id_no, 42);
    assert_eq!(metadata.code_file, "titanic-eda.ipynb");
    assert_eq!(metadata.is_private, Some(false));
    assert!(metadata.enable_gpu);
    assert_eq!(metadata.dataset_sources, vec!["heptapod/titanic"]);
}

#[tokio::test]
async fn test_pull_kernel_script_gets_script_extension() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/kernels/pull"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metadata": {"id": 3, "ref": "alice/model", "title": "Model", "language": "r", "kernelType": "script"},
            "blob": {"source": "print(1)"}
        })))
        .mount(&server)
        .await;

    let dest = TempDir::new().expect("failed to create temp dir");
    let client = client_for(&server);
    let source = client
        .pull_kernel("alice/model", dest.path())
        .await
        .expect("pull should succeed");

    assert_eq!(source, dest.path().join("model.R"));
    let raw = std::fs::read_to_string(dest.path().join(METADATA_FILE_NAME)).unwrap();
    let metadata: KernelMetadata = serde_json::from_str(&raw).unwrap();
    assert_eq!(metadata.is_private, None);
    assert!(metadata.is_private(), "missing flag counts as private");
}

#[tokio::test]
async fn test_pull_kernel_not_found_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/kernels/pull"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dest = TempDir::new().expect("failed to create temp dir");
    let client = client_for(&server);
    let error = client
        .pull_kernel("alice/gone", dest.path())
        .await
        .expect_err("404 should fail");

    assert!(matches!(error, ApiError::HttpStatus { status: 404, .. }));
    assert_eq!(std::fs::read_dir(dest.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_pull_kernel_rejects_malformed_ref_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dest = TempDir::new().expect("failed to create temp dir");
    let client = client_for(&server);
    let error = client
        .pull_kernel("no-slash", dest.path())
        .await
        .expect_err("bad ref should fail");

    assert!(matches!(error, ApiError::InvalidRef { .. }));
}
