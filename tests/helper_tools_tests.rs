use rmcp::service::ServiceExt;
use serde_json::{json, Value};
use std::io::Write;

use wield::helpers::HelperTools;
use wield::mcp::{McpConnection, ToolServer};
use wield::model::{FailureKind, ToolOutcome};
use wield::options::SessionLimits;
use wield::registry::ToolRegistry;

/// Serve the helper tools over an in-process duplex transport and hand
/// back a session registry connected to them.
async fn helper_registry() -> ToolRegistry {
    let (client_transport, server_transport) = tokio::io::duplex(1024);
    let handler = HelperTools::new();
    tokio::spawn(async move {
        let service = handler
            .serve(server_transport)
            .await
            .expect("helper server should start");
        service.waiting().await.expect("helper server error");
    });
    let service = ().serve(client_transport).await.expect("client connect");

    let servers: Vec<(String, Box<dyn ToolServer>)> = vec![(
        "helpers".to_string(),
        Box::new(McpConnection::from_service(service)),
    )];
    ToolRegistry::from_servers(servers, SessionLimits::default())
        .await
        .expect("registry should start")
}

#[tokio::test]
async fn test_helper_catalog_declares_required_arguments() {
    let mut registry = helper_registry().await;

    let read = registry
        .catalog()
        .iter()
        .find(|t| t.name == "read_file_content")
        .expect("read_file_content should be advertised");
    let required = read
        .input_schema
        .get("required")
        .and_then(Value::as_array)
        .expect("schema should declare required properties");
    assert!(required.contains(&json!("file_path")));

    let fetch = registry
        .catalog()
        .iter()
        .find(|t| t.name == "fetch_url_content_async")
        .expect("fetch_url_content_async should be advertised");
    let required = fetch
        .input_schema
        .get("required")
        .and_then(Value::as_array)
        .expect("schema should declare required properties");
    assert!(required.contains(&json!("url")));

    registry.end_session().await;
}

#[tokio::test]
async fn test_read_file_content_returns_file_text() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "three rings for the elven kings").unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let mut registry = helper_registry().await;
    let outcome = registry
        .invoke("read_file_content", &json!({ "file_path": path }))
        .await;

    match outcome {
        ToolOutcome::Success(payload) => {
            assert_eq!(payload["response"], "three rings for the elven kings");
        }
        ToolOutcome::Failure(failure) => panic!("expected success, got {}", failure),
    }

    registry.end_session().await;
}

#[tokio::test]
async fn test_read_file_content_missing_file_fails_execution() {
    let mut registry = helper_registry().await;
    let outcome = registry
        .invoke(
            "read_file_content",
            &json!({ "file_path": "/no/such/file-for-this-test.txt" }),
        )
        .await;

    match outcome {
        ToolOutcome::Failure(failure) => {
            assert_eq!(failure.kind, FailureKind::ExecutionFailed);
            assert!(!failure.message.is_empty());
        }
        ToolOutcome::Success(payload) => panic!("expected failure, got {}", payload),
    }

    registry.end_session().await;
}

#[tokio::test]
async fn test_read_file_content_rejects_unknown_encoding() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "plain text").unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let mut registry = helper_registry().await;
    let outcome = registry
        .invoke(
            "read_file_content",
            &json!({ "file_path": path, "encoding": "latin-1" }),
        )
        .await;

    match outcome {
        ToolOutcome::Failure(failure) => assert_eq!(failure.kind, FailureKind::ExecutionFailed),
        ToolOutcome::Success(payload) => panic!("expected failure, got {}", payload),
    }

    registry.end_session().await;
}

#[tokio::test]
async fn test_fetch_url_content_async_rejects_malformed_url() {
    let mut registry = helper_registry().await;
    let outcome = registry
        .invoke("fetch_url_content_async", &json!({ "url": "not a url" }))
        .await;

    match outcome {
        ToolOutcome::Failure(failure) => assert_eq!(failure.kind, FailureKind::ExecutionFailed),
        ToolOutcome::Success(payload) => panic!("expected failure, got {}", payload),
    }

    registry.end_session().await;
}

#[tokio::test]
async fn test_missing_required_argument_rejected_locally() {
    let mut registry = helper_registry().await;
    let outcome = registry.invoke("read_file_content", &json!({})).await;

    match outcome {
        ToolOutcome::Failure(failure) => {
            assert_eq!(failure.kind, FailureKind::InvalidArguments);
            assert!(failure.message.contains("file_path"));
        }
        ToolOutcome::Success(payload) => panic!("expected failure, got {}", payload),
    }

    registry.end_session().await;
}
