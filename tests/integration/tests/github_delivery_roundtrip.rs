//! Delivery engine over the GitHub REST client, against a mocked API.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use herald_issues::{
    compute_fingerprint, AuthenticatedIdentity, DeliveryEngine, DeliveryError, DeliveryOptions,
    DeliveryReceipt, RepoRef,
};
use herald_issues_runtime::{
    EventPayloadRepoContext, GithubApiClient, GithubApiClientConfig, IdentityMode,
};
use httpmock::prelude::*;
use serde_json::json;
use tempfile::tempdir;

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-15T12:00:00Z")
        .expect("timestamp")
        .with_timezone(&Utc)
}

fn github_client(base_url: &str, identity_mode: IdentityMode) -> Arc<GithubApiClient> {
    let mut config = GithubApiClientConfig::new("test-token", identity_mode);
    config.api_base = base_url.to_string();
    config.request_timeout_ms = 3_000;
    config.retry_max_attempts = 2;
    config.retry_base_delay_ms = 5;
    Arc::new(GithubApiClient::new(config).expect("client"))
}

fn engine_for(server: &MockServer) -> DeliveryEngine {
    let client = github_client(&server.base_url(), IdentityMode::App);
    DeliveryEngine::new(
        client.clone(),
        Arc::new(RepoRef::new("owner", "repo")),
        client,
    )
}

fn mock_app_identity(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET).path("/app");
        then.status(200).json_body(json!({
            "id": 1,
            "slug": "herald",
            "name": "Herald",
            "html_url": "https://github.com/apps/herald"
        }));
    })
}

fn marked(message: &str) -> String {
    format!("{message}\n<!--{}-->", compute_fingerprint(message))
}

#[tokio::test]
async fn integration_empty_tracker_creates_marked_thread() {
    let server = MockServer::start();
    let app = mock_app_identity(&server);
    let list = server.mock(|when, then| {
        when.method(GET)
            .path("/repos/owner/repo/issues")
            .query_param("state", "open")
            .query_param("creator", "app/herald")
            .query_param("per_page", "100");
        then.status(200).json_body(json!([]));
    });
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/owner/repo/issues")
            .json_body(json!({"title": "Report", "body": marked("Something failed")}));
        then.status(201).json_body(json!({
            "id": 501,
            "number": 17,
            "html_url": "https://github.com/owner/repo/issues/17"
        }));
    });

    let receipt = engine_for(&server)
        .deliver_at("Report", "Something failed", &DeliveryOptions::default(), now())
        .await
        .expect("deliver");

    assert_eq!(
        receipt,
        DeliveryReceipt {
            owner: "owner".to_string(),
            repo: "repo".to_string(),
            thread_number: 17,
            note_id: None,
            is_new: true,
            html_url: Some("https://github.com/owner/repo/issues/17".to_string()),
        }
    );
    app.assert_calls(1);
    list.assert_calls(1);
    create.assert_calls(1);
}

#[tokio::test]
async fn integration_stale_matching_thread_receives_substituted_note() {
    let server = MockServer::start();
    let _app = mock_app_identity(&server);
    let _list = server.mock(|when, then| {
        when.method(GET).path("/repos/owner/repo/issues");
        then.status(200).json_body(json!([
            {
                "number": 3,
                "title": "Other",
                "body": marked("Unrelated"),
                "locked": false,
                "state": "open",
                "updated_at": "2026-01-01T00:00:00Z"
            },
            {
                "number": 4,
                "title": "Report",
                "html_url": "https://github.com/owner/repo/issues/4",
                "body": format!("{}\n\nTriage notes added later.", marked("Something failed")),
                "locked": false,
                "state": "open",
                "updated_at": "2026-03-08T12:00:00Z"
            }
        ]));
    });
    let comment = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/owner/repo/issues/4/comments")
            .json_body(json!({
                "body": "Still failing. Sent by Herald (https://github.com/apps/herald)"
            }));
        then.status(201).json_body(json!({"id": 9_001}));
    });
    let create = server.mock(|when, then| {
        when.method(POST).path("/repos/owner/repo/issues");
        then.status(201).json_body(json!({"number": 99}));
    });

    let options = DeliveryOptions {
        update: "Still failing. Sent by {appName} ({appUrl})".to_string(),
        ..DeliveryOptions::default()
    };
    let receipt = engine_for(&server)
        .deliver_at("Report", "Something failed", &options, now())
        .await
        .expect("deliver");

    assert_eq!(receipt.thread_number, 4);
    assert_eq!(receipt.note_id, Some(9_001));
    assert_eq!(
        receipt.html_url.as_deref(),
        Some("https://github.com/owner/repo/issues/4")
    );
    assert!(!receipt.is_new);
    comment.assert_calls(1);
    create.assert_calls(0);
}

#[tokio::test]
async fn integration_fresh_or_locked_thread_is_reused_without_note() {
    let server = MockServer::start();
    let _app = mock_app_identity(&server);
    let _list = server.mock(|when, then| {
        when.method(GET).path("/repos/owner/repo/issues");
        then.status(200).json_body(json!([
            {
                "number": 8,
                "body": marked("Fresh failure"),
                "locked": false,
                "updated_at": "2026-03-09T12:00:01Z"
            },
            {
                "number": 9,
                "body": marked("Locked failure"),
                "locked": true,
                "updated_at": "2025-01-01T00:00:00Z"
            }
        ]));
    });
    let fresh_comment = server.mock(|when, then| {
        when.method(POST).path("/repos/owner/repo/issues/8/comments");
        then.status(201).json_body(json!({"id": 1}));
    });
    let locked_comment = server.mock(|when, then| {
        when.method(POST).path("/repos/owner/repo/issues/9/comments");
        then.status(201).json_body(json!({"id": 2}));
    });

    let engine = engine_for(&server);
    let options = DeliveryOptions {
        update: "ping".to_string(),
        ..DeliveryOptions::default()
    };
    let fresh = engine
        .deliver_at("Report", "Fresh failure", &options, now())
        .await
        .expect("fresh");
    assert_eq!((fresh.thread_number, fresh.note_id), (8, None));

    let locked = engine
        .deliver_at("Report", "Locked failure", &options, now())
        .await
        .expect("locked");
    assert_eq!((locked.thread_number, locked.note_id), (9, None));
    fresh_comment.assert_calls(0);
    locked_comment.assert_calls(0);
}

#[tokio::test]
async fn integration_list_failure_surfaces_as_transport_error() {
    let server = MockServer::start();
    let _app = mock_app_identity(&server);
    let list = server.mock(|when, then| {
        when.method(GET).path("/repos/owner/repo/issues");
        then.status(404).body("{\"message\":\"Not Found\"}");
    });

    let error = engine_for(&server)
        .deliver_at("Report", "Something failed", &DeliveryOptions::default(), now())
        .await
        .expect_err("missing repository");
    assert!(matches!(error, DeliveryError::Transport(_)));
    assert!(error
        .to_string()
        .contains("github api list issues failed with status 404"));
    list.assert_calls(1);
}

#[tokio::test]
async fn integration_default_repo_comes_from_event_payload() {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET)
            .path("/repos/octo/widgets/issues")
            .query_param("creator", "app/static");
        then.status(200).json_body(json!([]));
    });
    let create = server.mock(|when, then| {
        when.method(POST).path("/repos/octo/widgets/issues");
        then.status(201).json_body(json!({"number": 1}));
    });

    let temp = tempdir().expect("tempdir");
    let event_path = temp.path().join("event.json");
    std::fs::write(
        &event_path,
        json!({
            "action": "created",
            "repository": {"name": "widgets", "owner": {"login": "octo"}}
        })
        .to_string(),
    )
    .expect("write event");

    let client = github_client(
        &server.base_url(),
        IdentityMode::Static(AuthenticatedIdentity {
            name: "Static".to_string(),
            url: "https://example.test/static".to_string(),
            creator: "app/static".to_string(),
        }),
    );
    let engine = DeliveryEngine::new(
        client.clone(),
        Arc::new(EventPayloadRepoContext::new(event_path)),
        client,
    );
    let partial_override = DeliveryOptions {
        owner: Some("ignored".to_string()),
        ..DeliveryOptions::default()
    };
    let receipt = engine
        .deliver_at("Report", "Something failed", &partial_override, now())
        .await
        .expect("deliver");
    assert_eq!(receipt.owner, "octo");
    assert_eq!(receipt.repo, "widgets");
    list.assert_calls(1);
    create.assert_calls(1);
}

#[tokio::test]
async fn regression_create_server_error_makes_a_single_create_request() {
    let server = MockServer::start();
    let _app = mock_app_identity(&server);
    let list = server.mock(|when, then| {
        when.method(GET).path("/repos/owner/repo/issues");
        then.status(200).json_body(json!([]));
    });
    let create = server.mock(|when, then| {
        when.method(POST).path("/repos/owner/repo/issues");
        then.status(502).body("bad gateway");
    });

    let error = engine_for(&server)
        .deliver_at("Report", "Something failed", &DeliveryOptions::default(), now())
        .await
        .expect_err("create failure");
    assert!(matches!(error, DeliveryError::Transport(_)));
    list.assert_calls(1);
    create.assert_calls(1);
}
