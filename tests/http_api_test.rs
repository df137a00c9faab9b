//! HTTP control API implementation against a mock server

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dataflow_sync::{
    ControlApi, ControlApiConfig, Credential, CredentialsInput, DesiredAction, HttpControlApi,
    PollOutcome, PollPolicy, ResourceRef, SyncError, Synchronizer, WatchSpec,
};

fn api_for(server: &MockServer) -> HttpControlApi {
    HttpControlApi::new(ControlApiConfig {
        base_url: server.uri(),
        ..Default::default()
    })
    .unwrap()
}

fn credentials() -> CredentialsInput {
    CredentialsInput {
        username: "operator".into(),
        password: "secret".into(),
    }
}

fn state_body(value: &str) -> serde_json::Value {
    json!({
        "componentState": {
            "componentId": "proc-1",
            "localState": {
                "scope": "LOCAL",
                "state": [{"key": "last_tms", "value": value}]
            }
        }
    })
}

fn processor_body(run_state: &str, version: i64) -> serde_json::Value {
    json!({
        "revision": {"clientId": "client-1", "version": version},
        "id": "proc-1",
        "component": {"id": "proc-1", "state": run_state}
    })
}

#[tokio::test]
async fn acquires_token_from_form_post() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/access/token"))
        .and(body_string_contains("username=operator"))
        .and(body_string_contains("password=secret"))
        .respond_with(ResponseTemplate::new(201).set_body_string("jwt-token-value\n"))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let credential = api.acquire_token(&credentials()).await.unwrap();
    assert_eq!(credential.token(), "jwt-token-value");
}

#[tokio::test]
async fn rejected_login_is_an_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/access/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let result = api.acquire_token(&credentials()).await;
    assert!(matches!(result, Err(SyncError::Auth(_))));
}

#[tokio::test]
async fn reads_state_with_bearer_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/processors/proc-1/state"))
        .and(header("Authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(state_body("100")))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let credential = Credential::new("tok", None);
    let state = api
        .read_state(&ResourceRef::new("proc-1"), &credential)
        .await
        .unwrap();

    assert_eq!(state.get("last_tms"), Some("100"));
}

#[tokio::test]
async fn expired_token_on_read_is_auth_not_transport() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/processors/proc-1/state"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let credential = Credential::new("stale", None);
    let result = api.read_state(&ResourceRef::new("proc-1"), &credential).await;
    assert!(matches!(result, Err(SyncError::Auth(_))));
}

#[tokio::test]
async fn unknown_processor_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/processors/missing/state"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let credential = Credential::new("tok", None);
    let result = api.read_state(&ResourceRef::new("missing"), &credential).await;

    match result {
        Err(SyncError::NotFound(id)) => assert_eq!(id, "missing"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn apply_action_submits_current_revision() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/processors/proc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(processor_body("STOPPED", 3)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/processors/proc-1/run-status"))
        .and(body_string_contains("\"state\":\"RUNNING\""))
        .and(body_string_contains("\"version\":3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(processor_body("RUNNING", 4)))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let credential = Credential::new("tok", None);
    let ack = api
        .apply_action(&ResourceRef::new("proc-1"), DesiredAction::Run, &credential)
        .await
        .unwrap();

    assert_eq!(ack.run_status, "RUNNING");
    assert_eq!(ack.revision_version, 4);
}

#[tokio::test]
async fn rejected_run_state_change_is_a_conflict() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/processors/proc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(processor_body("RUNNING", 3)))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/processors/proc-1/run-status"))
        .respond_with(
            ResponseTemplate::new(409).set_body_string("processor is already running"),
        )
        .mount(&server)
        .await;

    let api = api_for(&server);
    let credential = Credential::new("tok", None);
    let result = api
        .apply_action(&ResourceRef::new("proc-1"), DesiredAction::Run, &credential)
        .await;

    assert!(matches!(result, Err(SyncError::Conflict(_))));
}

#[tokio::test]
async fn full_sequence_converges_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/access/token"))
        .respond_with(ResponseTemplate::new(201).set_body_string("jwt"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/processors/proc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(processor_body("STOPPED", 1)))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/processors/proc-1/run-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(processor_body("RUNNING", 2)))
        .mount(&server)
        .await;

    // baseline read plus two unchanged polls, then the update appears
    Mock::given(method("GET"))
        .and(path("/processors/proc-1/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(state_body("100")))
        .up_to_n_times(3)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/processors/proc-1/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(state_body("105")))
        .mount(&server)
        .await;

    let sync = Synchronizer::over_http(
        ControlApiConfig {
            base_url: server.uri(),
            ..Default::default()
        },
        credentials(),
    )
    .unwrap();

    let policy = PollPolicy {
        poll_interval: std::time::Duration::from_millis(5),
        max_attempts: 10,
        ..Default::default()
    };

    let outcome = sync
        .trigger_and_converge(
            &ResourceRef::new("proc-1"),
            &WatchSpec::new("last_tms"),
            DesiredAction::Run,
            &policy,
            &tokio_util::sync::CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        outcome,
        PollOutcome::Converged {
            value: "105".into(),
            attempts: 3,
        }
    );
}
