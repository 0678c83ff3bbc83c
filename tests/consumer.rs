use hyper::{Body, Client, Request};
use pact_harness::{
    match_response, BodyMatching, Error, Interaction, InteractionRequest, InteractionResponse,
    Method, MockServer, Pact, PactSession, ResponseData, SessionConfiguration, SessionState,
};
use serde_json::json;
use std::{fs, path::PathBuf};

fn artifact_dir(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("pact-harness-{}-{}", label, std::process::id()))
}

fn session_configuration(label: &str) -> SessionConfiguration {
    let mut configuration = SessionConfiguration::new();
    configuration.set_artifact_dir(artifact_dir(label));
    configuration
}

fn projects_interaction() -> Interaction {
    Interaction::new(
        "a request for projects",
        InteractionRequest::new(Method::Get, "/projects").header("Accept", "application/json"),
        InteractionResponse::new(200)
            .header("Content-Type", "application/json")
            .body(json!({ "reply": "hello" })),
    )
    .given("i have a list of projects")
}

async fn issue_get(url: String, accept: Option<&str>) -> (u16, String) {
    let client = Client::new();
    let mut request_builder = Request::builder().method("GET").uri(url);
    if let Some(accept) = accept {
        request_builder = request_builder.header("Accept", accept);
    }

    let response = client
        .request(request_builder.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status().as_u16();
    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();

    (status, String::from_utf8_lossy(&body).into())
}

#[tokio::test]
async fn exercised_interaction_passes_verification() {
    let mut session = PactSession::start(
        "PactUI",
        "Projects Provider",
        61431,
        session_configuration("scenario-a"),
    )
    .unwrap();

    session
        .add_interactions(vec![projects_interaction()])
        .await
        .unwrap();
    assert_eq!(session.state(), SessionState::ReadyForExercise);

    let url = format!("{}/projects", session.server_url());
    let (status, body) = session
        .exercise(|| issue_get(url, Some("application/json")))
        .await;

    assert_eq!(status, 200);
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&body).unwrap(),
        json!({ "reply": "hello" })
    );

    session.verify().unwrap();
    assert_eq!(session.state(), SessionState::Verified);

    let path = session.finalize().unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "pactui-projects_provider.json"
    );

    session.stop();
    fs::remove_dir_all(artifact_dir("scenario-a")).unwrap();
}

#[tokio::test]
async fn wrong_request_fails_verification_but_not_finalize() {
    let mut session = PactSession::start(
        "PactUI",
        "Projects Provider",
        61432,
        session_configuration("scenario-b"),
    )
    .unwrap();

    session
        .add_interactions(vec![projects_interaction()])
        .await
        .unwrap();

    let url = format!("{}/projects2", session.server_url());
    let (status, _) = session
        .exercise(|| issue_get(url, Some("application/json")))
        .await;
    assert_eq!(status, 500);

    match session.verify() {
        Err(Error::UnmetExpectations(report)) => {
            assert_eq!(report.unmatched, vec!["a request for projects".to_string()]);
            assert_eq!(report.unexpected.len(), 1);
            assert_eq!(report.unexpected[0].uri, "/projects2");
        }
        other => panic!("expected unmet expectations, got {:?}", other),
    }

    // A failed verify still flushes whatever was recorded.
    let path = session.finalize().unwrap();
    let pact = Pact::load(&path).unwrap();
    assert_eq!(pact.interactions.len(), 1);

    session.stop();
    fs::remove_dir_all(artifact_dir("scenario-b")).unwrap();
}

#[tokio::test]
async fn finalized_pact_round_trips_and_matches_the_declared_response() {
    let mut session = PactSession::start(
        "PactUI",
        "Projects Provider",
        61433,
        session_configuration("round-trip"),
    )
    .unwrap();

    session
        .add_interactions(vec![projects_interaction()])
        .await
        .unwrap();

    let url = format!("{}/projects", session.server_url());
    session
        .exercise(|| issue_get(url, Some("application/json")))
        .await;
    session.verify().unwrap();

    let path = session.finalize().unwrap();
    let first = fs::read(&path).unwrap();

    // Finalizing twice yields byte-identical artifacts.
    session.finalize().unwrap();
    assert_eq!(fs::read(&path).unwrap(), first);

    let pact = Pact::load(&path).unwrap();
    assert_eq!(pact.consumer.name, "PactUI");
    assert_eq!(pact.provider.name, "Projects Provider");
    assert_eq!(pact.metadata.pact_spec_version, "2.0.0");

    let reloaded = &pact.interactions[0];
    assert_eq!(
        reloaded.state.as_deref(),
        Some("i have a list of projects")
    );

    // A response literally equal to the declared one matches the
    // reloaded expectation.
    let literal = ResponseData {
        status_code: 200,
        headers: [("content-type".to_string(), "application/json".to_string())]
            .iter()
            .cloned()
            .collect(),
        body: r#"{"reply":"hello"}"#.into(),
    };
    assert!(match_response(&reloaded.response, &literal, BodyMatching::Exact).is_empty());

    session.stop();
    fs::remove_dir_all(artifact_dir("round-trip")).unwrap();
}

#[tokio::test]
async fn interactions_cannot_be_added_after_finalize() {
    let mut session = PactSession::start(
        "PactUI",
        "Projects Provider",
        61434,
        session_configuration("terminal"),
    )
    .unwrap();

    session
        .add_interactions(vec![projects_interaction()])
        .await
        .unwrap();
    session.finalize().unwrap();
    assert_eq!(session.state(), SessionState::Finalized);

    match session.add_interactions(vec![projects_interaction()]).await {
        Err(Error::SessionFinalized) => {}
        other => panic!("expected SessionFinalized, got {:?}", other),
    }

    session.stop();
    fs::remove_dir_all(artifact_dir("terminal")).unwrap();
}

#[tokio::test]
async fn a_port_is_owned_by_one_server_at_a_time() {
    let first = MockServer::start(61435).unwrap();

    match MockServer::start(61435) {
        Err(Error::ServerStart(_)) => {}
        other => panic!("expected ServerStart, got {:?}", other),
    }

    drop(first);
}

#[tokio::test]
async fn malformed_interactions_are_rejected_at_registration() {
    let mut session = PactSession::start(
        "PactUI",
        "Projects Provider",
        61437,
        session_configuration("registration"),
    )
    .unwrap();

    let malformed = Interaction::new(
        "an impossible response",
        InteractionRequest::new(Method::Get, "/projects"),
        InteractionResponse::new(700),
    );

    match session.add_interactions(vec![malformed]).await {
        Err(Error::Registration(reason)) => assert!(reason.contains("700")),
        other => panic!("expected Registration, got {:?}", other),
    }

    session.stop();
}

#[tokio::test]
async fn verify_is_idempotent() {
    let mut session = PactSession::start(
        "PactUI",
        "Projects Provider",
        61436,
        session_configuration("idempotent-verify"),
    )
    .unwrap();

    session
        .add_interactions(vec![projects_interaction()])
        .await
        .unwrap();

    let url = format!("{}/projects", session.server_url());
    session
        .exercise(|| issue_get(url, Some("application/json")))
        .await;

    session.verify().unwrap();
    session.verify().unwrap();

    session.stop();
}
