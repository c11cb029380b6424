use crate::common::fake_users_api::FakeBehaviour;
use crate::common::{spawn_fake_api, spawn_fake_api_with};
use users_contract::contract::ContractViolation;
use users_contract::scenario::{CREATE_BLANK_USER, CREATE_VALID_USER, CaseFailure};
use users_contract::users_client::ClientError;

#[tokio::test]
async fn a_failed_creation_fails_every_later_case() {
    // Arrange
    let api = spawn_fake_api().await;
    let scenario = api.scenario_with_token("not-the-token");

    // Act
    let report = scenario.run().await;

    // Assert
    assert_eq!(report.passed_count(), 0);
    assert!(matches!(
        report.outcome(CREATE_VALID_USER).unwrap().result,
        Err(CaseFailure::Contract(ContractViolation::CodeMismatch {
            expected: 201,
            actual: 401
        }))
    ));
    assert!(matches!(
        report.outcome(CREATE_BLANK_USER).unwrap().result,
        Err(CaseFailure::Contract(ContractViolation::CodeMismatch {
            expected: 422,
            actual: 401
        }))
    ));
    let downstream: Vec<_> = report.outcomes().iter().skip(2).collect();
    assert_eq!(downstream.len(), 7);
    for outcome in downstream {
        assert!(
            matches!(outcome.result, Err(CaseFailure::MissingFixture)),
            "{} should fail for lack of a created user",
            outcome.case
        );
    }
}

#[tokio::test]
async fn no_request_targets_a_user_that_was_never_created() {
    // Arrange
    let api = spawn_fake_api().await;
    let scenario = api.scenario_with_token("not-the-token");

    // Act
    let _ = scenario.run().await;

    // Assert
    let requests = api.received_requests().await;
    assert_eq!(requests, vec!["POST /users", "POST /users"]);
}

#[tokio::test]
async fn an_unreachable_api_is_reported_as_transport_failures() {
    // Arrange
    let api = spawn_fake_api().await;
    let mut configuration = api.configuration.clone();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    configuration.api.base_url = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
    drop(listener);
    let scenario = users_contract::scenario::UsersScenario::build(configuration).unwrap();

    // Act
    let report = scenario.run().await;

    // Assert
    assert!(!report.is_success());
    assert!(matches!(
        report.outcome(CREATE_VALID_USER).unwrap().result,
        Err(CaseFailure::Transport(ClientError::Transport(_)))
    ));
    assert!(matches!(
        report.outcome(CREATE_BLANK_USER).unwrap().result,
        Err(CaseFailure::Transport(ClientError::Transport(_)))
    ));
}

#[tokio::test]
async fn a_created_user_without_an_id_fails_every_later_case() {
    // Arrange
    let api = spawn_fake_api_with(FakeBehaviour {
        omits_created_id: true,
        ..Default::default()
    })
    .await;

    // Act
    let report = api.scenario().run().await;

    // Assert
    assert!(matches!(
        report.outcome(CREATE_VALID_USER).unwrap().result,
        Err(CaseFailure::Contract(ContractViolation::MissingField(ref field))) if field == "id"
    ));
    assert!(report.outcome(CREATE_BLANK_USER).unwrap().passed());
    let downstream: Vec<_> = report.outcomes().iter().skip(2).collect();
    assert_eq!(downstream.len(), 7);
    for outcome in downstream {
        assert!(
            matches!(outcome.result, Err(CaseFailure::MissingFixture)),
            "{} should fail for lack of a created user id",
            outcome.case
        );
    }
    let requests = api.received_requests().await;
    assert_eq!(requests, vec!["POST /users", "POST /users"]);
}
