//! Contract files as read back by a provider

use pactsmith::contract::{CLIENT_NAME, PACT_SPECIFICATION_VERSION};
use pactsmith::{Contract, ContractWriter, Interaction, PactError, Request, Response};
use serde_json::json;

fn interactions() -> Vec<Interaction> {
    vec![
        Interaction {
            description: "a request for user 1".into(),
            provider_state: Some("user 1 exists".into()),
            request: Request::get("/users/1").with_header("Accept", "application/json"),
            response: Response::new(200).with_body(json!({"id": 1, "name": "John Doe"})),
        },
        Interaction {
            description: "a request to delete user 1".into(),
            provider_state: None,
            request: Request::delete("/users/1"),
            response: Response::new(204),
        },
    ]
}

#[test]
fn test_written_file_reads_back() {
    let tmp = tempfile::tempdir().unwrap();
    let writer = ContractWriter::new("Order Service", "User Service", interactions());
    let path = writer.write(tmp.path()).unwrap();

    let contract = Contract::from_file(&path).unwrap();
    assert_eq!(&contract, writer.contract());
    assert_eq!(
        contract.metadata.pact_specification.version,
        PACT_SPECIFICATION_VERSION
    );
    assert_eq!(
        contract.metadata.client.as_ref().map(|c| c.name.as_str()),
        Some(CLIENT_NAME)
    );
}

#[test]
fn test_file_text_is_stable() {
    let tmp = tempfile::tempdir().unwrap();
    let writer = ContractWriter::new("a", "b", interactions());
    let path = writer.write(tmp.path()).unwrap();
    let first = std::fs::read_to_string(&path).unwrap();

    let reparsed: Contract = first.parse().unwrap();
    assert_eq!(reparsed.to_json().unwrap(), first);
}

#[test]
fn test_foreign_contract_without_client() {
    let text = r#"{
        "consumer": {"name": "web"},
        "provider": {"name": "api"},
        "interactions": [{
            "description": "health",
            "request": {"method": "GET", "path": "/health"},
            "response": {"status": 200},
            "_id": "ignored"
        }],
        "metadata": {"pactSpecification": {"version": "2.0.0"}}
    }"#;
    let contract: Contract = text.parse().unwrap();
    assert!(contract.metadata.client.is_none());
    assert_eq!(contract.interactions[0].request.path, "/health");
    assert!(contract.validate().is_ok());
}

#[test]
fn test_invalid_contract_reports_every_issue() {
    let contract = Contract::new(
        "",
        "api",
        vec![Interaction {
            description: String::new(),
            provider_state: None,
            request: Request::new("FETCH", "health"),
            response: Response::new(700),
        }],
    );
    match contract.validate() {
        Err(PactError::InvalidContract { issues }) => assert_eq!(issues.len(), 5),
        other => panic!("expected InvalidContract, got {:?}", other),
    }
}

#[test]
fn test_malformed_json_is_parse_error() {
    let err = Contract::from_slice(b"{not json").unwrap_err();
    assert!(matches!(err, PactError::Parse(_)));
}
