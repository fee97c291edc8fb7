//! End-to-end tests for the Pact builder
//!
//! Tests cover:
//! - Scenario A: GET replay, unmatched 500, coverage failure
//! - Scenario B: POST body structural subset
//! - Scenario C: contract file naming
//! - Scenario D: teardown without verify
//! - Panic and error propagation with guaranteed teardown

use pactsmith::{Contract, Pact, PactError, Request, Response};
use serde_json::{json, Value};

fn user_pact(dir: &std::path::Path) -> Pact {
    let mut pact = Pact::new("Order Service", "User Service").with_pact_dir(dir);
    pact.given("user 1 exists")
        .upon_receiving("a request for user 1")
        .with_request(Request::get("/users/1"))
        .unwrap()
        .will_respond_with(Response::new(200).with_body(json!({"id": 1, "name": "John Doe"})))
        .unwrap();
    pact
}

// ============================================================================
// Scenario A
// ============================================================================

mod get_user_tests {
    use super::*;

    #[tokio::test]
    async fn test_matching_get_returns_declared_body() {
        let dir = tempfile::tempdir().unwrap();
        let mut pact = user_pact(dir.path());

        let path = pact
            .verify(|url| async move {
                let body: Value = reqwest::get(format!("{}/users/1", url))
                    .await?
                    .json()
                    .await?;
                assert_eq!(body, json!({"id": 1, "name": "John Doe"}));
                Ok(())
            })
            .await
            .expect("verification should pass");

        let contract = Contract::from_file(&path).unwrap();
        assert_eq!(contract.interactions.len(), 1);
        assert_eq!(
            contract.interactions[0].provider_state.as_deref(),
            Some("user 1 exists")
        );
    }

    #[tokio::test]
    async fn test_wrong_user_gets_500_and_coverage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut pact = user_pact(dir.path());

        let err = pact
            .verify(|url| async move {
                let resp = reqwest::get(format!("{}/users/2", url)).await?;
                assert_eq!(resp.status().as_u16(), 500);
                let body: Value = resp.json().await?;
                assert_eq!(body["error"], "No matching interaction found");
                assert_eq!(body["request"]["path"], "/users/2");
                assert_eq!(body["request"]["method"], "GET");
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PactError::Verification { .. }));
        assert!(err.to_string().contains("a request for user 1"));
        assert!(!dir
            .path()
            .join("order_service-user_service.json")
            .exists());
    }

    #[tokio::test]
    async fn test_repeated_calls_still_verify() {
        let dir = tempfile::tempdir().unwrap();
        let mut pact = user_pact(dir.path());

        pact.verify(|url| async move {
            for _ in 0..3 {
                let resp = reqwest::get(format!("{}/users/1", url)).await?;
                assert_eq!(resp.status().as_u16(), 200);
            }
            Ok(())
        })
        .await
        .unwrap();
    }
}

// ============================================================================
// Scenario B
// ============================================================================

mod create_user_tests {
    use super::*;

    fn create_pact(dir: &std::path::Path) -> Pact {
        let mut pact = Pact::new("Order Service", "User Service").with_pact_dir(dir);
        pact.upon_receiving("a request to create a user")
            .with_request(json!({
                "method": "POST",
                "path": "/users",
                "headers": {"Content-Type": "application/json"},
                "body": {"name": "Jane Doe", "email": "jane@example.com"}
            }))
            .unwrap()
            .will_respond_with(json!({
                "status": 201,
                "body": {"id": 2, "name": "Jane Doe", "email": "jane@example.com"}
            }))
            .unwrap();
        pact
    }

    #[tokio::test]
    async fn test_extra_field_still_matches() {
        let dir = tempfile::tempdir().unwrap();
        let mut pact = create_pact(dir.path());

        pact.verify(|url| async move {
            let resp = reqwest::Client::new()
                .post(format!("{}/users", url))
                .json(&json!({"name": "Jane Doe", "email": "jane@example.com", "extra": "x"}))
                .send()
                .await?;
            assert_eq!(resp.status().as_u16(), 201);
            let body: Value = resp.json().await?;
            assert_eq!(body["id"], 2);
            Ok(())
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_missing_email_does_not_match() {
        let dir = tempfile::tempdir().unwrap();
        let mut pact = create_pact(dir.path());

        let err = pact
            .verify(|url| async move {
                let resp = reqwest::Client::new()
                    .post(format!("{}/users", url))
                    .json(&json!({"name": "Jane Doe"}))
                    .send()
                    .await?;
                assert_eq!(resp.status().as_u16(), 500);
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PactError::Verification { .. }));
    }

    #[tokio::test]
    async fn test_written_request_keeps_declared_fields_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut pact = create_pact(dir.path());

        let path = pact
            .verify(|url| async move {
                reqwest::Client::new()
                    .post(format!("{}/users", url))
                    .json(&json!({"name": "Jane Doe", "email": "jane@example.com"}))
                    .send()
                    .await?;
                Ok(())
            })
            .await
            .unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        let request = &written["interactions"][0]["request"];
        assert_eq!(request["method"], "POST");
        assert!(request.get("query").is_none());
        assert_eq!(request["body"]["email"], "jane@example.com");
        assert!(written["interactions"][0].get("providerState").is_none());
    }
}

// ============================================================================
// Scenario C
// ============================================================================

mod naming_tests {
    use super::*;

    #[tokio::test]
    async fn test_contract_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut pact = Pact::new("Order Service", "User Service").with_pact_dir(dir.path());
        let path = pact.verify(|_url| async { Ok(()) }).await.unwrap();
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("order_service-user_service.json")
        );
    }
}

// ============================================================================
// Scenario D and teardown discipline
// ============================================================================

mod teardown_tests {
    use super::*;

    #[tokio::test]
    async fn test_teardown_without_verify() {
        let mut pact = Pact::new("Order Service", "User Service");
        pact.teardown().await;
        assert!(pact.server_url().is_none());
    }

    #[tokio::test]
    async fn test_server_stopped_after_exercise_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut pact = user_pact(dir.path());
        let mut seen_url = String::new();

        let err = pact
            .verify(|url| {
                seen_url = url.clone();
                async { Err(anyhow::anyhow!("client failed")) }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PactError::Exercise(_)));
        assert!(reqwest::get(format!("{}/users/1", seen_url)).await.is_err());
    }

    #[tokio::test]
    async fn test_server_stopped_after_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();
        let url_slot = std::sync::Arc::new(parking_lot::Mutex::new(String::new()));
        let slot = url_slot.clone();

        let handle = tokio::spawn(async move {
            let mut pact = user_pact(&path);
            pact.verify(|url| async move {
                *slot.lock() = url;
                panic!("assertion inside exercise");
            })
            .await
        });

        let joined = handle.await;
        assert!(joined.unwrap_err().is_panic());

        let url = url_slot.lock().clone();
        assert!(!url.is_empty());
        assert!(reqwest::get(format!("{}/users/1", url)).await.is_err());
        assert!(!dir.path().join("order_service-user_service.json").exists());
    }

    #[tokio::test]
    async fn test_fresh_server_per_verify() {
        let dir = tempfile::tempdir().unwrap();
        let mut pact = user_pact(dir.path());

        pact.verify(|url| async move {
            reqwest::get(format!("{}/users/1", url)).await?;
            Ok(())
        })
        .await
        .unwrap();

        // Coverage from the first run does not carry over.
        let err = pact.verify(|_url| async { Ok(()) }).await.unwrap_err();
        assert!(matches!(err, PactError::Verification { .. }));
    }
}
