#[cfg(test)]
mod support {
    use pact_mock_provider::{Interaction, Pact, Request, Response};
    use tracing_subscriber::EnvFilter;

    pub fn init_logging() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    pub fn users_pact() -> Pact {
        Pact::new("user-web", "user-service")
            .with_interaction(
                Interaction::new(
                    "a request for user 42",
                    Request::new("GET", "/users/42").with_header("Accept", "application/json"),
                    Response::new(200)
                        .with_header("Content-Type", "application/json")
                        .with_header("X-Request-Cost", "1")
                        .with_header("X-Request-Cost", "2")
                        .with_body(r#"{"id":42,"name":"Zaphod"}"#),
                )
                .given("user 42 exists"),
            )
            .with_interaction(Interaction::new(
                "a search for users",
                Request::new("GET", "/users").with_query("name", "zaphod"),
                Response::new(200).with_body("[]"),
            ))
            .with_interaction(Interaction::new(
                "an empty ping",
                Request::new("POST", "/ping").with_body(Vec::new()),
                Response::new(204),
            ))
            .with_interaction(Interaction::new(
                "a plain text note",
                Request::new("POST", "/notes")
                    .with_header("Content-Type", "text/plain; charset=klingon")
                    .with_body("hello"),
                Response::new(201),
            ))
    }
}

#[cfg(test)]
mod mock_provider_tests {
    use crate::support::{init_logging, users_pact};
    use futures::future::join_all;
    use pact_mock_provider::{
        run_consumer_test, Interaction, MismatchRecord, MockProvider, MockProviderConfig, Pact,
        Request, Response, TestFailure, VerificationVerdict, UNEXPECTED_REQUEST_HEADER,
    };
    use std::net::{SocketAddr, TcpListener};

    fn config_in(dir: &tempfile::TempDir) -> MockProviderConfig {
        let mut config = MockProviderConfig::new();
        config.set_pact_directory(dir.path());
        config
    }

    #[tokio::test]
    async fn matched_request_gets_the_expected_response() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();

        let verdict = run_consumer_test(users_pact(), config_in(&dir), |provider| async move {
            let response = reqwest::Client::new()
                .get(provider.url_for("/users/42"))
                .header("Accept", "application/json")
                .send()
                .await?;

            assert_eq!(response.status(), 200);
            assert_eq!(response.headers()["content-type"], "application/json");
            assert_eq!(response.headers()["x-request-cost"], "1, 2");
            assert_eq!(response.headers()["content-length"], "25");
            assert_eq!(response.text().await?, r#"{"id":42,"name":"Zaphod"}"#);
            Ok::<(), reqwest::Error>(())
        })
        .await
        .unwrap();

        assert_eq!(verdict, VerificationVerdict::Ok);
    }

    #[tokio::test]
    async fn clean_run_persists_the_pact_exactly_once() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();

        let verdict = run_consumer_test(users_pact(), config_in(&dir), |provider| async move {
            let client = reqwest::Client::new();
            let search = client
                .get(provider.url_for("/users?name=zaphod"))
                .send()
                .await?;
            assert_eq!(search.text().await?, "[]");
            Ok::<(), reqwest::Error>(())
        })
        .await
        .unwrap();

        assert_eq!(verdict, VerificationVerdict::Ok);
        let files = std::fs::read_dir(dir.path()).unwrap().collect::<Vec<_>>();
        assert_eq!(files.len(), 1);

        let pact: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("user-web-user-service.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(pact["interactions"].as_array().unwrap().len(), 4);
        assert_eq!(pact["interactions"][0]["providerState"], "user 42 exists");
    }

    #[tokio::test]
    async fn unexpected_request_gets_a_500_and_blocks_the_pact() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();

        let verdict = run_consumer_test(users_pact(), config_in(&dir), |provider| async move {
            let response = reqwest::Client::new()
                .delete(provider.url_for("/users/42?reason=\"gone\""))
                .send()
                .await?;

            assert_eq!(response.status(), 500);
            assert_eq!(response.headers()[UNEXPECTED_REQUEST_HEADER], "1");
            assert_eq!(response.headers()["access-control-allow-origin"], "*");
            let body: serde_json::Value = response.json().await?;
            let error = body["error"].as_str().unwrap();
            assert!(error.starts_with("Unexpected request : "));
            assert!(error.contains("method: DELETE"));
            assert!(error.contains("reason"));
            Ok::<(), reqwest::Error>(())
        })
        .await
        .unwrap();

        match verdict {
            VerificationVerdict::Mismatches(mismatches) => {
                assert_eq!(mismatches.len(), 1);
                assert!(matches!(
                    &mismatches[0],
                    MismatchRecord::UnexpectedRequest(request) if request.path() == "/users/42"
                ));
            }
            other => panic!("expected mismatches, got {:?}", other),
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn partial_match_is_reported_with_its_problems() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();

        let verdict = run_consumer_test(users_pact(), config_in(&dir), |provider| async move {
            let client = reqwest::Client::new();
            for name in &["arthur", "ford"] {
                let response = client
                    .get(provider.url_for(format!("/users?name={}", name)))
                    .send()
                    .await?;
                assert_eq!(response.status(), 500);
            }
            Ok::<(), reqwest::Error>(())
        })
        .await
        .unwrap();

        match verdict {
            VerificationVerdict::Mismatches(mismatches) => {
                assert_eq!(mismatches.len(), 2);
                for mismatch in mismatches {
                    match mismatch {
                        MismatchRecord::PartialMismatch {
                            description,
                            problems,
                        } => {
                            assert_eq!(description, "a search for users");
                            assert_eq!(problems.len(), 1);
                        }
                        other => panic!("expected a partial mismatch, got {:?}", other),
                    }
                }
            }
            other => panic!("expected mismatches, got {:?}", other),
        }
        assert!(!dir.path().join("user-web-user-service.json").exists());
    }

    #[tokio::test]
    async fn failing_test_is_an_error_and_the_listener_is_released() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();
        let mut address: Option<SocketAddr> = None;
        let mut provider = MockProvider::new(users_pact(), config_in(&dir));

        let verdict = provider
            .run_and_write_pact(|handle| {
                address = Some(handle.address());
                async move {
                    reqwest::get(handle.url_for("/nowhere"))
                        .await
                        .map_err(|e| e.to_string())?;
                    Err::<(), String>(String::from("consumer assertion failed"))
                }
            })
            .await
            .unwrap();

        match verdict {
            VerificationVerdict::Error {
                failure,
                mock_server_state,
            } => {
                assert_eq!(
                    failure,
                    TestFailure::Failed(String::from("consumer assertion failed"))
                );
                assert!(matches!(
                    *mock_server_state,
                    VerificationVerdict::Mismatches(ref m) if m.len() == 1
                ));
            }
            other => panic!("expected an error verdict, got {:?}", other),
        }

        provider.stop().await;
        provider.stop().await;
        assert!(TcpListener::bind(address.unwrap()).is_ok());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_unexpected_requests_are_all_recorded() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();

        let verdict = run_consumer_test(users_pact(), config_in(&dir), |provider| async move {
            let client = reqwest::Client::new();
            let responses = join_all((0..50).map(|i| {
                client
                    .get(provider.url_for(format!("/unexpected/{}", i)))
                    .send()
            }))
            .await;

            for response in responses {
                assert_eq!(response?.status(), 500);
            }
            Ok::<(), reqwest::Error>(())
        })
        .await
        .unwrap();

        match verdict {
            VerificationVerdict::Mismatches(mismatches) => {
                let mut paths = mismatches
                    .iter()
                    .map(|mismatch| match mismatch {
                        MismatchRecord::UnexpectedRequest(request) => request.path().to_string(),
                        other => panic!("expected an unexpected request, got {:?}", other),
                    })
                    .collect::<Vec<_>>();
                paths.sort();
                paths.dedup();
                assert_eq!(paths.len(), 50);
            }
            other => panic!("expected mismatches, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn zero_length_body_matches_an_empty_body() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();

        let verdict = run_consumer_test(users_pact(), config_in(&dir), |provider| async move {
            let response = reqwest::Client::new()
                .post(provider.url_for("/ping"))
                .header("Content-Length", "0")
                .body("")
                .send()
                .await?;
            assert_eq!(response.status(), 204);
            Ok::<(), reqwest::Error>(())
        })
        .await
        .unwrap();

        assert_eq!(verdict, VerificationVerdict::Ok);
    }

    #[tokio::test]
    async fn malformed_charset_falls_back_without_failing() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();

        let verdict = run_consumer_test(users_pact(), config_in(&dir), |provider| async move {
            let response = reqwest::Client::new()
                .post(provider.url_for("/notes"))
                .header("Content-Type", "text/plain; charset=klingon")
                .body("hello")
                .send()
                .await?;
            assert_eq!(response.status(), 201);
            Ok::<(), reqwest::Error>(())
        })
        .await
        .unwrap();

        assert_eq!(verdict, VerificationVerdict::Ok);
    }

    #[tokio::test]
    async fn non_ascii_json_body_matches() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();
        let pact = Pact::new("user-web", "user-service").with_interaction(Interaction::new(
            "a new user with an accented name",
            Request::new("POST", "/users")
                .with_header("Content-Type", "application/json")
                .with_body(r#"{"name":"Zoë"}"#),
            Response::new(201),
        ));

        let verdict = run_consumer_test(pact, config_in(&dir), |provider| async move {
            let response = reqwest::Client::new()
                .post(provider.url_for("/users"))
                .json(&serde_json::json!({"name": "Zoë"}))
                .send()
                .await?;
            assert_eq!(response.status(), 201);
            Ok::<(), reqwest::Error>(())
        })
        .await
        .unwrap();

        assert_eq!(verdict, VerificationVerdict::Ok);
        assert!(dir.path().join("user-web-user-service.json").exists());
    }
}

#[cfg(test)]
mod macro_tests {
    use crate::support::users_pact;
    use pact_mock_provider::{pact_consumer_test, MockProviderConfig, MockProviderHandle};

    fn configure(config: &mut MockProviderConfig) {
        config.set_pact_directory(std::env::temp_dir().join("pact-mock-provider-macro-tests"));
        config.set_overwrite_pacts(true);
    }

    #[pact_consumer_test(users_pact, configure)]
    async fn consumer_fetches_a_user(provider: MockProviderHandle) -> Result<(), reqwest::Error> {
        let user: serde_json::Value = reqwest::Client::new()
            .get(provider.url_for("/users/42"))
            .header("Accept", "application/json")
            .send()
            .await?
            .json()
            .await?;

        assert_eq!(user["name"], "Zaphod");
        Ok(())
    }

    #[pact_consumer_test(users_pact, configure)]
    #[should_panic(expected = "Pact verification failed")]
    async fn consumer_calling_an_unknown_endpoint_fails(provider: MockProviderHandle) {
        let _ = reqwest::get(provider.url_for("/teapot")).await;
    }
}
