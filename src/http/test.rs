#[cfg(test)]
mod tests {
    use crate::http::{ApiRequest, FilePart, RetryConfig, RetryingHttpClient, TimeoutSettings, Transport, TransportError};
    use proptest::prelude::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(max_retries: u32) -> RetryingHttpClient {
        RetryingHttpClient::new(RetryConfig::immediate(max_retries), TimeoutSettings::default()).unwrap()
    }

    fn client_with_request_timeout(max_retries: u32, timeout: Duration) -> RetryingHttpClient {
        let timeouts = TimeoutSettings {
            connect: None,
            request: Some(timeout),
        };
        RetryingHttpClient::new(RetryConfig::immediate(max_retries), timeouts).unwrap()
    }

    #[tokio::test]
    async fn test_json_request_carries_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("x-api-key", "secret"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"autoUrba": false})))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let request = ApiRequest::post(format!("{}/echo", server.uri()))
            .header("x-api-key", "secret")
            .json(json!({"autoUrba": false}));

        let response = client(0).send(&request).await.unwrap();
        assert_eq!(response.status.as_u16(), 200);
        assert_eq!(response.body, "ok");
    }

    #[tokio::test]
    async fn test_transient_status_is_retried_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"id":"x"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(5)
            .send(&ApiRequest::post(format!("{}/busy", server.uri())))
            .await
            .unwrap();

        assert_eq!(response.status.as_u16(), 201);
        assert_eq!(response.body, r#"{"id":"x"}"#);
    }

    #[tokio::test]
    async fn test_non_transient_status_is_returned_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(5)
            .send(&ApiRequest::post(format!("{}/broken", server.uri())))
            .await
            .unwrap();

        assert_eq!(response.status.as_u16(), 500);
        assert_eq!(response.body, "boom");
    }

    #[tokio::test]
    async fn test_exhausted_budget_surfaces_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/limited"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let result = client(2)
            .send(&ApiRequest::post(format!("{}/limited", server.uri())))
            .await;

        match result {
            Err(TransportError::RetriesExhausted { attempts, reason, .. }) => {
                assert_eq!(attempts, 3);
                assert!(reason.contains("429"));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_failure_is_retried_then_surfaced() {
        // Nothing listens on a port whose listener was just dropped
        let uri = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            format!("http://{}", listener.local_addr().unwrap())
        };

        let result = client(1).send(&ApiRequest::post(format!("{uri}/gone"))).await;

        match result {
            Err(TransportError::RetriesExhausted { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_multipart_body_is_resent_on_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/file"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/file"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let request = ApiRequest::post(format!("{}/file", server.uri())).multipart(FilePart {
            field: "scanFile".to_string(),
            file_name: "report.csv".to_string(),
            contents: b"package,version\nserde,1.0\n".to_vec(),
        });

        let response = client(3).send(&request).await.unwrap();
        assert_eq!(response.status.as_u16(), 201);

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 2);
        for attempt in received {
            let body = String::from_utf8_lossy(&attempt.body);
            assert!(body.contains("name=\"scanFile\""));
            assert!(body.contains("filename=\"report.csv\""));
            assert!(body.contains("serde,1.0"));
        }
    }

    #[tokio::test]
    async fn test_timed_out_attempt_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let response = client_with_request_timeout(3, Duration::from_millis(300))
            .send(&ApiRequest::post(format!("{}/slow", server.uri())))
            .await
            .unwrap();

        assert_eq!(response.status.as_u16(), 200);
        assert_eq!(response.body, "ok");
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_persistent_timeouts_exhaust_budget() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/stuck"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let result = client_with_request_timeout(1, Duration::from_millis(300))
            .send(&ApiRequest::post(format!("{}/stuck", server.uri())))
            .await;

        match result {
            Err(TransportError::RetriesExhausted { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    const PROPERTY_BUDGET: u32 = 3;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(12))]

        /// A call that turns healthy on attempt `n` succeeds iff `n` fits the budget
        #[test]
        fn prop_transient_failures_recover_within_budget(
            n in 1u32..=PROPERTY_BUDGET + 3,
            status in prop::sample::select(vec![429u16, 502, 503]),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            runtime.block_on(async {
                let server = MockServer::start().await;
                if n > 1 {
                    Mock::given(method("POST"))
                        .and(path("/flaky"))
                        .respond_with(ResponseTemplate::new(status))
                        .up_to_n_times(u64::from(n - 1))
                        .mount(&server)
                        .await;
                }
                Mock::given(method("POST"))
                    .and(path("/flaky"))
                    .respond_with(ResponseTemplate::new(201))
                    .mount(&server)
                    .await;

                let max_attempts = PROPERTY_BUDGET + 1;
                let result = client(PROPERTY_BUDGET)
                    .send(&ApiRequest::post(format!("{}/flaky", server.uri())))
                    .await;
                let sent = server.received_requests().await.unwrap().len() as u32;

                if n <= max_attempts {
                    assert_eq!(result.unwrap().status.as_u16(), 201);
                    assert_eq!(sent, n);
                } else {
                    match result {
                        Err(TransportError::RetriesExhausted { attempts, .. }) => assert_eq!(attempts, max_attempts),
                        other => panic!("expected RetriesExhausted, got {other:?}"),
                    }
                    assert_eq!(sent, max_attempts);
                }
            });
        }
    }
}
